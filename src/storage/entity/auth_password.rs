use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_passwords")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub password_hash: String,
    pub valid_from: i64,  // primo giorno del mese, incluso
    pub valid_until: i64, // primo giorno del mese successivo, escluso
    pub is_active: bool,
    pub generated_by: String, // auto / manual / admin
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
