use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "pozzi")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub nome: String,
    #[sea_orm(nullable)]
    pub ubicazione: Option<String>,
    pub attivo: bool,
    #[sea_orm(nullable)]
    pub note: Option<String>,

    // prezzi unitari socio / non socio
    #[sea_orm(nullable)]
    pub prezzo_socio: Option<f64>,
    #[sea_orm(nullable)]
    pub prezzo_non_socio: Option<f64>,

    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
