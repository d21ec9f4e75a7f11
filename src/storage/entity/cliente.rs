use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clienti")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub nome: String,
    pub cognome: String,
    #[sea_orm(nullable)]
    pub codice_fiscale: Option<String>,
    #[sea_orm(nullable)]
    pub telefono: Option<String>,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    #[sea_orm(nullable)]
    pub indirizzo: Option<String>,
    // JSON array di id dei pozzi
    pub pozzi_ids_json: String,
    pub attivo: bool,
    pub socio: bool,
    #[sea_orm(nullable)]
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
