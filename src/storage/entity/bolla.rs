use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bolle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub numero_bolla: String, // unico per pozzo, non globalmente
    pub data: DateTimeUtc,
    pub cliente_id: String,
    pub pozzo_id: String,
    pub ore: f64,
    pub metri_cubi: f64,
    pub acconto: f64,
    pub saldato: bool,
    pub cliente_socio: bool,
    #[sea_orm(nullable)]
    pub importo_totale: Option<f64>,
    #[sea_orm(nullable)]
    pub note: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

// Nessuna foreign key a livello di database: i vincoli sono applicati dai service.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
