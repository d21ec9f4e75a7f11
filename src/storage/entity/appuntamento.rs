use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appuntamenti")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub cliente_id: String,
    pub pozzo_id: String,
    pub data_ora: DateTimeUtc,
    pub tipo: String,  // Consegna acqua / Manutenzione / Sopralluogo / Altro
    pub stato: String, // Programmato / Completato / Annullato
    #[sea_orm(nullable)]
    pub descrizione: Option<String>,
    #[sea_orm(nullable)]
    pub note: Option<String>,
    pub notifica_reminder: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
