use crate::storage::entity::pozzo::{
    self, ActiveModel as PozzoActiveModel, Entity as Pozzo, Model as PozzoModel,
};
use crate::storage::{flexible_datetime, new_id, nullable, to_datetime};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreatePozzo {
    pub nome: String,
    pub ubicazione: Option<String>,
    #[serde(default = "default_true")]
    pub attivo: bool,
    pub note: Option<String>,
    pub prezzo_socio: Option<f64>,
    pub prezzo_non_socio: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePozzo {
    pub nome: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub ubicazione: Option<Option<String>>,
    pub attivo: Option<bool>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub note: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub prezzo_socio: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub prezzo_non_socio: Option<Option<f64>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PozzoDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub nome: String,
    pub ubicazione: Option<String>,
    pub attivo: bool,
    pub note: Option<String>,
    pub prezzo_socio: Option<f64>,
    pub prezzo_non_socio: Option<f64>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl From<PozzoModel> for PozzoDto {
    fn from(model: PozzoModel) -> Self {
        Self {
            id: model.id,
            nome: model.nome,
            ubicazione: model.ubicazione,
            attivo: model.attivo,
            note: model.note,
            prezzo_socio: model.prezzo_socio,
            prezzo_non_socio: model.prezzo_non_socio,
            created_at: to_datetime(model.created_at),
            updated_at: to_datetime(model.updated_at),
        }
    }
}

pub struct PozzoRepository;

impl PozzoRepository {
    pub async fn insert(
        db: &DatabaseConnection,
        def: CreatePozzo,
    ) -> Result<PozzoModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        let active_model = PozzoActiveModel {
            id: Set(new_id()),
            nome: Set(def.nome),
            ubicazione: Set(def.ubicazione),
            attivo: Set(def.attivo),
            note: Set(def.note),
            prezzo_socio: Set(def.prezzo_socio),
            prezzo_non_socio: Set(def.prezzo_non_socio),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(db).await
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<PozzoModel>, sea_orm::DbErr> {
        Pozzo::find().order_by_asc(pozzo::Column::Nome).all(db).await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: &str,
    ) -> Result<Option<PozzoModel>, sea_orm::DbErr> {
        Pozzo::find_by_id(id.to_string()).one(db).await
    }

    pub async fn find_by_ids(
        db: &DatabaseConnection,
        ids: Vec<String>,
    ) -> Result<Vec<PozzoModel>, sea_orm::DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Pozzo::find()
            .filter(pozzo::Column::Id.is_in(ids))
            .all(db)
            .await
    }

    pub async fn update(
        db: &DatabaseConnection,
        model: PozzoModel,
        changes: UpdatePozzo,
    ) -> Result<PozzoModel, sea_orm::DbErr> {
        let mut active_model: PozzoActiveModel = model.into();
        if let Some(v) = changes.nome {
            active_model.nome = Set(v);
        }
        if let Some(v) = changes.ubicazione {
            active_model.ubicazione = Set(v);
        }
        if let Some(v) = changes.attivo {
            active_model.attivo = Set(v);
        }
        if let Some(v) = changes.note {
            active_model.note = Set(v);
        }
        if let Some(v) = changes.prezzo_socio {
            active_model.prezzo_socio = Set(v);
        }
        if let Some(v) = changes.prezzo_non_socio {
            active_model.prezzo_non_socio = Set(v);
        }
        active_model.updated_at = Set(Utc::now().timestamp());
        active_model.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<u64, sea_orm::DbErr> {
        let res = Pozzo::delete_by_id(id.to_string()).exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_all(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        let res = Pozzo::delete_many().exec(db).await?;
        Ok(res.rows_affected)
    }

    #[cfg(test)]
    pub async fn count(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        use sea_orm::PaginatorTrait;
        Pozzo::find().count(db).await
    }
}
