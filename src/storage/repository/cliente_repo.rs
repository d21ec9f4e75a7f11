use crate::storage::entity::cliente::{
    self, ActiveModel as ClienteActiveModel, Entity as Cliente, Model as ClienteModel,
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
pub struct CreateCliente {
    pub nome: String,
    pub cognome: String,
    pub codice_fiscale: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub indirizzo: Option<String>,
    #[serde(default)]
    pub pozzi_ids: Vec<String>,
    #[serde(default = "default_true")]
    pub attivo: bool,
    #[serde(default)]
    pub socio: bool,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCliente {
    pub nome: Option<String>,
    pub cognome: Option<String>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub codice_fiscale: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub telefono: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub indirizzo: Option<Option<String>>,
    pub pozzi_ids: Option<Vec<String>>,
    pub attivo: Option<bool>,
    pub socio: Option<bool>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub note: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClienteDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub nome: String,
    pub cognome: String,
    pub codice_fiscale: Option<String>,
    pub telefono: Option<String>,
    pub email: Option<String>,
    pub indirizzo: Option<String>,
    pub pozzi_ids: Vec<String>,
    pub attivo: bool,
    pub socio: bool,
    pub note: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl From<ClienteModel> for ClienteDto {
    fn from(model: ClienteModel) -> Self {
        let pozzi_ids = decode_ids(&model.pozzi_ids_json);
        Self {
            id: model.id,
            nome: model.nome,
            cognome: model.cognome,
            codice_fiscale: model.codice_fiscale,
            telefono: model.telefono,
            email: model.email,
            indirizzo: model.indirizzo,
            pozzi_ids,
            attivo: model.attivo,
            socio: model.socio,
            note: model.note,
            created_at: to_datetime(model.created_at),
            updated_at: to_datetime(model.updated_at),
        }
    }
}

fn encode_ids(ids: &[String]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_ids(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

pub struct ClienteRepository;

impl ClienteRepository {
    pub async fn insert(
        db: &DatabaseConnection,
        def: CreateCliente,
    ) -> Result<ClienteModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        let active_model = ClienteActiveModel {
            id: Set(new_id()),
            nome: Set(def.nome),
            cognome: Set(def.cognome),
            codice_fiscale: Set(def.codice_fiscale),
            telefono: Set(def.telefono),
            email: Set(def.email),
            indirizzo: Set(def.indirizzo),
            pozzi_ids_json: Set(encode_ids(&def.pozzi_ids)),
            attivo: Set(def.attivo),
            socio: Set(def.socio),
            note: Set(def.note),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(db).await
    }

    pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<ClienteModel>, sea_orm::DbErr> {
        Cliente::find()
            .order_by_asc(cliente::Column::Cognome)
            .order_by_asc(cliente::Column::Nome)
            .all(db)
            .await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: &str,
    ) -> Result<Option<ClienteModel>, sea_orm::DbErr> {
        Cliente::find_by_id(id.to_string()).one(db).await
    }

    pub async fn find_by_ids(
        db: &DatabaseConnection,
        ids: Vec<String>,
    ) -> Result<Vec<ClienteModel>, sea_orm::DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Cliente::find()
            .filter(cliente::Column::Id.is_in(ids))
            .all(db)
            .await
    }

    pub async fn find_by_pozzo(
        db: &DatabaseConnection,
        pozzo_id: &str,
    ) -> Result<Vec<ClienteModel>, sea_orm::DbErr> {
        // LIKE restringe i candidati, il controllo esatto avviene sul JSON decodificato
        let candidates = Cliente::find()
            .filter(cliente::Column::PozziIdsJson.contains(format!("\"{}\"", pozzo_id)))
            .order_by_asc(cliente::Column::Cognome)
            .order_by_asc(cliente::Column::Nome)
            .all(db)
            .await?;
        Ok(candidates
            .into_iter()
            .filter(|c| decode_ids(&c.pozzi_ids_json).iter().any(|id| id == pozzo_id))
            .collect())
    }

    pub async fn update(
        db: &DatabaseConnection,
        model: ClienteModel,
        changes: UpdateCliente,
    ) -> Result<ClienteModel, sea_orm::DbErr> {
        let mut active_model: ClienteActiveModel = model.into();
        if let Some(v) = changes.nome {
            active_model.nome = Set(v);
        }
        if let Some(v) = changes.cognome {
            active_model.cognome = Set(v);
        }
        if let Some(v) = changes.codice_fiscale {
            active_model.codice_fiscale = Set(v);
        }
        if let Some(v) = changes.telefono {
            active_model.telefono = Set(v);
        }
        if let Some(v) = changes.email {
            active_model.email = Set(v);
        }
        if let Some(v) = changes.indirizzo {
            active_model.indirizzo = Set(v);
        }
        if let Some(v) = changes.pozzi_ids {
            active_model.pozzi_ids_json = Set(encode_ids(&v));
        }
        if let Some(v) = changes.attivo {
            active_model.attivo = Set(v);
        }
        if let Some(v) = changes.socio {
            active_model.socio = Set(v);
        }
        if let Some(v) = changes.note {
            active_model.note = Set(v);
        }
        active_model.updated_at = Set(Utc::now().timestamp());
        active_model.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<u64, sea_orm::DbErr> {
        let res = Cliente::delete_by_id(id.to_string()).exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_all(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        let res = Cliente::delete_many().exec(db).await?;
        Ok(res.rows_affected)
    }

    #[cfg(test)]
    pub async fn count(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        use sea_orm::PaginatorTrait;
        Cliente::find().count(db).await
    }
}
