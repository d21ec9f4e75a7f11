use crate::storage::entity::appuntamento::{
    self, ActiveModel as AppuntamentoActiveModel, Entity as Appuntamento,
    Model as AppuntamentoModel,
};
use crate::storage::{flexible_datetime, new_id, nullable, to_datetime};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TipoAppuntamento {
    #[default]
    #[serde(rename = "Consegna acqua")]
    ConsegnaAcqua,
    Manutenzione,
    Sopralluogo,
    Altro,
}

impl TipoAppuntamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsegnaAcqua => "Consegna acqua",
            Self::Manutenzione => "Manutenzione",
            Self::Sopralluogo => "Sopralluogo",
            Self::Altro => "Altro",
        }
    }
}

impl FromStr for TipoAppuntamento {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Consegna acqua" => Ok(Self::ConsegnaAcqua),
            "Manutenzione" => Ok(Self::Manutenzione),
            "Sopralluogo" => Ok(Self::Sopralluogo),
            "Altro" => Ok(Self::Altro),
            other => Err(format!("tipo appuntamento sconosciuto: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StatoAppuntamento {
    #[default]
    Programmato,
    Completato,
    Annullato,
}

impl StatoAppuntamento {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Programmato => "Programmato",
            Self::Completato => "Completato",
            Self::Annullato => "Annullato",
        }
    }
}

impl FromStr for StatoAppuntamento {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Programmato" => Ok(Self::Programmato),
            "Completato" => Ok(Self::Completato),
            "Annullato" => Ok(Self::Annullato),
            other => Err(format!("stato appuntamento sconosciuto: {other}")),
        }
    }
}

impl fmt::Display for StatoAppuntamento {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppuntamento {
    pub cliente_id: String,
    pub pozzo_id: String,
    #[serde(with = "flexible_datetime")]
    pub data_ora: DateTime<Utc>,
    #[serde(default)]
    pub tipo: TipoAppuntamento,
    #[serde(default)]
    pub stato: StatoAppuntamento,
    pub descrizione: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub notifica_reminder: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppuntamento {
    pub cliente_id: Option<String>,
    pub pozzo_id: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub data_ora: Option<DateTime<Utc>>,
    pub tipo: Option<TipoAppuntamento>,
    pub stato: Option<StatoAppuntamento>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub descrizione: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub note: Option<Option<String>>,
    pub notifica_reminder: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct AppuntamentoFilter {
    pub cliente_id: Option<String>,
    pub pozzo_id: Option<String>,
    pub stato: Option<StatoAppuntamento>,
    pub dal: Option<DateTime<Utc>>,
    pub al: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppuntamentoDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub cliente_id: String,
    pub pozzo_id: String,
    #[serde(with = "flexible_datetime")]
    pub data_ora: DateTime<Utc>,
    pub tipo: TipoAppuntamento,
    pub stato: StatoAppuntamento,
    pub descrizione: Option<String>,
    pub note: Option<String>,
    pub notifica_reminder: bool,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl From<AppuntamentoModel> for AppuntamentoDto {
    fn from(model: AppuntamentoModel) -> Self {
        Self {
            id: model.id,
            cliente_id: model.cliente_id,
            pozzo_id: model.pozzo_id,
            data_ora: model.data_ora,
            tipo: model.tipo.parse().unwrap_or_default(),
            stato: model.stato.parse().unwrap_or_default(),
            descrizione: model.descrizione,
            note: model.note,
            notifica_reminder: model.notifica_reminder,
            created_at: to_datetime(model.created_at),
            updated_at: to_datetime(model.updated_at),
        }
    }
}

pub struct AppuntamentoRepository;

impl AppuntamentoRepository {
    pub async fn insert(
        db: &DatabaseConnection,
        def: CreateAppuntamento,
    ) -> Result<AppuntamentoModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        let active_model = AppuntamentoActiveModel {
            id: Set(new_id()),
            cliente_id: Set(def.cliente_id),
            pozzo_id: Set(def.pozzo_id),
            data_ora: Set(def.data_ora),
            tipo: Set(def.tipo.as_str().to_string()),
            stato: Set(def.stato.as_str().to_string()),
            descrizione: Set(def.descrizione),
            note: Set(def.note),
            notifica_reminder: Set(def.notifica_reminder),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(db).await
    }

    pub async fn find_filtered(
        db: &DatabaseConnection,
        filter: &AppuntamentoFilter,
    ) -> Result<Vec<AppuntamentoModel>, sea_orm::DbErr> {
        let mut query = Appuntamento::find();
        if let Some(id) = &filter.cliente_id {
            query = query.filter(appuntamento::Column::ClienteId.eq(id.as_str()));
        }
        if let Some(id) = &filter.pozzo_id {
            query = query.filter(appuntamento::Column::PozzoId.eq(id.as_str()));
        }
        if let Some(stato) = filter.stato {
            query = query.filter(appuntamento::Column::Stato.eq(stato.as_str()));
        }
        if let Some(dal) = filter.dal {
            query = query.filter(appuntamento::Column::DataOra.gte(dal));
        }
        if let Some(al) = filter.al {
            query = query.filter(appuntamento::Column::DataOra.lte(al));
        }
        query
            .order_by_desc(appuntamento::Column::DataOra)
            .all(db)
            .await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: &str,
    ) -> Result<Option<AppuntamentoModel>, sea_orm::DbErr> {
        Appuntamento::find_by_id(id.to_string()).one(db).await
    }

    pub async fn count_by_cliente(
        db: &DatabaseConnection,
        cliente_id: &str,
    ) -> Result<u64, sea_orm::DbErr> {
        Appuntamento::find()
            .filter(appuntamento::Column::ClienteId.eq(cliente_id))
            .count(db)
            .await
    }

    pub async fn count_by_stato(
        db: &DatabaseConnection,
        stato: StatoAppuntamento,
    ) -> Result<u64, sea_orm::DbErr> {
        Appuntamento::find()
            .filter(appuntamento::Column::Stato.eq(stato.as_str()))
            .count(db)
            .await
    }

    /// Conta gli appuntamenti con `from <= data_ora < until`.
    pub async fn count_between(
        db: &DatabaseConnection,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<u64, sea_orm::DbErr> {
        Appuntamento::find()
            .filter(appuntamento::Column::DataOra.gte(from))
            .filter(appuntamento::Column::DataOra.lt(until))
            .count(db)
            .await
    }

    pub async fn update(
        db: &DatabaseConnection,
        model: AppuntamentoModel,
        changes: UpdateAppuntamento,
    ) -> Result<AppuntamentoModel, sea_orm::DbErr> {
        let mut active_model: AppuntamentoActiveModel = model.into();
        if let Some(v) = changes.cliente_id {
            active_model.cliente_id = Set(v);
        }
        if let Some(v) = changes.pozzo_id {
            active_model.pozzo_id = Set(v);
        }
        if let Some(v) = changes.data_ora {
            active_model.data_ora = Set(v);
        }
        if let Some(v) = changes.tipo {
            active_model.tipo = Set(v.as_str().to_string());
        }
        if let Some(v) = changes.stato {
            active_model.stato = Set(v.as_str().to_string());
        }
        if let Some(v) = changes.descrizione {
            active_model.descrizione = Set(v);
        }
        if let Some(v) = changes.note {
            active_model.note = Set(v);
        }
        if let Some(v) = changes.notifica_reminder {
            active_model.notifica_reminder = Set(v);
        }
        active_model.updated_at = Set(Utc::now().timestamp());
        active_model.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<u64, sea_orm::DbErr> {
        let res = Appuntamento::delete_by_id(id.to_string()).exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn count(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        Appuntamento::find().count(db).await
    }
}
