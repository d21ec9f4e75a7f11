use crate::storage::entity::bolla::{
    self, ActiveModel as BollaActiveModel, Entity as Bolla, Model as BollaModel,
};
use crate::storage::{flexible_datetime, new_id, nullable, to_datetime};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateBolla {
    pub numero_bolla: String,
    #[serde(with = "flexible_datetime")]
    pub data: DateTime<Utc>,
    pub cliente_id: String,
    pub pozzo_id: String,
    pub ore: f64,
    pub metri_cubi: f64,
    pub acconto: f64,
    #[serde(default)]
    pub saldato: bool,
    #[serde(default)]
    pub cliente_socio: bool,
    pub importo_totale: Option<f64>,
    pub note: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBolla {
    pub numero_bolla: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub data: Option<DateTime<Utc>>,
    pub cliente_id: Option<String>,
    pub pozzo_id: Option<String>,
    pub ore: Option<f64>,
    pub metri_cubi: Option<f64>,
    pub acconto: Option<f64>,
    pub saldato: Option<bool>,
    pub cliente_socio: Option<bool>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub importo_totale: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable::deserialize")]
    pub note: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BollaDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub numero_bolla: String,
    #[serde(with = "flexible_datetime")]
    pub data: DateTime<Utc>,
    pub cliente_id: String,
    pub pozzo_id: String,
    pub ore: f64,
    pub metri_cubi: f64,
    pub acconto: f64,
    pub saldato: bool,
    pub cliente_socio: bool,
    pub importo_totale: Option<f64>,
    pub note: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl From<BollaModel> for BollaDto {
    fn from(model: BollaModel) -> Self {
        Self {
            id: model.id,
            numero_bolla: model.numero_bolla,
            data: model.data,
            cliente_id: model.cliente_id,
            pozzo_id: model.pozzo_id,
            ore: model.ore,
            metri_cubi: model.metri_cubi,
            acconto: model.acconto,
            saldato: model.saldato,
            cliente_socio: model.cliente_socio,
            importo_totale: model.importo_totale,
            note: model.note,
            created_at: to_datetime(model.created_at),
            updated_at: to_datetime(model.updated_at),
        }
    }
}

pub struct BollaRepository;

impl BollaRepository {
    pub async fn insert(
        db: &DatabaseConnection,
        def: CreateBolla,
    ) -> Result<BollaModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        let active_model = BollaActiveModel {
            id: Set(new_id()),
            numero_bolla: Set(def.numero_bolla),
            data: Set(def.data),
            cliente_id: Set(def.cliente_id),
            pozzo_id: Set(def.pozzo_id),
            ore: Set(def.ore),
            metri_cubi: Set(def.metri_cubi),
            acconto: Set(def.acconto),
            saldato: Set(def.saldato),
            cliente_socio: Set(def.cliente_socio),
            importo_totale: Set(def.importo_totale),
            note: Set(def.note),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(db).await
    }

    /// Elenca le bolle dalla più recente, filtrando se richiesto per cliente e/o pozzo.
    pub async fn find_filtered(
        db: &DatabaseConnection,
        cliente_id: Option<&str>,
        pozzo_id: Option<&str>,
    ) -> Result<Vec<BollaModel>, sea_orm::DbErr> {
        let mut query = Bolla::find();
        if let Some(id) = cliente_id {
            query = query.filter(bolla::Column::ClienteId.eq(id));
        }
        if let Some(id) = pozzo_id {
            query = query.filter(bolla::Column::PozzoId.eq(id));
        }
        query.order_by_desc(bolla::Column::Data).all(db).await
    }

    pub async fn find_by_id(
        db: &DatabaseConnection,
        id: &str,
    ) -> Result<Option<BollaModel>, sea_orm::DbErr> {
        Bolla::find_by_id(id.to_string()).one(db).await
    }

    pub async fn find_by_pozzo_and_numero(
        db: &DatabaseConnection,
        pozzo_id: &str,
        numero_bolla: &str,
        exclude_id: Option<&str>,
    ) -> Result<Option<BollaModel>, sea_orm::DbErr> {
        let mut query = Bolla::find()
            .filter(bolla::Column::PozzoId.eq(pozzo_id))
            .filter(bolla::Column::NumeroBolla.eq(numero_bolla));
        if let Some(id) = exclude_id {
            query = query.filter(bolla::Column::Id.ne(id));
        }
        query.one(db).await
    }

    pub async fn numeri_by_pozzo(
        db: &DatabaseConnection,
        pozzo_id: &str,
    ) -> Result<Vec<String>, sea_orm::DbErr> {
        Bolla::find()
            .select_only()
            .column(bolla::Column::NumeroBolla)
            .filter(bolla::Column::PozzoId.eq(pozzo_id))
            .into_tuple::<String>()
            .all(db)
            .await
    }

    pub async fn count_by_cliente(
        db: &DatabaseConnection,
        cliente_id: &str,
    ) -> Result<u64, sea_orm::DbErr> {
        Bolla::find()
            .filter(bolla::Column::ClienteId.eq(cliente_id))
            .count(db)
            .await
    }

    pub async fn update(
        db: &DatabaseConnection,
        model: BollaModel,
        changes: UpdateBolla,
    ) -> Result<BollaModel, sea_orm::DbErr> {
        let mut active_model: BollaActiveModel = model.into();
        if let Some(v) = changes.numero_bolla {
            active_model.numero_bolla = Set(v);
        }
        if let Some(v) = changes.data {
            active_model.data = Set(v);
        }
        if let Some(v) = changes.cliente_id {
            active_model.cliente_id = Set(v);
        }
        if let Some(v) = changes.pozzo_id {
            active_model.pozzo_id = Set(v);
        }
        if let Some(v) = changes.ore {
            active_model.ore = Set(v);
        }
        if let Some(v) = changes.metri_cubi {
            active_model.metri_cubi = Set(v);
        }
        if let Some(v) = changes.acconto {
            active_model.acconto = Set(v);
        }
        if let Some(v) = changes.saldato {
            active_model.saldato = Set(v);
        }
        if let Some(v) = changes.cliente_socio {
            active_model.cliente_socio = Set(v);
        }
        if let Some(v) = changes.importo_totale {
            active_model.importo_totale = Set(v);
        }
        if let Some(v) = changes.note {
            active_model.note = Set(v);
        }
        active_model.updated_at = Set(Utc::now().timestamp());
        active_model.update(db).await
    }

    pub async fn delete(db: &DatabaseConnection, id: &str) -> Result<u64, sea_orm::DbErr> {
        let res = Bolla::delete_by_id(id.to_string()).exec(db).await?;
        Ok(res.rows_affected)
    }

    pub async fn delete_all(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        let res = Bolla::delete_many().exec(db).await?;
        Ok(res.rows_affected)
    }

    #[cfg(test)]
    pub async fn count(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        Bolla::find().count(db).await
    }
}
