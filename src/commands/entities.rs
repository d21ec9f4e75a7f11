use crate::app_state::AppState;
use crate::commands::app_command::{Area, ListFilters};
use crate::commands::render;
use crate::error::{AppError, AppResult};
use crate::storage::parse_datetime;
use crate::storage::repository::{AppuntamentoFilter, StatoAppuntamento};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

fn payload<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
    serde_json::from_str(raw).map_err(|e| AppError::validation(format!("JSON non valido: {e}")))
}

fn date_filter(flag: &str, raw: Option<&str>) -> AppResult<Option<chrono::DateTime<chrono::Utc>>> {
    raw.map(|s| {
        parse_datetime(s).ok_or_else(|| AppError::validation(format!("{flag}: data non valida: {s}")))
    })
    .transpose()
}

pub(crate) fn appuntamenti_filter(filters: &ListFilters) -> AppResult<AppuntamentoFilter> {
    let stato = filters
        .stato
        .as_deref()
        .map(str::parse::<StatoAppuntamento>)
        .transpose()
        .map_err(AppError::Validation)?;
    Ok(AppuntamentoFilter {
        cliente_id: filters.cliente.clone(),
        pozzo_id: filters.pozzo.clone(),
        stato,
        dal: date_filter("--dal", filters.dal.as_deref())?,
        al: date_filter("--al", filters.al.as_deref())?,
    })
}

pub async fn list(state: &AppState, area: Area, filters: &ListFilters) -> anyhow::Result<Value> {
    let cliente = filters.cliente.as_deref();
    let pozzo = filters.pozzo.as_deref();
    match area {
        Area::Pozzi => render(state.pozzi.find_all().await?),
        Area::Clienti => render(state.clienti.find_all().await?),
        Area::Bolle if filters.detailed => {
            render(state.bolle.find_all_detailed(cliente, pozzo).await?)
        }
        Area::Bolle => render(match (cliente, pozzo) {
            (Some(c), Some(p)) => state.bolle.find_by_cliente_and_pozzo(c, p).await?,
            (Some(c), None) => state.bolle.find_by_cliente(c).await?,
            (None, Some(p)) => state.bolle.find_by_pozzo(p).await?,
            (None, None) => state.bolle.find_all().await?,
        }),
        Area::Appuntamenti => {
            let filter = appuntamenti_filter(filters)?;
            render(state.appuntamenti.find_all(&filter).await?)
        }
    }
}

pub async fn get(state: &AppState, area: Area, id: &str, detailed: bool) -> anyhow::Result<Value> {
    match area {
        Area::Pozzi => render(state.pozzi.find_one(id).await?),
        Area::Clienti => render(state.clienti.find_one(id).await?),
        Area::Bolle if detailed => render(state.bolle.find_one_detailed(id).await?),
        Area::Bolle => render(state.bolle.find_one(id).await?),
        Area::Appuntamenti => render(state.appuntamenti.find_one(id).await?),
    }
}

pub async fn create(state: &AppState, area: Area, raw: &str) -> anyhow::Result<Value> {
    match area {
        Area::Pozzi => render(state.pozzi.create(payload(raw)?).await?),
        Area::Clienti => render(state.clienti.create(payload(raw)?).await?),
        Area::Bolle => render(state.bolle.create(payload(raw)?).await?),
        Area::Appuntamenti => render(state.appuntamenti.create(payload(raw)?).await?),
    }
}

pub async fn update(state: &AppState, area: Area, id: &str, raw: &str) -> anyhow::Result<Value> {
    match area {
        Area::Pozzi => render(state.pozzi.update(id, payload(raw)?).await?),
        Area::Clienti => render(state.clienti.update(id, payload(raw)?).await?),
        Area::Bolle => render(state.bolle.update(id, payload(raw)?).await?),
        Area::Appuntamenti => render(state.appuntamenti.update(id, payload(raw)?).await?),
    }
}

pub async fn delete(state: &AppState, area: Area, id: &str) -> anyhow::Result<Value> {
    match area {
        Area::Pozzi => state.pozzi.remove(id).await?,
        Area::Clienti => state.clienti.remove(id).await?,
        Area::Bolle => state.bolle.remove(id).await?,
        Area::Appuntamenti => state.appuntamenti.remove(id).await?,
    }
    Ok(json!({ "success": true, "id": id }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::connection::memory_db;

    async fn state() -> AppState {
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
            authorized_emails: Vec::new(),
            bcrypt_cost: 4,
        };
        AppState::new(memory_db().await, &config)
    }

    #[test]
    fn appuntamenti_filter_parses_state_and_dates() {
        let filters = ListFilters {
            stato: Some("Completato".to_string()),
            dal: Some("2024-05-01".to_string()),
            ..Default::default()
        };
        let filter = appuntamenti_filter(&filters).unwrap();
        assert_eq!(filter.stato, Some(StatoAppuntamento::Completato));
        assert!(filter.dal.is_some() && filter.al.is_none());

        let bad = ListFilters {
            stato: Some("Forse".to_string()),
            ..Default::default()
        };
        assert!(matches!(appuntamenti_filter(&bad), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_get_delete_through_commands() {
        let state = state().await;
        let created = create(&state, Area::Pozzi, r#"{"nome": "Pozzo Nord", "prezzoSocio": 1.5}"#)
            .await
            .unwrap();
        let id = created["_id"].as_str().unwrap().to_string();
        assert_eq!(created["attivo"], true);

        let fetched = get(&state, Area::Pozzi, &id, false).await.unwrap();
        assert_eq!(fetched["nome"], "Pozzo Nord");

        let deleted = delete(&state, Area::Pozzi, &id).await.unwrap();
        assert_eq!(deleted["success"], true);

        let err = get(&state, Area::Pozzi, &id, false).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let state = state().await;
        let err = create(&state, Area::Clienti, "{nome:").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::Validation(_))
        ));
    }
}
