pub mod app_command;
pub mod auth;
pub mod backup;
pub mod entities;

pub use app_command::{AppCommand, USAGE};

use crate::app_state::AppState;
use serde::Serialize;
use serde_json::Value;

/// Esegue un comando già interpretato e restituisce ciò che va stampato.
pub async fn execute(cmd: AppCommand, state: &AppState) -> anyhow::Result<Value> {
    match cmd {
        AppCommand::List { area, filters } => entities::list(state, area, &filters).await,
        AppCommand::Get { area, id, detailed } => entities::get(state, area, &id, detailed).await,
        AppCommand::Create { area, json } => entities::create(state, area, &json).await,
        AppCommand::Update { area, id, json } => entities::update(state, area, &id, &json).await,
        AppCommand::Delete { area, id } => entities::delete(state, area, &id).await,
        AppCommand::ClientiByPozzo { pozzo_id } => {
            render(state.clienti.find_by_pozzo(&pozzo_id).await?)
        }
        AppCommand::BolleNextNumero { pozzo_id } => {
            let numero = state.bolle.next_numero(&pozzo_id).await?;
            Ok(serde_json::json!({ "pozzoId": pozzo_id, "numeroBolla": numero }))
        }
        AppCommand::AppuntamentiStats => {
            render(state.appuntamenti.stats(chrono::Utc::now()).await?)
        }
        AppCommand::BackupExport { file } => backup::export(&state.backup, file.as_deref()).await,
        AppCommand::BackupImport { file } => backup::import(&state.backup, &file).await,
        AppCommand::BackupClear => render(state.backup.clear_all().await?),
        AppCommand::AuthInit => auth::init(&state.auth).await,
        AppCommand::AuthGenerate { generated_by } => auth::generate(&state.auth, &generated_by).await,
        AppCommand::AuthCurrent => render(state.auth.current_password(chrono::Utc::now()).await?),
        AppCommand::AuthValidate { email, password } => {
            auth::validate(&state.auth, &email, &password).await
        }
        AppCommand::AuthStats => render(state.auth.stats(chrono::Utc::now()).await?),
        AppCommand::AuthLogs { limit } => render(state.auth.recent_logs(limit).await?),
        AppCommand::AuthUsers => render(state.auth.authorized_users().await?),
        AppCommand::Help => Ok(Value::String(USAGE.to_string())),
        AppCommand::Unknown(msg) => anyhow::bail!(msg),
    }
}

pub(crate) fn render<T: Serialize>(value: T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(value)?)
}
