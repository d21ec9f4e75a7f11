mod app_state;
mod auth;
mod backup;
mod commands;
mod config;
mod error;
mod services;
mod storage;

use std::sync::Arc;

use crate::app_state::AppState;
use crate::commands::{AppCommand, USAGE};
use crate::config::Config;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .filter_module("gestionale_pozzi", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .parse_default_env() // RUST_LOG ha la precedenza
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = AppCommand::from_args(&args);
    match &command {
        AppCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        AppCommand::Unknown(msg) => anyhow::bail!("{}", msg),
        _ => {}
    }

    let config = Config::load();
    let db = storage::establish_connection(&config.database_url, config.max_connections).await?;
    let state = AppState::new(Arc::new(db), &config);

    let output = commands::execute(command, &state).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
