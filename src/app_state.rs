use crate::auth::AuthService;
use crate::backup::BackupService;
use crate::config::Config;
use crate::services::{AppuntamentiService, BolleService, ClientiService, PozziService};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Tutti i servizi, con un unico pool di connessioni condiviso.
pub struct AppState {
    pub pozzi: PozziService,
    pub clienti: ClientiService,
    pub bolle: BolleService,
    pub appuntamenti: AppuntamentiService,
    pub backup: BackupService,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        Self {
            pozzi: PozziService::new(db.clone()),
            clienti: ClientiService::new(db.clone()),
            bolle: BolleService::new(db.clone()),
            appuntamenti: AppuntamentiService::new(db.clone()),
            backup: BackupService::new(db.clone()),
            auth: AuthService::new(db, config),
        }
    }
}
