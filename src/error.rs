use sea_orm::DbErr;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("dati non validi: {0}")]
    Validation(String),
    #[error("{entity} con ID {id} non trovato")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Referenced(String),
    #[error("errore database: {0}")]
    Storage(#[from] DbErr),
    #[error("errore hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("attività interrotta: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
