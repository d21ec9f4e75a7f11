use crate::error::{AppError, AppResult};
use crate::services::validation::{optional_non_negative, optional_text, require_text};
use crate::storage::repository::{CreatePozzo, PozzoDto, PozzoRepository, UpdatePozzo};
use log::info;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

const ENTITY: &str = "Pozzo";

pub struct PozziService {
    db: Arc<DatabaseConnection>,
}

impl PozziService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, def: CreatePozzo) -> AppResult<PozzoDto> {
        require_text("nome", &def.nome)?;
        optional_non_negative("prezzoSocio", def.prezzo_socio)?;
        optional_non_negative("prezzoNonSocio", def.prezzo_non_socio)?;

        let model = PozzoRepository::insert(&self.db, def).await?;
        info!("✓ Pozzo creato [{}]: {}", model.id, model.nome);
        Ok(model.into())
    }

    pub async fn find_all(&self) -> AppResult<Vec<PozzoDto>> {
        let models = PozzoRepository::find_all(&self.db).await?;
        Ok(models.into_iter().map(PozzoDto::from).collect())
    }

    pub async fn find_one(&self, id: &str) -> AppResult<PozzoDto> {
        PozzoRepository::find_by_id(&self.db, id)
            .await?
            .map(PozzoDto::from)
            .ok_or_else(|| AppError::not_found(ENTITY, id))
    }

    pub async fn update(&self, id: &str, changes: UpdatePozzo) -> AppResult<PozzoDto> {
        optional_text("nome", changes.nome.as_deref())?;
        optional_non_negative("prezzoSocio", changes.prezzo_socio.flatten())?;
        optional_non_negative("prezzoNonSocio", changes.prezzo_non_socio.flatten())?;

        let model = PozzoRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))?;
        let updated = PozzoRepository::update(&self.db, model, changes).await?;
        Ok(updated.into())
    }

    pub async fn remove(&self, id: &str) -> AppResult<()> {
        if PozzoRepository::delete(&self.db, id).await? == 0 {
            return Err(AppError::not_found(ENTITY, id));
        }
        info!("Pozzo eliminato [{}]", id);
        Ok(())
    }
}
