use crate::error::{AppError, AppResult};
use crate::services::validation::{optional_email, optional_text, require_text};
use crate::storage::repository::{
    AppuntamentoRepository, BollaRepository, ClienteDto, ClienteRepository, CreateCliente,
    UpdateCliente,
};
use log::{info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

const ENTITY: &str = "Cliente";

pub struct ClientiService {
    db: Arc<DatabaseConnection>,
}

impl ClientiService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, def: CreateCliente) -> AppResult<ClienteDto> {
        require_text("nome", &def.nome)?;
        require_text("cognome", &def.cognome)?;
        optional_email(def.email.as_deref())?;

        let model = ClienteRepository::insert(&self.db, def).await?;
        info!(
            "✓ Cliente creato [{}]: {} {}",
            model.id, model.nome, model.cognome
        );
        Ok(model.into())
    }

    pub async fn find_all(&self) -> AppResult<Vec<ClienteDto>> {
        let models = ClienteRepository::find_all(&self.db).await?;
        Ok(models.into_iter().map(ClienteDto::from).collect())
    }

    pub async fn find_one(&self, id: &str) -> AppResult<ClienteDto> {
        ClienteRepository::find_by_id(&self.db, id)
            .await?
            .map(ClienteDto::from)
            .ok_or_else(|| AppError::not_found(ENTITY, id))
    }

    /// Clienti che hanno `pozzo_id` tra i propri pozzi.
    pub async fn find_by_pozzo(&self, pozzo_id: &str) -> AppResult<Vec<ClienteDto>> {
        let models = ClienteRepository::find_by_pozzo(&self.db, pozzo_id).await?;
        Ok(models.into_iter().map(ClienteDto::from).collect())
    }

    pub async fn update(&self, id: &str, changes: UpdateCliente) -> AppResult<ClienteDto> {
        optional_text("nome", changes.nome.as_deref())?;
        optional_text("cognome", changes.cognome.as_deref())?;
        optional_email(changes.email.as_ref().and_then(Option::as_deref))?;

        let model = ClienteRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))?;
        let updated = ClienteRepository::update(&self.db, model, changes).await?;
        Ok(updated.into())
    }

    /// Elimina il cliente solo se nessuna bolla o appuntamento lo riferisce ancora.
    pub async fn remove(&self, id: &str) -> AppResult<()> {
        let cliente = ClienteRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))?;

        let bolle = BollaRepository::count_by_cliente(&self.db, id).await?;
        let appuntamenti = AppuntamentoRepository::count_by_cliente(&self.db, id).await?;
        if bolle > 0 || appuntamenti > 0 {
            let msg = referenced_message(&cliente.nome, &cliente.cognome, bolle, appuntamenti);
            warn!("⚠ Eliminazione bloccata: {}", msg);
            return Err(AppError::Referenced(msg));
        }

        ClienteRepository::delete(&self.db, id).await?;
        info!("Cliente eliminato [{}]", id);
        Ok(())
    }
}

fn referenced_message(nome: &str, cognome: &str, bolle: u64, appuntamenti: u64) -> String {
    let mut parts = Vec::new();
    if bolle > 0 {
        let label = if bolle == 1 {
            "bolla associata"
        } else {
            "bolle associate"
        };
        parts.push(format!("{bolle} {label}"));
    }
    if appuntamenti > 0 {
        let label = if appuntamenti == 1 {
            "appuntamento associato"
        } else {
            "appuntamenti associati"
        };
        parts.push(format!("{appuntamenti} {label}"));
    }

    let prima = match (bolle, appuntamenti) {
        (b, a) if b > 0 && a > 0 => "le bolle e gli appuntamenti",
        (1, _) => "la bolla",
        (b, _) if b > 0 => "le bolle",
        (_, 1) => "l'appuntamento",
        _ => "gli appuntamenti",
    };

    format!(
        "Impossibile eliminare il cliente {nome} {cognome}: ci sono {}. Elimina prima {prima} per procedere.",
        parts.join(" e ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{bolla, cliente, pozzo};
    use crate::services::{AppuntamentiService, BolleService, PozziService};
    use crate::storage::connection::memory_db;
    use crate::storage::repository::appuntamento_repo::TipoAppuntamento;
    use crate::storage::repository::{CreateAppuntamento, StatoAppuntamento};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn rejects_missing_surname_and_bad_email() {
        let service = ClientiService::new(memory_db().await);
        assert!(matches!(
            service.create(cliente("Mario", "", vec![])).await,
            Err(AppError::Validation(_))
        ));

        let mut def = cliente("Mario", "Rossi", vec![]);
        def.email = Some("mario.rossi".to_string());
        assert!(matches!(service.create(def).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn find_by_pozzo_matches_exact_ids() {
        let db = memory_db().await;
        let pozzi = PozziService::new(db.clone());
        let service = ClientiService::new(db);

        let nord = pozzi.create(pozzo("Nord")).await.unwrap();
        let sud = pozzi.create(pozzo("Sud")).await.unwrap();
        service
            .create(cliente("Mario", "Rossi", vec![nord.id.clone()]))
            .await
            .unwrap();
        service
            .create(cliente("Anna", "Bianchi", vec![nord.id.clone(), sud.id.clone()]))
            .await
            .unwrap();

        let on_nord = service.find_by_pozzo(&nord.id).await.unwrap();
        let cognomi: Vec<_> = on_nord.iter().map(|c| c.cognome.as_str()).collect();
        assert_eq!(cognomi, vec!["Bianchi", "Rossi"]);
        assert_eq!(service.find_by_pozzo(&sud.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_blocked_while_referenced_by_bolle() {
        let db = memory_db().await;
        let pozzi = PozziService::new(db.clone());
        let bolle = BolleService::new(db.clone());
        let service = ClientiService::new(db);

        let p = pozzi.create(pozzo("Nord")).await.unwrap();
        let c = service
            .create(cliente("Mario", "Rossi", vec![p.id.clone()]))
            .await
            .unwrap();
        let b = bolle.create(bolla("1", &c.id, &p.id)).await.unwrap();

        match service.remove(&c.id).await {
            Err(AppError::Referenced(msg)) => {
                assert!(msg.contains("Mario Rossi"));
                assert!(msg.contains("1 bolla associata"));
            }
            other => panic!("expected Referenced, got {other:?}"),
        }

        bolle.remove(&b.id).await.unwrap();
        service.remove(&c.id).await.unwrap();
        assert!(matches!(
            service.find_one(&c.id).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn delete_blocked_while_referenced_by_appuntamento() {
        let db = memory_db().await;
        let pozzi = PozziService::new(db.clone());
        let appuntamenti = AppuntamentiService::new(db.clone());
        let service = ClientiService::new(db);

        let p = pozzi.create(pozzo("Nord")).await.unwrap();
        let c = service
            .create(cliente("Anna", "Bianchi", vec![p.id.clone()]))
            .await
            .unwrap();
        let a = appuntamenti
            .create(CreateAppuntamento {
                cliente_id: c.id.clone(),
                pozzo_id: p.id.clone(),
                data_ora: Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap(),
                tipo: TipoAppuntamento::default(),
                stato: StatoAppuntamento::default(),
                descrizione: None,
                note: None,
                notifica_reminder: false,
            })
            .await
            .unwrap();

        match service.remove(&c.id).await {
            Err(AppError::Referenced(msg)) => {
                assert!(msg.contains("1 appuntamento associato"), "{msg}");
                assert!(!msg.contains("bolla"), "{msg}");
                assert!(msg.contains("Elimina prima l'appuntamento"), "{msg}");
            }
            other => panic!("expected Referenced, got {other:?}"),
        }

        appuntamenti.remove(&a.id).await.unwrap();
        service.remove(&c.id).await.unwrap();
        assert!(matches!(
            service.find_one(&c.id).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[test]
    fn referenced_message_counts_both_kinds() {
        let msg = referenced_message("Anna", "Bianchi", 3, 1);
        assert_eq!(
            msg,
            "Impossibile eliminare il cliente Anna Bianchi: ci sono 3 bolle associate e 1 appuntamento associato. Elimina prima le bolle e gli appuntamenti per procedere."
        );
    }
}
