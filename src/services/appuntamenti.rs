use crate::error::{AppError, AppResult};
use crate::storage::repository::{
    AppuntamentoDto, AppuntamentoFilter, AppuntamentoRepository, ClienteRepository,
    CreateAppuntamento, PozzoRepository, StatoAppuntamento, UpdateAppuntamento,
};
use chrono::{DateTime, Datelike, Duration, Utc};
use log::info;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;

const ENTITY: &str = "Appuntamento";

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct AppuntamentiStats {
    pub totale: u64,
    pub programmati: u64,
    pub completati: u64,
    pub annullati: u64,
    pub oggi: u64,
    pub settimana: u64,
}

pub struct AppuntamentiService {
    db: Arc<DatabaseConnection>,
}

impl AppuntamentiService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, def: CreateAppuntamento) -> AppResult<AppuntamentoDto> {
        self.ensure_refs(Some(&def.cliente_id), Some(&def.pozzo_id))
            .await?;
        let model = AppuntamentoRepository::insert(&self.db, def).await?;
        info!(
            "✓ Appuntamento {} creato per {}",
            model.tipo,
            model.data_ora.format("%Y-%m-%d %H:%M")
        );
        Ok(model.into())
    }

    pub async fn find_all(&self, filter: &AppuntamentoFilter) -> AppResult<Vec<AppuntamentoDto>> {
        if let (Some(dal), Some(al)) = (filter.dal, filter.al) {
            if dal > al {
                return Err(AppError::validation("intervallo date non valido: dal > al"));
            }
        }
        let models = AppuntamentoRepository::find_filtered(&self.db, filter).await?;
        Ok(models.into_iter().map(AppuntamentoDto::from).collect())
    }

    pub async fn find_one(&self, id: &str) -> AppResult<AppuntamentoDto> {
        AppuntamentoRepository::find_by_id(&self.db, id)
            .await?
            .map(AppuntamentoDto::from)
            .ok_or_else(|| AppError::not_found(ENTITY, id))
    }

    pub async fn update(
        &self,
        id: &str,
        changes: UpdateAppuntamento,
    ) -> AppResult<AppuntamentoDto> {
        let model = AppuntamentoRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))?;
        self.ensure_refs(changes.cliente_id.as_deref(), changes.pozzo_id.as_deref())
            .await?;
        let updated = AppuntamentoRepository::update(&self.db, model, changes).await?;
        Ok(updated.into())
    }

    pub async fn remove(&self, id: &str) -> AppResult<()> {
        if AppuntamentoRepository::delete(&self.db, id).await? == 0 {
            return Err(AppError::not_found(ENTITY, id));
        }
        info!("Appuntamento eliminato [{}]", id);
        Ok(())
    }

    /// Conteggi per stato più gli appuntamenti di oggi e della settimana (domenica-sabato, UTC).
    pub async fn stats(&self, now: DateTime<Utc>) -> AppResult<AppuntamentiStats> {
        let db = self.db.as_ref();
        let (oggi_inizio, settimana_inizio) = day_and_week_start(now);
        let domani = oggi_inizio + Duration::days(1);
        let settimana_fine = settimana_inizio + Duration::days(7);

        let (totale, programmati, completati, annullati, oggi, settimana) = futures::try_join!(
            AppuntamentoRepository::count(db),
            AppuntamentoRepository::count_by_stato(db, StatoAppuntamento::Programmato),
            AppuntamentoRepository::count_by_stato(db, StatoAppuntamento::Completato),
            AppuntamentoRepository::count_by_stato(db, StatoAppuntamento::Annullato),
            AppuntamentoRepository::count_between(db, oggi_inizio, domani),
            AppuntamentoRepository::count_between(db, settimana_inizio, settimana_fine),
        )?;

        Ok(AppuntamentiStats {
            totale,
            programmati,
            completati,
            annullati,
            oggi,
            settimana,
        })
    }

    async fn ensure_refs(&self, cliente_id: Option<&str>, pozzo_id: Option<&str>) -> AppResult<()> {
        if let Some(id) = cliente_id {
            if ClienteRepository::find_by_id(&self.db, id).await?.is_none() {
                return Err(AppError::not_found("Cliente", id));
            }
        }
        if let Some(id) = pozzo_id {
            if PozzoRepository::find_by_id(&self.db, id).await?.is_none() {
                return Err(AppError::not_found("Pozzo", id));
            }
        }
        Ok(())
    }
}

fn day_and_week_start(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let oggi = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now);
    let back = i64::from(now.weekday().num_days_from_sunday());
    (oggi, oggi - Duration::days(back))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{cliente, pozzo};
    use crate::services::{ClientiService, PozziService};
    use crate::storage::connection::memory_db;
    use crate::storage::repository::appuntamento_repo::TipoAppuntamento;
    use chrono::TimeZone;

    async fn seed() -> (AppuntamentiService, String, String) {
        let db = memory_db().await;
        let p = PozziService::new(db.clone())
            .create(pozzo("Nord"))
            .await
            .unwrap();
        let c = ClientiService::new(db.clone())
            .create(cliente("Mario", "Rossi", vec![p.id.clone()]))
            .await
            .unwrap();
        (AppuntamentiService::new(db), c.id, p.id)
    }

    fn at(cliente_id: &str, pozzo_id: &str, data_ora: DateTime<Utc>) -> CreateAppuntamento {
        CreateAppuntamento {
            cliente_id: cliente_id.to_string(),
            pozzo_id: pozzo_id.to_string(),
            data_ora,
            tipo: TipoAppuntamento::default(),
            stato: StatoAppuntamento::default(),
            descrizione: Some("Consegna 30 mc".to_string()),
            note: None,
            notifica_reminder: false,
        }
    }

    #[test]
    fn week_starts_on_sunday() {
        // mercoledì 15 maggio 2024
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 17, 45, 0).unwrap();
        let (oggi, settimana) = day_and_week_start(now);
        assert_eq!(oggi, Utc.with_ymd_and_hms(2024, 5, 15, 0, 0, 0).unwrap());
        assert_eq!(settimana, Utc.with_ymd_and_hms(2024, 5, 12, 0, 0, 0).unwrap());

        let sunday = Utc.with_ymd_and_hms(2024, 5, 12, 9, 0, 0).unwrap();
        assert_eq!(day_and_week_start(sunday).1, Utc.with_ymd_and_hms(2024, 5, 12, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn stats_count_states_today_and_week() {
        let (service, c, p) = seed().await;
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();

        service
            .create(at(&c, &p, Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap()))
            .await
            .unwrap();
        let lunedi = service
            .create(at(&c, &p, Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap()))
            .await
            .unwrap();
        service
            .create(at(&c, &p, Utc.with_ymd_and_hms(2024, 5, 20, 9, 0, 0).unwrap()))
            .await
            .unwrap();
        service
            .update(
                &lunedi.id,
                UpdateAppuntamento {
                    stato: Some(StatoAppuntamento::Completato),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let stats = service.stats(now).await.unwrap();
        assert_eq!(
            stats,
            AppuntamentiStats {
                totale: 3,
                programmati: 2,
                completati: 1,
                annullati: 0,
                oggi: 1,
                settimana: 2,
            }
        );
    }

    #[tokio::test]
    async fn filters_by_state_and_inclusive_range() {
        let (service, c, p) = seed().await;
        for day in [1, 10, 20] {
            service
                .create(at(&c, &p, Utc.with_ymd_and_hms(2024, 6, day, 8, 0, 0).unwrap()))
                .await
                .unwrap();
        }

        let filter = AppuntamentoFilter {
            dal: Some(Utc.with_ymd_and_hms(2024, 6, 10, 8, 0, 0).unwrap()),
            al: Some(Utc.with_ymd_and_hms(2024, 6, 20, 8, 0, 0).unwrap()),
            ..Default::default()
        };
        let found = service.find_all(&filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found[0].data_ora > found[1].data_ora);

        let annullati = AppuntamentoFilter {
            stato: Some(StatoAppuntamento::Annullato),
            ..Default::default()
        };
        assert!(service.find_all(&annullati).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_requires_existing_pozzo() {
        let (service, c, _) = seed().await;
        let err = service.create(at(&c, "nessuno", Utc::now())).await;
        assert!(matches!(err, Err(AppError::NotFound { entity: "Pozzo", .. })));
    }
}
