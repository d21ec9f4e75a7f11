use crate::error::{AppError, AppResult};
use crate::services::validation::{
    optional_non_negative, optional_text, require_non_negative, require_text,
};
use crate::storage::entity::bolla::Model as BollaModel;
use crate::storage::repository::{
    BollaDto, BollaRepository, ClienteDto, ClienteRepository, CreateBolla, PozzoDto,
    PozzoRepository, UpdateBolla,
};
use log::{info, warn};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const ENTITY: &str = "Bolla";

/// Bolla con cliente e pozzo risolti.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BollaDetailed {
    #[serde(flatten)]
    pub bolla: BollaDto,
    pub cliente: Option<ClienteDto>,
    pub pozzo: Option<PozzoDto>,
}

pub struct BolleService {
    db: Arc<DatabaseConnection>,
}

impl BolleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create(&self, def: CreateBolla) -> AppResult<BollaDto> {
        require_text("numeroBolla", &def.numero_bolla)?;
        require_non_negative("ore", def.ore)?;
        require_non_negative("metriCubi", def.metri_cubi)?;
        require_non_negative("acconto", def.acconto)?;
        optional_non_negative("importoTotale", def.importo_totale)?;

        self.ensure_refs(Some(&def.cliente_id), Some(&def.pozzo_id))
            .await?;
        self.ensure_unique(&def.pozzo_id, &def.numero_bolla, None)
            .await?;

        let model = BollaRepository::insert(&self.db, def).await?;
        info!(
            "✓ Bolla {} creata per pozzo {}",
            model.numero_bolla, model.pozzo_id
        );
        Ok(model.into())
    }

    pub async fn find_all(&self) -> AppResult<Vec<BollaDto>> {
        self.find_filtered(None, None).await
    }

    pub async fn find_by_cliente(&self, cliente_id: &str) -> AppResult<Vec<BollaDto>> {
        self.find_filtered(Some(cliente_id), None).await
    }

    pub async fn find_by_pozzo(&self, pozzo_id: &str) -> AppResult<Vec<BollaDto>> {
        self.find_filtered(None, Some(pozzo_id)).await
    }

    pub async fn find_by_cliente_and_pozzo(
        &self,
        cliente_id: &str,
        pozzo_id: &str,
    ) -> AppResult<Vec<BollaDto>> {
        self.find_filtered(Some(cliente_id), Some(pozzo_id)).await
    }

    /// Dalla `data` più recente.
    async fn find_filtered(
        &self,
        cliente_id: Option<&str>,
        pozzo_id: Option<&str>,
    ) -> AppResult<Vec<BollaDto>> {
        let models = BollaRepository::find_filtered(&self.db, cliente_id, pozzo_id).await?;
        Ok(models.into_iter().map(BollaDto::from).collect())
    }

    pub async fn find_one(&self, id: &str) -> AppResult<BollaDto> {
        Ok(self.load(id).await?.into())
    }

    pub async fn find_all_detailed(
        &self,
        cliente_id: Option<&str>,
        pozzo_id: Option<&str>,
    ) -> AppResult<Vec<BollaDetailed>> {
        let models = BollaRepository::find_filtered(&self.db, cliente_id, pozzo_id).await?;
        self.populate(models).await
    }

    pub async fn find_one_detailed(&self, id: &str) -> AppResult<BollaDetailed> {
        let model = self.load(id).await?;
        let mut detailed = self.populate(vec![model]).await?;
        detailed
            .pop()
            .ok_or_else(|| AppError::not_found(ENTITY, id))
    }

    pub async fn update(&self, id: &str, changes: UpdateBolla) -> AppResult<BollaDto> {
        optional_text("numeroBolla", changes.numero_bolla.as_deref())?;
        optional_non_negative("ore", changes.ore)?;
        optional_non_negative("metriCubi", changes.metri_cubi)?;
        optional_non_negative("acconto", changes.acconto)?;
        optional_non_negative("importoTotale", changes.importo_totale.flatten())?;

        let current = self.load(id).await?;
        self.ensure_refs(changes.cliente_id.as_deref(), changes.pozzo_id.as_deref())
            .await?;

        if changes.numero_bolla.is_some() || changes.pozzo_id.is_some() {
            let pozzo_id = changes.pozzo_id.as_deref().unwrap_or(&current.pozzo_id);
            let numero = changes
                .numero_bolla
                .as_deref()
                .unwrap_or(&current.numero_bolla);
            self.ensure_unique(pozzo_id, numero, Some(id)).await?;
        }

        let updated = BollaRepository::update(&self.db, current, changes).await?;
        Ok(updated.into())
    }

    pub async fn remove(&self, id: &str) -> AppResult<()> {
        if BollaRepository::delete(&self.db, id).await? == 0 {
            return Err(AppError::not_found(ENTITY, id));
        }
        info!("Bolla eliminata [{}]", id);
        Ok(())
    }

    /// Prossimo numero libero per un pozzo: il `numeroBolla` numerico più alto + 1.
    pub async fn next_numero(&self, pozzo_id: &str) -> AppResult<String> {
        let numeri = BollaRepository::numeri_by_pozzo(&self.db, pozzo_id).await?;
        Ok(next_numero_from(&numeri))
    }

    async fn load(&self, id: &str) -> AppResult<BollaModel> {
        BollaRepository::find_by_id(&self.db, id)
            .await?
            .ok_or_else(|| AppError::not_found(ENTITY, id))
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

    async fn ensure_unique(
        &self,
        pozzo_id: &str,
        numero_bolla: &str,
        exclude_id: Option<&str>,
    ) -> AppResult<()> {
        let existing =
            BollaRepository::find_by_pozzo_and_numero(&self.db, pozzo_id, numero_bolla, exclude_id)
                .await?;
        if existing.is_some() {
            warn!(
                "⚠ Numero bolla {} già usato nel pozzo {}",
                numero_bolla, pozzo_id
            );
            return Err(AppError::Conflict(format!(
                "Esiste già una bolla con numero {numero_bolla} per questo pozzo"
            )));
        }
        Ok(())
    }

    async fn populate(&self, models: Vec<BollaModel>) -> AppResult<Vec<BollaDetailed>> {
        let cliente_ids: HashSet<String> = models.iter().map(|b| b.cliente_id.clone()).collect();
        let pozzo_ids: HashSet<String> = models.iter().map(|b| b.pozzo_id.clone()).collect();

        let clienti: HashMap<String, ClienteDto> =
            ClienteRepository::find_by_ids(&self.db, cliente_ids.into_iter().collect())
                .await?
                .into_iter()
                .map(|c| (c.id.clone(), ClienteDto::from(c)))
                .collect();
        let pozzi: HashMap<String, PozzoDto> =
            PozzoRepository::find_by_ids(&self.db, pozzo_ids.into_iter().collect())
                .await?
                .into_iter()
                .map(|p| (p.id.clone(), PozzoDto::from(p)))
                .collect();

        Ok(models
            .into_iter()
            .map(|model| BollaDetailed {
                cliente: clienti.get(&model.cliente_id).cloned(),
                pozzo: pozzi.get(&model.pozzo_id).cloned(),
                bolla: model.into(),
            })
            .collect())
    }
}

fn next_numero_from(numeri: &[String]) -> String {
    numeri
        .iter()
        .filter_map(|n| n.trim().parse::<u64>().ok())
        .max()
        .map(|max| (max + 1).to_string())
        .unwrap_or_else(|| "1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::{bolla, cliente, pozzo};
    use crate::services::{ClientiService, PozziService};
    use crate::storage::connection::memory_db;
    use chrono::{TimeZone, Utc};

    struct Seed {
        service: BolleService,
        cliente_id: String,
        nord_id: String,
        sud_id: String,
    }

    async fn seed() -> Seed {
        let db = memory_db().await;
        let pozzi = PozziService::new(db.clone());
        let clienti = ClientiService::new(db.clone());
        let nord = pozzi.create(pozzo("Nord")).await.unwrap();
        let sud = pozzi.create(pozzo("Sud")).await.unwrap();
        let c = clienti
            .create(cliente("Mario", "Rossi", vec![nord.id.clone()]))
            .await
            .unwrap();
        Seed {
            service: BolleService::new(db),
            cliente_id: c.id,
            nord_id: nord.id,
            sud_id: sud.id,
        }
    }

    #[tokio::test]
    async fn numero_is_unique_per_pozzo_only() {
        let s = seed().await;
        s.service
            .create(bolla("7", &s.cliente_id, &s.nord_id))
            .await
            .unwrap();

        let dup = s.service.create(bolla("7", &s.cliente_id, &s.nord_id)).await;
        assert!(matches!(dup, Err(AppError::Conflict(_))));

        s.service
            .create(bolla("7", &s.cliente_id, &s.sud_id))
            .await
            .unwrap();
        assert_eq!(s.service.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_checks_uniqueness_but_excludes_itself() {
        let s = seed().await;
        let first = s
            .service
            .create(bolla("1", &s.cliente_id, &s.nord_id))
            .await
            .unwrap();
        s.service
            .create(bolla("2", &s.cliente_id, &s.nord_id))
            .await
            .unwrap();

        let same = s
            .service
            .update(
                &first.id,
                UpdateBolla {
                    numero_bolla: Some("1".to_string()),
                    saldato: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(same.saldato);

        let clash = s
            .service
            .update(
                &first.id,
                UpdateBolla {
                    numero_bolla: Some("2".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(AppError::Conflict(_))));

        let moved = s
            .service
            .update(
                &first.id,
                UpdateBolla {
                    pozzo_id: Some(s.sud_id.clone()),
                    numero_bolla: Some("2".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.pozzo_id, s.sud_id);
    }

    #[tokio::test]
    async fn create_requires_existing_references() {
        let s = seed().await;
        let err = s
            .service
            .create(bolla("1", "cliente-fantasma", &s.nord_id))
            .await;
        assert!(matches!(err, Err(AppError::NotFound { entity: "Cliente", .. })));

        let mut neg = bolla("1", &s.cliente_id, &s.nord_id);
        neg.metri_cubi = -3.0;
        assert!(matches!(s.service.create(neg).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn lists_newest_first_and_filters() {
        let s = seed().await;
        let mut old = bolla("1", &s.cliente_id, &s.nord_id);
        old.data = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        s.service.create(old).await.unwrap();
        s.service
            .create(bolla("2", &s.cliente_id, &s.nord_id))
            .await
            .unwrap();
        s.service
            .create(bolla("1", &s.cliente_id, &s.sud_id))
            .await
            .unwrap();

        let nord = s.service.find_by_pozzo(&s.nord_id).await.unwrap();
        let numeri: Vec<_> = nord.iter().map(|b| b.numero_bolla.as_str()).collect();
        assert_eq!(numeri, vec!["2", "1"]);
        assert_eq!(
            s.service
                .find_by_cliente_and_pozzo(&s.cliente_id, &s.sud_id)
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(s.service.find_by_cliente(&s.cliente_id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn next_numero_uses_numeric_maximum() {
        let s = seed().await;
        assert_eq!(s.service.next_numero(&s.nord_id).await.unwrap(), "1");

        for numero in ["9", "10", "B-3"] {
            s.service
                .create(bolla(numero, &s.cliente_id, &s.nord_id))
                .await
                .unwrap();
        }
        assert_eq!(s.service.next_numero(&s.nord_id).await.unwrap(), "11");
        assert_eq!(s.service.next_numero(&s.sud_id).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn detailed_view_resolves_cliente_and_pozzo() {
        let s = seed().await;
        let created = s
            .service
            .create(bolla("1", &s.cliente_id, &s.nord_id))
            .await
            .unwrap();

        let detailed = s.service.find_one_detailed(&created.id).await.unwrap();
        assert_eq!(detailed.cliente.map(|c| c.cognome), Some("Rossi".to_string()));
        assert_eq!(detailed.pozzo.map(|p| p.nome), Some("Nord".to_string()));

        let json = serde_json::to_value(
            s.service.find_all_detailed(None, None).await.unwrap(),
        )
        .unwrap();
        assert_eq!(json[0]["numeroBolla"], "1");
        assert_eq!(json[0]["pozzo"]["nome"], "Nord");
    }

    #[test]
    fn next_numero_ignores_non_numeric() {
        assert_eq!(next_numero_from(&[]), "1");
        assert_eq!(next_numero_from(&["A".to_string()]), "1");
        assert_eq!(next_numero_from(&["2".to_string(), " 12 ".to_string()]), "13");
    }
}
