use crate::backup::decode::{DecodedSnapshot, PendingBolla, PendingCliente, PendingPozzo};
use crate::backup::model::{
    ClearReport, CollectionCounts, ImportReport, ImportWarning, Snapshot, SnapshotData,
    BACKUP_VERSION,
};
use crate::error::AppResult;
use crate::storage::repository::{
    BollaDto, BollaRepository, ClienteDto, ClienteRepository, PozzoDto, PozzoRepository,
};
use chrono::Utc;
use log::{error, info, warn};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub struct BackupService {
    db: Arc<DatabaseConnection>,
}

impl BackupService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Legge tutti i pozzi, i clienti e le bolle in un unico snapshot.
    pub async fn export(&self) -> AppResult<Snapshot> {
        info!("📦 Esportazione backup in corso...");
        let db = self.db.as_ref();
        let (pozzi, clienti, bolle) = futures::try_join!(
            PozzoRepository::find_all(db),
            ClienteRepository::find_all(db),
            BollaRepository::find_filtered(db, None, None),
        )?;

        let data = SnapshotData {
            pozzi: pozzi.into_iter().map(PozzoDto::from).collect(),
            clienti: clienti.into_iter().map(ClienteDto::from).collect(),
            bolle: bolle.into_iter().map(BollaDto::from).collect(),
        };
        let stats = CollectionCounts {
            pozzi: data.pozzi.len() as u64,
            clienti: data.clienti.len() as u64,
            bolle: data.bolle.len() as u64,
        };
        info!(
            "✓ Backup creato: {} pozzi, {} clienti, {} bolle",
            stats.pozzi, stats.clienti, stats.bolle
        );

        Ok(Snapshot {
            version: BACKUP_VERSION.to_string(),
            timestamp: Utc::now(),
            data,
            stats,
        })
    }

    /// Sostituisce pozzi, clienti e bolle con il contenuto dello snapshot.
    ///
    /// I record ricevono id nuovi; i riferimenti passano per mappe vecchio id → nuovo id
    /// costruite passo dopo passo. Lo snapshot viene decodificato per intero prima di
    /// scrivere, quindi uno malformato lascia il database intatto. Un errore successivo
    /// svuota le tre collezioni e restituisce l'errore originale.
    pub async fn import(&self, raw: &Value) -> AppResult<ImportReport> {
        let decoded = DecodedSnapshot::from_value(raw)?;
        info!(
            "🔄 Inizio importazione backup: {} pozzi, {} clienti, {} bolle",
            decoded.pozzi.len(),
            decoded.clienti.len(),
            decoded.bolle.len()
        );

        match self.replace_all(decoded).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!("✗ Errore durante l'importazione: {}", e);
                warn!("⚠ Tentativo di rollback...");
                if let Err(clear_err) = self.clear_all().await {
                    error!("✗ Rollback fallito: {}", clear_err);
                }
                Err(e)
            }
        }
    }

    /// Elimina tutte le bolle, i clienti e i pozzi, in quest'ordine.
    pub async fn clear_all(&self) -> AppResult<ClearReport> {
        info!("🗑 Cancellazione di tutti i dati...");
        let bolle = BollaRepository::delete_all(&self.db).await?;
        let clienti = ClienteRepository::delete_all(&self.db).await?;
        let pozzi = PozzoRepository::delete_all(&self.db).await?;

        let stats = CollectionCounts {
            pozzi,
            clienti,
            bolle,
        };
        info!(
            "✓ Dati cancellati: {} bolle, {} clienti, {} pozzi",
            bolle, clienti, pozzi
        );
        Ok(ClearReport {
            success: true,
            message: "Tutti i dati sono stati eliminati".to_string(),
            stats,
        })
    }

    async fn replace_all(&self, decoded: DecodedSnapshot) -> AppResult<ImportReport> {
        self.clear_all().await?;

        let mut warnings = Vec::new();
        let (pozzi_map, pozzi) = self.import_pozzi(decoded.pozzi).await?;
        let (clienti_map, clienti) = self
            .import_clienti(decoded.clienti, &pozzi_map, &mut warnings)
            .await?;
        let bolle = self
            .import_bolle(decoded.bolle, &clienti_map, &pozzi_map, &mut warnings)
            .await?;

        let stats = CollectionCounts {
            pozzi,
            clienti,
            bolle,
        };
        info!(
            "🎉 Importazione completata: {} pozzi, {} clienti, {} bolle ({} avvisi)",
            stats.pozzi,
            stats.clienti,
            stats.bolle,
            warnings.len()
        );

        Ok(ImportReport {
            success: true,
            message: "Backup importato con successo".to_string(),
            stats,
            warnings,
        })
    }

    /// Un `_id` ripetuto punta all'ultimo record inserito, ma ogni riga conta.
    async fn import_pozzi(
        &self,
        pozzi: Vec<PendingPozzo>,
    ) -> AppResult<(HashMap<String, String>, u64)> {
        let mut map = HashMap::with_capacity(pozzi.len());
        let mut imported = 0u64;
        for pending in pozzi {
            let model = PozzoRepository::insert(&self.db, pending.def).await?;
            map.insert(pending.old_id, model.id);
            imported += 1;
        }
        info!("✓ {} pozzi importati", imported);
        Ok((map, imported))
    }

    async fn import_clienti(
        &self,
        clienti: Vec<PendingCliente>,
        pozzi_map: &HashMap<String, String>,
        warnings: &mut Vec<ImportWarning>,
    ) -> AppResult<(HashMap<String, String>, u64)> {
        let mut map = HashMap::with_capacity(clienti.len());
        let mut imported = 0u64;
        for pending in clienti {
            let mut def = pending.def;
            def.pozzi_ids = pending
                .old_pozzi_ids
                .into_iter()
                .filter_map(|old| match pozzi_map.get(&old) {
                    Some(new_id) => Some(new_id.clone()),
                    None => {
                        let warning = ImportWarning::PozzoNonTrovato {
                            cliente: format!("{} {}", def.nome, def.cognome),
                            pozzo_id: old,
                        };
                        warn!("⚠ {}", warning);
                        warnings.push(warning);
                        None
                    }
                })
                .collect();

            let model = ClienteRepository::insert(&self.db, def).await?;
            map.insert(pending.old_id, model.id);
            imported += 1;
        }
        info!("✓ {} clienti importati", imported);
        Ok((map, imported))
    }

    async fn import_bolle(
        &self,
        bolle: Vec<PendingBolla>,
        clienti_map: &HashMap<String, String>,
        pozzi_map: &HashMap<String, String>,
        warnings: &mut Vec<ImportWarning>,
    ) -> AppResult<u64> {
        let mut imported = 0u64;
        for pending in bolle {
            let (Some(cliente_id), Some(pozzo_id)) = (
                clienti_map.get(&pending.old_cliente_id),
                pozzi_map.get(&pending.old_pozzo_id),
            ) else {
                let warning = ImportWarning::BollaSaltata {
                    numero_bolla: pending.def.numero_bolla,
                    cliente_id: pending.old_cliente_id,
                    pozzo_id: pending.old_pozzo_id,
                };
                warn!("⚠ {}", warning);
                warnings.push(warning);
                continue;
            };

            let mut def = pending.def;
            def.cliente_id = cliente_id.clone();
            def.pozzo_id = pozzo_id.clone();
            BollaRepository::insert(&self.db, def).await?;
            imported += 1;
        }
        info!("✓ {} bolle importate", imported);
        Ok(imported)
    }
}
