use crate::backup::BackupService;
use crate::commands::render;
use crate::error::AppError;
use anyhow::Context;
use log::info;
use serde_json::{json, Value};

/// Stampa lo snapshot, oppure lo scrive in `file` e stampa un riepilogo.
pub async fn export(service: &BackupService, file: Option<&str>) -> anyhow::Result<Value> {
    let snapshot = service.export().await?;
    let Some(path) = file else {
        return render(&snapshot);
    };

    let bytes = serde_json::to_vec_pretty(&snapshot)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("impossibile scrivere il backup in {path}"))?;
    info!("✓ Backup salvato in {}", path);
    Ok(json!({ "success": true, "file": path, "stats": snapshot.stats }))
}

pub async fn import(service: &BackupService, file: &str) -> anyhow::Result<Value> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("impossibile leggere il backup {file}"))?;
    let snapshot: Value = serde_json::from_str(&raw)
        .map_err(|e| AppError::validation(format!("{file}: JSON non valido: {e}")))?;
    render(service.import(&snapshot).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures::pozzo;
    use crate::services::PozziService;
    use crate::storage::connection::memory_db;

    #[tokio::test]
    async fn export_to_file_then_import_it() {
        let db = memory_db().await;
        PozziService::new(db.clone())
            .create(pozzo("Nord"))
            .await
            .unwrap();
        let service = BackupService::new(db);

        let path = std::env::temp_dir().join(format!("pozzi-backup-{}.json", uuid::Uuid::new_v4()));
        let path_str = path.to_string_lossy().to_string();

        let summary = export(&service, Some(&path_str)).await.unwrap();
        assert_eq!(summary["stats"]["pozzi"], 1);

        let report = import(&service, &path_str).await.unwrap();
        assert_eq!(report["success"], true);
        assert_eq!(report["stats"]["pozzi"], 1);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let service = BackupService::new(memory_db().await);
        assert!(import(&service, "/nonexistent/backup.json").await.is_err());
    }
}
