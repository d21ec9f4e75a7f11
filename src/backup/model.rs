use crate::storage::flexible_datetime;
use crate::storage::repository::{BollaDto, ClienteDto, PozzoDto};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BACKUP_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Snapshot {
    pub version: String,
    #[serde(with = "flexible_datetime")]
    pub timestamp: DateTime<Utc>,
    pub data: SnapshotData,
    pub stats: CollectionCounts,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SnapshotData {
    pub pozzi: Vec<PozzoDto>,
    pub clienti: Vec<ClienteDto>,
    pub bolle: Vec<BollaDto>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionCounts {
    pub pozzi: u64,
    pub clienti: u64,
    pub bolle: u64,
}

/// Riferimento che non è stato possibile riportare durante l'importazione.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "tipo", rename_all = "camelCase")]
pub enum ImportWarning {
    /// Un cliente elencava un pozzo assente dallo snapshot; la voce è stata scartata.
    #[serde(rename_all = "camelCase")]
    PozzoNonTrovato { cliente: String, pozzo_id: String },
    /// Una bolla puntava a un cliente o pozzo mancante e non è stata importata.
    #[serde(rename_all = "camelCase")]
    BollaSaltata {
        numero_bolla: String,
        cliente_id: String,
        pozzo_id: String,
    },
}

impl fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PozzoNonTrovato { cliente, pozzo_id } => {
                write!(f, "Pozzo {pozzo_id} non trovato per cliente {cliente}")
            }
            Self::BollaSaltata {
                numero_bolla,
                cliente_id,
                pozzo_id,
            } => write!(
                f,
                "Riferimenti non validi per bolla {numero_bolla} (cliente {cliente_id}, pozzo {pozzo_id}), saltata"
            ),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub stats: CollectionCounts,
    pub warnings: Vec<ImportWarning>,
}

#[derive(Debug, Serialize, Clone)]
pub struct ClearReport {
    pub success: bool,
    pub message: String,
    pub stats: CollectionCounts,
}
