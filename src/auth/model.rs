use crate::storage::repository::PasswordInfo;
use serde::Serialize;
use std::fmt;

/// Motivo del rifiuto di un accesso. Verificati nell'ordine di dichiarazione.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    EmailNotAuthorized,
    NoActivePassword,
    PasswordExpired,
    WrongPassword,
}

impl FailureReason {
    /// Testo salvato nel log degli accessi.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailNotAuthorized => "Email non autorizzata",
            Self::NoActivePassword => "Nessuna password attiva",
            Self::PasswordExpired => "Password scaduta",
            Self::WrongPassword => "Password errata",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LoginOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
}

impl LoginOutcome {
    pub fn accepted() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub fn refused(reason: FailureReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

/// Restituita una sola volta alla generazione; il testo in chiaro non viene salvato.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPassword {
    pub password: String,
    #[serde(flatten)]
    pub info: PasswordInfo,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthStats {
    pub total_logins: u64,
    pub successful_logins: u64,
    pub failed_logins: u64,
    pub today_logins: u64,
    pub week_logins: u64,
    pub month_logins: u64,
    pub unique_users: u64,
}
