use crate::auth::model::{AuthStats, FailureReason, GeneratedPassword, LoginOutcome};
use crate::config::Config;
use crate::error::AppResult;
use crate::storage::repository::{
    AccessAttempt, AuthLogDto, AuthRepository, AuthUserDto, PasswordInfo,
};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

const MESI: [&str; 12] = [
    "gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic",
];
const SUFFIX_LEN: usize = 8;

pub struct AuthService {
    db: Arc<DatabaseConnection>,
    authorized_emails: Vec<String>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        Self {
            db,
            authorized_emails: config.authorized_emails.clone(),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// Crea la password del mese che contiene `now` e la rende l'unica attiva.
    pub async fn generate_monthly_password(
        &self,
        generated_by: &str,
        now: DateTime<Utc>,
    ) -> AppResult<GeneratedPassword> {
        let (valid_from, valid_until) = month_window(now);
        let password = monthly_password(now);
        let cost = self.bcrypt_cost;
        let plain = password.clone();
        let hash = run_blocking(move || bcrypt::hash(plain, cost)).await?;

        let model = AuthRepository::replace_active_password(
            &self.db,
            hash,
            valid_from.timestamp(),
            valid_until.timestamp(),
            generated_by,
        )
        .await?;
        info!(
            "🔑 Nuova password generata ({}), valida da {} a {}",
            generated_by,
            valid_from.to_rfc3339(),
            valid_until.to_rfc3339()
        );

        Ok(GeneratedPassword {
            password,
            info: model.into(),
        })
    }

    pub async fn current_password(&self, now: DateTime<Utc>) -> AppResult<Option<PasswordInfo>> {
        let current = AuthRepository::find_current(&self.db, now.timestamp()).await?;
        Ok(current.map(PasswordInfo::from))
    }

    /// Verifica un accesso e lo registra nel log qualunque sia l'esito.
    pub async fn validate_password(
        &self,
        email: &str,
        password: &str,
        ip_address: Option<String>,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<LoginOutcome> {
        let email = email.trim().to_lowercase();
        let at = now.timestamp();
        let outcome = self.check(&email, password, at).await?;

        if outcome.valid {
            AuthRepository::record_login(&self.db, &email, at).await?;
            info!("✓ Accesso riuscito: {}", email);
        } else if let Some(reason) = outcome.reason {
            warn!("⚠ Accesso negato per {}: {}", email, reason);
        }

        AuthRepository::insert_log(
            &self.db,
            AccessAttempt {
                email,
                at,
                success: outcome.valid,
                ip_address,
                user_agent,
                failure_reason: outcome.reason.map(|r| r.as_str().to_string()),
            },
        )
        .await?;
        Ok(outcome)
    }

    async fn check(&self, email: &str, password: &str, now: i64) -> AppResult<LoginOutcome> {
        if !self.authorized_emails.iter().any(|e| e == email) {
            return Ok(LoginOutcome::refused(FailureReason::EmailNotAuthorized));
        }

        let Some(current) = AuthRepository::find_current(&self.db, now).await? else {
            // distingue una password del mese scorso da nessuna password
            let reason = match AuthRepository::find_latest_active(&self.db).await? {
                Some(latest) if latest.valid_until <= now => FailureReason::PasswordExpired,
                _ => FailureReason::NoActivePassword,
            };
            return Ok(LoginOutcome::refused(reason));
        };

        let plain = password.to_string();
        let hash = current.password_hash;
        if !run_blocking(move || bcrypt::verify(plain, &hash)).await? {
            return Ok(LoginOutcome::refused(FailureReason::WrongPassword));
        }
        Ok(LoginOutcome::accepted())
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> AppResult<AuthStats> {
        let db = self.db.as_ref();
        let today = day_start(now).timestamp();
        let week = (now - Duration::days(7)).timestamp();
        let month = month_window(now).0.timestamp();

        let (total, successful, failed, today_logins, week_logins, month_logins, users) = futures::try_join!(
            AuthRepository::count_logs(db, None, None),
            AuthRepository::count_logs(db, Some(true), None),
            AuthRepository::count_logs(db, Some(false), None),
            AuthRepository::count_logs(db, None, Some(today)),
            AuthRepository::count_logs(db, None, Some(week)),
            AuthRepository::count_logs(db, None, Some(month)),
            AuthRepository::count_active_users(db),
        )?;

        Ok(AuthStats {
            total_logins: total,
            successful_logins: successful,
            failed_logins: failed,
            today_logins,
            week_logins,
            month_logins,
            unique_users: users,
        })
    }

    pub async fn recent_logs(&self, limit: u64) -> AppResult<Vec<AuthLogDto>> {
        let logs = AuthRepository::recent_logs(&self.db, limit).await?;
        Ok(logs.into_iter().map(AuthLogDto::from).collect())
    }

    pub async fn authorized_users(&self) -> AppResult<Vec<AuthUserDto>> {
        let users = AuthRepository::list_users(&self.db).await?;
        Ok(users.into_iter().map(AuthUserDto::from).collect())
    }

    /// Garantisce una riga utente per ogni email autorizzata. Le righe esistenti restano invariate.
    pub async fn initialize_authorized_users(&self) -> AppResult<usize> {
        for email in &self.authorized_emails {
            AuthRepository::ensure_user(&self.db, email).await?;
        }
        info!(
            "✓ Utenti autorizzati inizializzati: {}",
            self.authorized_emails.len()
        );
        Ok(self.authorized_emails.len())
    }
}

fn monthly_password(now: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("pozzi-{}-{}-{}", MESI[now.month0() as usize], now.year(), suffix)
}

/// bcrypt è CPU-bound: gira sul pool bloccante di tokio, non sui worker async.
async fn run_blocking<T, F>(f: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, bcrypt::BcryptError> + Send + 'static,
    T: Send + 'static,
{
    Ok(tokio::task::spawn_blocking(f).await??)
}

/// `[primo giorno del mese, primo giorno del mese successivo)` in UTC.
fn month_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let (next_year, next_month) = if now.month() == 12 {
        (now.year() + 1, 1)
    } else {
        (now.year(), now.month() + 1)
    };
    let start = Utc
        .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (start, end)
}

fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}
