use log::{info, warn};
use std::{collections::HashSet, env, fmt::Display, str::FromStr};

const DEFAULT_DATABASE_URL: &str = "sqlite://pozzi.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    /// Email (minuscole, senza duplicati) abilitate all'accesso con la password mensile.
    pub authorized_emails: Vec<String>,
    pub bcrypt_cost: u32,
}

impl Config {
    /// Legge `.env` (se presente) e poi l'ambiente del processo.
    pub fn load() -> Self {
        match dotenv::dotenv() {
            Ok(path) => info!("✓ Caricato file .env: {}", path.display()),
            Err(_) => info!("Nessun file .env, uso le variabili di sistema"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let authorized_emails = parse_email_list(lookup("AUTHORIZED_EMAILS").as_deref());
        if authorized_emails.is_empty() {
            warn!("AUTHORIZED_EMAILS vuota: nessun utente potrà accedere");
        }

        let bcrypt_cost = try_load(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST);
        let bcrypt_cost = if (4..=31).contains(&bcrypt_cost) {
            bcrypt_cost
        } else {
            warn!("BCRYPT_COST={bcrypt_cost} fuori intervallo 4..=31, uso il default");
            bcrypt::DEFAULT_COST
        };

        Self {
            database_url: lookup("DATABASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", 10u32).max(1),
            authorized_emails,
            bcrypt_cost,
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        None => {
            info!("{key} non impostata, uso il default: {default}");
            default
        }
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Valore {key} non valido ({e}), uso il default: {default}");
            default
        }),
    }
}

fn parse_email_list(raw: Option<&str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(cfg.authorized_emails.is_empty());
    }

    #[test]
    fn email_list_is_trimmed_and_lowercased() {
        let cfg = config_from(&[("AUTHORIZED_EMAILS", " Mario@Example.com, ,anna@example.com ")]);
        assert_eq!(
            cfg.authorized_emails,
            vec!["mario@example.com".to_string(), "anna@example.com".to_string()]
        );
    }

    #[test]
    fn email_list_drops_non_adjacent_duplicates_keeping_order() {
        let cfg = config_from(&[(
            "AUTHORIZED_EMAILS",
            "mario@example.com,anna@example.com,MARIO@example.com, anna@example.com",
        )]);
        assert_eq!(
            cfg.authorized_emails,
            vec!["mario@example.com".to_string(), "anna@example.com".to_string()]
        );
    }

    #[test]
    fn malformed_numbers_fall_back_to_defaults() {
        let cfg = config_from(&[("BCRYPT_COST", "tanto"), ("DB_MAX_CONNECTIONS", "0")]);
        assert_eq!(cfg.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(cfg.max_connections, 1);

        let cfg = config_from(&[("BCRYPT_COST", "99")]);
        assert_eq!(cfg.bcrypt_cost, bcrypt::DEFAULT_COST);
    }
}
