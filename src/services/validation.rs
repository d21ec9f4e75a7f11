use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

pub fn require_text(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} non può essere vuoto")));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: f64) -> AppResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!(
            "{field} deve essere un numero >= 0 (ricevuto {value})"
        )));
    }
    Ok(())
}

pub fn optional_non_negative(field: &str, value: Option<f64>) -> AppResult<()> {
    match value {
        Some(v) => require_non_negative(field, v),
        None => Ok(()),
    }
}

pub fn optional_text(field: &str, value: Option<&str>) -> AppResult<()> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

pub fn optional_email(value: Option<&str>) -> AppResult<()> {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    let re = EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
    });
    match value {
        Some(v) if !re.is_match(v.trim()) => {
            Err(AppError::validation(format!("email non valida: {v}")))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_text_and_negative_amounts() {
        assert!(require_text("nome", "  ").is_err());
        assert!(require_text("nome", "Pozzo Nord").is_ok());
        assert!(require_non_negative("ore", -0.5).is_err());
        assert!(require_non_negative("ore", f64::NAN).is_err());
        assert!(optional_non_negative("importoTotale", None).is_ok());
    }

    #[test]
    fn email_format() {
        assert!(optional_email(Some("mario.rossi@example.it")).is_ok());
        assert!(optional_email(Some("mario.rossi")).is_err());
        assert!(optional_email(None).is_ok());
    }
}
