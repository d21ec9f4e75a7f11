use crate::auth::AuthService;
use crate::commands::render;
use crate::error::AppError;
use chrono::Utc;
use serde_json::{json, Value};

const GENERATED_BY: [&str; 3] = ["auto", "manual", "admin"];

pub async fn init(service: &AuthService) -> anyhow::Result<Value> {
    let users = service.initialize_authorized_users().await?;
    Ok(json!({ "success": true, "users": users }))
}

pub async fn generate(service: &AuthService, generated_by: &str) -> anyhow::Result<Value> {
    if !GENERATED_BY.contains(&generated_by) {
        return Err(AppError::validation(format!(
            "generatedBy deve essere uno tra {:?}",
            GENERATED_BY
        ))
        .into());
    }
    render(service.generate_monthly_password(generated_by, Utc::now()).await?)
}

pub async fn validate(service: &AuthService, email: &str, password: &str) -> anyhow::Result<Value> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let outcome = service
        .validate_password(email, password, None, Some(user_agent), Utc::now())
        .await?;
    render(outcome)
}
