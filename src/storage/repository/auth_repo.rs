use crate::storage::entity::auth_log::{
    self, ActiveModel as AuthLogActiveModel, Entity as AuthLog, Model as AuthLogModel,
};
use crate::storage::entity::auth_password::{
    self, ActiveModel as AuthPasswordActiveModel, Entity as AuthPassword,
    Model as AuthPasswordModel,
};
use crate::storage::entity::auth_user::{
    self, ActiveModel as AuthUserActiveModel, Entity as AuthUser, Model as AuthUserModel,
};
use crate::storage::{flexible_datetime, to_datetime};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PasswordInfo {
    pub id: i32,
    #[serde(with = "flexible_datetime")]
    pub valid_from: DateTime<Utc>,
    #[serde(with = "flexible_datetime")]
    pub valid_until: DateTime<Utc>,
    pub is_active: bool,
    pub generated_by: String,
}

impl From<AuthPasswordModel> for PasswordInfo {
    fn from(model: AuthPasswordModel) -> Self {
        Self {
            id: model.id,
            valid_from: to_datetime(model.valid_from),
            valid_until: to_datetime(model.valid_until),
            is_active: model.is_active,
            generated_by: model.generated_by,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthLogDto {
    pub id: i32,
    pub email: String,
    pub success: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub failure_reason: Option<String>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
}

impl From<AuthLogModel> for AuthLogDto {
    fn from(model: AuthLogModel) -> Self {
        Self {
            id: model.id,
            email: model.email,
            success: model.success,
            ip_address: model.ip_address,
            user_agent: model.user_agent,
            failure_reason: model.failure_reason,
            created_at: to_datetime(model.created_at),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthUserDto {
    pub email: String,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub login_count: i32,
    pub notes: Option<String>,
}

impl From<AuthUserModel> for AuthUserDto {
    fn from(model: AuthUserModel) -> Self {
        Self {
            email: model.email,
            is_active: model.is_active,
            last_login_at: model.last_login_at.map(to_datetime),
            login_count: model.login_count,
            notes: model.notes,
        }
    }
}

/// Riga da aggiungere al log degli accessi.
#[derive(Debug, Clone)]
pub struct AccessAttempt {
    pub email: String,
    pub at: i64,
    pub success: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub failure_reason: Option<String>,
}

pub struct AuthRepository;

impl AuthRepository {
    /// Disattiva tutte le password salvate e inserisce la nuova come unica attiva.
    pub async fn replace_active_password(
        db: &DatabaseConnection,
        password_hash: String,
        valid_from: i64,
        valid_until: i64,
        generated_by: &str,
    ) -> Result<AuthPasswordModel, sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        AuthPassword::update_many()
            .col_expr(auth_password::Column::IsActive, Expr::value(false))
            .col_expr(auth_password::Column::UpdatedAt, Expr::value(now))
            .filter(auth_password::Column::IsActive.eq(true))
            .exec(db)
            .await?;

        let active_model = AuthPasswordActiveModel {
            id: NotSet,
            password_hash: Set(password_hash),
            valid_from: Set(valid_from),
            valid_until: Set(valid_until),
            is_active: Set(true),
            generated_by: Set(generated_by.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active_model.insert(db).await
    }

    /// Password attiva più recente il cui periodo contiene `now`.
    pub async fn find_current(
        db: &DatabaseConnection,
        now: i64,
    ) -> Result<Option<AuthPasswordModel>, sea_orm::DbErr> {
        AuthPassword::find()
            .filter(auth_password::Column::IsActive.eq(true))
            .filter(auth_password::Column::ValidFrom.lte(now))
            .filter(auth_password::Column::ValidUntil.gt(now))
            .order_by_desc(auth_password::Column::ValidFrom)
            .one(db)
            .await
    }

    /// Password attiva più recente, qualunque sia il suo periodo.
    pub async fn find_latest_active(
        db: &DatabaseConnection,
    ) -> Result<Option<AuthPasswordModel>, sea_orm::DbErr> {
        AuthPassword::find()
            .filter(auth_password::Column::IsActive.eq(true))
            .order_by_desc(auth_password::Column::ValidFrom)
            .order_by_desc(auth_password::Column::Id)
            .one(db)
            .await
    }

    #[cfg(test)]
    pub async fn count_active_passwords(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        AuthPassword::find()
            .filter(auth_password::Column::IsActive.eq(true))
            .count(db)
            .await
    }

    pub async fn insert_log(
        db: &DatabaseConnection,
        attempt: AccessAttempt,
    ) -> Result<(), sea_orm::DbErr> {
        let active_model = AuthLogActiveModel {
            id: NotSet,
            email: Set(attempt.email),
            success: Set(attempt.success),
            ip_address: Set(attempt.ip_address),
            user_agent: Set(attempt.user_agent),
            failure_reason: Set(attempt.failure_reason),
            created_at: Set(attempt.at),
        };
        active_model.insert(db).await?;
        Ok(())
    }

    pub async fn recent_logs(
        db: &DatabaseConnection,
        limit: u64,
    ) -> Result<Vec<AuthLogModel>, sea_orm::DbErr> {
        AuthLog::find()
            .order_by_desc(auth_log::Column::CreatedAt)
            .order_by_desc(auth_log::Column::Id)
            .limit(limit)
            .all(db)
            .await
    }

    pub async fn count_logs(
        db: &DatabaseConnection,
        success: Option<bool>,
        since: Option<i64>,
    ) -> Result<u64, sea_orm::DbErr> {
        let mut query = AuthLog::find();
        if let Some(success) = success {
            query = query.filter(auth_log::Column::Success.eq(success));
        }
        if let Some(since) = since {
            query = query.filter(auth_log::Column::CreatedAt.gte(since));
        }
        query.count(db).await
    }

    /// Inserisce l'utente se manca, senza toccare le righe esistenti.
    pub async fn ensure_user(db: &DatabaseConnection, email: &str) -> Result<(), sea_orm::DbErr> {
        let now = Utc::now().timestamp();
        let active_model = AuthUserActiveModel {
            id: NotSet,
            email: Set(email.to_string()),
            is_active: Set(true),
            last_login_at: Set(None),
            login_count: Set(0),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        AuthUser::insert(active_model)
            .on_conflict(
                OnConflict::column(auth_user::Column::Email)
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec(db)
            .await?;
        Ok(())
    }

    pub async fn record_login(
        db: &DatabaseConnection,
        email: &str,
        at: i64,
    ) -> Result<AuthUserModel, sea_orm::DbErr> {
        Self::ensure_user(db, email).await?;
        let existing = AuthUser::find()
            .filter(auth_user::Column::Email.eq(email))
            .one(db)
            .await?
            .ok_or_else(|| sea_orm::DbErr::RecordNotFound(format!("auth_user {email}")))?;

        let login_count = existing.login_count + 1;
        let mut active_model: AuthUserActiveModel = existing.into();
        active_model.last_login_at = Set(Some(at));
        active_model.login_count = Set(login_count);
        active_model.updated_at = Set(at);
        active_model.update(db).await
    }

    pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<AuthUserModel>, sea_orm::DbErr> {
        AuthUser::find()
            .order_by_desc(auth_user::Column::LastLoginAt)
            .order_by_asc(auth_user::Column::Email)
            .all(db)
            .await
    }

    pub async fn count_active_users(db: &DatabaseConnection) -> Result<u64, sea_orm::DbErr> {
        AuthUser::find()
            .filter(auth_user::Column::IsActive.eq(true))
            .count(db)
            .await
    }
}
