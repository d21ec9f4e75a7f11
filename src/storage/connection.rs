use crate::storage::entity::{
    appuntamento, auth_log, auth_password, auth_user, bolla, cliente, pozzo,
};
use log::info;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    EntityTrait, Schema, Statement,
};
use std::time::Duration;

pub async fn establish_connection(
    db_url: &str,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());
    if is_in_memory(db_url) {
        // ogni connessione a :memory: è un database distinto
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .idle_timeout(Duration::from_secs(300));
    }
    opt.sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;
    let backend = db.get_database_backend();

    if backend == DatabaseBackend::Sqlite && !is_in_memory(db_url) {
        db.execute(Statement::from_string(
            backend,
            "PRAGMA journal_mode=WAL;".to_string(),
        ))
        .await?;
    }

    create_table(&db, pozzo::Entity).await?;
    create_table(&db, cliente::Entity).await?;
    create_table(&db, bolla::Entity).await?;
    create_table(&db, appuntamento::Entity).await?;
    create_table(&db, auth_password::Entity).await?;
    create_table(&db, auth_log::Entity).await?;
    create_table(&db, auth_user::Entity).await?;

    // numero bolla unico per pozzo
    db.execute(Statement::from_string(
        backend,
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_bolle_pozzo_numero ON bolle(pozzo_id, numero_bolla);"
            .to_string(),
    ))
    .await?;
    db.execute(Statement::from_string(
        backend,
        "CREATE INDEX IF NOT EXISTS idx_appuntamenti_data_ora ON appuntamenti(data_ora);"
            .to_string(),
    ))
    .await?;

    info!("Database connection established and tables initialized.");

    Ok(db)
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let stmt = builder.build(schema.create_table_from_entity(entity).if_not_exists());
    db.execute(stmt).await?;
    Ok(())
}

fn is_in_memory(db_url: &str) -> bool {
    db_url.contains(":memory:") || db_url.contains("mode=memory")
}

#[cfg(test)]
pub(crate) async fn memory_db() -> std::sync::Arc<DatabaseConnection> {
    let db = establish_connection("sqlite::memory:", 1)
        .await
        .expect("in-memory database");
    std::sync::Arc::new(db)
}
