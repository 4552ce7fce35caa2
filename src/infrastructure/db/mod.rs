use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::time::Duration;

pub type DbPool = Pool<Sqlite>;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS quota_usage (
        key_hash TEXT NOT NULL,
        install_id TEXT NOT NULL,
        char_count_std INTEGER NOT NULL DEFAULT 0,
        char_count_wave INTEGER NOT NULL DEFAULT 0,
        last_save_ms INTEGER NOT NULL,
        PRIMARY KEY (key_hash, install_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS quota_resets (
        key_hash TEXT PRIMARY KEY,
        reset_at_ms INTEGER NOT NULL
    )
    "#,
];

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await
}

/// Create the tables used by the quota meter if they are missing
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

pub async fn check_connection(pool: &DbPool) -> Result<bool, sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| true)
}
