//! Database initialization
//!
//! Creates the database file on first run and applies the schema. Every
//! statement is `CREATE ... IF NOT EXISTS`, so opening an existing database
//! is idempotent.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    configure_pool(&pool).await?;
    create_schema(&pool).await?;

    Ok(pool)
}

/// Single-connection in-memory database, used by tests and dry runs
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    configure_pool(&pool).await?;
    create_schema(&pool).await?;
    Ok(pool)
}

async fn configure_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA busy_timeout = 5000").execute(pool).await?;
    Ok(())
}

/// Create all tables (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_users_table(pool).await?;
    create_songs_table(pool).await?;
    create_recommendations_table(pool).await?;
    create_events_table(pool).await?;
    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_songs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            song_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            duration INTEGER,
            bpm INTEGER,
            key TEXT,
            url TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_songs_category ON songs(category)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_recommendations_table(pool: &SqlitePool) -> Result<()> {
    // categories and cognitive_scores are JSON documents
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS recommendations (
            user_id TEXT PRIMARY KEY,
            categories TEXT NOT NULL,
            cognitive_scores TEXT,
            updated_at TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            payload TEXT NOT NULL,
            ts TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_user ON events(user_id, ts)")
        .execute(pool)
        .await?;

    Ok(())
}
