//! Database access for catrack-ai
//!
//! SQLite-backed evidence persistence, scoped per inspection session.

pub mod evidence;

pub use evidence::{EvidenceRecord, EvidenceStore, SqliteEvidenceStore};

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize catrack-ai specific tables
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS evidence (
            session_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            audio_uri TEXT NOT NULL,
            image_uri TEXT,
            recorded_at TEXT NOT NULL,
            PRIMARY KEY (session_id, item_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (evidence)");

    Ok(())
}
