//! Session evidence persistence
//!
//! Durable (session, item) → local recording reference mapping, consumed
//! when a whole inspection session is compiled. Writes to different items
//! are independent; a bulk read reflects a point-in-time snapshot of the
//! writes that had completed, with no cross-item transactionality.

use async_trait::async_trait;
use catrack_common::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// One stored evidence entry for an inspection item
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRecord {
    pub item_id: Uuid,
    /// Local reference to the recorded voice note (path or data URI)
    pub audio_uri: String,
    /// Local reference to the component photo, if one was taken
    pub image_uri: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Durable evidence mapping, keyed by (session, item)
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Store or replace the evidence references for an item.
    async fn put(
        &self,
        session_id: Uuid,
        item_id: Uuid,
        audio_uri: &str,
        image_uri: Option<&str>,
    ) -> Result<()>;

    /// Fetch one item's evidence, if recorded.
    async fn get(&self, session_id: Uuid, item_id: Uuid) -> Result<Option<EvidenceRecord>>;

    /// Snapshot every recorded item for a session.
    async fn get_all(&self, session_id: Uuid) -> Result<Vec<EvidenceRecord>>;

    /// Drop everything recorded for a session.
    async fn clear(&self, session_id: Uuid) -> Result<()>;
}

/// SQLite-backed evidence store
pub struct SqliteEvidenceStore {
    pool: SqlitePool,
}

impl SqliteEvidenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvidenceStore for SqliteEvidenceStore {
    async fn put(
        &self,
        session_id: Uuid,
        item_id: Uuid,
        audio_uri: &str,
        image_uri: Option<&str>,
    ) -> Result<()> {
        let recorded_at = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO evidence (session_id, item_id, audio_uri, image_uri, recorded_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(session_id, item_id) DO UPDATE SET
                audio_uri = excluded.audio_uri,
                image_uri = excluded.image_uri,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(session_id.to_string())
        .bind(item_id.to_string())
        .bind(audio_uri)
        .bind(image_uri)
        .bind(&recorded_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            session_id = %session_id,
            item_id = %item_id,
            has_image = image_uri.is_some(),
            "Evidence recorded"
        );

        Ok(())
    }

    async fn get(&self, session_id: Uuid, item_id: Uuid) -> Result<Option<EvidenceRecord>> {
        let row = sqlx::query(
            r#"
            SELECT item_id, audio_uri, image_uri, recorded_at
            FROM evidence
            WHERE session_id = ? AND item_id = ?
            "#,
        )
        .bind(session_id.to_string())
        .bind(item_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(record_from_row).transpose()
    }

    async fn get_all(&self, session_id: Uuid) -> Result<Vec<EvidenceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, audio_uri, image_uri, recorded_at
            FROM evidence
            WHERE session_id = ?
            ORDER BY recorded_at
            "#,
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(record_from_row).collect()
    }

    async fn clear(&self, session_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM evidence WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::debug!(session_id = %session_id, "Session evidence cleared");

        Ok(())
    }
}

fn record_from_row(row: sqlx::sqlite::SqliteRow) -> Result<EvidenceRecord> {
    let item_id: String = row.get("item_id");
    let recorded_at: String = row.get("recorded_at");

    Ok(EvidenceRecord {
        item_id: Uuid::parse_str(&item_id)
            .map_err(|e| Error::Internal(format!("Corrupt item_id '{}': {}", item_id, e)))?,
        audio_uri: row.get("audio_uri"),
        image_uri: row.get("image_uri"),
        recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
            .map_err(|e| Error::Internal(format!("Corrupt recorded_at '{}': {}", recorded_at, e)))?
            .with_timezone(&Utc),
    })
}
