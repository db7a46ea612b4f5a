//! Mood entry database operations
//!
//! Entries are insert-only. Structured columns are stored as JSON text and
//! timestamps as fixed-width RFC 3339 strings (microsecond precision), so
//! lexical order on `timestamp` equals chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use crate::models::{EmotionalProfile, GeneratedPlaylist, MoodEntry};
use crate::{Error, Result};

/// Save a mood entry, returning its id
pub async fn save_mood_entry(pool: &SqlitePool, entry: &MoodEntry) -> Result<Uuid> {
    // Prepare all data before touching the database
    let id = entry.id.to_string();
    let emotions = serde_json::to_string(&entry.emotions)?;
    let generated_playlist = serde_json::to_string(&entry.generated_playlist)?;
    let timestamp = format_timestamp(&entry.timestamp);

    sqlx::query(
        r#"
        INSERT INTO mood_entries (id, input_text, emotions, generated_playlist, timestamp)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&entry.input_text)
    .bind(&emotions)
    .bind(&generated_playlist)
    .bind(&timestamp)
    .execute(pool)
    .await?;

    tracing::debug!(entry_id = %entry.id, "Mood entry saved");

    Ok(entry.id)
}

/// Load a single mood entry by id
pub async fn load_mood_entry(pool: &SqlitePool, id: Uuid) -> Result<Option<MoodEntry>> {
    let row = sqlx::query(
        r#"
        SELECT id, input_text, emotions, generated_playlist, timestamp
        FROM mood_entries
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|r| entry_from_row(&r)).transpose()
}

/// Most recent entries first, at most `limit`
pub async fn list_recent_entries(pool: &SqlitePool, limit: u32) -> Result<Vec<MoodEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT id, input_text, emotions, generated_playlist, timestamp
        FROM mood_entries
        ORDER BY timestamp DESC, rowid DESC
        LIMIT ?
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.iter().map(entry_from_row).collect()
}

fn entry_from_row(row: &SqliteRow) -> Result<MoodEntry> {
    let id: String = row.get("id");
    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("Failed to parse entry id '{}': {}", id, e)))?;

    let emotions: String = row.get("emotions");
    let emotions: EmotionalProfile = serde_json::from_str(&emotions)?;

    let generated_playlist: String = row.get("generated_playlist");
    let generated_playlist: GeneratedPlaylist = serde_json::from_str(&generated_playlist)?;

    let timestamp: String = row.get("timestamp");
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp: {}", e)))?
        .with_timezone(&Utc);

    Ok(MoodEntry {
        id,
        input_text: row.get("input_text"),
        emotions,
        generated_playlist,
        timestamp,
    })
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}
