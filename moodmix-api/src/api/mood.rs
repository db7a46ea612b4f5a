//! Mood analysis endpoints
//!
//! - POST /api/mood/analyze: run the playlist pipeline and persist the result
//! - GET /api/mood/history: most recent mood entries
//! - GET /api/mood/entries/:id: one mood entry

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use moodmix_common::db;
use moodmix_common::models::{
    EmotionalProfile, EnrichedTrack, MoodEntry, PlaylistStats, TargetFeatureProfile,
};

use crate::services::PipelineError;
use crate::{ApiError, ApiResult, AppState};

pub const DEFAULT_HISTORY_LIMIT: u32 = 10;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Missing or null text is treated like empty text
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistBody {
    pub tracks: Vec<EnrichedTrack>,
    pub stats: PlaylistStats,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(rename = "moodEntryId")]
    pub mood_entry_id: Uuid,
    pub emotion_analysis: EmotionalProfile,
    pub music_features: TargetFeatureProfile,
    pub playlist: PlaylistBody,
}

/// POST /api/mood/analyze
///
/// **Request:** `{"text": "I feel great today"}`
///
/// **Errors:** see `ApiError`; failed runs persist nothing. A body that is
/// not a JSON object with a string `text` is a validation error.
pub async fn analyze_mood(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<Json<AnalyzeResponse>> {
    let text = match payload {
        Ok(Json(request)) => request.text.unwrap_or_default(),
        Err(rejection) => {
            warn!(status = rejection.status().as_u16(), "Rejected analyze request body");
            return Err(PipelineError::Validation(
                "Request body must be a JSON object with a string \"text\" field".to_string(),
            )
            .into());
        }
    };

    let playlist = match state.assembler.assemble(&text).await {
        Ok(playlist) => playlist,
        Err(e) => {
            warn!(kind = e.kind(), "Playlist generation failed: {}", e);
            state.record_error(e.to_string()).await;
            return Err(e.into());
        }
    };

    let entry = MoodEntry::from_playlist(text.trim(), &playlist);
    let mood_entry_id = db::save_mood_entry(&state.db, &entry).await.map_err(|e| {
        ApiError::Internal(format!("Failed to save mood entry: {}", e))
    })?;

    info!(
        entry_id = %mood_entry_id,
        mood = %entry.generated_playlist.mood,
        tracks = playlist.tracks.len(),
        "Mood entry saved"
    );

    Ok(Json(AnalyzeResponse {
        mood_entry_id,
        emotion_analysis: playlist.emotional_profile,
        music_features: playlist.target,
        playlist: PlaylistBody {
            tracks: playlist.tracks,
            stats: playlist.stats,
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<MoodEntry>,
    pub count: usize,
}

/// GET /api/mood/history?limit=N
///
/// Newest first. `limit` defaults to 10 and is capped at 100; zero is rejected.
pub async fn mood_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }

    let entries = db::list_recent_entries(&state.db, limit.min(MAX_HISTORY_LIMIT)).await?;
    Ok(Json(HistoryResponse {
        count: entries.len(),
        entries,
    }))
}

/// GET /api/mood/entries/:id
pub async fn get_mood_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MoodEntry>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid mood entry id: {}", id)))?;

    db::load_mood_entry(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Mood entry {}", id)))
}

/// Build mood routes
pub fn mood_routes() -> Router<AppState> {
    Router::new()
        .route("/api/mood/analyze", post(analyze_mood))
        .route("/api/mood/history", get(mood_history))
        .route("/api/mood/entries/:id", get(get_mood_entry))
}
