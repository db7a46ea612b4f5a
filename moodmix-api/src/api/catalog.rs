//! Catalog connectivity check
//!
//! Provides GET /api/catalog/status: acquires a fresh access token to confirm
//! the configured client credentials are accepted.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
pub struct CatalogStatusResponse {
    pub status: String,
    pub connected: bool,
    /// When the acquired token lapses (the token itself is never returned)
    pub token_expires_at: DateTime<Utc>,
}

/// GET /api/catalog/status
///
/// **Errors:**
/// - 502 AUTH_FAILURE: credentials rejected or token endpoint misbehaved
pub async fn catalog_status(State(state): State<AppState>) -> ApiResult<Json<CatalogStatusResponse>> {
    match state.assembler.catalog().acquire_access_token().await {
        Ok(token) => {
            info!("Catalog credentials accepted");
            Ok(Json(CatalogStatusResponse {
                status: "ok".to_string(),
                connected: true,
                token_expires_at: token.expires_at,
            }))
        }
        Err(e) => {
            warn!(kind = e.kind(), "Catalog status check failed: {}", e);
            state.record_error(e.to_string()).await;
            Err(e.into())
        }
    }
}

/// Build catalog routes
pub fn catalog_routes() -> Router<AppState> {
    Router::new().route("/api/catalog/status", get(catalog_status))
}
