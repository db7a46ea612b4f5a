//! Service modules for the playlist pipeline
//!
//! - Remote clients for the emotion-analysis service and the music catalog
//! - Track scoring and ranking
//! - Playlist assembly (stage orchestration)

pub mod catalog_client;
pub mod emotion_client;
pub mod error;
pub mod playlist_assembler;
pub mod track_scorer;

pub use catalog_client::{AccessToken, CatalogClient, MusicCatalog};
pub use emotion_client::{EmotionAnalyzer, EmotionClient};
pub use error::{PipelineError, UpstreamService};
pub use playlist_assembler::{AssemblerSettings, PlaylistAssembler};
pub use track_scorer::{ScoredDimension, ScoredTrack};

use moodmix_common::config::ServiceConfig;
use std::sync::Arc;
use std::time::Duration;

/// Build the assembler and its remote clients from resolved configuration
pub fn build_assembler(config: &ServiceConfig) -> Result<PlaylistAssembler, reqwest::Error> {
    let timeout = Duration::from_millis(config.request_timeout_ms);

    let emotion = EmotionClient::new(config.emotion_service_url.clone(), timeout)?;
    let catalog = CatalogClient::new(
        config.catalog_auth_url.clone(),
        config.catalog_api_url.clone(),
        config.catalog_client_id.clone(),
        config.catalog_client_secret.clone(),
        timeout,
    )?;

    Ok(PlaylistAssembler::new(
        Arc::new(emotion),
        Arc::new(catalog),
        AssemblerSettings {
            candidate_limit: config.candidate_limit,
            playlist_size: config.playlist_size,
        },
    ))
}
