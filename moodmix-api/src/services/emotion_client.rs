//! Emotion-analysis service client
//!
//! Sends raw text to `POST {base_url}/analyze` and receives the emotional
//! profile together with the audio-feature target in one response.

use async_trait::async_trait;
use moodmix_common::models::EmotionAnalysis;
use serde::Serialize;
use std::time::Duration;

use super::error::{PipelineError, UpstreamService};

const USER_AGENT: &str = concat!("MoodMix/", env!("CARGO_PKG_VERSION"));
const SERVICE: UpstreamService = UpstreamService::Emotion;

/// Source of emotion analyses
#[async_trait]
pub trait EmotionAnalyzer: Send + Sync {
    /// Analyze non-empty text
    async fn analyze(&self, text: &str) -> Result<EmotionAnalysis, PipelineError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    text: &'a str,
}

/// HTTP client for the emotion-analysis service
pub struct EmotionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl EmotionClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn analyze_url(&self) -> String {
        format!("{}/analyze", self.base_url)
    }
}

#[async_trait]
impl EmotionAnalyzer for EmotionClient {
    async fn analyze(&self, text: &str) -> Result<EmotionAnalysis, PipelineError> {
        tracing::debug!(chars = text.chars().count(), "Querying emotion service");

        let response = self
            .http_client
            .post(self.analyze_url())
            .json(&AnalyzeRequest { text })
            .send()
            .await
            .map_err(|e| PipelineError::from_transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Emotion service returned error status");
            return Err(PipelineError::from_status(SERVICE, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::from_transport(SERVICE, e))?;

        let analysis: EmotionAnalysis = serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(error = %e, "Emotion service body could not be decoded");
            PipelineError::protocol(
                SERVICE,
                format!("invalid analysis body at line {} column {}", e.line(), e.column()),
            )
        })?;

        analysis
            .profile
            .validate()
            .map_err(|e| PipelineError::protocol(SERVICE, format!("invalid emotion_analysis: {}", e)))?;
        analysis
            .target
            .validate()
            .map_err(|e| PipelineError::protocol(SERVICE, format!("invalid music_features: {}", e)))?;

        tracing::info!(
            primary = %analysis.profile.primary,
            intensity = analysis.profile.intensity,
            genres = analysis.target.recommended_genres.len(),
            "Emotion analysis received"
        );

        Ok(analysis)
    }
}
