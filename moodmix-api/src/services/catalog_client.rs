//! Music catalog client
//!
//! Three operations against a Spotify-style Web API:
//! - client-credentials token grant
//! - recommendation query seeded by a target feature profile
//! - bulk audio-feature lookup, positionally aligned with the requested ids
//!
//! The client does not cache tokens; callers acquire one per playlist build.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use moodmix_common::models::{CandidateTrack, TargetFeatureProfile, TrackAudioFeatures};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use super::error::{PipelineError, UpstreamService};

const USER_AGENT: &str = concat!("MoodMix/", env!("CARGO_PKG_VERSION"));
const SERVICE: UpstreamService = UpstreamService::Catalog;

/// Popularity window around the target, in catalog popularity points
const POPULARITY_SPREAD: f64 = 10.0;
/// Genre seeds accepted per recommendation query
const MAX_GENRE_SEEDS: usize = 3;
/// BPM range `tempo_preference` is mapped onto
const TEMPO_MIN_BPM: f64 = 60.0;
const TEMPO_MAX_BPM: f64 = 180.0;

/// Bearer credential for catalog API calls
#[derive(Clone, PartialEq)]
pub struct AccessToken {
    pub token: String,
    /// Provider-reported expiry; informational only
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Music catalog operations used by the playlist pipeline
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// Client-credentials grant
    async fn acquire_access_token(&self) -> Result<AccessToken, PipelineError>;

    /// Recommendations for the target profile, at most `limit`
    ///
    /// An empty result is `PipelineError::NoCandidates`.
    async fn get_recommendations(
        &self,
        token: &AccessToken,
        target: &TargetFeatureProfile,
        limit: usize,
    ) -> Result<Vec<CandidateTrack>, PipelineError>;

    /// Audio features for each id, in request order
    ///
    /// `None` marks an id the catalog has no analysis for.
    async fn get_audio_features(
        &self,
        token: &AccessToken,
        track_ids: &[String],
    ) -> Result<Vec<Option<TrackAudioFeatures>>, PipelineError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    tracks: Vec<WireTrack>,
}

#[derive(Debug, Deserialize)]
struct WireTrack {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    external_urls: WireExternalUrls,
    #[serde(default)]
    artists: Vec<WireArtist>,
}

#[derive(Debug, Default, Deserialize)]
struct WireExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<TrackAudioFeatures>>,
}

impl From<WireTrack> for CandidateTrack {
    fn from(track: WireTrack) -> Self {
        CandidateTrack {
            id: track.id,
            external_url: track.external_urls.spotify.unwrap_or_default(),
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
        }
    }
}

/// `min_popularity` / `max_popularity` for a target
pub fn popularity_bounds(target: &TargetFeatureProfile) -> (u8, u8) {
    let center = target.popularity_target.round();
    let min = (center - POPULARITY_SPREAD).clamp(0.0, 100.0) as u8;
    let max = (center + POPULARITY_SPREAD).clamp(0.0, 100.0) as u8;
    (min, max)
}

/// Map a [0, 1] tempo preference onto a target BPM
pub fn target_tempo_bpm(tempo_preference: f64) -> f64 {
    let preference = tempo_preference.clamp(0.0, 1.0);
    TEMPO_MIN_BPM + preference * (TEMPO_MAX_BPM - TEMPO_MIN_BPM)
}

/// Query parameters for a recommendation request
pub fn recommendation_query(target: &TargetFeatureProfile, limit: usize) -> Vec<(&'static str, String)> {
    let (min_popularity, max_popularity) = popularity_bounds(target);

    let mut params = vec![
        ("limit", limit.to_string()),
        ("target_valence", target.valence.to_string()),
        ("target_energy", target.energy.to_string()),
        ("target_danceability", target.danceability.to_string()),
        ("target_instrumentalness", target.instrumentalness.to_string()),
        ("target_acousticness", target.acousticness.to_string()),
        ("target_tempo", target_tempo_bpm(target.tempo_preference).to_string()),
        ("min_popularity", min_popularity.to_string()),
        ("max_popularity", max_popularity.to_string()),
    ];

    let seeds: Vec<&str> = target
        .recommended_genres
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .take(MAX_GENRE_SEEDS)
        .collect();
    if !seeds.is_empty() {
        params.push(("seed_genres", seeds.join(",")));
    }

    params
}

/// HTTP client for the music catalog
pub struct CatalogClient {
    http_client: reqwest::Client,
    auth_url: String,
    api_url: String,
    client_id: String,
    client_secret: String,
}

impl CatalogClient {
    pub fn new(
        auth_url: impl Into<String>,
        api_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            auth_url: auth_url.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        })
    }

    /// Send a bearer-authenticated GET and decode the body of a success response
    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PipelineError> {
        let url = format!("{}/{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token.token)
            .query(query)
            .send()
            .await
            .map_err(|e| PipelineError::from_transport(SERVICE, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PipelineError::AuthFailure(format!(
                "catalog rejected access token for {}",
                path
            )));
        }
        if !status.is_success() {
            tracing::warn!(path = %path, status = status.as_u16(), "Catalog returned error status");
            return Err(PipelineError::from_status(SERVICE, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PipelineError::from_transport(SERVICE, e))?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(path = %path, error = %e, "Catalog body could not be decoded");
            PipelineError::protocol(
                SERVICE,
                format!("invalid {} body at line {} column {}", path, e.line(), e.column()),
            )
        })
    }
}

#[async_trait]
impl MusicCatalog for CatalogClient {
    async fn acquire_access_token(&self) -> Result<AccessToken, PipelineError> {
        let response = self
            .http_client
            .post(&self.auth_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                PipelineError::AuthFailure(format!(
                    "token request failed: {}",
                    PipelineError::from_transport(SERVICE, e)
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Catalog token request rejected");
            return Err(PipelineError::AuthFailure(format!(
                "token endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|_| PipelineError::AuthFailure("token response could not be parsed".to_string()))?;

        if token.access_token.trim().is_empty() {
            return Err(PipelineError::AuthFailure("token response carried an empty token".to_string()));
        }

        tracing::debug!(expires_in = token.expires_in, "Catalog access token acquired");

        Ok(AccessToken {
            token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in.max(0)),
        })
    }

    async fn get_recommendations(
        &self,
        token: &AccessToken,
        target: &TargetFeatureProfile,
        limit: usize,
    ) -> Result<Vec<CandidateTrack>, PipelineError> {
        let query = recommendation_query(target, limit);
        tracing::debug!(limit = limit, "Querying catalog recommendations");

        let parsed: RecommendationsResponse = self.get_json(token, "recommendations", &query).await?;

        // Keep first occurrence of each id
        let received = parsed.tracks.len();
        let mut seen = HashSet::new();
        let tracks: Vec<CandidateTrack> = parsed
            .tracks
            .into_iter()
            .filter(|t| !t.id.is_empty() && seen.insert(t.id.clone()))
            .map(CandidateTrack::from)
            .collect();

        if tracks.len() != received {
            tracing::warn!(
                received = received,
                kept = tracks.len(),
                "Dropped duplicate or id-less recommendations"
            );
        }

        if tracks.is_empty() {
            return Err(PipelineError::NoCandidates(
                "catalog returned no recommendations".to_string(),
            ));
        }

        tracing::info!(count = tracks.len(), "Catalog recommendations received");
        Ok(tracks)
    }

    async fn get_audio_features(
        &self,
        token: &AccessToken,
        track_ids: &[String],
    ) -> Result<Vec<Option<TrackAudioFeatures>>, PipelineError> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = [("ids", track_ids.join(","))];
        let parsed: AudioFeaturesResponse = self.get_json(token, "audio-features", &query).await?;

        validate_audio_features(track_ids, &parsed.audio_features)?;

        tracing::info!(
            requested = track_ids.len(),
            available = parsed.audio_features.iter().filter(|f| f.is_some()).count(),
            "Catalog audio features received"
        );

        Ok(parsed.audio_features)
    }
}

/// Check positional alignment and scoreability of an audio-features response
fn validate_audio_features(
    track_ids: &[String],
    features: &[Option<TrackAudioFeatures>],
) -> Result<(), PipelineError> {
    if features.len() != track_ids.len() {
        return Err(PipelineError::protocol(
            SERVICE,
            format!(
                "requested audio features for {} tracks, received {}",
                track_ids.len(),
                features.len()
            ),
        ));
    }

    for (position, (id, entry)) in track_ids.iter().zip(features).enumerate() {
        if let Some(f) = entry {
            if &f.id != id {
                return Err(PipelineError::protocol(
                    SERVICE,
                    format!("audio features at position {} do not belong to {}", position, id),
                ));
            }
            f.validate()
                .map_err(|e| PipelineError::protocol(SERVICE, e))?;
        }
    }

    Ok(())
}
