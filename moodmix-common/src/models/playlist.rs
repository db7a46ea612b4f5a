//! Catalog tracks, their audio features, and the assembled playlist

use serde::{Deserialize, Serialize};

use super::emotion::{EmotionalProfile, TargetFeatureProfile};

/// Catalog-provided audio analysis of one track
///
/// The catalog reports more fields than are listed here; only the five
/// normalized dimensions take part in scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAudioFeatures {
    /// Catalog track id these features belong to
    pub id: String,
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    pub instrumentalness: f64,
    pub acousticness: f64,
    /// Beats per minute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    /// Average loudness in dB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speechiness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness: Option<f64>,
}

impl TrackAudioFeatures {
    /// Reject features that cannot be scored
    pub fn validate(&self) -> Result<(), String> {
        let scored = [
            ("valence", self.valence),
            ("energy", self.energy),
            ("danceability", self.danceability),
            ("instrumentalness", self.instrumentalness),
            ("acousticness", self.acousticness),
        ];
        for (name, value) in scored {
            if !value.is_finite() {
                return Err(format!("{} for track {} is not a finite number", name, self.id));
            }
        }
        Ok(())
    }
}

/// Track returned by a recommendation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTrack {
    /// Catalog track id
    pub id: String,
    /// Public link to the track in the catalog
    pub external_url: String,
    /// Track title
    #[serde(default)]
    pub name: String,
    /// Artist display names
    #[serde(default)]
    pub artists: Vec<String>,
}

/// Candidate track with its audio features attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTrack {
    #[serde(flatten)]
    pub track: CandidateTrack,
    pub audio_features: TrackAudioFeatures,
}

impl EnrichedTrack {
    pub fn id(&self) -> &str {
        &self.track.id
    }
}

/// Aggregate statistics over the final track set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistStats {
    pub average_valence: f64,
    pub average_energy: f64,
    pub average_danceability: f64,
    pub genres: Vec<String>,
}

/// Output of one playlist assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistResult {
    /// Best matches first
    pub tracks: Vec<EnrichedTrack>,
    pub emotional_profile: EmotionalProfile,
    pub target: TargetFeatureProfile,
    pub stats: PlaylistStats,
}

impl PlaylistResult {
    /// Catalog ids of the tracks, in playlist order
    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.iter().map(|t| t.track.id.clone()).collect()
    }

    /// External link of the top-ranked track
    pub fn top_track_url(&self) -> Option<String> {
        self.tracks.first().map(|t| t.track.external_url.clone())
    }
}
