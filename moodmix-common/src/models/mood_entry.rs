//! Persisted record of one successful playlist generation

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::emotion::{EmotionalProfile, TargetFeatureProfile};
use super::playlist::{PlaylistResult, PlaylistStats};

/// Playlist summary stored alongside a mood entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlaylist {
    /// Link to the top-ranked track
    pub url: Option<String>,
    pub track_ids: Vec<String>,
    /// Primary emotion the playlist was built for
    pub mood: String,
    pub features: TargetFeatureProfile,
    pub stats: PlaylistStats,
}

/// One analyzed input and the playlist generated for it
///
/// Created once per successful run and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntry {
    pub id: Uuid,
    pub input_text: String,
    pub emotions: EmotionalProfile,
    pub generated_playlist: GeneratedPlaylist,
    pub timestamp: DateTime<Utc>,
}

impl MoodEntry {
    /// Build the entry for a freshly assembled playlist
    ///
    /// The timestamp is truncated to microseconds, the precision it is stored at.
    pub fn from_playlist(input_text: impl Into<String>, playlist: &PlaylistResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_text: input_text.into(),
            emotions: playlist.emotional_profile.clone(),
            generated_playlist: GeneratedPlaylist {
                url: playlist.top_track_url(),
                track_ids: playlist.track_ids(),
                mood: playlist.emotional_profile.primary.clone(),
                features: playlist.target.clone(),
                stats: playlist.stats.clone(),
            },
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }
}
