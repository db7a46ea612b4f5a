//! Emotion analysis output and the audio-feature target derived from it

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Emotional reading of a piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalProfile {
    /// Highest-scoring emotion label (e.g., "joy")
    pub primary: String,
    /// Runner-up emotion label
    #[serde(default)]
    pub secondary: String,
    /// Probability per emotion label
    #[serde(default)]
    pub emotions: BTreeMap<String, f64>,
    /// Overall strength of the reading (0.0-1.0)
    pub intensity: f64,
    /// Pleasantness (0.0-1.0)
    pub valence: f64,
    /// Activation (0.0-1.0)
    pub arousal: f64,
}

impl EmotionalProfile {
    /// Check the shape constraints a usable profile must meet
    pub fn validate(&self) -> Result<(), String> {
        if self.primary.trim().is_empty() {
            return Err("primary emotion is empty".to_string());
        }
        let scalars = [
            ("intensity", self.intensity),
            ("valence", self.valence),
            ("arousal", self.arousal),
        ];
        for (name, value) in scalars {
            if !value.is_finite() {
                return Err(format!("{} is not a finite number", name));
            }
        }
        if self.emotions.values().any(|v| !v.is_finite()) {
            return Err("an emotion score is not a finite number".to_string());
        }
        Ok(())
    }
}

/// Audio-feature profile the playlist should match
///
/// The five scored dimensions (valence, energy, danceability,
/// instrumentalness, acousticness) are normalized to [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFeatureProfile {
    pub valence: f64,
    pub energy: f64,
    pub danceability: f64,
    /// Relative tempo preference (0.0 = slow, 1.0 = fast)
    pub tempo_preference: f64,
    pub instrumentalness: f64,
    pub acousticness: f64,
    /// Catalog popularity to aim for (0-100)
    pub popularity_target: f64,
    /// Genres in order of preference
    #[serde(default, alias = "genres")]
    pub recommended_genres: Vec<String>,
}

impl TargetFeatureProfile {
    /// Enforce the range invariants on every numeric field
    pub fn validate(&self) -> Result<(), String> {
        let unit_fields = [
            ("valence", self.valence),
            ("energy", self.energy),
            ("danceability", self.danceability),
            ("tempo_preference", self.tempo_preference),
            ("instrumentalness", self.instrumentalness),
            ("acousticness", self.acousticness),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} is outside [0, 1]", name));
            }
        }
        if !(0.0..=100.0).contains(&self.popularity_target) {
            return Err("popularity_target is outside [0, 100]".to_string());
        }
        Ok(())
    }
}

/// Combined result of one emotion-analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    #[serde(rename = "emotion_analysis")]
    pub profile: EmotionalProfile,
    #[serde(rename = "music_features")]
    pub target: TargetFeatureProfile,
}
