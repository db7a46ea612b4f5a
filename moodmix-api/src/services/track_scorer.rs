//! Track scoring and ranking
//!
//! A candidate's score is a weighted similarity to the target profile:
//!
//! ```text
//! score = 1.0 - Σ weight(d) × |track[d] - target[d]|
//! ```
//!
//! over the five normalized dimensions below. Weights sum to 1.0, so with
//! inputs in [0, 1] the score lies in [0, 1] and identical features score 1.0.

use std::cmp::Ordering;

use moodmix_common::models::{EnrichedTrack, PlaylistStats, TargetFeatureProfile, TrackAudioFeatures};

/// Audio-feature dimensions that contribute to the score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoredDimension {
    Valence,
    Energy,
    Danceability,
    Instrumentalness,
    Acousticness,
}

impl ScoredDimension {
    /// Every scored dimension, in summation order
    pub const ALL: [ScoredDimension; 5] = [
        ScoredDimension::Valence,
        ScoredDimension::Energy,
        ScoredDimension::Danceability,
        ScoredDimension::Instrumentalness,
        ScoredDimension::Acousticness,
    ];

    pub fn weight(self) -> f64 {
        match self {
            ScoredDimension::Valence => 0.30,
            ScoredDimension::Energy => 0.20,
            ScoredDimension::Danceability => 0.20,
            ScoredDimension::Instrumentalness => 0.15,
            ScoredDimension::Acousticness => 0.15,
        }
    }

    fn of_track(self, features: &TrackAudioFeatures) -> f64 {
        match self {
            ScoredDimension::Valence => features.valence,
            ScoredDimension::Energy => features.energy,
            ScoredDimension::Danceability => features.danceability,
            ScoredDimension::Instrumentalness => features.instrumentalness,
            ScoredDimension::Acousticness => features.acousticness,
        }
    }

    fn of_target(self, target: &TargetFeatureProfile) -> f64 {
        match self {
            ScoredDimension::Valence => target.valence,
            ScoredDimension::Energy => target.energy,
            ScoredDimension::Danceability => target.danceability,
            ScoredDimension::Instrumentalness => target.instrumentalness,
            ScoredDimension::Acousticness => target.acousticness,
        }
    }
}

/// Track paired with its match score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTrack {
    pub track: EnrichedTrack,
    pub score: f64,
}

/// Similarity of a track's features to the target (higher is better)
pub fn score(features: &TrackAudioFeatures, target: &TargetFeatureProfile) -> f64 {
    ScoredDimension::ALL.iter().fold(1.0, |acc, dim| {
        acc - dim.weight() * (dim.of_track(features) - dim.of_target(target)).abs()
    })
}

/// Score every track, order best first and keep at most `limit`
///
/// The sort is stable: tracks with equal scores keep their candidate order.
pub fn rank(tracks: Vec<EnrichedTrack>, target: &TargetFeatureProfile, limit: usize) -> Vec<ScoredTrack> {
    let mut scored: Vec<ScoredTrack> = tracks
        .into_iter()
        .map(|track| {
            let score = score(&track.audio_features, target);
            ScoredTrack { track, score }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Arithmetic mean; 0.0 for an empty sequence
pub fn average(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Aggregate statistics for a final track set
pub fn playlist_stats(tracks: &[EnrichedTrack], genres: &[String]) -> PlaylistStats {
    PlaylistStats {
        average_valence: average(tracks.iter().map(|t| t.audio_features.valence)),
        average_energy: average(tracks.iter().map(|t| t.audio_features.energy)),
        average_danceability: average(tracks.iter().map(|t| t.audio_features.danceability)),
        genres: genres.to_vec(),
    }
}
