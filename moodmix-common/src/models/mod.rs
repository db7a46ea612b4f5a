//! Domain models shared by the MoodMix services
//!
//! - Emotional analysis output (what the text expresses)
//! - Audio-feature targets and catalog tracks (what the playlist should sound like)
//! - Persisted mood entries

pub mod emotion;
pub mod mood_entry;
pub mod playlist;

pub use emotion::{EmotionAnalysis, EmotionalProfile, TargetFeatureProfile};
pub use mood_entry::{GeneratedPlaylist, MoodEntry};
pub use playlist::{CandidateTrack, EnrichedTrack, PlaylistResult, PlaylistStats, TrackAudioFeatures};
