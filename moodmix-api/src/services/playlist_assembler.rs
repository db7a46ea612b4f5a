//! Playlist assembly
//!
//! Runs the stages of one playlist request strictly in sequence:
//!
//! 1. Credential: acquire a catalog access token
//! 2. Analyze: emotional profile + target features from the emotion service
//! 3. Recommend: candidate tracks for the target
//! 4. Enrich: bulk audio-feature lookup, zipped back onto the candidates
//! 5. Score & Rank: best matches first, truncated to the playlist size
//! 6. Aggregate: playlist statistics
//!
//! Any stage failure aborts the request. Persisting the result is left to the
//! caller.

use std::sync::Arc;

use moodmix_common::config::{DEFAULT_CANDIDATE_LIMIT, DEFAULT_PLAYLIST_SIZE};
use moodmix_common::models::{CandidateTrack, EnrichedTrack, PlaylistResult, TrackAudioFeatures};

use super::catalog_client::MusicCatalog;
use super::emotion_client::EmotionAnalyzer;
use super::error::PipelineError;
use super::track_scorer;

/// Longest accepted input text, in characters
pub const MAX_INPUT_CHARS: usize = 5000;

/// Size limits for one assembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerSettings {
    /// Recommendations requested from the catalog
    pub candidate_limit: usize,
    /// Tracks kept after ranking
    pub playlist_size: usize,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            playlist_size: DEFAULT_PLAYLIST_SIZE,
        }
    }
}

/// Orchestrates the remote calls and scoring for a playlist request
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct PlaylistAssembler {
    emotion: Arc<dyn EmotionAnalyzer>,
    catalog: Arc<dyn MusicCatalog>,
    settings: AssemblerSettings,
}

impl PlaylistAssembler {
    pub fn new(
        emotion: Arc<dyn EmotionAnalyzer>,
        catalog: Arc<dyn MusicCatalog>,
        settings: AssemblerSettings,
    ) -> Self {
        Self {
            emotion,
            catalog,
            settings,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn MusicCatalog> {
        &self.catalog
    }

    pub fn settings(&self) -> AssemblerSettings {
        self.settings
    }

    /// Build a playlist for `text`
    pub async fn assemble(&self, text: &str) -> Result<PlaylistResult, PipelineError> {
        let text = validate_input(text)?;

        // Stage 1: Credential
        let token = self.catalog.acquire_access_token().await?;
        tracing::debug!(stage = "credential", "Catalog access token acquired");

        // Stage 2: Analyze
        let analysis = self.emotion.analyze(text).await?;
        tracing::info!(
            stage = "analyze",
            primary = %analysis.profile.primary,
            valence = analysis.profile.valence,
            arousal = analysis.profile.arousal,
            "Emotion analysis complete"
        );

        // Stage 3: Recommend
        let candidates = self
            .catalog
            .get_recommendations(&token, &analysis.target, self.settings.candidate_limit)
            .await?;
        if candidates.is_empty() {
            return Err(PipelineError::NoCandidates(
                "catalog returned no recommendations".to_string(),
            ));
        }
        tracing::info!(stage = "recommend", candidates = candidates.len(), "Candidates received");

        // Stage 4: Enrich
        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let features = self.catalog.get_audio_features(&token, &ids).await?;
        let enriched = enrich(candidates, features)?;
        if enriched.is_empty() {
            return Err(PipelineError::NoCandidates(
                "no candidate track has audio features".to_string(),
            ));
        }
        tracing::info!(stage = "enrich", enriched = enriched.len(), "Audio features attached");

        // Stage 5: Score & Rank
        let ranked = track_scorer::rank(enriched, &analysis.target, self.settings.playlist_size);
        tracing::info!(
            stage = "rank",
            selected = ranked.len(),
            top_score = ranked.first().map(|s| s.score).unwrap_or(0.0),
            "Tracks ranked"
        );
        let tracks: Vec<EnrichedTrack> = ranked.into_iter().map(|s| s.track).collect();

        // Stage 6: Aggregate
        let stats = track_scorer::playlist_stats(&tracks, &analysis.target.recommended_genres);

        Ok(PlaylistResult {
            tracks,
            emotional_profile: analysis.profile,
            target: analysis.target,
            stats,
        })
    }
}

/// Reject input before any remote call; returns the trimmed text
pub fn validate_input(text: &str) -> Result<&str, PipelineError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PipelineError::Validation("Text is required".to_string()));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_INPUT_CHARS {
        return Err(PipelineError::Validation(format!(
            "Text is too long ({} characters, maximum {})",
            chars, MAX_INPUT_CHARS
        )));
    }
    Ok(trimmed)
}

/// Zip features back onto candidates by position, dropping unanalyzed tracks
fn enrich(
    candidates: Vec<CandidateTrack>,
    features: Vec<Option<TrackAudioFeatures>>,
) -> Result<Vec<EnrichedTrack>, PipelineError> {
    if candidates.len() != features.len() {
        return Err(PipelineError::protocol(
            super::error::UpstreamService::Catalog,
            format!(
                "requested audio features for {} tracks, received {}",
                candidates.len(),
                features.len()
            ),
        ));
    }

    Ok(candidates
        .into_iter()
        .zip(features)
        .filter_map(|(track, features)| match features {
            Some(audio_features) => Some(EnrichedTrack {
                track,
                audio_features,
            }),
            None => {
                tracing::warn!(track_id = %track.id, "No audio features for candidate, skipping");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_client::AccessToken;
    use crate::services::error::UpstreamService;
    use async_trait::async_trait;
    use chrono::Utc;
    use moodmix_common::models::{EmotionAnalysis, EmotionalProfile, TargetFeatureProfile};
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn joyful_analysis() -> EmotionAnalysis {
        let mut emotions = BTreeMap::new();
        emotions.insert("joy".to_string(), 0.9);
        emotions.insert("surprise".to_string(), 0.1);
        EmotionAnalysis {
            profile: EmotionalProfile {
                primary: "joy".to_string(),
                secondary: "surprise".to_string(),
                emotions,
                intensity: 0.9,
                valence: 0.8,
                arousal: 0.6,
            },
            target: TargetFeatureProfile {
                valence: 0.8,
                energy: 0.7,
                danceability: 0.7,
                tempo_preference: 0.7,
                instrumentalness: 0.3,
                acousticness: 0.3,
                popularity_target: 70.0,
                recommended_genres: vec!["pop".to_string(), "dance".to_string()],
            },
        }
    }

    fn candidate(i: usize) -> CandidateTrack {
        CandidateTrack {
            id: format!("track-{:02}", i),
            external_url: format!("https://open.example/track/{:02}", i),
            name: format!("Song {}", i),
            artists: vec!["Artist".to_string()],
        }
    }

    /// Deterministic spread of feature values per candidate index
    fn features_for(i: usize) -> TrackAudioFeatures {
        let step = |k: usize| ((i * k) % 17) as f64 / 16.0;
        TrackAudioFeatures {
            id: format!("track-{:02}", i),
            valence: step(7),
            energy: step(5),
            danceability: step(3),
            instrumentalness: step(11),
            acousticness: step(13),
            tempo: None,
            loudness: None,
            speechiness: None,
            liveness: None,
        }
    }

    struct FakeEmotion {
        result: Mutex<Option<Result<EmotionAnalysis, PipelineError>>>,
        calls: AtomicUsize,
    }

    impl FakeEmotion {
        fn ok(analysis: EmotionAnalysis) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(Ok(analysis))),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(err: PipelineError) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(Err(err))),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl EmotionAnalyzer for FakeEmotion {
        async fn analyze(&self, _text: &str) -> Result<EmotionAnalysis, PipelineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .lock()
                .unwrap()
                .take()
                .expect("analyze called more than once")
        }
    }

    struct FakeCatalog {
        fail_token: bool,
        candidates: Vec<CandidateTrack>,
        features: Vec<Option<TrackAudioFeatures>>,
        token_calls: AtomicUsize,
        recommendation_calls: AtomicUsize,
        feature_calls: AtomicUsize,
        requested_limit: AtomicUsize,
    }

    impl FakeCatalog {
        fn with_candidates(count: usize) -> Self {
            Self {
                fail_token: false,
                candidates: (0..count).map(candidate).collect(),
                features: (0..count).map(|i| Some(features_for(i))).collect(),
                token_calls: AtomicUsize::new(0),
                recommendation_calls: AtomicUsize::new(0),
                feature_calls: AtomicUsize::new(0),
                requested_limit: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MusicCatalog for FakeCatalog {
        async fn acquire_access_token(&self) -> Result<AccessToken, PipelineError> {
            self.token_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_token {
                return Err(PipelineError::AuthFailure("invalid client".to_string()));
            }
            Ok(AccessToken {
                token: "token".to_string(),
                expires_at: Utc::now(),
            })
        }

        async fn get_recommendations(
            &self,
            _token: &AccessToken,
            _target: &TargetFeatureProfile,
            limit: usize,
        ) -> Result<Vec<CandidateTrack>, PipelineError> {
            self.recommendation_calls.fetch_add(1, Ordering::SeqCst);
            self.requested_limit.store(limit, Ordering::SeqCst);
            if self.candidates.is_empty() {
                return Err(PipelineError::NoCandidates("empty".to_string()));
            }
            Ok(self.candidates.clone())
        }

        async fn get_audio_features(
            &self,
            _token: &AccessToken,
            track_ids: &[String],
        ) -> Result<Vec<Option<TrackAudioFeatures>>, PipelineError> {
            self.feature_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(track_ids.len(), self.candidates.len());
            Ok(self.features.clone())
        }
    }

    fn assembler(emotion: Arc<FakeEmotion>, catalog: Arc<FakeCatalog>) -> PlaylistAssembler {
        PlaylistAssembler::new(emotion, catalog, AssemblerSettings::default())
    }

    #[tokio::test]
    async fn test_assemble_ranks_and_truncates_fifteen_candidates() {
        let emotion = FakeEmotion::ok(joyful_analysis());
        let catalog = Arc::new(FakeCatalog::with_candidates(15));
        let result = assembler(emotion.clone(), catalog.clone())
            .assemble("I feel great today")
            .await
            .unwrap();

        assert_eq!(result.tracks.len(), 10);
        assert_eq!(catalog.requested_limit.load(Ordering::SeqCst), 20);
        assert_eq!(catalog.token_calls.load(Ordering::SeqCst), 1);
        assert_eq!(emotion.calls.load(Ordering::SeqCst), 1);

        // Sorted by score, matching an independent ranking
        let target = joyful_analysis().target;
        let scores: Vec<f64> = result
            .tracks
            .iter()
            .map(|t| track_scorer::score(&t.audio_features, &target))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        let mut manual: Vec<(usize, f64)> = (0..15)
            .map(|i| (i, track_scorer::score(&features_for(i), &target)))
            .collect();
        manual.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
        let expected_ids: Vec<String> = manual[..10].iter().map(|(i, _)| format!("track-{:02}", i)).collect();
        assert_eq!(result.track_ids(), expected_ids);

        // Mean valence of the selected tracks, to 6 decimal places
        let manual_valence: f64 =
            manual[..10].iter().map(|(i, _)| features_for(*i).valence).sum::<f64>() / 10.0;
        assert!((result.stats.average_valence - manual_valence).abs() < 1e-6);

        assert_eq!(result.emotional_profile.primary, "joy");
        assert_eq!(result.stats.genres, vec!["pop", "dance"]);
    }

    #[tokio::test]
    async fn test_assemble_fewer_than_playlist_size() {
        let catalog = Arc::new(FakeCatalog::with_candidates(4));
        let result = assembler(FakeEmotion::ok(joyful_analysis()), catalog)
            .assemble("meh")
            .await
            .unwrap();
        assert_eq!(result.tracks.len(), 4);
    }

    #[tokio::test]
    async fn test_assemble_drops_tracks_without_features() {
        let mut catalog = FakeCatalog::with_candidates(12);
        catalog.features[0] = None;
        catalog.features[5] = None;
        catalog.features[7] = None;
        let result = assembler(FakeEmotion::ok(joyful_analysis()), Arc::new(catalog))
            .assemble("text")
            .await
            .unwrap();

        // min(10, 9 enriched)
        assert_eq!(result.tracks.len(), 9);
        let ids = result.track_ids();
        assert!(!ids.contains(&"track-00".to_string()));
        assert!(!ids.contains(&"track-05".to_string()));
    }

    #[tokio::test]
    async fn test_assemble_no_features_at_all_is_no_candidates() {
        let mut catalog = FakeCatalog::with_candidates(3);
        catalog.features = vec![None, None, None];
        let err = assembler(FakeEmotion::ok(joyful_analysis()), Arc::new(catalog))
            .assemble("text")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoCandidates(_)));
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_remote_calls() {
        let emotion = FakeEmotion::ok(joyful_analysis());
        let catalog = Arc::new(FakeCatalog::with_candidates(5));
        let err = assembler(emotion.clone(), catalog.clone())
            .assemble("   \n\t")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(catalog.token_calls.load(Ordering::SeqCst), 0);
        assert_eq!(emotion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overlong_text_rejected() {
        let text = "a".repeat(MAX_INPUT_CHARS + 1);
        let err = validate_input(&text).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        assert_eq!(validate_input("  fine  ").unwrap(), "fine");
    }

    #[tokio::test]
    async fn test_auth_failure_aborts_before_analysis() {
        let emotion = FakeEmotion::ok(joyful_analysis());
        let mut catalog = FakeCatalog::with_candidates(5);
        catalog.fail_token = true;
        let catalog = Arc::new(catalog);

        let err = assembler(emotion.clone(), catalog.clone())
            .assemble("text")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::AuthFailure(_)));
        assert_eq!(emotion.calls.load(Ordering::SeqCst), 0);
        assert_eq!(catalog.recommendation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_emotion_unavailable_aborts_pipeline() {
        let emotion = FakeEmotion::failing(PipelineError::UpstreamUnavailable {
            service: UpstreamService::Emotion,
            message: "HTTP 503".to_string(),
        });
        let catalog = Arc::new(FakeCatalog::with_candidates(5));

        let err = assembler(emotion, catalog.clone()).assemble("text").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::UpstreamUnavailable {
                service: UpstreamService::Emotion,
                ..
            }
        ));
        assert_eq!(catalog.recommendation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_recommendations_skips_enrichment() {
        let catalog = Arc::new(FakeCatalog::with_candidates(0));
        let err = assembler(FakeEmotion::ok(joyful_analysis()), catalog.clone())
            .assemble("text")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoCandidates(_)));
        assert_eq!(catalog.feature_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_enrich_length_mismatch_is_protocol_error() {
        let err = enrich(vec![candidate(0), candidate(1)], vec![Some(features_for(0))]).unwrap_err();
        assert_eq!(err.kind(), "UPSTREAM_PROTOCOL");
    }

    #[test]
    fn test_enrich_preserves_candidate_order() {
        let enriched = enrich(
            vec![candidate(2), candidate(0), candidate(1)],
            vec![Some(features_for(2)), Some(features_for(0)), None],
        )
        .unwrap();
        let ids: Vec<&str> = enriched.iter().map(|e| e.id()).collect();
        assert_eq!(ids, vec!["track-02", "track-00"]);
    }
}
