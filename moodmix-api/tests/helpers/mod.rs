//! Shared test helpers: local stub servers for the emotion service and the
//! music catalog
#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serve `router` on an ephemeral local port; returns its base URL
pub async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing is listening on
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe listener");
    let addr = listener.local_addr().expect("probe local addr");
    drop(listener);
    format!("http://{}", addr)
}

/// Emotion service reply for a joyful input
pub fn joyful_analysis_body() -> Value {
    json!({
        "emotion_analysis": {
            "primary": "joy",
            "secondary": "surprise",
            "emotions": { "joy": 0.86, "surprise": 0.09, "neutral": 0.05 },
            "intensity": 0.86,
            "valence": 0.8,
            "arousal": 0.65
        },
        "music_features": {
            "valence": 0.8,
            "energy": 0.7,
            "danceability": 0.7,
            "tempo_preference": 0.7,
            "instrumentalness": 0.3,
            "acousticness": 0.3,
            "popularity_target": 70,
            "recommended_genres": ["pop", "dance", "happy", "funk"]
        }
    })
}

/// Behavior of the emotion stub
#[derive(Clone)]
pub enum EmotionReply {
    Ok(Value),
    Status(StatusCode),
    Raw(&'static str),
    Slow(Duration),
}

#[derive(Clone)]
pub struct EmotionStub {
    pub reply: EmotionReply,
    pub calls: Arc<AtomicUsize>,
    pub last_text: Arc<Mutex<Option<String>>>,
}

impl EmotionStub {
    pub fn new(reply: EmotionReply) -> Self {
        Self {
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            last_text: Arc::new(Mutex::new(None)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn spawn(&self) -> String {
        let router = Router::new()
            .route("/analyze", post(emotion_analyze))
            .with_state(self.clone());
        spawn_stub(router).await
    }
}

async fn emotion_analyze(
    State(stub): State<EmotionStub>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    use axum::response::IntoResponse;

    stub.calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_text.lock().unwrap() = body["text"].as_str().map(str::to_string);

    match stub.reply {
        EmotionReply::Ok(value) => Json(value).into_response(),
        EmotionReply::Status(status) => (status, "upstream says no").into_response(),
        EmotionReply::Raw(text) => (StatusCode::OK, text).into_response(),
        EmotionReply::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(joyful_analysis_body()).into_response()
        }
    }
}

/// Deterministic audio features for the n-th catalog track
pub fn features_json(id: &str, n: usize) -> Value {
    let step = |k: usize| ((n * k) % 17) as f64 / 16.0;
    json!({
        "id": id,
        "valence": step(7),
        "energy": step(5),
        "danceability": step(3),
        "instrumentalness": step(11),
        "acousticness": step(13),
        "tempo": 90.0 + n as f64,
        "key": 5,
        "mode": 1,
        "uri": format!("catalog:track:{}", id)
    })
}

pub fn track_id(n: usize) -> String {
    format!("trk{:03}", n)
}

/// Behavior of the catalog stub
#[derive(Clone)]
pub struct CatalogStub {
    /// Tracks returned by /v1/recommendations
    pub track_count: usize,
    pub token_status: StatusCode,
    pub recommendations_status: StatusCode,
    pub features_status: StatusCode,
    /// Track indices reported with `null` features
    pub missing_features: Vec<usize>,
    /// Drop the last feature entry to break positional alignment
    pub truncate_features: bool,
    /// Replaces the generated /v1/recommendations body
    pub recommendations_body: Option<Value>,
    pub token_calls: Arc<AtomicUsize>,
    pub recommendation_calls: Arc<AtomicUsize>,
    pub feature_calls: Arc<AtomicUsize>,
    pub last_token_auth: Arc<Mutex<Option<String>>>,
    pub last_token_form: Arc<Mutex<Option<String>>>,
    pub last_bearer: Arc<Mutex<Option<String>>>,
    pub last_recommendation_query: Arc<Mutex<HashMap<String, String>>>,
}

impl CatalogStub {
    pub fn new(track_count: usize) -> Self {
        Self {
            track_count,
            token_status: StatusCode::OK,
            recommendations_status: StatusCode::OK,
            features_status: StatusCode::OK,
            missing_features: Vec::new(),
            truncate_features: false,
            recommendations_body: None,
            token_calls: Arc::new(AtomicUsize::new(0)),
            recommendation_calls: Arc::new(AtomicUsize::new(0)),
            feature_calls: Arc::new(AtomicUsize::new(0)),
            last_token_auth: Arc::new(Mutex::new(None)),
            last_token_form: Arc::new(Mutex::new(None)),
            last_bearer: Arc::new(Mutex::new(None)),
            last_recommendation_query: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn feature_calls(&self) -> usize {
        self.feature_calls.load(Ordering::SeqCst)
    }

    /// Spawn the stub; returns `(auth_url, api_url)`
    pub async fn spawn(&self) -> (String, String) {
        let router = Router::new()
            .route("/api/token", post(catalog_token))
            .route("/v1/recommendations", get(catalog_recommendations))
            .route("/v1/audio-features", get(catalog_audio_features))
            .with_state(self.clone());
        let base = spawn_stub(router).await;
        (format!("{}/api/token", base), format!("{}/v1", base))
    }
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn catalog_token(
    State(stub): State<CatalogStub>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    stub.token_calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_token_auth.lock().unwrap() = header(&headers, "authorization");
    *stub.last_token_form.lock().unwrap() = Some(body);

    if !stub.token_status.is_success() {
        return (stub.token_status, Json(json!({ "error": "invalid_client" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "access_token": "stub-access-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })),
    )
}

async fn catalog_recommendations(
    State(stub): State<CatalogStub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    stub.recommendation_calls.fetch_add(1, Ordering::SeqCst);
    *stub.last_bearer.lock().unwrap() = header(&headers, "authorization");
    *stub.last_recommendation_query.lock().unwrap() = query;

    if !stub.recommendations_status.is_success() {
        return (stub.recommendations_status, Json(json!({ "error": "nope" })));
    }
    if let Some(body) = stub.recommendations_body {
        return (StatusCode::OK, Json(body));
    }

    let tracks: Vec<Value> = (0..stub.track_count)
        .map(|n| {
            let id = track_id(n);
            json!({
                "id": id,
                "name": format!("Track {}", n),
                "external_urls": { "spotify": format!("https://open.example/track/{}", id) },
                "artists": [{ "name": "Stub Artist" }],
                "popularity": 70
            })
        })
        .collect();
    (StatusCode::OK, Json(json!({ "tracks": tracks, "seeds": [] })))
}

async fn catalog_audio_features(
    State(stub): State<CatalogStub>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    stub.feature_calls.fetch_add(1, Ordering::SeqCst);

    if !stub.features_status.is_success() {
        return (stub.features_status, Json(json!({ "error": "nope" })));
    }

    let ids: Vec<String> = query
        .get("ids")
        .map(|ids| ids.split(',').map(str::to_string).collect())
        .unwrap_or_default();

    let mut features: Vec<Value> = ids
        .iter()
        .map(|id| {
            let n: usize = id.trim_start_matches("trk").parse().unwrap_or(0);
            if stub.missing_features.contains(&n) {
                Value::Null
            } else {
                features_json(id, n)
            }
        })
        .collect();
    if stub.truncate_features {
        features.pop();
    }

    (StatusCode::OK, Json(json!({ "audio_features": features })))
}
