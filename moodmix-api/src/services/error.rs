//! Pipeline error taxonomy
//!
//! Every stage failure aborts the whole request with one of these kinds.
//! Messages name the failing service but never carry raw upstream payloads.

use std::fmt;
use thiserror::Error;

/// Remote dependency a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    Emotion,
    Catalog,
}

impl fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamService::Emotion => write!(f, "emotion service"),
            UpstreamService::Catalog => write!(f, "music catalog"),
        }
    }
}

/// Playlist pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input rejected before any remote call
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Catalog credential could not be acquired or was rejected
    #[error("Catalog authentication failed: {0}")]
    AuthFailure(String),

    /// Network error, timeout, or server-side failure
    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable {
        service: UpstreamService,
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Unexpected response from {service}: {message}")]
    UpstreamProtocol {
        service: UpstreamService,
        message: String,
    },

    /// Recommendation query produced nothing usable
    #[error("No candidate tracks: {0}")]
    NoCandidates(String),
}

impl PipelineError {
    /// Stable machine-readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) => "VALIDATION_ERROR",
            PipelineError::AuthFailure(_) => "AUTH_FAILURE",
            PipelineError::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            PipelineError::UpstreamProtocol { .. } => "UPSTREAM_PROTOCOL",
            PipelineError::NoCandidates(_) => "NO_CANDIDATES",
        }
    }

    pub(crate) fn unavailable(service: UpstreamService, message: impl Into<String>) -> Self {
        PipelineError::UpstreamUnavailable {
            service,
            message: message.into(),
        }
    }

    pub(crate) fn protocol(service: UpstreamService, message: impl Into<String>) -> Self {
        PipelineError::UpstreamProtocol {
            service,
            message: message.into(),
        }
    }

    /// Classify a failed send (connect error, timeout, broken body)
    pub(crate) fn from_transport(service: UpstreamService, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "connection failed".to_string()
        } else {
            format!("transport error: {}", err.without_url())
        };
        PipelineError::unavailable(service, message)
    }

    /// Classify a non-success HTTP status
    ///
    /// 5xx and 429 mean the service is unavailable; anything else is a
    /// response this client does not understand.
    pub(crate) fn from_status(service: UpstreamService, status: reqwest::StatusCode) -> Self {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            PipelineError::unavailable(service, format!("HTTP {}", status.as_u16()))
        } else {
            PipelineError::protocol(service, format!("HTTP {}", status.as_u16()))
        }
    }
}
