//! Configuration loading and resolution
//!
//! Settings are resolved once at startup with the priority order:
//! 1. Command-line argument or environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! Catalog client credentials have no default and must come from tier 1 or 2.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";
pub const DEFAULT_EMOTION_SERVICE_URL: &str = "http://localhost:5000";
pub const DEFAULT_CATALOG_AUTH_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_CATALOG_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 8000;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 20;
pub const DEFAULT_PLAYLIST_SIZE: usize = 10;
/// Upper bound on tracks per playlist
pub const MAX_PLAYLIST_SIZE: usize = 10;

/// Contents of the optional TOML config file
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub emotion_service_url: Option<String>,
    pub catalog_auth_url: Option<String>,
    pub catalog_api_url: Option<String>,
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub candidate_limit: Option<usize>,
    pub playlist_size: Option<usize>,
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub database_path: Option<PathBuf>,
    pub emotion_service_url: Option<String>,
    pub catalog_auth_url: Option<String>,
    pub catalog_api_url: Option<String>,
    pub catalog_client_id: Option<String>,
    pub catalog_client_secret: Option<String>,
    pub request_timeout_ms: Option<u64>,
}

/// Fully resolved service configuration
#[derive(Clone, PartialEq)]
pub struct ServiceConfig {
    pub bind_address: String,
    pub database_path: PathBuf,
    pub emotion_service_url: String,
    pub catalog_auth_url: String,
    pub catalog_api_url: String,
    pub catalog_client_id: String,
    pub catalog_client_secret: String,
    /// Upper bound for every outbound HTTP call
    pub request_timeout_ms: u64,
    /// Number of recommendations requested per playlist
    pub candidate_limit: usize,
    /// Maximum number of tracks in a generated playlist
    pub playlist_size: usize,
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_address", &self.bind_address)
            .field("database_path", &self.database_path)
            .field("emotion_service_url", &self.emotion_service_url)
            .field("catalog_auth_url", &self.catalog_auth_url)
            .field("catalog_api_url", &self.catalog_api_url)
            .field("catalog_client_id", &self.catalog_client_id)
            .field("catalog_client_secret", &"<redacted>")
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("candidate_limit", &self.candidate_limit)
            .field("playlist_size", &self.playlist_size)
            .finish()
    }
}

impl ServiceConfig {
    /// Merge overrides, TOML values and defaults into a validated config
    pub fn resolve(overrides: ConfigOverrides, toml_config: TomlConfig) -> Result<Self> {
        let catalog_client_id = pick_credential(
            "catalog_client_id",
            overrides.catalog_client_id,
            toml_config.catalog_client_id,
        )?;
        let catalog_client_secret = pick_credential(
            "catalog_client_secret",
            overrides.catalog_client_secret,
            toml_config.catalog_client_secret,
        )?;

        let config = Self {
            bind_address: overrides
                .bind_address
                .or(toml_config.bind_address)
                .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_path: overrides
                .database_path
                .or(toml_config.database_path)
                .unwrap_or_else(default_database_path),
            emotion_service_url: trim_url(
                overrides
                    .emotion_service_url
                    .or(toml_config.emotion_service_url)
                    .unwrap_or_else(|| DEFAULT_EMOTION_SERVICE_URL.to_string()),
            ),
            catalog_auth_url: overrides
                .catalog_auth_url
                .or(toml_config.catalog_auth_url)
                .unwrap_or_else(|| DEFAULT_CATALOG_AUTH_URL.to_string()),
            catalog_api_url: trim_url(
                overrides
                    .catalog_api_url
                    .or(toml_config.catalog_api_url)
                    .unwrap_or_else(|| DEFAULT_CATALOG_API_URL.to_string()),
            ),
            catalog_client_id,
            catalog_client_secret,
            request_timeout_ms: overrides
                .request_timeout_ms
                .or(toml_config.request_timeout_ms)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            candidate_limit: toml_config.candidate_limit.unwrap_or(DEFAULT_CANDIDATE_LIMIT),
            playlist_size: toml_config.playlist_size.unwrap_or(DEFAULT_PLAYLIST_SIZE),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_ms == 0 {
            return Err(Error::Config("request_timeout_ms must be greater than 0".to_string()));
        }
        if self.candidate_limit == 0 || self.candidate_limit > 100 {
            return Err(Error::Config(format!(
                "candidate_limit must be between 1 and 100 (got {})",
                self.candidate_limit
            )));
        }
        if self.playlist_size == 0 || self.playlist_size > MAX_PLAYLIST_SIZE {
            return Err(Error::Config(format!(
                "playlist_size must be between 1 and {} (got {})",
                MAX_PLAYLIST_SIZE, self.playlist_size
            )));
        }
        Ok(())
    }
}

/// Choose a credential from CLI/ENV first, then TOML
fn pick_credential(name: &str, from_cli: Option<String>, from_toml: Option<String>) -> Result<String> {
    let cli_valid = from_cli.filter(|v| is_valid_key(v));
    let toml_valid = from_toml.filter(|v| is_valid_key(v));

    if cli_valid.is_some() && toml_valid.is_some() {
        warn!(
            "{} found in both environment/command line and TOML config. Using environment/command line.",
            name
        );
    }

    if let Some(value) = cli_valid {
        info!("{} loaded from environment/command line", name);
        return Ok(value);
    }
    if let Some(value) = toml_valid {
        info!("{} loaded from TOML config", name);
        return Ok(value);
    }

    Err(Error::Config(format!(
        "{} not configured. Set it with --{} / MOODMIX_{} or in the TOML config file",
        name,
        name.replace('_', "-"),
        name.to_uppercase()
    )))
}

/// Validate credential value (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn trim_url(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

/// Load the TOML config file
///
/// A missing file is not an error: a warning is logged and defaults are used.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Default config file location for the platform
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("moodmix").join("moodmix.toml"))
        .unwrap_or_else(|| PathBuf::from("moodmix.toml"))
}

/// OS-dependent default database path
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("moodmix").join("moodmix.db"))
        .unwrap_or_else(|| PathBuf::from("./moodmix_data/moodmix.db"))
}
