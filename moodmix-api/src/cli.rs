//! Command-line arguments for moodmix-api
//!
//! Every setting can come from a flag or its environment variable; unset
//! values fall through to the TOML config file and then to compiled defaults.

use std::path::PathBuf;

use clap::Parser;
use moodmix_common::config::{self, ConfigOverrides, ServiceConfig};
use moodmix_common::{Error, Result};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "moodmix-api")]
#[command(about = "Mood-driven playlist service")]
#[command(version)]
pub struct Args {
    /// TOML config file (defaults to the platform config dir)
    #[arg(long, env = "MOODMIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "MOODMIX_BIND")]
    pub bind: Option<String>,

    /// SQLite database file
    #[arg(long, env = "MOODMIX_DATABASE")]
    pub database: Option<PathBuf>,

    /// Base URL of the emotion-analysis service
    #[arg(long, env = "MOODMIX_EMOTION_URL")]
    pub emotion_url: Option<String>,

    /// Catalog token endpoint
    #[arg(long, env = "MOODMIX_CATALOG_AUTH_URL")]
    pub catalog_auth_url: Option<String>,

    /// Catalog API base URL
    #[arg(long, env = "MOODMIX_CATALOG_API_URL")]
    pub catalog_api_url: Option<String>,

    /// Catalog client id
    #[arg(long, env = "MOODMIX_CATALOG_CLIENT_ID")]
    pub catalog_client_id: Option<String>,

    /// Catalog client secret
    #[arg(long, env = "MOODMIX_CATALOG_CLIENT_SECRET", hide_env_values = true)]
    pub catalog_client_secret: Option<String>,

    /// Per-request timeout for remote calls, in milliseconds
    #[arg(long, env = "MOODMIX_REQUEST_TIMEOUT_MS")]
    pub request_timeout_ms: Option<u64>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            database_path: self.database.clone(),
            emotion_service_url: self.emotion_url.clone(),
            catalog_auth_url: self.catalog_auth_url.clone(),
            catalog_api_url: self.catalog_api_url.clone(),
            catalog_client_id: self.catalog_client_id.clone(),
            catalog_client_secret: self.catalog_client_secret.clone(),
            request_timeout_ms: self.request_timeout_ms,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_config_path)
    }

    /// Resolve the full service configuration
    ///
    /// An explicitly named config file must exist; the default one may not.
    pub fn load_config(&self) -> Result<ServiceConfig> {
        let path = self.config_path();
        if self.config.is_some() && !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let toml_config = config::load_toml_config(&path)?;
        ServiceConfig::resolve(self.overrides(), toml_config)
    }
}
