//! RON configuration for the headless timeline follower.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use timeline_core::{QueryFilter, ScopeFilter};
use timeline_engine::{EngineConfig, FetchSettings};
use timeline_logging::timeline_info;

use crate::logging::{LogDestination, LogLevel};

pub const DEFAULT_CONFIG_FILE: &str = "timeline.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub account_id: String,
    pub page_limit: u32,
    /// Stop following after this many pages even if more exist.
    pub max_pages: u32,
    pub throttle_ms: u64,
    pub request_timeout_secs: u64,
    pub exclude_replies: bool,
    pub exclude_reblogs: bool,
    pub only_media: bool,
    pub log_destination: LogDestination,
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mastodon.social".to_string(),
            account_id: "1".to_string(),
            page_limit: 20,
            max_pages: 3,
            throttle_ms: 100,
            request_timeout_secs: 30,
            exclude_replies: false,
            exclude_reblogs: false,
            only_media: false,
            log_destination: LogDestination::Terminal,
            log_level: LogLevel::Info,
        }
    }
}

impl AppConfig {
    pub fn filter(&self) -> QueryFilter {
        QueryFilter {
            exclude_replies: self.exclude_replies,
            exclude_reblogs: self.exclude_reblogs,
            only_media: self.only_media,
            exclude_deleted: true,
        }
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            base_url: self.base_url.clone(),
            account_id: self.account_id.clone(),
            page_limit: self.page_limit,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..FetchSettings::default()
        }
    }

    pub fn engine_config(&self, scope: ScopeFilter) -> EngineConfig {
        EngineConfig {
            throttle_interval: Duration::from_millis(self.throttle_ms),
            initial_scope: scope,
        }
    }
}

/// Loads the config at `path`; a missing file means defaults.
pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let config = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    timeline_info!("Loaded config from {:?}", path);
    Ok(config)
}
