use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::models::StreamMode;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub recents: RecentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Absolute base URL advertised in generated links. When unset, the base
    /// is derived from each request's Host header.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_base_url")]
    pub base_url: String,
    #[serde(default = "default_upstream_api_url")]
    pub api_url: String,
    /// Total per-request timeout for page and API fetches
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
    /// Connect timeout, also used for media relays which carry no total timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: String,
    /// Cap on concurrent outbound requests to the upstream host
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Browser identities rotated per page request
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Default serving mode for `/v/{id}`; overridable per request with `?mode=`
    #[serde(default)]
    pub mode: StreamMode,
    #[serde(default = "default_stream_cache_capacity")]
    pub cache_capacity: usize,
    /// Freshness window for resolved URLs when the upstream sets no expiry
    #[serde(default = "default_stream_ttl")]
    pub default_ttl: String,
    /// Safety margin subtracted from the upstream-provided expiry
    #[serde(default = "default_expire_offset")]
    pub expire_offset: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentsConfig {
    #[serde(default = "default_recents_capacity")]
    pub capacity: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_upstream_base_url() -> String {
    DEFAULT_UPSTREAM_BASE_URL.to_string()
}

fn default_upstream_api_url() -> String {
    DEFAULT_UPSTREAM_API_URL.to_string()
}

fn default_request_timeout() -> String {
    "10s".to_string()
}

fn default_connect_timeout() -> String {
    "15s".to_string()
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}

fn default_stream_cache_capacity() -> usize {
    DEFAULT_STREAM_CACHE_CAPACITY
}

fn default_stream_ttl() -> String {
    "60s".to_string()
}

fn default_expire_offset() -> String {
    "5s".to_string()
}

fn default_recents_capacity() -> usize {
    DEFAULT_RECENTS_CAPACITY
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_base_url(),
            api_url: default_upstream_api_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_connections: default_max_connections(),
            user_agents: default_user_agents(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            mode: StreamMode::default(),
            cache_capacity: default_stream_cache_capacity(),
            default_ttl: default_stream_ttl(),
            expire_offset: default_expire_offset(),
        }
    }
}

impl Default for RecentsConfig {
    fn default() -> Self {
        Self {
            capacity: default_recents_capacity(),
        }
    }
}

fn parse_duration_or(value: &str, fallback: Duration) -> Duration {
    humantime::parse_duration(value).unwrap_or(fallback)
}

impl UpstreamConfig {
    pub fn request_timeout_duration(&self) -> Duration {
        parse_duration_or(&self.request_timeout, Duration::from_secs(10))
    }

    pub fn connect_timeout_duration(&self) -> Duration {
        parse_duration_or(&self.connect_timeout, Duration::from_secs(15))
    }

    /// Hostname used to validate that client-supplied URLs belong upstream
    pub fn host(&self) -> String {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| self.base_url.clone())
    }
}

impl StreamConfig {
    pub fn default_ttl_duration(&self) -> Duration {
        parse_duration_or(&self.default_ttl, Duration::from_secs(60))
    }

    pub fn expire_offset_duration(&self) -> Duration {
        parse_duration_or(&self.expire_offset, Duration::from_secs(5))
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from_file(&config_file)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
