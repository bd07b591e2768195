use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::OmdbConfig;
use crate::watched::EntryDefaults;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub omdb: Option<OmdbConfig>,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub defaults: EntryDefaults,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the browser UI bundle, served as a fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8800
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("popcorn.db")
}

/// Settings for the client-side controllers and the synchronizer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the watched-list backend (e.g., "http://127.0.0.1:8800")
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    /// Queries shorter than this (in characters) never hit the network
    #[serde(default = "default_min_query_len")]
    pub min_query_len: usize,
    /// Delay before a search is sent, restarted on every keystroke
    #[serde(default)]
    pub debounce_ms: u64,
    /// Upper bound for every outbound call
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            min_query_len: default_min_query_len(),
            debounce_ms: 0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8800".to_string()
}

fn default_min_query_len() -> usize {
    3
}

fn default_request_timeout() -> u64 {
    10
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub omdb: Option<SanitizedOmdbConfig>,
    pub client: ClientConfig,
    pub defaults: EntryDefaults,
}

/// Sanitized OMDb config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedOmdbConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u64,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            omdb: config.omdb.as_ref().map(|o| SanitizedOmdbConfig {
                base_url: o.base_url(),
                api_key_configured: !o.api_key.is_empty(),
                timeout_secs: o.timeout_secs,
            }),
            client: config.client.clone(),
            defaults: config.defaults.clone(),
        }
    }
}
