//! Raw settings and their loader

use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;
use tracing::debug;

use crate::{
    error::{ConfigError, Result},
    gateway::GatewayConfig,
};

/// Flat settings as deployments provide them. Keys match environment
/// variable names, lowercased (`ES_HOST` is `es_host`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// JSON array or comma-separated list
    #[serde(default = "default_cors_allow_origins")]
    pub cors_allow_origins: String,

    #[serde(default = "default_es_host")]
    pub es_host: String,
    #[serde(default)]
    pub es_username: Option<String>,
    #[serde(default)]
    pub es_password: Option<String>,
    #[serde(default)]
    pub es_api_key: Option<String>,
    #[serde(default = "default_es_request_timeout_secs")]
    pub es_request_timeout_secs: u64,
    #[serde(default = "default_es_connect_timeout_secs")]
    pub es_connect_timeout_secs: u64,
    #[serde(default = "default_es_retry_backoff_ms")]
    pub es_retry_backoff_ms: u64,
    #[serde(default = "default_es_pool_idle_timeout_secs")]
    pub es_pool_idle_timeout_secs: u64,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    #[serde(default = "default_max_result_window")]
    pub max_result_window: usize,
    #[serde(default = "default_es_export_size_cap")]
    pub es_export_size_cap: usize,
    #[serde(default = "default_max_aggregation_size")]
    pub max_aggregation_size: usize,
    #[serde(default = "default_max_query_depth")]
    pub max_query_depth: usize,
    /// Replaces the default clause allow-list when set
    #[serde(default)]
    pub allowed_query_clauses: Option<String>,
    /// Replaces the default aggregation allow-list when set
    #[serde(default)]
    pub allowed_aggregations: Option<String>,

    #[serde(default = "default_index_sample")]
    pub index_sample: String,
    #[serde(default = "default_index_population")]
    pub index_population: String,
    #[serde(default = "default_index_superpopulation")]
    pub index_superpopulation: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_index_analysis_group")]
    pub index_analysis_group: String,
    #[serde(default = "default_index_data_collections")]
    pub index_data_collections: String,
    #[serde(default = "default_index_sitemap")]
    pub index_sitemap: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_addr: default_bind_addr(),
            cors_allow_origins: default_cors_allow_origins(),
            es_host: default_es_host(),
            es_username: None,
            es_password: None,
            es_api_key: None,
            es_request_timeout_secs: default_es_request_timeout_secs(),
            es_connect_timeout_secs: default_es_connect_timeout_secs(),
            es_retry_backoff_ms: default_es_retry_backoff_ms(),
            es_pool_idle_timeout_secs: default_es_pool_idle_timeout_secs(),
            max_page_size: default_max_page_size(),
            max_result_window: default_max_result_window(),
            es_export_size_cap: default_es_export_size_cap(),
            max_aggregation_size: default_max_aggregation_size(),
            max_query_depth: default_max_query_depth(),
            allowed_query_clauses: None,
            allowed_aggregations: None,
            index_sample: default_index_sample(),
            index_population: default_index_population(),
            index_superpopulation: default_index_superpopulation(),
            index_file: default_index_file(),
            index_analysis_group: default_index_analysis_group(),
            index_data_collections: default_index_data_collections(),
            index_sitemap: default_index_sitemap(),
        }
    }
}

/// Split a list setting. Accepts a JSON array (`["a","b"]`) or a comma list
/// (`a, b`); blank entries are dropped.
pub fn parse_list(key: &'static str, raw: &str) -> Result<Vec<String>> {
    let raw = raw.trim();
    if raw.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(raw)
            .map_err(|e| ConfigError::invalid(key, format!("not a JSON string array: {e}")))?;
        return Ok(items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect());
    }

    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect())
}

/// Loads [`Settings`] from `.env`, an optional settings file and the environment
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: PathBuf,
    dotenv: bool,
}

impl SettingsLoader {
    /// Looks for `igsr-api.{toml,json,yaml}` in the working directory
    pub fn new() -> Self {
        Self {
            file: PathBuf::from("igsr-api"),
            dotenv: true,
        }
    }

    /// Use a different settings file
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = path.into();
        self
    }

    /// Skip reading `.env`
    pub fn without_dotenv(mut self) -> Self {
        self.dotenv = false;
        self
    }

    pub fn load(&self) -> Result<Settings> {
        if self.dotenv {
            if let Ok(path) = dotenv::dotenv() {
                debug!(path = %path.display(), "loaded .env");
            }
        }

        let config = Config::builder()
            .add_source(File::from(self.file.clone()).required(false))
            .add_source(Environment::default())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Load and validate in one step
    pub fn load_gateway(&self) -> Result<GatewayConfig> {
        GatewayConfig::from_settings(self.load()?)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}

// Default value functions for serde
fn default_port() -> u16 {
    8000
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_cors_allow_origins() -> String {
    "http://localhost:8080".to_string()
}

fn default_es_host() -> String {
    "http://localhost:9200".to_string()
}

fn default_es_request_timeout_secs() -> u64 {
    10
}

fn default_es_connect_timeout_secs() -> u64 {
    2
}

fn default_es_retry_backoff_ms() -> u64 {
    100
}

fn default_es_pool_idle_timeout_secs() -> u64 {
    90
}

fn default_max_page_size() -> usize {
    100
}

fn default_max_result_window() -> usize {
    10_000
}

fn default_es_export_size_cap() -> usize {
    10_000
}

fn default_max_aggregation_size() -> usize {
    1_000
}

fn default_max_query_depth() -> usize {
    16
}

fn default_index_sample() -> String {
    "sample".to_string()
}

fn default_index_population() -> String {
    "population".to_string()
}

fn default_index_superpopulation() -> String {
    "superpopulation".to_string()
}

fn default_index_file() -> String {
    "file".to_string()
}

fn default_index_analysis_group() -> String {
    "analysis_group".to_string()
}

fn default_index_data_collections() -> String {
    "data_collections".to_string()
}

fn default_index_sitemap() -> String {
    "sitemap".to_string()
}
