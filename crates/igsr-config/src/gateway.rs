//! Validated gateway configuration

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use igsr_backend::BackendConfig;
use igsr_query::QueryPolicy;

use crate::{
    error::{ConfigError, Result},
    resources::{IndexNames, ResourceRegistry},
    settings::{parse_list, Settings},
};

/// Everything the gateway needs at startup, checked once
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Origins allowed to call with credentials
    pub cors_allow_origins: Vec<String>,
    pub backend: BackendConfig,
    pub policy: QueryPolicy,
    /// Page size bound for TSV exports
    pub export_size_cap: usize,
    pub indices: IndexNames,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            cors_allow_origins: vec!["http://localhost:8080".to_string()],
            backend: BackendConfig::default(),
            policy: QueryPolicy::default(),
            export_size_cap: 10_000,
            indices: IndexNames::default(),
        }
    }
}

impl GatewayConfig {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let bind_addr = settings
            .bind_addr
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::invalid("bind_addr", e.to_string()))?;

        let cors_allow_origins = parse_list("cors_allow_origins", &settings.cors_allow_origins)?;
        if cors_allow_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::invalid(
                "cors_allow_origins",
                "wildcard origin cannot be combined with credentials",
            ));
        }

        let es_host = settings.es_host.trim();
        if !(es_host.starts_with("http://") || es_host.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "es_host",
                format!("expected an http(s) URL, got {es_host:?}"),
            ));
        }
        if settings.es_request_timeout_secs == 0 {
            return Err(ConfigError::invalid("es_request_timeout_secs", "must be positive"));
        }

        let backend = BackendConfig {
            base_url: es_host.to_string(),
            timeout: Duration::from_secs(settings.es_request_timeout_secs),
            connect_timeout: Duration::from_secs(settings.es_connect_timeout_secs.max(1)),
            retry_backoff: Duration::from_millis(settings.es_retry_backoff_ms),
            pool_idle_timeout: Duration::from_secs(settings.es_pool_idle_timeout_secs),
            auth: BackendConfig::auth_from_parts(
                settings.es_api_key,
                settings.es_username,
                settings.es_password,
            ),
            ..BackendConfig::default()
        };

        let mut policy = QueryPolicy::default()
            .with_max_page_size(settings.max_page_size)
            .with_max_result_window(settings.max_result_window);
        policy.max_aggregation_size = settings.max_aggregation_size;
        policy.max_depth = settings.max_query_depth;
        if let Some(raw) = settings.allowed_query_clauses.as_deref() {
            policy = policy.with_clauses(parse_list("allowed_query_clauses", raw)?);
        }
        if let Some(raw) = settings.allowed_aggregations.as_deref() {
            policy = policy.with_aggregations(parse_list("allowed_aggregations", raw)?);
        }

        let config = Self {
            bind_addr,
            port: settings.port,
            cors_allow_origins,
            backend,
            policy,
            export_size_cap: settings.es_export_size_cap,
            indices: IndexNames {
                sample: settings.index_sample,
                population: settings.index_population,
                superpopulation: settings.index_superpopulation,
                file: settings.index_file,
                analysis_group: settings.index_analysis_group,
                data_collections: settings.index_data_collections,
                sitemap: settings.index_sitemap,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Cross-field bounds
    pub fn validate(&self) -> Result<()> {
        let policy = &self.policy;
        if policy.max_page_size == 0 {
            return Err(ConfigError::invalid("max_page_size", "must be positive"));
        }
        if policy.max_page_size > policy.max_result_window {
            return Err(ConfigError::invalid(
                "max_page_size",
                format!(
                    "{} exceeds max_result_window {}",
                    policy.max_page_size, policy.max_result_window
                ),
            ));
        }
        if self.export_size_cap == 0 || self.export_size_cap > policy.max_result_window {
            return Err(ConfigError::invalid(
                "es_export_size_cap",
                format!("must be between 1 and {}", policy.max_result_window),
            ));
        }
        if policy.max_depth == 0 {
            return Err(ConfigError::invalid("max_query_depth", "must be positive"));
        }
        if policy.allowed_clauses.is_empty() {
            return Err(ConfigError::invalid("allowed_query_clauses", "must not be empty"));
        }
        let unmodelled = policy.unmodelled_clauses();
        if !unmodelled.is_empty() {
            return Err(ConfigError::invalid(
                "allowed_query_clauses",
                format!("{} cannot be validated and are not accepted", unmodelled.join(", ")),
            ));
        }
        self.registry()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Resource registry for the configured index names
    pub fn registry(&self) -> Result<ResourceRegistry> {
        ResourceRegistry::builtin(&self.indices)
    }
}
