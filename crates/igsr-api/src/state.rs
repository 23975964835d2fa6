//! Application state for the API server

use std::{sync::Arc, time::Instant};

use igsr_backend::{shared_backend, SearchBackend};
use igsr_config::{ConfigError, GatewayConfig};

use crate::{error::StartupError, gateway::SearchGateway};

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    /// Request pipeline
    pub gateway: Arc<SearchGateway>,
    /// Startup configuration
    pub config: Arc<GatewayConfig>,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Build state with the production Elasticsearch backend
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let backend = shared_backend(config.backend.clone())?;
        Ok(Self::with_backend(config, backend)?)
    }

    /// Build state around any backend
    pub fn with_backend(
        config: GatewayConfig,
        backend: Arc<dyn SearchBackend>,
    ) -> Result<Self, ConfigError> {
        let gateway = SearchGateway::new(
            Arc::new(config.registry()?),
            config.policy.clone(),
            backend,
            config.export_size_cap,
        );
        Ok(Self {
            gateway: Arc::new(gateway),
            config: Arc::new(config),
            start_time: Instant::now(),
        })
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
