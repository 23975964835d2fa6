//! Search engine client for the IGSR gateway
//!
//! Executes validated queries against Elasticsearch and turns every
//! transport or HTTP outcome into a classified [`BackendError`].
//!
//! ## Features
//!
//! - **Trait-based design**: Mockable via `SearchBackend`
//! - **Configurable**: Timeouts, auth, pool sizing
//! - **Bounded retry**: One retry for transient failures, fixed backoff
//! - **Connection pooling**: Managed by the shared reqwest client
//! - **Testing support**: Exercised against wiremock servers

pub mod client;
pub mod config;
pub mod error;
pub mod middleware;

pub use client::{shared_backend, ElasticClient, SearchBackend};
pub use config::{BackendAuth, BackendConfig};
pub use error::{BackendError, BackendErrorKind, Result};
pub use middleware::{RetryPolicy, RetryStats, RetryingBackend};

/// Re-export commonly used types
pub use reqwest::StatusCode;
