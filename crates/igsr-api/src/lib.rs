//! IGSR query gateway
//!
//! Accepts search requests from the IGSR website, validates them against a
//! clause allow-list, forwards them to Elasticsearch and returns a reshaped,
//! engine-neutral response.
//!
//! ## Features
//!
//! - **Resource routing**: `/{resource}/_search`, also under `/beta`
//! - **Document detail**: lookup by id with exact-match fallback
//! - **TSV downloads**: `/{resource}/_search/{name}.tsv`
//! - **Single error table**: every failure maps to one status and `kind`
//! - **OpenAPI**: served at `/openapi.json`

pub mod error;
pub mod export;
pub mod extract;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod normalizer;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{ApiError, ApiResult, StartupError};
pub use gateway::SearchGateway;
pub use routes::router;
pub use server::{serve, shutdown_signal, GatewayServer};
pub use state::AppState;
