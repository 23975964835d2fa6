//! IGSR gateway configuration
//!
//! Settings come from an optional `.env`, an optional `igsr-api.toml` and the
//! process environment, in increasing order of precedence. They are checked
//! once at startup and turned into an immutable [`GatewayConfig`] plus the
//! [`ResourceRegistry`] the router consults on every request.

pub mod error;
pub mod gateway;
pub mod resources;
pub mod settings;

pub use error::{ConfigError, Result};
pub use gateway::GatewayConfig;
pub use resources::{Decoration, IndexNames, ResourceRegistry, ResourceSpec};
pub use settings::{parse_list, Settings, SettingsLoader};
