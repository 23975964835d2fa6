//! Backend client configuration

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Credentials presented to the search engine
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendAuth {
    /// `Authorization: ApiKey <key>`
    ApiKey { key: String },
    /// HTTP basic auth
    Basic { username: String, password: String },
}

impl fmt::Debug for BackendAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendAuth::ApiKey { .. } => f.write_str("ApiKey(***)"),
            BackendAuth::Basic { username, .. } => write!(f, "Basic({username}, ***)"),
        }
    }
}

/// Search engine client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Engine base URL, e.g. `http://localhost:9200`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single request
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    /// Delay before the single retry of a transient failure
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff: Duration,

    /// Retry transient failures once
    #[serde(default = "default_retry_enabled")]
    pub retry_enabled: bool,

    /// Custom user agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pool idle timeout
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout: Duration,

    /// Idle connections kept per engine node
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    /// Engine credentials
    #[serde(default)]
    pub auth: Option<BackendAuth>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            retry_backoff: default_retry_backoff(),
            retry_enabled: default_retry_enabled(),
            user_agent: default_user_agent(),
            pool_idle_timeout: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            auth: None,
        }
    }
}

impl BackendConfig {
    /// Create a new backend config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set retry backoff
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Disable the transient-failure retry
    pub fn without_retry(mut self) -> Self {
        self.retry_enabled = false;
        self
    }

    /// Set credentials
    pub fn with_auth(mut self, auth: BackendAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Pick credentials the way deployments provide them: an API key wins
    /// over basic auth, and basic auth needs both halves.
    pub fn auth_from_parts(
        api_key: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Option<BackendAuth> {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());

        if present(&api_key) {
            return api_key.map(|key| BackendAuth::ApiKey { key });
        }
        if present(&username) && present(&password) {
            return username
                .zip(password)
                .map(|(username, password)| BackendAuth::Basic { username, password });
        }
        None
    }
}

// Default value functions for serde
fn default_base_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(2)
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(100)
}

fn default_retry_enabled() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("igsr-api/{}", env!("CARGO_PKG_VERSION"))
}

fn default_pool_idle_timeout() -> Duration {
    Duration::from_secs(90)
}

fn default_pool_max_idle_per_host() -> usize {
    10
}
