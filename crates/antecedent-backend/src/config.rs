use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection settings used to open backend handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Base URL of the API server.
    #[serde(default = "default_server")]
    pub server: String,
    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,
    /// Accept any server certificate. Only for local clusters.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_server() -> String {
    "http://127.0.0.1:8001".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            token: None,
            insecure_skip_tls_verify: false,
            timeout_ms: default_timeout_ms(),
        }
    }
}
