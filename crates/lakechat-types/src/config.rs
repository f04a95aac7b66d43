//! Client configuration for lakechat.
//!
//! `ClientConfig` is the `config.toml` found in the data directory. Every
//! field has a default so an empty or missing file is valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Smallest accepted backend timeout.
const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;

/// Top-level client configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the analytics backend (without the `/api/...` path).
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Upper bound on each backend call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Identity of the signed-in user, sent to the backend as `company_id`.
    #[serde(default)]
    pub user_id: Option<String>,

    /// Optional bearer token for the backend.
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Backend timeout with the 1-second floor applied.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(MIN_REQUEST_TIMEOUT_SECS))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_id: None,
            api_key: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("backend_url", &self.backend_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_id", &self.user_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
