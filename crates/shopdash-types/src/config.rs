use serde::{Deserialize, Serialize};

use crate::session::ShopScope;

/// Client configuration, persisted by the app between page loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend origin; empty means same origin as the page
    pub api_base: String,
    pub session_path: String,
    pub stream_path: String,
    /// Extra attempts after the first failed session creation
    pub session_retries: u32,
    /// Fixed delay between session attempts
    pub retry_backoff_ms: u64,
    /// Timeout for session calls. Streams have none.
    pub request_timeout_ms: u64,
    /// Storage key holding the bearer token
    pub token_storage_key: String,
    pub shop_scope: ShopScope,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            session_path: "/api/chat/sessions".to_string(),
            stream_path: "/api/chat/stream".to_string(),
            session_retries: 2,
            retry_backoff_ms: 1000,
            request_timeout_ms: 15_000,
            token_storage_key: "token".to_string(),
            shop_scope: ShopScope::All,
        }
    }
}

impl ClientConfig {
    pub fn session_url(&self) -> String {
        join_url(&self.api_base, &self.session_path)
    }

    pub fn session_url_for(&self, session_id: &str) -> String {
        format!("{}/{}", self.session_url().trim_end_matches('/'), session_id)
    }

    pub fn stream_url(&self) -> String {
        join_url(&self.api_base, &self.stream_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
