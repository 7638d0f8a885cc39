//! Client-side configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8787";

/// Where notes go and what a note looks like when the sender says nothing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Remote store. `None` keeps notes in an in-process store.
    pub server_url: Option<String>,
    /// Base used for share links, if different from `server_url`
    pub public_url: Option<String>,
    pub request_timeout_secs: u64,
    pub default_ttl_minutes: f64,
    pub default_burn_after_read: bool,
    pub default_max_views: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            public_url: None,
            request_timeout_secs: 10,
            default_ttl_minutes: 24.0 * 60.0,
            default_burn_after_read: true,
            default_max_views: None,
        }
    }
}

impl ClientConfig {
    pub fn remote(server_url: impl Into<String>) -> Self {
        Self {
            server_url: Some(server_url.into()),
            ..Self::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL that share links are built on
    pub fn link_base(&self) -> &str {
        self.public_url
            .as_deref()
            .or(self.server_url.as_deref())
            .unwrap_or(DEFAULT_SERVER_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_base_precedence() {
        let mut config = ClientConfig::default();
        assert_eq!(config.link_base(), DEFAULT_SERVER_URL);

        config.server_url = Some("https://api.example".to_string());
        assert_eq!(config.link_base(), "https://api.example");

        config.public_url = Some("https://notes.example".to_string());
        assert_eq!(config.link_base(), "https://notes.example");
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"server_url":"http://x","default_max_views":9}"#).unwrap();
        assert_eq!(config.server_url.as_deref(), Some("http://x"));
        assert_eq!(config.default_max_views, Some(9));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.default_burn_after_read);
    }
}
