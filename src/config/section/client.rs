//! `[client]` section configuration.
//!
//! Settings for the `watch` consumers (browser page model, editor).
//!
//! # Example
//!
//! ```toml
//! [client]
//! host = "127.0.0.1"
//! port = 28888
//! reconnect_delay_ms = 5000   # fixed delay, no backoff
//! base_px = 10                # font-size = base_px + relativeSizeValue
//! highlight_ms = 1000
//! toast_ms = 3000
//! debug = false               # request enriched payloads
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub reconnect_delay_ms: u64,
    pub base_px: i32,
    pub highlight_ms: u64,
    pub toast_ms: u64,
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 28888,
            reconnect_delay_ms: 5000,
            base_px: 10,
            highlight_ms: 1000,
            toast_ms: 3000,
            debug: false,
        }
    }
}

impl ClientConfig {
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn toast(&self) -> Duration {
        Duration::from_millis(self.toast_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::config::test_parse_config;

    #[test]
    fn test_client_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.client.url(), "ws://127.0.0.1:28888");
        assert_eq!(config.client.reconnect_delay(), Duration::from_secs(5));
        assert_eq!(config.client.base_px, 10);
        assert_eq!(config.client.highlight(), Duration::from_secs(1));
        assert_eq!(config.client.toast(), Duration::from_secs(3));
        assert!(!config.client.debug);
    }

    #[test]
    fn test_client_custom() {
        let config = test_parse_config("[client]\nport = 30000\ndebug = true\nbase_px = 12");
        assert_eq!(config.client.port, 30000);
        assert!(config.client.debug);
        assert_eq!(config.client.base_px, 12);
    }
}
