//! `[serve]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"   # Network interface (127.0.0.1 = localhost only)
//! port = 28888              # Notification channel (WebSocket)
//! control_port = 28880      # HTTP control API
//! mode = "notify"           # "notify" broadcasts updates, "direct" only writes files
//! ```
//!
//! Both ports fall back to the next free port when taken.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// What the server does after a successful apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ServeMode {
    /// Broadcast `font-config-updated` to every connected client.
    #[default]
    Notify,
    /// Write files only; the notification channel is not started.
    Direct,
}

impl ServeMode {
    pub const fn notifies(self) -> bool {
        matches!(self, Self::Notify)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    pub interface: IpAddr,

    /// Notification channel port.
    pub port: u16,

    /// HTTP control API port.
    pub control_port: u16,

    pub mode: ServeMode,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 28888,
            control_port: 28880,
            mode: ServeMode::Notify,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::ServeMode;
    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config = test_parse_config(
            "[serve]\ninterface = \"0.0.0.0\"\nport = 9000\ncontrol_port = 9100\nmode = \"direct\"",
        );
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.serve.port, 9000);
        assert_eq!(config.serve.control_port, 9100);
        assert_eq!(config.serve.mode, ServeMode::Direct);
        assert!(!config.serve.mode.notifies());
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.serve.interface, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.serve.port, 28888);
        assert_eq!(config.serve.control_port, 28880);
        assert_eq!(config.serve.mode, ServeMode::Notify);
    }
}
