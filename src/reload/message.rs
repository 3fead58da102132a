//! Notification channel protocol.
//!
//! JSON messages tagged by `type`:
//!
//! | direction      | type                                            |
//! |----------------|-------------------------------------------------|
//! | client→server  | `client-connected`, `cursor-plugin-connected`   |
//! | client→server  | `get-status`, `enable-debug-mode`, `set-debug-mode`, `heartbeat` |
//! | server→client  | `connected`, `font-config-updated`, `status`, `heartbeat-response` |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ServeMode;
use crate::patch::BatchReport;
use crate::utils::now_millis;

/// Server name announced in the handshake ack.
pub const SERVER_NAME: &str = "font-tool";

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

// ============================================================================
// Capabilities
// ============================================================================

/// Capability flag declared in a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Enriched payloads: server timestamp, client count, debug matches.
    DebugMode,
    /// Selector, path, pattern and line content on each update.
    UpdateDetails,
    #[serde(other)]
    Unknown,
}

/// Capabilities negotiated for one connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub debug: bool,
    pub details: bool,
}

impl Capabilities {
    pub fn from_flags(flags: &[Capability]) -> Self {
        Self {
            debug: flags.contains(&Capability::DebugMode),
            details: flags.contains(&Capability::UpdateDetails),
        }
    }

    pub fn flags(self) -> Vec<Capability> {
        let mut flags = Vec::new();
        if self.debug {
            flags.push(Capability::DebugMode);
        }
        if self.details {
            flags.push(Capability::UpdateDetails);
        }
        flags
    }
}

// ============================================================================
// Client → Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    ClientConnected {
        #[serde(default)]
        timestamp: u64,
        #[serde(default)]
        capabilities: Vec<Capability>,
    },
    CursorPluginConnected {
        #[serde(default)]
        version: String,
        #[serde(default)]
        capabilities: Vec<Capability>,
    },
    GetStatus {
        #[serde(default)]
        timestamp: u64,
    },
    EnableDebugMode {
        #[serde(default = "enabled_default")]
        enabled: bool,
    },
    SetDebugMode {
        enabled: bool,
    },
    Heartbeat,
}

fn enabled_default() -> bool {
    true
}

impl ClientMessage {
    pub fn from_json(s: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"heartbeat"}"#.to_string())
    }

    /// Browser handshake.
    pub fn browser(capabilities: Capabilities) -> Self {
        Self::ClientConnected {
            timestamp: now_millis(),
            capabilities: capabilities.flags(),
        }
    }

    /// Editor handshake.
    pub fn editor(capabilities: Capabilities) -> Self {
        Self::CursorPluginConnected {
            version: env!("CARGO_PKG_VERSION").to_string(),
            capabilities: capabilities.flags(),
        }
    }
}

// ============================================================================
// Server → Client
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub capabilities: Vec<Capability>,
}

/// Reply to `get-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub running: bool,
    pub port: u16,
    pub client_count: usize,
    pub mode: ServeMode,
}

/// One element change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntry {
    pub component_name: String,
    pub element_name: String,
    pub relative_size_value: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_content: Option<String>,
}

impl UpdateEntry {
    fn without_details(&self) -> Self {
        Self {
            component_name: self.component_name.clone(),
            element_name: self.element_name.clone(),
            relative_size_value: self.relative_size_value,
            selector: None,
            path: None,
            match_pattern: None,
            line_content: None,
        }
    }
}

/// Flattened match line for debug clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugMatch {
    pub component_name: String,
    pub element_name: String,
    pub relative_size_value: i32,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub match_pattern: String,
}

/// `font-config-updated` payload. `updates` may be empty: receivers then
/// fall back to a global refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessage {
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub updated_files: Vec<String>,
    #[serde(default)]
    pub updates: Vec<UpdateEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_matches: Option<Vec<DebugMatch>>,
}

impl UpdateMessage {
    /// Update carrying the elements applied by one batch.
    pub fn from_report(report: &BatchReport) -> Self {
        let updates = report
            .elements
            .iter()
            .map(|applied| UpdateEntry {
                component_name: applied.component_name.clone(),
                element_name: applied.element_name.clone(),
                relative_size_value: applied.relative_size_value,
                selector: applied.selector.clone(),
                path: Some(applied.path.clone()),
                match_pattern: applied.match_pattern.clone(),
                line_content: applied.line_content.clone(),
            })
            .collect();

        Self {
            timestamp: now_millis(),
            updated_files: report.updated_files.clone(),
            updates,
            ..Self::default()
        }
    }

    /// Payload for a client with `caps`.
    pub fn personalize(&self, caps: Capabilities, client_count: usize) -> Self {
        let mut message = Self {
            timestamp: self.timestamp,
            updated_files: self.updated_files.clone(),
            updates: if caps.details {
                self.updates.clone()
            } else {
                self.updates.iter().map(UpdateEntry::without_details).collect()
            },
            ..Self::default()
        };

        if caps.debug {
            message.server_timestamp = Some(now_millis());
            message.client_count = Some(client_count);
            message.debug_matches = Some(
                self.updates
                    .iter()
                    .map(|u| DebugMatch {
                        component_name: u.component_name.clone(),
                        element_name: u.element_name.clone(),
                        relative_size_value: u.relative_size_value,
                        path: u.path.clone().unwrap_or_default(),
                        match_pattern: u.match_pattern.clone().unwrap_or_default(),
                    })
                    .collect(),
            );
        }

        message
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    Connected {
        #[serde(rename = "serverInfo")]
        server_info: ServerInfo,
    },
    FontConfigUpdated(UpdateMessage),
    Status(Status),
    HeartbeatResponse {
        timestamp: u64,
    },
}

impl ServerMessage {
    /// Handshake ack.
    pub fn connected() -> Self {
        Self::Connected {
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                capabilities: vec![Capability::DebugMode, Capability::UpdateDetails],
            },
        }
    }

    pub fn heartbeat_response() -> Self {
        Self::HeartbeatResponse {
            timestamp: now_millis(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"font-config-updated"}"#.to_string())
    }

    pub fn from_json(s: &str) -> Result<Self, MessageError> {
        Ok(serde_json::from_str(s)?)
    }
}
