//! Configuration section definitions.
//!
//! Each module corresponds to a section in `font-tool.toml`:
//!
//! | Module    | TOML Section | Purpose                                  |
//! |-----------|--------------|------------------------------------------|
//! | `project` | `[project]`  | Project root, field names, extensions    |
//! | `serve`   | `[serve]`    | Notification channel and control API     |
//! | `client`  | `[client]`   | Consumers: reconnect, base size, timers  |

mod client;
mod project;
mod serve;

pub use client::ClientConfig;
pub use project::ProjectConfig;
pub use serve::{ServeConfig, ServeMode};
