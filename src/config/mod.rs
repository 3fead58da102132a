//! Tool configuration for `font-tool.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── project    # [project]
//! │   ├── serve      # [serve]
//! │   └── client     # [client]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # ToolConfig (this file)
//! ```
//!
//! A missing config file is not an error: every section has defaults.
//! `FONT_TOOL_PORT` overrides both channel ports, CLI flags override everything.

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, is_identifier};

pub use section::{ClientConfig, ProjectConfig, ServeConfig, ServeMode};
pub use types::{ConfigError, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    log,
    utils::path::resolve_root,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable overriding `serve.port` and `client.port`.
pub const PORT_ENV: &str = "FONT_TOOL_PORT";

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing font-tool.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Absolute path to the config file, even when it does not exist
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Resolved project root (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

impl ToolConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file; the project root is
    /// resolved relative to the directory holding it.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        let found = find_config_file(&cli.config);

        let mut config = match &found {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        config.config_path = found.unwrap_or_else(|| cwd.join(&cli.config));
        let base = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);

        config.apply_env(std::env::var(PORT_ENV).ok().as_deref());
        config.apply_command_options(cli);
        config.finalize(&base);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} (ignored): {}", display_path, fields.join(", "));
    }

    /// Resolve `project.root` against `base`.
    fn finalize(&mut self, base: &Path) {
        self.root = resolve_root(&self.project.root, base);
    }

    /// Apply the `FONT_TOOL_PORT` override. Unparsable values are ignored.
    fn apply_env(&mut self, port: Option<&str>) {
        let Some(raw) = port else { return };
        match raw.trim().parse::<u16>() {
            Ok(port) => {
                self.serve.port = port;
                self.client.port = port;
            }
            Err(_) => log!("warning"; "ignoring {}={:?}: not a port number", PORT_ENV, raw),
        }
    }

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Scan { root, .. } | Commands::Apply { root, .. } | Commands::Show { root, .. } => {
                Self::update_root(&mut self.project.root, root.as_ref());
            }
            Commands::Serve {
                root,
                interface,
                port,
                control_port,
                mode,
            } => {
                Self::update_root(&mut self.project.root, root.as_ref());
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.control_port, control_port.as_ref());
                Self::update_option(&mut self.serve.mode, mode.as_ref());
            }
            Commands::Watch { host, port, debug, .. } | Commands::Status { host, port, debug } => {
                Self::update_option(&mut self.client.host, host.as_ref());
                Self::update_option(&mut self.client.port, port.as_ref());
                if *debug {
                    self.client.debug = true;
                }
            }
        }

        if self.client.debug {
            crate::logger::set_verbose(true);
        }
    }

    fn update_root(target: &mut String, value: Option<&PathBuf>) {
        if let Some(value) = value {
            *target = value.to_string_lossy().into_owned();
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Check field names and ports.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.project.field_names.is_empty() {
            return Err(ConfigError::Validation(
                "[project.field_names] must name at least one helper".into(),
            ));
        }
        if let Some(bad) = self.project.field_names.iter().find(|n| !is_identifier(n)) {
            return Err(ConfigError::Validation(format!(
                "[project.field_names] `{bad}` is not a valid identifier"
            )));
        }
        if self.project.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "[project.extensions] must list at least one extension".into(),
            ));
        }

        for (name, port) in [
            ("serve.port", self.serve.port),
            ("serve.control_port", self.serve.control_port),
            ("client.port", self.client.port),
        ] {
            if port == 0 {
                return Err(ConfigError::Validation(format!("[{name}] must be non-zero")));
            }
        }

        Ok(())
    }

    /// Recognized field names, as the locator expects them.
    pub fn field_names(&self) -> &[String] {
        &self.project.field_names
    }

    /// Extensions normalized without a leading dot.
    pub fn extensions(&self) -> Vec<String> {
        self.project
            .extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_string())
            .collect()
    }
}

/// Parse a config string for tests; panics on invalid input.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ToolConfig {
    ToolConfig::from_str(content).unwrap()
}
