//! `[project]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [project]
//! root = "~/code/my-app"                              # React project root
//! field_names = ["getTextScaleClass", "mapLevelToPx"] # size helpers to rewrite
//! extensions = ["js", "jsx", "ts", "tsx"]             # files scanned
//! ```

use serde::{Deserialize, Serialize};

use crate::locate::DEFAULT_FIELD_NAMES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root, relative to the config file. `~` is expanded.
    pub root: String,

    /// Helper names recognized as `name(fontSize±N)`.
    pub field_names: Vec<String>,

    /// Source file extensions, without the dot.
    pub extensions: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            field_names: DEFAULT_FIELD_NAMES.iter().map(|s| s.to_string()).collect(),
            extensions: ["js", "jsx", "ts", "tsx"].iter().map(|s| s.to_string()).collect(),
        }
    }
}
