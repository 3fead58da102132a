//! `font-tool scan`

use anyhow::Result;

use super::print_json;
use crate::config::ToolConfig;
use crate::log;
use crate::workspace::Workspace;

pub fn run_scan(config: &ToolConfig, pretty: bool) -> Result<()> {
    let workspace = Workspace::from_config(config);
    if !workspace.root().is_dir() {
        log!("warning"; "project root {} is not a directory", workspace.root().display());
    }

    let report = workspace.scan();
    print_json(&report, pretty)
}
