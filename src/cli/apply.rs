//! `font-tool apply`
//!
//! Patches sources locally. Nothing is broadcast: a running `serve` only
//! notifies clients for batches it applied itself.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};

use super::print_json;
use crate::config::ToolConfig;
use crate::patch::ApplyRequest;
use crate::workspace::Workspace;

/// Apply the request read from `input` (`-` for stdin).
///
/// `root_override` drops the request's own `projectDir`.
pub fn run_apply(config: &ToolConfig, input: &Path, root_override: bool, json: bool) -> Result<()> {
    let raw = read_input(input)?;
    let mut request = ApplyRequest::from_json(&raw)
        .with_context(|| format!("invalid apply request in {}", describe(input)))?;
    if root_override {
        request.project_dir = None;
    }

    let report = Workspace::from_config(config).apply(&request);
    if json {
        print_json(&report, true)
    } else {
        report.display_status();
        Ok(())
    }
}

fn read_input(input: &Path) -> Result<String> {
    if is_stdin(input) {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read apply request from stdin")?;
        return Ok(raw);
    }

    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn is_stdin(input: &Path) -> bool {
    input.as_os_str() == "-"
}

fn describe(input: &Path) -> String {
    if is_stdin(input) {
        "stdin".to_string()
    } else {
        input.display().to_string()
    }
}
