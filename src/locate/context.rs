//! Source context around requested lines of a component file.
//!
//! Each requested line gets a window of [`CONTEXT_RADIUS`] lines either side;
//! markers within [`MARKER_REACH`] lines of a window are listed with it.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::file::find_file;
use crate::marker::{Marker, find_markers};
use crate::utils::lines::LineIndex;
use crate::utils::path::PathHint;

pub const CONTEXT_RADIUS: usize = 5;
pub const MARKER_REACH: usize = 3;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("file `{0}` not found under the project root")]
    NotFound(String),

    #[error("no valid line numbers in {0:?}")]
    NoLines(Vec<usize>),

    #[error("failed to read `{0}`")]
    Io(PathBuf, #[source] io::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextLine {
    pub number: usize,
    pub text: String,
    pub target: bool,
    pub marker: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyMarker {
    pub line: usize,
    pub marker: Marker,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub line: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub lines: Vec<ContextLine>,
    pub markers: Vec<NearbyMarker>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowReport {
    pub file: PathBuf,
    pub contexts: Vec<Context>,
}

/// Locate `file` (a name or a `name:line,line` hint) and cut contexts.
///
/// Lines from the hint and `lines` are merged; lines past the end of the
/// file are dropped.
pub fn show_context(root: &Path, file: &str, lines: &[usize]) -> Result<ShowReport, ContextError> {
    let hint = PathHint::parse(file);
    let mut wanted = hint.lines.clone();
    wanted.extend(lines.iter().copied().filter(|&l| l > 0));
    wanted.sort_unstable();
    wanted.dedup();

    let path = find_file(root, &hint.file_name)
        .ok_or_else(|| ContextError::NotFound(hint.file_name.clone()))?;
    let content = fs::read_to_string(&path).map_err(|e| ContextError::Io(path.clone(), e))?;

    let contexts = build_contexts(&content, &wanted);
    if contexts.is_empty() {
        return Err(ContextError::NoLines(wanted));
    }

    Ok(ShowReport {
        file: path,
        contexts,
    })
}

fn build_contexts(content: &str, wanted: &[usize]) -> Vec<Context> {
    let text_lines: Vec<&str> = content.lines().collect();
    let markers = find_markers(content, &LineIndex::new(content));

    wanted
        .iter()
        .copied()
        .filter(|&line| line <= text_lines.len())
        .map(|line| {
            let start_line = line.saturating_sub(CONTEXT_RADIUS).max(1);
            let end_line = (line + CONTEXT_RADIUS).min(text_lines.len());

            let nearby: Vec<NearbyMarker> = markers
                .iter()
                .filter(|m| m.line + MARKER_REACH >= start_line && m.line <= end_line + MARKER_REACH)
                .map(|m| NearbyMarker {
                    line: m.line,
                    marker: m.marker.clone(),
                })
                .collect();

            let lines = (start_line..=end_line)
                .map(|number| ContextLine {
                    number,
                    text: text_lines[number - 1].to_string(),
                    target: number == line,
                    marker: nearby.iter().any(|m| m.line == number),
                })
                .collect();

            Context {
                line,
                start_line,
                end_line,
                lines,
                markers: nearby,
            }
        })
        .collect()
}
