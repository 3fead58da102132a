//! Editor consumer: reports every `@font-tool` comment in updated files as a
//! highlight range that expires after five seconds.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::Consumer;
use crate::marker::KEYWORD;
use crate::reload::message::ServerMessage;
use crate::{debug, log};

pub const HIGHLIGHT_TTL: Duration = Duration::from_secs(5);

/// One highlighted marker. `line` is 1-based; columns are 0-based character
/// offsets, `end_col` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRange {
    pub file: PathBuf,
    pub line: usize,
    pub start_col: usize,
    pub end_col: usize,
}

/// Marker positions in `content`: `(line, start_col, end_col)`.
///
/// The range runs to the comment close on the same line, else to line end.
pub fn marker_ranges(content: &str) -> Vec<(usize, usize, usize)> {
    let mut out = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        for m in KEYWORD.find_iter(line) {
            let rest = &line[m.start()..];
            let end = [("*/", 2), ("-->", 3)]
                .iter()
                .filter_map(|(close, len)| rest.find(close).map(|i| m.start() + i + len))
                .min()
                .unwrap_or(line.len());

            out.push((
                idx + 1,
                line[..m.start()].chars().count(),
                line[..end].chars().count(),
            ));
        }
    }
    out
}

pub struct EditorConsumer {
    root: PathBuf,
    active: Vec<(HighlightRange, Instant)>,
}

impl EditorConsumer {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            active: Vec::new(),
        }
    }

    /// Ranges still shown.
    pub fn active(&self) -> impl Iterator<Item = &HighlightRange> {
        self.active.iter().map(|(range, _)| range)
    }

    fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn highlight(&mut self, file: &str, now: Instant) {
        let path = self.resolve(file);
        let Ok(content) = fs::read_to_string(&path) else {
            debug!("editor"; "skipping {}: not readable", path.display());
            return;
        };

        for (line, start_col, end_col) in marker_ranges(&content) {
            log!("editor"; "{}:{}:{}", path.display(), line, start_col + 1);
            self.active.push((
                HighlightRange {
                    file: path.clone(),
                    line,
                    start_col,
                    end_col,
                },
                now + HIGHLIGHT_TTL,
            ));
        }
    }
}

impl Consumer for EditorConsumer {
    fn on_message(&mut self, msg: ServerMessage, now: Instant) {
        match msg {
            ServerMessage::FontConfigUpdated(update) => {
                log!("editor"; "font config updated ({} file(s))", update.updated_files.len());
                for file in &update.updated_files {
                    self.highlight(file, now);
                }
            }
            other => debug!("editor"; "ignoring {:?}", other),
        }
    }

    fn tick(&mut self, now: Instant) {
        let before = self.active.len();
        self.active.retain(|(_, expires_at)| *expires_at > now);
        if self.active.len() != before {
            debug!("editor"; "cleared {} highlight(s)", before - self.active.len());
        }
    }
}
