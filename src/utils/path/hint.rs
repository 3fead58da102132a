//! `file:line` hints.
//!
//! Element records carry a `path` like `Card.tsx:12` (sometimes with a
//! directory prefix, sometimes with several comma-separated lines). The hint
//! only helps re-find the file; it is never trusted as ground truth.

/// Parsed `file:line[,line...]` hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHint {
    /// Bare file name (directory prefix removed).
    pub file_name: String,
    /// 1-based lines, possibly empty.
    pub lines: Vec<usize>,
}

impl PathHint {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (file_part, lines) = match raw.rsplit_once(':') {
            Some((file, tail)) if Self::is_line_list(tail) => (file, Self::parse_lines(tail)),
            _ => (raw, Vec::new()),
        };

        let file_name = file_part
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(file_part)
            .to_string();

        Self { file_name, lines }
    }

    /// First hinted line, if any.
    pub fn line(&self) -> Option<usize> {
        self.lines.first().copied()
    }

    fn is_line_list(tail: &str) -> bool {
        !tail.is_empty()
            && tail
                .split(',')
                .all(|part| !part.trim().is_empty() && part.trim().bytes().all(|b| b.is_ascii_digit()))
    }

    fn parse_lines(tail: &str) -> Vec<usize> {
        tail.split(',')
            .filter_map(|part| part.trim().parse().ok())
            .filter(|&line| line > 0)
            .collect()
    }
}
