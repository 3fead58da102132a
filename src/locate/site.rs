//! Site analysis: pair markers with the size calls they annotate.
//!
//! Pairing runs in four passes, each only touching what earlier passes left
//! unbound:
//!
//! 1. marker and call on the same line
//! 2. adjoining lines: markers and calls on consecutive non-blank lines form
//!    alternating chains. A chain opening with a marker pairs each marker
//!    with the call below it; a chain running call..marker pairs each marker
//!    with the call above it; a chain running call..call leaves its first
//!    call and pairs the rest downward
//! 3. upward from the marker, the JSX convention of annotating the line above
//! 4. upward from each remaining call towards a remaining marker
//!
//! Upward scans cover at most [`SCAN_LIMIT`] non-blank lines and stop at a
//! declaration, a component marker, or another anchor of the kind being
//! scanned past. Calls left unbound become sites with a placeholder name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::call::{CallMatch, CallMatcher};
use crate::marker::{self, MarkerMatch};
use crate::utils::lines::LineIndex;

/// Upward scans cover this many non-blank lines.
pub const SCAN_LIMIT: usize = 7;

/// Start of a function, class or arrow-function declaration.
static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:export\s+)?(?:default\s+)?(?:(?:async\s+)?function\b|class\s)|^\s*(?:export\s+)?(?:const|let|var)\s+\w+\s*=\s*(?:async\s*)?(?:\([^)]*\)|\w+)\s*=>",
    )
    .unwrap()
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([a-z][a-z0-9-]*)").unwrap());

static CLASS_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bclass(?:Name)?\s*=\s*["']([^"']+)["']"#).unwrap());

/// How a site was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// An `@font-tool` marker.
    Comment,
    /// A size call with no marker nearby.
    Code,
}

/// One patchable element in a file.
#[derive(Debug, Clone)]
pub struct Site {
    pub component: String,
    pub element: String,
    pub relative_size: i32,
    pub match_type: MatchType,
    pub marker: Option<MarkerMatch>,
    pub calls: Vec<CallMatch>,
    /// Marker line, or first call line for code sites.
    pub line: usize,
    /// First non-blank line after the marker.
    pub next_line: Option<String>,
    /// Comment line directly above the site.
    pub previous_comment: Option<String>,
    /// Text of the first call line.
    pub line_content: Option<String>,
}

impl Site {
    /// Every line touched by this site.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.marker
            .iter()
            .map(|m| m.line)
            .chain(self.calls.iter().map(|c| c.line))
    }

    /// `fontSize`, `fontSize+N` or `fontSize-N`.
    pub fn current_value(&self) -> String {
        match self.relative_size {
            0 => "fontSize".to_string(),
            n => format!("fontSize{n:+}"),
        }
    }

    /// CSS selector derived from the annotated JSX line.
    pub fn selector(&self) -> Option<String> {
        self.next_line
            .as_deref()
            .and_then(selector_for)
            .or_else(|| self.line_content.as_deref().and_then(selector_for))
    }

    /// Pattern the site holds once patched to `target`, for diagnostics.
    pub fn match_pattern(&self, target: i32) -> Option<String> {
        self.calls
            .first()
            .map(|call| call.render(target))
            .or_else(|| {
                self.marker
                    .as_ref()
                    .map(|m| m.marker.with_size(target).render(m.style))
            })
    }
}

/// `tag.class1.class2` from a JSX line with a literal class attribute.
pub fn selector_for(line: &str) -> Option<String> {
    let tag = TAG.captures(line)?.get(1)?.as_str();
    let mut selector = tag.to_string();
    if let Some(caps) = CLASS_LITERAL.captures(line) {
        for class in caps[1].split_whitespace() {
            selector.push('.');
            selector.push_str(class);
        }
    }
    Some(selector)
}

/// Result of analysing one file.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// File-scoped component name (component marker or file stem).
    pub component: String,
    pub sites: Vec<Site>,
}

impl Analysis {
    /// Sites for `component`/`element`, compared after trimming.
    pub fn find<'a>(&'a self, component: &str, element: &str) -> Vec<&'a Site> {
        let (component, element) = (component.trim(), element.trim());
        self.sites
            .iter()
            .filter(|site| site.component == component && site.element == element)
            .collect()
    }

    /// Sites touching any of the given lines.
    pub fn at_lines<'a>(&'a self, lines: &[usize]) -> Vec<&'a Site> {
        self.sites
            .iter()
            .filter(|site| site.lines().any(|line| lines.contains(&line)))
            .collect()
    }
}

/// Placeholder name for a site whose marker does not name an element.
pub fn placeholder_name(line: usize) -> String {
    format!("element-{line}")
}

/// Component name implied by a file name (`Card.tsx` → `Card`).
pub fn file_component(file_name: &str) -> String {
    file_name.split('.').next().unwrap_or(file_name).to_string()
}

enum Step {
    Continue,
    Found,
    Stop,
}

struct Text<'a> {
    lines: Vec<&'a str>,
}

impl<'a> Text<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().collect(),
        }
    }

    fn get(&self, line: usize) -> Option<&'a str> {
        line.checked_sub(1).and_then(|i| self.lines.get(i)).copied()
    }

    /// Visit up to `SCAN_LIMIT` non-blank lines above `from`.
    fn scan_up(&self, from: usize, mut visit: impl FnMut(usize, &str) -> Step) -> Option<usize> {
        let mut seen = 0;
        let mut line = from;
        while line > 1 && seen < SCAN_LIMIT {
            line -= 1;
            let text = self.get(line).unwrap_or_default();
            if text.trim().is_empty() {
                continue;
            }
            seen += 1;
            match visit(line, text) {
                Step::Continue => {}
                Step::Found => return Some(line),
                Step::Stop => return None,
            }
        }
        None
    }

    fn next_non_blank(&self, from: usize) -> Option<usize> {
        (from + 1..=self.lines.len()).find(|&line| {
            self.get(line)
                .is_some_and(|text| !text.trim().is_empty())
        })
    }

    fn prev_non_blank(&self, from: usize) -> Option<usize> {
        (1..from).rev().find(|&line| {
            self.get(line)
                .is_some_and(|text| !text.trim().is_empty())
        })
    }
}

fn is_comment_line(text: &str) -> bool {
    let text = text.trim_start();
    ["//", "/*", "{/*", "<!--", "*"]
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

/// Analyse `content`, using `default_component` when the file carries no
/// component marker.
pub fn analyze(content: &str, default_component: &str, matcher: &CallMatcher) -> Analysis {
    let index = LineIndex::new(content);
    let text = Text::new(content);

    let component_lines = marker::component_marker_lines(content, &index);
    let component = component_lines
        .first()
        .map_or_else(|| default_component.to_string(), |(_, name)| name.clone());
    let component_at: FxHashSet<usize> = component_lines.iter().map(|(line, _)| *line).collect();

    let markers = marker::find_markers(content, &index);
    let calls = matcher.find(content, &index);

    let mut calls_at: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, call) in calls.iter().enumerate() {
        calls_at.entry(call.line).or_default().push(i);
    }
    let marker_at: BTreeMap<usize, usize> = markers
        .iter()
        .enumerate()
        .rev()
        .map(|(i, m)| (m.line, i))
        .collect();

    let is_stop = |line: usize, text: &str| component_at.contains(&line) || DECLARATION.is_match(text);

    // binding[marker] = call line
    let mut binding: Vec<Option<usize>> = vec![None; markers.len()];
    let mut claimed: FxHashSet<usize> = FxHashSet::default();

    // 1. same line
    for (i, m) in markers.iter().enumerate() {
        if calls_at.contains_key(&m.line) && claimed.insert(m.line) {
            binding[i] = Some(m.line);
        }
    }

    // 2. adjoining lines, one alternating chain at a time
    for chain in adjoining_chains(&text, &markers, &marker_at, &calls_at, &binding, &claimed) {
        for (i, call_line) in pair_chain(&chain) {
            claimed.insert(call_line);
            binding[i] = Some(call_line);
        }
    }

    // 3. upward from markers
    for (i, m) in markers.iter().enumerate() {
        if binding[i].is_some() {
            continue;
        }
        let found = text.scan_up(m.line, |line, line_text| {
            if calls_at.contains_key(&line) {
                if claimed.contains(&line) { Step::Stop } else { Step::Found }
            } else if marker_at.contains_key(&line) || is_stop(line, line_text) {
                Step::Stop
            } else {
                Step::Continue
            }
        });
        if let Some(line) = found {
            claimed.insert(line);
            binding[i] = Some(line);
        }
    }

    // 4. upward from remaining calls
    let call_lines: Vec<usize> = calls_at.keys().copied().collect();
    for call_line in call_lines {
        if claimed.contains(&call_line) {
            continue;
        }
        let found = text.scan_up(call_line, |line, line_text| {
            if calls_at.contains_key(&line) {
                Step::Stop
            } else if let Some(&i) = marker_at.get(&line) {
                if binding[i].is_none() { Step::Found } else { Step::Stop }
            } else if is_stop(line, line_text) {
                Step::Stop
            } else {
                Step::Continue
            }
        });
        if let Some(&i) = found.and_then(|line| marker_at.get(&line)) {
            claimed.insert(call_line);
            binding[i] = Some(call_line);
        }
    }

    let calls_on = |line: Option<usize>| -> Vec<CallMatch> {
        line.and_then(|line| calls_at.get(&line))
            .map(|ids| ids.iter().map(|&i| calls[i].clone()).collect())
            .unwrap_or_default()
    };

    let mut sites = Vec::new();

    for (i, m) in markers.iter().enumerate() {
        let site_calls = calls_on(binding[i]);
        let relative_size = if m.marker.carries_size() {
            m.marker.relative_size()
        } else {
            site_calls.first().map_or(0, |call| call.size)
        };
        let site_component = m
            .marker
            .component()
            .map_or_else(|| component.clone(), str::to_string);
        let element = m
            .marker
            .element()
            .map_or_else(|| placeholder_name(m.line), str::to_string);

        sites.push(Site {
            component: site_component,
            element,
            relative_size,
            match_type: MatchType::Comment,
            line: m.line,
            next_line: text
                .next_non_blank(m.line)
                .and_then(|line| text.get(line))
                .map(|s| s.trim().to_string()),
            previous_comment: previous_comment(&text, m.line),
            line_content: binding[i]
                .and_then(|line| text.get(line))
                .map(|s| s.trim().to_string()),
            marker: Some(m.clone()),
            calls: site_calls,
        });
    }

    for &line in calls_at.keys() {
        if claimed.contains(&line) {
            continue;
        }
        let site_calls = calls_on(Some(line));
        sites.push(Site {
            component: component.clone(),
            element: placeholder_name(line),
            relative_size: site_calls.first().map_or(0, |call| call.size),
            match_type: MatchType::Code,
            line,
            next_line: None,
            previous_comment: previous_comment(&text, line),
            line_content: text.get(line).map(|s| s.trim().to_string()),
            marker: None,
            calls: site_calls,
        });
    }

    sites.sort_by_key(|site| site.line);

    Analysis { component, sites }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// Unbound marker, by index.
    Marker(usize),
    /// Unclaimed call line.
    Call(usize),
}

/// Unbound markers and unclaimed calls on consecutive non-blank lines,
/// alternating in kind.
fn adjoining_chains(
    text: &Text<'_>,
    markers: &[MarkerMatch],
    marker_at: &BTreeMap<usize, usize>,
    calls_at: &BTreeMap<usize, Vec<usize>>,
    binding: &[Option<usize>],
    claimed: &FxHashSet<usize>,
) -> Vec<Vec<(usize, Anchor)>> {
    let mut anchors: BTreeMap<usize, Anchor> = BTreeMap::new();
    for &line in calls_at.keys() {
        if !claimed.contains(&line) {
            anchors.insert(line, Anchor::Call(line));
        }
    }
    for (&line, &i) in marker_at {
        if binding[i].is_none() && !anchors.contains_key(&line) && markers[i].line == line {
            anchors.insert(line, Anchor::Marker(i));
        }
    }

    let mut chains: Vec<Vec<(usize, Anchor)>> = Vec::new();
    for (&line, &anchor) in &anchors {
        let extends = chains.last().and_then(|chain| chain.last()).is_some_and(|&(prev, kind)| {
            text.next_non_blank(prev) == Some(line)
                && matches!(
                    (kind, anchor),
                    (Anchor::Marker(_), Anchor::Call(_)) | (Anchor::Call(_), Anchor::Marker(_))
                )
        });
        match chains.last_mut() {
            Some(chain) if extends => chain.push((line, anchor)),
            _ => chains.push(vec![(line, anchor)]),
        }
    }
    chains.retain(|chain| chain.len() > 1);
    chains
}

/// `(marker index, call line)` pairs for one alternating chain.
fn pair_chain(chain: &[(usize, Anchor)]) -> Vec<(usize, usize)> {
    let opens_with_call = matches!(chain.first(), Some((_, Anchor::Call(_))));
    let closes_with_marker = matches!(chain.last(), Some((_, Anchor::Marker(_))));
    let start = usize::from(opens_with_call && !closes_with_marker);

    chain[start..]
        .chunks_exact(2)
        .filter_map(|pair| match (pair[0].1, pair[1].1) {
            (Anchor::Marker(i), Anchor::Call(line)) | (Anchor::Call(line), Anchor::Marker(i)) => {
                Some((i, line))
            }
            _ => None,
        })
        .collect()
}

fn previous_comment(text: &Text<'_>, line: usize) -> Option<String> {
    let prev = text.prev_non_blank(line)?;
    let content = text.get(prev)?;
    is_comment_line(content).then(|| content.trim().to_string())
}
