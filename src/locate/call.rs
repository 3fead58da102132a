//! Recognized size-call patterns.
//!
//! A call is `name(fontSize)`, `name(fontSize+N)` or `name(fontSize-N)` where
//! `name` is one of the configured field names. Two fixed wrappers are
//! recognized even when their helper is not configured:
//!
//! - `text-[${mapLevelToPx(fontSize+1)}px]` (also `getFontSize`)
//! - `` fontSize: `${mapLevelToPx(fontSize+1)}px` ``

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::utils::lines::LineIndex;

/// Default field names recognized in source.
pub const DEFAULT_FIELD_NAMES: &[&str] = &["getTextScaleClass", "mapLevelToPx"];

/// Argument part shared by every call pattern.
const ARG: &str = r"\(\s*fontSize\s*(?:(?P<sign>[+-])\s*(?P<num>\d+))?\s*\)";

static WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"text-\[\$\{{(?P<call>(?P<name>mapLevelToPx|getFontSize){ARG})\}}px\]"
    ))
    .unwrap()
});

static TEMPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"fontSize\s*:\s*`\$\{{(?P<call>(?P<name>mapLevelToPx){ARG})\}}px`"
    ))
    .unwrap()
});

/// Which pattern recognized a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallKind {
    /// A configured field name.
    Field,
    /// `text-[${..}px]` wrapper.
    Wrapper,
    /// `` fontSize: `${..}px` `` template literal.
    Template,
}

/// One size call found in content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallMatch {
    pub kind: CallKind,
    pub name: String,
    /// Encoded relative size (`fontSize` alone is 0).
    pub size: i32,
    /// Byte range of `name(...)`.
    pub span: Range<usize>,
    /// 1-based line.
    pub line: usize,
}

impl CallMatch {
    /// Canonical text of this call for `size`.
    pub fn render(&self, size: i32) -> String {
        render_call(&self.name, size)
    }
}

/// `name(fontSize)` for 0, `name(fontSize+N)` / `name(fontSize-N)` otherwise.
pub fn render_call(name: &str, size: i32) -> String {
    match size {
        0 => format!("{name}(fontSize)"),
        n => format!("{name}(fontSize{n:+})"),
    }
}

/// Matcher for a set of field names plus the fixed wrappers.
#[derive(Debug, Clone)]
pub struct CallMatcher {
    fields: Option<Regex>,
}

impl CallMatcher {
    pub fn new<S: AsRef<str>>(field_names: &[S]) -> Self {
        let alternatives: Vec<String> = field_names
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .map(regex::escape)
            .collect();

        let fields = (!alternatives.is_empty()).then(|| {
            let pattern = format!(
                r"\b(?P<call>(?P<name>{}){ARG})",
                alternatives.join("|")
            );
            Regex::new(&pattern)
        });

        Self {
            fields: fields.and_then(Result::ok),
        }
    }

    /// Every call in `content`, sorted by position, one entry per span.
    pub fn find(&self, content: &str, lines: &LineIndex) -> Vec<CallMatch> {
        let mut found: Vec<CallMatch> = Vec::new();

        let mut collect = |re: &Regex, kind: CallKind| {
            for caps in re.captures_iter(content) {
                if let Some(call) = extract(&caps, kind, lines) {
                    found.push(call);
                }
            }
        };

        collect(&*WRAPPER, CallKind::Wrapper);
        collect(&*TEMPLATE, CallKind::Template);
        if let Some(fields) = &self.fields {
            collect(fields, CallKind::Field);
        }

        // Fixed wrappers were collected first, so they win on shared spans.
        found.sort_by_key(|call| call.span.start);
        found.dedup_by_key(|call| call.span.start);
        found
    }

    /// Whether a line contains any recognized call.
    pub fn is_call_line(&self, line: &str) -> bool {
        WRAPPER.is_match(line)
            || TEMPLATE.is_match(line)
            || self.fields.as_ref().is_some_and(|re| re.is_match(line))
    }
}

fn extract(caps: &Captures<'_>, kind: CallKind, lines: &LineIndex) -> Option<CallMatch> {
    let call = caps.name("call")?;
    let name = caps.name("name")?.as_str().to_string();
    let size = match (caps.name("sign"), caps.name("num")) {
        (Some(sign), Some(num)) => {
            let n: i32 = num.as_str().parse().ok()?;
            if sign.as_str() == "-" { -n } else { n }
        }
        _ => 0,
    };

    Some(CallMatch {
        kind,
        name,
        size,
        span: call.range(),
        line: lines.line_of(call.start()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(content: &str) -> Vec<CallMatch> {
        let lines = LineIndex::new(content);
        CallMatcher::new(DEFAULT_FIELD_NAMES).find(content, &lines)
    }

    #[test]
    fn test_field_calls() {
        let found = find("a(getTextScaleClass(fontSize+2))\nb(mapLevelToPx( fontSize - 1 ))\nc(mapLevelToPx(fontSize))");
        assert_eq!(found.len(), 3);
        assert_eq!((found[0].size, found[0].line), (2, 1));
        assert_eq!(found[0].name, "getTextScaleClass");
        assert_eq!((found[1].size, found[1].line), (-1, 2));
        assert_eq!((found[2].size, found[2].line), (0, 3));
    }

    #[test]
    fn test_template_literal_is_one_call() {
        let content = "style={{fontSize: `${mapLevelToPx(fontSize+1)}px`}}";
        let found = find(content);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, CallKind::Template);
        assert_eq!(&content[found[0].span.clone()], "mapLevelToPx(fontSize+1)");
    }

    #[test]
    fn test_wrapper_without_configured_name() {
        let content = "className={`text-[${getFontSize(fontSize-2)}px]`}";
        let lines = LineIndex::new(content);
        let found = CallMatcher::new(&["customHelper"]).find(content, &lines);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, CallKind::Wrapper);
        assert_eq!(found[0].size, -2);
    }

    #[test]
    fn test_custom_field_names() {
        let content = "scale(fontSize+3) mapLevelToPx(fontSize+1)";
        let lines = LineIndex::new(content);
        let found = CallMatcher::new(&["scale"]).find(content, &lines);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "scale");
    }

    #[test]
    fn test_word_boundary() {
        assert!(find("xmapLevelToPx(fontSize+1)").is_empty());
    }

    #[test]
    fn test_render_call_zero_is_bare() {
        assert_eq!(render_call("mapLevelToPx", 0), "mapLevelToPx(fontSize)");
        assert_eq!(render_call("mapLevelToPx", 3), "mapLevelToPx(fontSize+3)");
        assert_eq!(render_call("mapLevelToPx", -2), "mapLevelToPx(fontSize-2)");
    }

    #[test]
    fn test_is_call_line() {
        let matcher = CallMatcher::new(DEFAULT_FIELD_NAMES);
        assert!(matcher.is_call_line("  getTextScaleClass(fontSize)"));
        assert!(!matcher.is_call_line("  <h2>Title</h2>"));
    }
}
