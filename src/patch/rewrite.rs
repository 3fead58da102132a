//! Text edits for one element.
//!
//! Edits only ever replace a marker body or a call expression; the rest of
//! the file, including comment delimiters and prose, is kept byte for byte.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::locate::Site;

/// `data-font-tool="+2"` style attribute emitted by the class helper.
static DATA_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data-font-tool\s*=\s*["']([+-]?\s*\d+)["']"#).unwrap());

/// One replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

/// Edits needed to bring `sites` to `target`. Empty when already current.
pub fn plan(sites: &[&Site], target: i32) -> Vec<Edit> {
    let mut edits = Vec::new();

    for site in sites {
        if let Some(found) = &site.marker
            && found.marker.carries_size()
            && found.marker.relative_size() != target
        {
            edits.push(Edit {
                span: found.span.clone(),
                replacement: found.rewrite(&found.marker.with_size(target)),
            });
        }

        for call in &site.calls {
            if call.size != target {
                edits.push(Edit {
                    span: call.span.clone(),
                    replacement: call.render(target),
                });
            }
        }
    }

    edits.sort_by_key(|edit| edit.span.start);
    edits.dedup_by_key(|edit| edit.span.start);
    edits
}

/// Apply non-overlapping edits sorted by position.
pub fn apply(content: &str, edits: &[Edit]) -> String {
    let mut out = String::with_capacity(content.len() + 16 * edits.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.span.start < cursor {
            continue;
        }
        out.push_str(&content[cursor..edit.span.start]);
        out.push_str(&edit.replacement);
        cursor = edit.span.end;
    }
    out.push_str(&content[cursor..]);
    out
}

/// Whether a `data-font-tool` attribute already encodes `target`.
pub fn has_data_attribute(content: &str, target: i32) -> bool {
    DATA_ATTRIBUTE.captures_iter(content).any(|caps| {
        crate::marker::parse_signed(&caps[1]) == Some(target)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locate::{CallMatcher, DEFAULT_FIELD_NAMES, analyze};

    fn sites_for(content: &str) -> Vec<Site> {
        analyze(content, "Card", &CallMatcher::new(DEFAULT_FIELD_NAMES)).sites
    }

    #[test]
    fn test_plan_marker_and_call() {
        let content = "{/* @font-tool: Card - Title - fontSize+1 */}\n<h2 className={getTextScaleClass(fontSize+1)}>T</h2>\n";
        let sites = sites_for(content);
        let refs: Vec<&Site> = sites.iter().collect();
        let edits = plan(&refs, 3);
        assert_eq!(edits.len(), 2);
        let out = apply(content, &edits);
        assert_eq!(
            out,
            "{/* @font-tool: Card - Title - fontSize+3 */}\n<h2 className={getTextScaleClass(fontSize+3)}>T</h2>\n"
        );
    }

    #[test]
    fn test_plan_is_empty_when_current() {
        let content = "// @font-tool: Card - Title - fontSize+2\nconst s = mapLevelToPx(fontSize+2);\n";
        let sites = sites_for(content);
        let refs: Vec<&Site> = sites.iter().collect();
        assert!(plan(&refs, 2).is_empty());
    }

    #[test]
    fn test_zero_renders_bare() {
        let content = "// @font-tool: Title\nconst s = mapLevelToPx(fontSize-1);\n";
        let sites = sites_for(content);
        let refs: Vec<&Site> = sites.iter().collect();
        let out = apply(content, &plan(&refs, 0));
        assert_eq!(out, "// @font-tool: Title\nconst s = mapLevelToPx(fontSize);\n");
    }

    #[test]
    fn test_apply_keeps_surroundings() {
        let content = "abc XYZ def";
        let edits = vec![Edit {
            span: 4..7,
            replacement: "xy".into(),
        }];
        assert_eq!(apply(content, &edits), "abc xy def");
    }

    #[test]
    fn test_data_attribute() {
        let content = r#"<p className="text-[15px]" data-font-tool="+2">x</p>"#;
        assert!(has_data_attribute(content, 2));
        assert!(!has_data_attribute(content, 3));
    }
}
