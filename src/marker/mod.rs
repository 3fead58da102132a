//! Marker grammar: `@font-tool` comments embedded in source files.
//!
//! # Forms
//!
//! | Form      | Text                                         |
//! |-----------|----------------------------------------------|
//! | full      | `@font-tool: Card - Title - fontSize+2`      |
//! | element   | `@font-tool: Title` (size implicit 0)        |
//! | size      | `@font-tool: +2`                             |
//! | component | `@font-tool组件: Card` (file-scoped default) |
//!
//! Each form may sit inside any of the four comment families:
//! `{/* */}`, `<!-- -->`, `//`, `/* */`.
//!
//! Parsing always tries the full form first. Trying the element form first
//! would cut a full marker at its first hyphen.

mod pattern;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::utils::lines::LineIndex;

pub use pattern::KEYWORD;

/// Base pixel size used by the pixel-mapping helper.
pub const BASE_FONT_PX: i32 = 13;

/// Levels accepted by the pixel-mapping helper; others are clamped.
pub const LEVEL_MIN: i32 = -2;
pub const LEVEL_MAX: i32 = 15;

/// Map a relative size level to pixels, clamping to `[LEVEL_MIN, LEVEL_MAX]`.
pub fn map_level_to_px(level: i32) -> i32 {
    BASE_FONT_PX + level.clamp(LEVEL_MIN, LEVEL_MAX)
}

// ============================================================================
// Marker
// ============================================================================

/// A parsed element marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "form", rename_all = "lowercase")]
pub enum Marker {
    Full {
        component: String,
        element: String,
        size: i32,
    },
    Element {
        element: String,
    },
    Size {
        size: i32,
    },
}

impl Marker {
    pub fn full(component: impl Into<String>, element: impl Into<String>, size: i32) -> Self {
        Self::Full {
            component: component.into(),
            element: element.into(),
            size,
        }
    }

    pub fn component(&self) -> Option<&str> {
        match self {
            Self::Full { component, .. } => Some(component),
            _ => None,
        }
    }

    pub fn element(&self) -> Option<&str> {
        match self {
            Self::Full { element, .. } | Self::Element { element } => Some(element),
            Self::Size { .. } => None,
        }
    }

    /// Relative size carried by the marker (element form is implicitly 0).
    pub fn relative_size(&self) -> i32 {
        match self {
            Self::Full { size, .. } | Self::Size { size } => *size,
            Self::Element { .. } => 0,
        }
    }

    /// Whether the marker text encodes a size that must follow the code.
    pub fn carries_size(&self) -> bool {
        !matches!(self, Self::Element { .. })
    }

    /// Same marker with a different size. Element-form markers carry no size
    /// and are returned unchanged.
    pub fn with_size(&self, size: i32) -> Self {
        match self {
            Self::Full {
                component, element, ..
            } => Self::full(component.clone(), element.clone(), size),
            Self::Size { .. } => Self::Size { size },
            Self::Element { .. } => self.clone(),
        }
    }

    /// Marker body without comment delimiters.
    pub fn render_body(&self, colon: Colon) -> String {
        let c = colon.as_str();
        match self {
            Self::Full {
                component,
                element,
                size,
            } => format!("@font-tool{c} {component} - {element} - fontSize{size:+}"),
            Self::Element { element } => format!("@font-tool{c} {element}"),
            Self::Size { size } => format!("@font-tool{c} {size:+}"),
        }
    }

    /// Full comment text in the given style.
    pub fn render(&self, style: MarkerStyle) -> String {
        style.delimiter.wrap(&self.render_body(style.colon))
    }
}

/// Parse marker text (a bare body or a whole comment).
///
/// Returns `None` when no `@font-tool` keyword is present or no form matches.
pub fn parse(text: &str) -> Option<Marker> {
    parse_with_range(text).map(|(marker, _)| marker)
}

/// Like [`parse`], also returning the byte range of the marker body within
/// `text`. Prose around the body inside the same comment is not part of it.
fn parse_with_range(text: &str) -> Option<(Marker, Range<usize>)> {
    if !pattern::KEYWORD.is_match(text) {
        return None;
    }

    if let Some(caps) = pattern::FULL.captures(text) {
        let component = caps[1].trim();
        let element = caps[2].trim();
        if let Some(size) = parse_signed(&caps[3])
            && !component.is_empty()
            && !element.is_empty()
        {
            let range = caps.get(0)?.range();
            return Some((Marker::full(component, element, size), range));
        }
    }

    if let Some(caps) = pattern::ELEMENT.captures(text) {
        let name = caps.get(1)?;
        let element = name.as_str().trim();
        if !element.is_empty() && !pattern::NUMERIC.is_match(element) {
            let end = name.start() + name.as_str().trim_end().len();
            let marker = Marker::Element {
                element: element.to_string(),
            };
            return Some((marker, caps.get(0)?.start()..end));
        }
    }

    let caps = pattern::SIZE.captures(text)?;
    let size = parse_signed(&caps[1])?;
    Some((Marker::Size { size }, caps.get(0)?.range()))
}

/// Parse the file-scoped component name marker.
pub fn parse_component(text: &str) -> Option<String> {
    let caps = pattern::COMPONENT.captures(text)?;
    let name = caps[1].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Parse `+2`, `-3`, `4`, `- 1`.
pub fn parse_signed(text: &str) -> Option<i32> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.strip_prefix('+').unwrap_or(&compact).parse().ok()
}

// ============================================================================
// Style
// ============================================================================

/// Comment delimiter family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    /// `{/* ... */}` (JSX)
    Brace,
    /// `<!-- ... -->`
    Html,
    /// `// ...`
    Line,
    /// `/* ... */`
    Block,
}

impl Delimiter {
    pub const ALL: [Self; 4] = [Self::Brace, Self::Html, Self::Line, Self::Block];

    pub fn wrap(self, body: &str) -> String {
        match self {
            Self::Brace => format!("{{/* {body} */}}"),
            Self::Html => format!("<!-- {body} -->"),
            Self::Line => format!("// {body}"),
            Self::Block => format!("/* {body} */"),
        }
    }

    /// Family of the first comment in `text`.
    pub fn detect(text: &str) -> Option<Self> {
        pattern::COMMENT
            .captures(text)
            .map(|caps| Self::from_group(&caps))
    }

    fn from_group(caps: &regex::Captures<'_>) -> Self {
        if caps.get(1).is_some() {
            Self::Brace
        } else if caps.get(2).is_some() {
            Self::Html
        } else if caps.get(3).is_some() {
            Self::Block
        } else {
            Self::Line
        }
    }
}

/// Colon variant following the keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colon {
    #[default]
    Ascii,
    FullWidth,
}

impl Colon {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascii => ":",
            Self::FullWidth => "：",
        }
    }

    pub fn detect(text: &str) -> Self {
        match pattern::KEYWORD.find(text) {
            Some(m) if m.as_str().ends_with('：') => Self::FullWidth,
            _ => Self::Ascii,
        }
    }
}

/// How a marker is written: which comment family and which colon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub delimiter: Delimiter,
    pub colon: Colon,
}

impl MarkerStyle {
    pub const fn new(delimiter: Delimiter) -> Self {
        Self {
            delimiter,
            colon: Colon::Ascii,
        }
    }
}

// ============================================================================
// Markers in content
// ============================================================================

/// A marker located in file content.
#[derive(Debug, Clone)]
pub struct MarkerMatch {
    pub marker: Marker,
    pub style: MarkerStyle,
    /// Byte range of the marker body (`@font-tool...`); comment delimiters
    /// and prose sharing the comment are outside it.
    pub span: Range<usize>,
    /// 1-based line of the marker body.
    pub line: usize,
}

impl MarkerMatch {
    /// Replacement for [`MarkerMatch::span`] describing `marker`, keeping the
    /// original colon. Delimiters and surrounding prose stay untouched.
    pub fn rewrite(&self, marker: &Marker) -> String {
        marker.render_body(self.style.colon)
    }
}

/// Find every element marker in `content`, in source order.
pub fn find_markers(content: &str, lines: &LineIndex) -> Vec<MarkerMatch> {
    pattern::COMMENT
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(4).or_else(|| caps.get(0))?;
            let text = whole.as_str();
            let (marker, body) = parse_with_range(text)?;
            let span = whole.start() + body.start..whole.start() + body.end;
            Some(MarkerMatch {
                marker,
                style: MarkerStyle {
                    delimiter: Delimiter::from_group(&caps),
                    colon: Colon::detect(text),
                },
                line: lines.line_of(span.start),
                span,
            })
        })
        .collect()
}

/// Lines (1-based) holding a component marker, in source order.
pub fn component_marker_lines(content: &str, lines: &LineIndex) -> Vec<(usize, String)> {
    pattern::COMPONENT
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps[1].trim();
            (!name.is_empty()).then(|| (lines.line_of(whole.start()), name.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Marker> {
        vec![
            Marker::full("Card", "Title", 2),
            Marker::full("Card", "Body Text", -1),
            Marker::full("Nav", "Link", 0),
            Marker::Element {
                element: "Subtitle".to_string(),
            },
            Marker::Size { size: 3 },
            Marker::Size { size: -2 },
            Marker::Size { size: 0 },
        ]
    }

    #[test]
    fn test_render_parse_render_is_stable() {
        for marker in samples() {
            for delimiter in Delimiter::ALL {
                for colon in [Colon::Ascii, Colon::FullWidth] {
                    let style = MarkerStyle { delimiter, colon };
                    let rendered = marker.render(style);
                    let parsed = parse(&rendered).expect(&rendered);
                    assert_eq!(parsed.render(style), rendered);
                    assert_eq!(Delimiter::detect(&rendered), Some(delimiter));
                    assert_eq!(Colon::detect(&rendered), colon);
                }
            }
        }
    }

    #[test]
    fn test_full_form_takes_precedence() {
        let marker = parse("@font-tool: A - B - fontSize+2").unwrap();
        assert_eq!(marker, Marker::full("A", "B", 2));
        assert_eq!(marker.component(), Some("A"));
        assert_eq!(marker.element(), Some("B"));
    }

    #[test]
    fn test_element_form() {
        let marker = parse("{/* @font-tool: Title */}").unwrap();
        assert_eq!(marker.element(), Some("Title"));
        assert_eq!(marker.component(), None);
        assert_eq!(marker.relative_size(), 0);
    }

    #[test]
    fn test_size_form_not_read_as_element() {
        assert_eq!(parse("// @font-tool: +4"), Some(Marker::Size { size: 4 }));
        assert_eq!(parse("// @font-tool: -2"), Some(Marker::Size { size: -2 }));
        assert_eq!(parse("<!-- @font-tool: 7 -->"), Some(Marker::Size { size: 7 }));
    }

    #[test]
    fn test_keyword_required() {
        assert_eq!(parse("// just a comment"), None);
        assert_eq!(parse("// @font-tool组件: Card"), None);
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let marker = parse("// @Font-Tool: Card - Title - fontSize-1").unwrap();
        assert_eq!(marker, Marker::full("Card", "Title", -1));
    }

    #[test]
    fn test_fullwidth_colon() {
        let marker = parse("{/* @font-tool：卡片 - 标题 - fontSize+1 */}").unwrap();
        assert_eq!(marker, Marker::full("卡片", "标题", 1));
    }

    #[test]
    fn test_size_is_unbounded_at_parse_time() {
        let marker = parse("// @font-tool: Card - Title - fontSize+40").unwrap();
        assert_eq!(marker.relative_size(), 40);
    }

    #[test]
    fn test_map_level_to_px_clamps() {
        assert_eq!(map_level_to_px(0), 13);
        assert_eq!(map_level_to_px(2), 15);
        assert_eq!(map_level_to_px(-5), 11);
        assert_eq!(map_level_to_px(40), 28);
    }

    #[test]
    fn test_parse_component() {
        assert_eq!(parse_component("// @font-tool组件: Card"), Some("Card".into()));
        assert_eq!(parse_component("// @font-tool: Card"), None);
    }

    #[test]
    fn test_parse_signed() {
        assert_eq!(parse_signed("+2"), Some(2));
        assert_eq!(parse_signed("- 3"), Some(-3));
        assert_eq!(parse_signed("5"), Some(5));
        assert_eq!(parse_signed("x"), None);
    }

    #[test]
    fn test_with_size() {
        assert_eq!(
            Marker::full("A", "B", 1).with_size(3),
            Marker::full("A", "B", 3)
        );
        assert_eq!(Marker::Size { size: 1 }.with_size(-1), Marker::Size { size: -1 });
        let element = Marker::Element {
            element: "T".into(),
        };
        assert_eq!(element.with_size(5), element);
    }

    #[test]
    fn test_find_markers_in_content() {
        let content = "\
export function Card() {
  return (
    <div>
      {/* @font-tool: Card - Title - fontSize+1 */}
      <h2>Title</h2>
      <!-- @font-tool: Subtitle -->
      // not a marker
    </div>
  );
}
";
        let lines = LineIndex::new(content);
        let found = find_markers(content, &lines);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].line, 4);
        assert_eq!(found[0].style.delimiter, Delimiter::Brace);
        assert_eq!(
            &content[found[0].span.clone()],
            "@font-tool: Card - Title - fontSize+1"
        );
        assert_eq!(found[1].line, 6);
        assert_eq!(found[1].style.delimiter, Delimiter::Html);
    }

    #[test]
    fn test_rewrite_keeps_style() {
        let content = "<!-- @font-tool：A - B - fontSize+1 -->";
        let lines = LineIndex::new(content);
        let found = find_markers(content, &lines);
        let new = found[0].rewrite(&found[0].marker.with_size(-2));
        assert_eq!(new, "@font-tool： A - B - fontSize-2");
        assert_eq!(&content[found[0].span.clone()], "@font-tool：A - B - fontSize+1");
    }

    #[test]
    fn test_body_excludes_surrounding_prose() {
        let content = "\
/** Card heading, keep in sync with the design tokens.
 * @font-tool: Card - Title - fontSize+1 */
// @font-tool: Card - Body - fontSize+0 trailing note
{/* @font-tool: Subtitle  */}
";
        let lines = LineIndex::new(content);
        let found = find_markers(content, &lines);
        assert_eq!(found.len(), 3);

        assert_eq!(&content[found[0].span.clone()], "@font-tool: Card - Title - fontSize+1");
        assert_eq!(found[0].style.delimiter, Delimiter::Block);
        assert_eq!(found[0].line, 2);

        assert_eq!(&content[found[1].span.clone()], "@font-tool: Card - Body - fontSize+0");
        assert_eq!(&content[found[2].span.clone()], "@font-tool: Subtitle");
    }

    #[test]
    fn test_component_marker_lines() {
        let content = "// @font-tool组件: Card\nconst a = 1;\n/* @font-tool组件: Other */\n";
        let lines = LineIndex::new(content);
        let found = component_marker_lines(content, &lines);
        assert_eq!(found, vec![(1, "Card".to_string()), (3, "Other".to_string())]);
    }
}
