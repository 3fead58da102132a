//! DOM-side locator.
//!
//! Every strategy implements [`CandidateProducer`]. A [`Locator`] runs all
//! producers for the query kind (no short-circuit), then [`dedup`] keeps the
//! best-scoring candidate per element.

use rustc_hash::FxHashSet;
use serde::Serialize;

use super::page::{NodeId, Page};
use crate::marker::{self, KEYWORD};
use crate::reload::message::UpdateEntry;

/// Component-identifying attribute.
pub const COMPONENT_ATTR: &str = "data-component";
/// Explicit size-marker attribute (`data-font-tool="+2"`).
pub const SIZE_ATTR: &str = "data-font-tool";

/// Tags considered by the text-element heuristic.
const TEXT_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "li", "label", "button",
];

/// Class-name fragments hinting at a sized text element.
const CLASS_HINTS: &[&str] = &["text-", "title", "heading", "label", "font"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    ComponentAttributeWithText,
    ComponentAttribute,
    CommentSibling,
    Selector,
    TextContent,
    DataAttribute,
    InlineStyle,
    FontSizeStyle,
    TextElement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: NodeId,
    pub kind: MatchKind,
    /// Size to apply; `None` when the strategy cannot tell.
    pub relative_size: Option<i32>,
    pub score: f32,
}

/// One update entry to place on the page.
#[derive(Debug, Clone, Copy)]
pub struct ElementQuery<'a> {
    pub component: &'a str,
    pub element: &'a str,
    pub relative_size: i32,
    pub selector: Option<&'a str>,
}

impl<'a> From<&'a UpdateEntry> for ElementQuery<'a> {
    fn from(entry: &'a UpdateEntry) -> Self {
        Self {
            component: &entry.component_name,
            element: &entry.element_name,
            relative_size: entry.relative_size_value,
            selector: entry.selector.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Query<'a> {
    /// A specific `{componentName, elementName}` pair.
    Element(ElementQuery<'a>),
    /// No specific update; `base_px` turns sizes back into levels.
    Refresh { base_px: i32 },
}

pub trait CandidateProducer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Candidates for `query`; producers ignore queries of the other kind.
    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate>;
}

/// Ordered producer chains for both query kinds.
pub struct Locator {
    element: Vec<Box<dyn CandidateProducer>>,
    refresh: Vec<Box<dyn CandidateProducer>>,
}

impl Default for Locator {
    fn default() -> Self {
        Self {
            element: vec![
                Box::new(ComponentAttribute),
                Box::new(CommentSibling),
                Box::new(TextContent),
                Box::new(SelectorMatch),
            ],
            refresh: vec![
                Box::new(DataAttribute),
                Box::new(InlineStyle),
                Box::new(FontSizeStyle),
                Box::new(TextElement),
            ],
        }
    }
}

impl Locator {
    pub fn empty() -> Self {
        Self {
            element: Vec::new(),
            refresh: Vec::new(),
        }
    }

    pub fn with_element(mut self, producer: impl CandidateProducer + 'static) -> Self {
        self.element.push(Box::new(producer));
        self
    }

    pub fn with_refresh(mut self, producer: impl CandidateProducer + 'static) -> Self {
        self.refresh.push(Box::new(producer));
        self
    }

    /// Ranked, deduplicated candidates.
    pub fn locate(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let chain = match query {
            Query::Element(_) => &self.element,
            Query::Refresh { .. } => &self.refresh,
        };

        let mut candidates = Vec::new();
        for producer in chain {
            let found = producer.produce(page, query);
            crate::debug!("dom"; "{}: {} candidate(s)", producer.name(), found.len());
            candidates.extend(found);
        }
        dedup(candidates)
    }
}

/// Sort by score, descending, and keep the first candidate per element.
///
/// The sort is stable, so equal scores keep producer order.
pub fn dedup(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut seen = FxHashSet::default();
    candidates.retain(|c| seen.insert(c.node));
    candidates
}

/// Sizes a designer is unlikely to pick by hand.
pub fn is_non_default_size(px: f32) -> bool {
    let n = px.trunc() as i32;
    n % 2 != 0 || !(10..=20).contains(&n)
}

// ============================================================================
// Element strategies
// ============================================================================

/// `data-component="<componentName>"`: 0.9 when the text mentions the
/// element, 0.8 otherwise.
pub struct ComponentAttribute;

impl CandidateProducer for ComponentAttribute {
    fn name(&self) -> &'static str {
        "component-attribute"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let Query::Element(q) = query else {
            return Vec::new();
        };

        page.elements()
            .into_iter()
            .filter(|&id| page.element(id).and_then(|e| e.attr(COMPONENT_ATTR)) == Some(q.component))
            .map(|id| {
                let with_text = page.text_content(id).contains(q.element);
                Candidate {
                    node: id,
                    kind: if with_text {
                        MatchKind::ComponentAttributeWithText
                    } else {
                        MatchKind::ComponentAttribute
                    },
                    relative_size: Some(q.relative_size),
                    score: if with_text { 0.9 } else { 0.8 },
                }
            })
            .collect()
    }
}

/// The element right after a `@font-tool` comment naming the element.
pub struct CommentSibling;

impl CandidateProducer for CommentSibling {
    fn name(&self) -> &'static str {
        "comment-sibling"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let Query::Element(q) = query else {
            return Vec::new();
        };

        page.comments()
            .into_iter()
            .filter(|(_, body)| KEYWORD.is_match(body) && body.contains(q.element))
            .filter_map(|(id, _)| page.next_element_sibling(id))
            .map(|node| Candidate {
                node,
                kind: MatchKind::CommentSibling,
                relative_size: Some(q.relative_size),
                score: 0.85,
            })
            .collect()
    }
}

/// Text equal to the element name: parent 0.7, grandparent 0.6,
/// great-grandparent 0.5.
pub struct TextContent;

impl CandidateProducer for TextContent {
    fn name(&self) -> &'static str {
        "text-content"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let Query::Element(q) = query else {
            return Vec::new();
        };

        let mut out = Vec::new();
        for (text_node, text) in page.text_nodes() {
            if text.trim() != q.element {
                continue;
            }
            let wrappers = page.ancestors(text_node).skip(1).take(3);
            for (node, score) in wrappers.zip([0.7, 0.6, 0.5]) {
                out.push(Candidate {
                    node,
                    kind: MatchKind::TextContent,
                    relative_size: Some(q.relative_size),
                    score,
                });
            }
        }
        out
    }
}

/// Elements matching the selector derived from the marker's next line.
pub struct SelectorMatch;

impl CandidateProducer for SelectorMatch {
    fn name(&self) -> &'static str {
        "selector"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let Query::Element(ElementQuery {
            selector: Some(selector),
            relative_size,
            ..
        }) = query
        else {
            return Vec::new();
        };

        page.select(selector)
            .into_iter()
            .map(|node| Candidate {
                node,
                kind: MatchKind::Selector,
                relative_size: Some(*relative_size),
                score: 0.75,
            })
            .collect()
    }
}

// ============================================================================
// Refresh strategies
// ============================================================================

/// `data-font-tool="<±N>"`.
pub struct DataAttribute;

impl CandidateProducer for DataAttribute {
    fn name(&self) -> &'static str {
        "data-attribute"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        if !matches!(query, Query::Refresh { .. }) {
            return Vec::new();
        }

        page.elements()
            .into_iter()
            .filter_map(|id| {
                let value = page.element(id)?.attr(SIZE_ATTR)?;
                Some(Candidate {
                    node: id,
                    kind: MatchKind::DataAttribute,
                    relative_size: marker::parse_signed(value),
                    score: 0.95,
                })
            })
            .collect()
    }
}

/// Inline `font-size` in pixels.
pub struct InlineStyle;

impl CandidateProducer for InlineStyle {
    fn name(&self) -> &'static str {
        "inline-style"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let Query::Refresh { base_px } = *query else {
            return Vec::new();
        };

        page.elements()
            .into_iter()
            .filter_map(|id| {
                let px = page.element(id)?.inline_font_size()?;
                Some(Candidate {
                    node: id,
                    kind: MatchKind::InlineStyle,
                    relative_size: Some(px.trunc() as i32 - base_px),
                    score: 0.9,
                })
            })
            .collect()
    }
}

/// Visible text whose computed size looks computed rather than designed.
pub struct FontSizeStyle;

impl CandidateProducer for FontSizeStyle {
    fn name(&self) -> &'static str {
        "font-size-style"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        let Query::Refresh { base_px } = *query else {
            return Vec::new();
        };

        page.elements()
            .into_iter()
            .filter(|&id| page.is_visible(id) && !page.text_content(id).trim().is_empty())
            .filter_map(|id| {
                let px = page.computed_font_size(id);
                is_non_default_size(px).then(|| {
                    let n = px.trunc() as i32;
                    Candidate {
                        node: id,
                        kind: MatchKind::FontSizeStyle,
                        relative_size: (10..=25).contains(&n).then(|| n - base_px),
                        score: 0.85,
                    }
                })
            })
            .collect()
    }
}

/// Headings, paragraphs, buttons and labels, scored 0.5 to 0.8.
pub struct TextElement;

impl TextElement {
    fn score(page: &Page, id: NodeId) -> f32 {
        let mut score = 0.5;
        if is_non_default_size(page.computed_font_size(id)) {
            score += 0.2;
        }
        let class_name = page.element(id).map_or("", |e| e.class_name());
        if CLASS_HINTS.iter().any(|hint| class_name.contains(hint)) {
            score += 0.1;
        }
        if !page.text_content(id).trim().is_empty() {
            score += 0.1;
        }
        score
    }
}

impl CandidateProducer for TextElement {
    fn name(&self) -> &'static str {
        "text-element"
    }

    fn produce(&self, page: &Page, query: &Query<'_>) -> Vec<Candidate> {
        if !matches!(query, Query::Refresh { .. }) {
            return Vec::new();
        }

        page.elements_by_tag(TEXT_TAGS)
            .map(|id| Candidate {
                node: id,
                kind: MatchKind::TextElement,
                relative_size: None,
                score: Self::score(page, id),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<main>
<div data-component="Card" class="card">
  <!-- @font-tool: Title -->
  <h2 class="title">Title</h2>
  <p class="body">Body text</p>
</div>
<div data-component="Nav"><a>Home</a></div>
</main>"#;

    fn query<'a>(component: &'a str, element: &'a str) -> Query<'a> {
        Query::Element(ElementQuery {
            component,
            element,
            relative_size: 3,
            selector: None,
        })
    }

    fn tag(page: &Page, c: &Candidate) -> String {
        page.element(c.node).unwrap().tag.clone()
    }

    #[test]
    fn test_dedup_keeps_best_score() {
        let node = Page::parse("<p>x</p>").unwrap().elements()[0];
        let make = |score, kind| Candidate {
            node,
            kind,
            relative_size: None,
            score,
        };
        let kept = dedup(vec![
            make(0.5, MatchKind::TextElement),
            make(0.95, MatchKind::DataAttribute),
            make(0.7, MatchKind::TextContent),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 0.95);
        assert_eq!(kept[0].kind, MatchKind::DataAttribute);
    }

    #[test]
    fn test_element_chain_ranks_candidates() {
        let page = Page::parse(PAGE).unwrap();
        let found = Locator::default().locate(&page, &query("Card", "Title"));

        // div: component + text 0.9 beats its wrapper score 0.6
        // h2: comment sibling 0.85 beats text 0.7
        assert_eq!(tag(&page, &found[0]), "div");
        assert_eq!(found[0].kind, MatchKind::ComponentAttributeWithText);
        assert_eq!(found[0].score, 0.9);

        assert_eq!(tag(&page, &found[1]), "h2");
        assert_eq!(found[1].kind, MatchKind::CommentSibling);

        assert_eq!(tag(&page, &found[2]), "main");
        assert_eq!(found.len(), 3);

        let nodes: Vec<_> = found.iter().map(|c| c.node).collect();
        let unique: FxHashSet<_> = nodes.iter().collect();
        assert_eq!(unique.len(), nodes.len());
        assert!(found.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(found.iter().all(|c| c.relative_size == Some(3)));
    }

    #[test]
    fn test_component_attribute_without_text() {
        let page = Page::parse(PAGE).unwrap();
        let found = ComponentAttribute.produce(&page, &query("Nav", "Title"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, 0.8);
        assert_eq!(found[0].kind, MatchKind::ComponentAttribute);
    }

    #[test]
    fn test_text_content_requires_exact_text() {
        let page = Page::parse(PAGE).unwrap();
        assert!(TextContent.produce(&page, &query("X", "Body")).is_empty());

        let found = TextContent.produce(&page, &query("X", "Body text"));
        let scores: Vec<f32> = found.iter().map(|c| c.score).collect();
        assert_eq!(scores, [0.7, 0.6, 0.5]);
        assert_eq!(tag(&page, &found[0]), "p");
    }

    #[test]
    fn test_selector_strategy() {
        let page = Page::parse(PAGE).unwrap();
        let q = Query::Element(ElementQuery {
            component: "X",
            element: "Y",
            relative_size: -1,
            selector: Some("p.body"),
        });
        let found = SelectorMatch.produce(&page, &q);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].score, 0.75);
        assert_eq!(found[0].relative_size, Some(-1));
    }

    #[test]
    fn test_refresh_chain() {
        let page = Page::parse(
            r#"<div><span data-font-tool="+2">a</span><p style="font-size: 15px">b</p><label class="label">c</label></div>"#,
        )
        .unwrap();
        let found = Locator::default().locate(&page, &Query::Refresh { base_px: 10 });

        assert_eq!(found[0].kind, MatchKind::DataAttribute);
        assert_eq!(found[0].relative_size, Some(2));
        assert_eq!(found[1].kind, MatchKind::InlineStyle);
        assert_eq!(found[1].relative_size, Some(5));

        let label = found.iter().find(|c| tag(&page, c) == "label").unwrap();
        // 16px default (+0), class hint (+0.1), text (+0.1)
        assert!((label.score - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_chains_ignore_other_queries() {
        let page = Page::parse(PAGE).unwrap();
        assert!(DataAttribute.produce(&page, &query("Card", "Title")).is_empty());
        assert!(ComponentAttribute
            .produce(&page, &Query::Refresh { base_px: 10 })
            .is_empty());
    }

    #[test]
    fn test_custom_producer() {
        struct Everything;
        impl CandidateProducer for Everything {
            fn name(&self) -> &'static str {
                "everything"
            }
            fn produce(&self, page: &Page, _: &Query<'_>) -> Vec<Candidate> {
                page.elements()
                    .into_iter()
                    .map(|node| Candidate {
                        node,
                        kind: MatchKind::Selector,
                        relative_size: None,
                        score: 0.1,
                    })
                    .collect()
            }
        }

        let page = Page::parse("<div><p>a</p></div>").unwrap();
        let found = Locator::empty().with_element(Everything).locate(&page, &query("A", "B"));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_non_default_size() {
        assert!(is_non_default_size(13.0));
        assert!(is_non_default_size(24.0));
        assert!(is_non_default_size(8.0));
        assert!(!is_non_default_size(16.0));
        assert!(!is_non_default_size(10.0));
    }
}
