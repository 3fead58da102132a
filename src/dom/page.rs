//! Owned page model built from an HTML snapshot.
//!
//! `tl` parses the snapshot; the result is copied into an arena of nodes so
//! that styles can be mutated and the page written back out.

use std::iter;

use thiserror::Error;

use crate::utils::html::{is_raw_text_element, is_void_element, quote_attr, unescape};

/// Font size with no inline style and no tag default.
pub const DEFAULT_FONT_PX: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to parse HTML: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, Option<String>)>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    /// Attribute value; boolean attributes read as `""`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = Some(value.into());
        match self.attrs.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn class_name(&self) -> &str {
        self.attr("class").unwrap_or("")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_name().split_whitespace()
    }

    /// Value of one inline style property.
    pub fn style(&self, property: &str) -> Option<String> {
        declarations(self.attr("style")?)
            .into_iter()
            .rev()
            .find(|(name, _)| name.eq_ignore_ascii_case(property))
            .map(|(_, value)| value)
    }

    /// Set one inline style property, keeping the others in place.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut decls = self.attr("style").map(declarations).unwrap_or_default();
        match decls.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(property)) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attr("style", render_declarations(&decls));
    }

    pub fn remove_style(&mut self, property: &str) {
        let Some(style) = self.attr("style") else {
            return;
        };
        let mut decls = declarations(style);
        decls.retain(|(name, _)| !name.eq_ignore_ascii_case(property));
        if decls.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", render_declarations(&decls));
        }
    }

    /// Inline `font-size` in pixels.
    pub fn inline_font_size(&self) -> Option<f32> {
        self.style("font-size").as_deref().and_then(parse_px)
    }
}

fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn render_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// `"13px"` → `13.0`. Other units are not resolved.
pub fn parse_px(value: &str) -> Option<f32> {
    value.trim().strip_suffix("px")?.trim().parse().ok()
}

/// User-agent default size for tags that change it.
fn tag_font_size(tag: &str) -> Option<f32> {
    match tag {
        "h1" => Some(32.0),
        "h2" => Some(24.0),
        "h3" => Some(19.0),
        "h4" => Some(16.0),
        "h5" | "small" => Some(13.0),
        "h6" => Some(11.0),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Page {
    pub fn parse(html: &str) -> Result<Self, PageError> {
        let dom = tl::parse(html, tl::ParserOptions::default())
            .map_err(|e| PageError::Parse(format!("{e:?}")))?;
        let parser = dom.parser();

        let mut page = Self::default();
        for handle in dom.children() {
            if let Some(id) = page.import(*handle, parser, None) {
                page.roots.push(id);
            }
        }
        Ok(page)
    }

    fn import(
        &mut self,
        handle: tl::NodeHandle,
        parser: &tl::Parser,
        parent: Option<NodeId>,
    ) -> Option<NodeId> {
        let node = handle.get(parser)?;

        let (kind, child_handles) = match node {
            tl::Node::Tag(tag) => {
                let mut element = Element::new(tag.name().as_utf8_str().to_lowercase());
                for (key, value) in tag.attributes().iter() {
                    let key_str: &str = key.as_ref();
                    element
                        .attrs
                        .push((key_str.to_string(), value.map(|v| v.to_string())));
                }
                let children: Vec<_> = tag.children().top().iter().copied().collect();
                (NodeKind::Element(element), children)
            }
            tl::Node::Raw(bytes) => (NodeKind::Text(bytes.as_utf8_str().into_owned()), Vec::new()),
            tl::Node::Comment(bytes) => {
                let raw = bytes.as_utf8_str();
                let raw: &str = &raw;
                let body = raw.strip_prefix("<!--").unwrap_or(raw);
                let body = body.strip_suffix("-->").unwrap_or(body);
                (NodeKind::Comment(body.to_string()), Vec::new())
            }
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent,
            children: Vec::new(),
        });

        let children = child_handles
            .into_iter()
            .filter_map(|child| self.import(child, parser, Some(id)))
            .collect();
        self.nodes[id.0].children = children;

        Some(id)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes.get_mut(id.0)?.kind {
            NodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0)?.parent
    }

    /// `id` and then each ancestor up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(Some(id), |&node| self.parent(node))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id.0).map_or(&[], |n| &n.children)
    }

    /// The next sibling that is an element, skipping text and comments.
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = match self.parent(id) {
            Some(parent) => self.children(parent),
            None => &self.roots,
        };
        let pos = siblings.iter().position(|&s| s == id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|&s| self.element(s).is_some())
    }

    /// All nodes in document order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// All elements in document order.
    pub fn elements(&self) -> Vec<NodeId> {
        self.nodes()
            .into_iter()
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    pub fn elements_by_tag<'a>(&'a self, tags: &'a [&str]) -> impl Iterator<Item = NodeId> + 'a {
        self.elements()
            .into_iter()
            .filter(move |&id| self.element(id).is_some_and(|e| tags.contains(&e.tag.as_str())))
    }

    /// Comment bodies in document order.
    pub fn comments(&self) -> Vec<(NodeId, &str)> {
        self.nodes()
            .into_iter()
            .filter_map(|id| match self.kind(id)? {
                NodeKind::Comment(body) => Some((id, body.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Text nodes outside script/style, decoded.
    pub fn text_nodes(&self) -> Vec<(NodeId, String)> {
        self.nodes()
            .into_iter()
            .filter(|&id| !self.in_raw_text(id))
            .filter_map(|id| match self.kind(id)? {
                NodeKind::Text(text) => Some((id, unescape(text).into_owned())),
                _ => None,
            })
            .collect()
    }

    fn in_raw_text(&self, id: NodeId) -> bool {
        self.parent(id)
            .and_then(|p| self.element(p))
            .is_some_and(|e| is_raw_text_element(&e.tag))
    }

    /// Concatenated decoded text below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) if !self.in_raw_text(id) => out.push_str(&unescape(text)),
            Some(NodeKind::Element(_)) => {
                for &child in self.children(id) {
                    self.collect_text(child, out);
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // Style
    // ========================================================================

    /// Nearest inline `font-size` on the element or an ancestor, else the tag
    /// default, else 16px.
    pub fn computed_font_size(&self, id: NodeId) -> f32 {
        for node in self.ancestors(id) {
            let Some(element) = self.element(node) else {
                continue;
            };
            if let Some(px) = element.inline_font_size() {
                return px;
            }
            if let Some(px) = tag_font_size(&element.tag) {
                return px;
            }
        }
        DEFAULT_FONT_PX
    }

    /// No `hidden` attribute and no `display: none` up the tree.
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.ancestors(id).filter_map(|n| self.element(n)).all(|e| {
            !e.has_attr("hidden")
                && e.style("display").is_none_or(|d| !d.eq_ignore_ascii_case("none"))
        })
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    /// Simple compound selectors only: `tag`, `.class`, `#id`, `tag.a.b`.
    pub fn matches_selector(&self, id: NodeId, selector: &str) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        let Some(parsed) = SimpleSelector::parse(selector) else {
            return false;
        };

        parsed.tag.is_none_or(|t| element.tag.eq_ignore_ascii_case(t))
            && parsed.id.is_none_or(|i| element.attr("id") == Some(i))
            && parsed
                .classes
                .iter()
                .all(|c| element.classes().any(|have| have == *c))
    }

    pub fn select(&self, selector: &str) -> Vec<NodeId> {
        self.elements()
            .into_iter()
            .filter(|&id| self.matches_selector(id, selector))
            .collect()
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.write_node(root, &mut out);
        }
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Element(element)) => {
                out.push('<');
                out.push_str(&element.tag);
                for (key, value) in &element.attrs {
                    out.push(' ');
                    out.push_str(key);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        out.push_str(&quote_attr(value));
                        out.push('"');
                    }
                }
                out.push('>');

                if is_void_element(&element.tag) || element.tag.starts_with('!') {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag);
                out.push('>');
            }
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Comment(body)) => {
                out.push_str("<!--");
                out.push_str(body);
                out.push_str("-->");
            }
            None => {}
        }
    }
}

struct SimpleSelector<'a> {
    tag: Option<&'a str>,
    id: Option<&'a str>,
    classes: Vec<&'a str>,
}

impl<'a> SimpleSelector<'a> {
    fn parse(selector: &'a str) -> Option<Self> {
        let selector = selector.trim();
        if selector.is_empty() || selector.contains([' ', '>', '[', ':', ',']) {
            return None;
        }

        let mut parts = selector.split('.');
        let head = parts.next().unwrap_or("");
        let classes: Vec<&str> = parts.filter(|c| !c.is_empty()).collect();

        let (tag, id) = match head.split_once('#') {
            Some((tag, id)) => (tag, Some(id)),
            None => (head, None),
        };
        let tag = (!tag.is_empty()).then_some(tag);

        (tag.is_some() || id.is_some() || !classes.is_empty()).then_some(Self { tag, id, classes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = r#"<div class="card" data-component="Card" style="font-size: 14px"><!-- @font-tool: Title --><h2 class="title text-lg">Title &amp; Co</h2><p>Body <b>bold</b></p><span hidden>gone</span></div>"#;

    fn first(page: &Page, selector: &str) -> NodeId {
        page.select(selector)[0]
    }

    #[test]
    fn test_roundtrip_keeps_structure() {
        let page = Page::parse(HTML).unwrap();
        let again = Page::parse(&page.to_html()).unwrap();
        assert_eq!(again.elements().len(), page.elements().len());
        assert_eq!(again.comments().len(), 1);
    }

    #[test]
    fn test_comments_and_siblings() {
        let page = Page::parse(HTML).unwrap();
        let comments = page.comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].1.trim(), "@font-tool: Title");

        let next = page.next_element_sibling(comments[0].0).unwrap();
        assert_eq!(page.element(next).unwrap().tag, "h2");
    }

    #[test]
    fn test_text_content_decodes() {
        let page = Page::parse(HTML).unwrap();
        let h2 = first(&page, "h2");
        assert_eq!(page.text_content(h2), "Title & Co");
        let p = first(&page, "p");
        assert_eq!(page.text_content(p), "Body bold");
    }

    #[test]
    fn test_computed_font_size() {
        let page = Page::parse(HTML).unwrap();
        assert_eq!(page.computed_font_size(first(&page, "div")), 14.0);
        // tag default beats the inherited size
        assert_eq!(page.computed_font_size(first(&page, "h2")), 24.0);
        // inherited from the div
        assert_eq!(page.computed_font_size(first(&page, "b")), 14.0);

        let bare = Page::parse("<section><em>x</em></section>").unwrap();
        assert_eq!(bare.computed_font_size(first(&bare, "em")), DEFAULT_FONT_PX);
    }

    #[test]
    fn test_visibility() {
        let page = Page::parse(HTML).unwrap();
        assert!(page.is_visible(first(&page, "p")));
        assert!(!page.is_visible(first(&page, "span")));

        let page = Page::parse(r#"<div style="display:none"><p>x</p></div>"#).unwrap();
        assert!(!page.is_visible(first(&page, "p")));
    }

    #[test]
    fn test_set_style_replaces_in_place() {
        let mut page = Page::parse(r#"<p style="color: red; font-size: 12px">x</p>"#).unwrap();
        let p = first(&page, "p");
        let element = page.element_mut(p).unwrap();
        element.set_style("font-size", "13px");
        element.set_style("background-color", "#fffacd");
        assert_eq!(
            element.attr("style"),
            Some("color: red; font-size: 13px; background-color: #fffacd")
        );

        element.remove_style("color");
        element.remove_style("background-color");
        assert_eq!(element.attr("style"), Some("font-size: 13px"));
        element.remove_style("font-size");
        assert!(!element.has_attr("style"));
    }

    #[test]
    fn test_selectors() {
        let page = Page::parse(HTML).unwrap();
        let h2 = first(&page, "h2");
        assert!(page.matches_selector(h2, "h2.title"));
        assert!(page.matches_selector(h2, ".title.text-lg"));
        assert!(!page.matches_selector(h2, "h2.subtitle"));
        assert!(!page.matches_selector(h2, "div h2"));
        assert_eq!(page.select("div.card").len(), 1);
    }

    #[test]
    fn test_parse_px() {
        assert_eq!(parse_px("13px"), Some(13.0));
        assert_eq!(parse_px(" 12.5px "), Some(12.5));
        assert_eq!(parse_px("1.2em"), None);
    }
}
