//! Live DOM updater: applies `font-config-updated` messages to a page.
//!
//! Timers are deadlines; the owner calls [`LiveUpdater::tick`] to expire
//! highlights and the toast.

use std::time::{Duration, Instant};

use super::locate::{Candidate, Locator, MatchKind, Query};
use super::page::{NodeId, Page};
use crate::config::ClientConfig;
use crate::debug;
use crate::reload::message::UpdateMessage;

/// Set on every element the updater restyled.
pub const UPDATED_ATTR: &str = "data-font-tool-updated";
pub const HIGHLIGHT_COLOR: &str = "#fffacd";

/// Sample size of the unmatched-page report.
const REPORT_SAMPLE: usize = 20;

/// Events the page's own code may observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    /// Payload-less "sizes changed, re-read them" notification.
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Restyled {
    pub node: NodeId,
    pub kind: MatchKind,
    pub font_px: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyOutcome {
    pub restyled: Vec<Restyled>,
    /// The global refresh path ran.
    pub fallback: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdaterSettings {
    pub base_px: i32,
    pub highlight: Duration,
    pub toast: Duration,
}

impl Default for UpdaterSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for UpdaterSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            base_px: config.base_px,
            highlight: config.highlight(),
            toast: config.toast(),
        }
    }
}

struct Highlight {
    node: NodeId,
    original: Option<String>,
    expires_at: Instant,
}

pub struct LiveUpdater {
    locator: Locator,
    settings: UpdaterSettings,
    highlights: Vec<Highlight>,
    toast: Option<Toast>,
    events: Vec<PageEvent>,
}

impl LiveUpdater {
    pub fn new(settings: UpdaterSettings) -> Self {
        Self::with_locator(settings, Locator::default())
    }

    pub fn with_locator(settings: UpdaterSettings, locator: Locator) -> Self {
        Self {
            locator,
            settings,
            highlights: Vec::new(),
            toast: None,
            events: Vec::new(),
        }
    }

    /// Restyle every element located for `update`; fall back to a global
    /// refresh when nothing matched or the update carries no entries.
    pub fn apply(&mut self, page: &mut Page, update: &UpdateMessage, now: Instant) -> ApplyOutcome {
        let mut restyled = Vec::new();

        for entry in &update.updates {
            if entry.component_name.is_empty() || entry.element_name.is_empty() {
                debug!("dom"; "skipping update without component or element name");
                continue;
            }

            let candidates = self.locator.locate(page, &Query::Element(entry.into()));
            debug!(
                "dom"; "{} - {}: {} element(s)",
                entry.component_name, entry.element_name, candidates.len()
            );
            for candidate in candidates {
                let level = candidate.relative_size.unwrap_or(entry.relative_size_value);
                restyled.extend(self.restyle(page, &candidate, level, now));
            }
        }

        if !update.updates.is_empty() && restyled.is_empty() {
            report_unmatched(page);
        }

        let fallback = restyled.is_empty();
        if fallback {
            self.events.push(PageEvent::Refresh);
            restyled = self.sweep(page, now);
        }

        let message = if fallback {
            "font sizes refreshed".to_string()
        } else {
            format!("font sizes updated ({} element(s))", restyled.len())
        };
        self.toast = Some(Toast {
            message,
            expires_at: now + self.settings.toast,
        });

        ApplyOutcome { restyled, fallback }
    }

    /// Marker-attribute sweep of the global refresh.
    fn sweep(&mut self, page: &mut Page, now: Instant) -> Vec<Restyled> {
        let candidates = self.locator.locate(page, &Query::Refresh {
            base_px: self.settings.base_px,
        });

        candidates
            .iter()
            .filter(|c| c.kind == MatchKind::DataAttribute)
            .filter_map(|c| {
                let level = c.relative_size?;
                self.restyle(page, c, level, now)
            })
            .collect()
    }

    fn restyle(
        &mut self,
        page: &mut Page,
        candidate: &Candidate,
        level: i32,
        now: Instant,
    ) -> Option<Restyled> {
        let font_px = self.settings.base_px + level;
        let element = page.element_mut(candidate.node)?;

        element.set_style("font-size", &format!("{font_px}px"));
        element.set_attr(UPDATED_ATTR, "true");

        let expires_at = now + self.settings.highlight;
        match self.highlights.iter_mut().find(|h| h.node == candidate.node) {
            Some(existing) => existing.expires_at = expires_at,
            None => self.highlights.push(Highlight {
                node: candidate.node,
                original: element.style("background-color"),
                expires_at,
            }),
        }
        element.set_style("background-color", HIGHLIGHT_COLOR);
        element.set_style("transition", "background-color 1s");

        Some(Restyled {
            node: candidate.node,
            kind: candidate.kind,
            font_px,
        })
    }

    /// Expire highlights and the toast whose deadline passed.
    pub fn tick(&mut self, page: &mut Page, now: Instant) {
        self.highlights.retain(|h| {
            if h.expires_at > now {
                return true;
            }
            if let Some(element) = page.element_mut(h.node) {
                match &h.original {
                    Some(color) => element.set_style("background-color", color),
                    None => element.remove_style("background-color"),
                }
            }
            false
        });

        if self.toast.as_ref().is_some_and(|t| t.expires_at <= now) {
            self.toast = None;
        }
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    /// Highlights still waiting for their deadline.
    pub fn pending_highlights(&self) -> usize {
        self.highlights.len()
    }

    /// Next deadline, if any timer is running.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.highlights
            .iter()
            .map(|h| h.expires_at)
            .chain(self.toast.as_ref().map(|t| t.expires_at))
            .min()
    }

    /// Drain dispatched page events.
    pub fn take_events(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Verbose report when an update matched nothing.
fn report_unmatched(page: &Page) {
    if !crate::logger::is_verbose() {
        return;
    }

    let comments = page.comments();
    debug!("dom"; "no element matched; {} comment(s) on the page", comments.len());
    for (i, (_, body)) in comments.iter().enumerate() {
        debug!("dom"; "  comment {}: {}", i + 1, body.trim());
    }

    let sample = page
        .elements_by_tag(&["p", "h1", "h2", "h3", "h4", "h5", "h6", "div", "span"])
        .filter(|&id| !page.text_content(id).trim().is_empty())
        .take(REPORT_SAMPLE);
    for id in sample {
        let tag = page.element(id).map_or("", |e| e.tag.as_str());
        let text: String = page.text_content(id).trim().chars().take(20).collect();
        debug!("dom"; "  <{}> {:?} {}px", tag, text, page.computed_font_size(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::message::UpdateEntry;

    const PAGE: &str = r#"<div data-component="Card"><!-- @font-tool: Title --><h2 style="background-color: white">Title</h2><span data-font-tool="+4">x</span></div>"#;

    fn entry(component: &str, element: &str, size: i32) -> UpdateEntry {
        UpdateEntry {
            component_name: component.into(),
            element_name: element.into(),
            relative_size_value: size,
            selector: None,
            path: None,
            match_pattern: None,
            line_content: None,
        }
    }

    fn update(updates: Vec<UpdateEntry>) -> UpdateMessage {
        UpdateMessage {
            updates,
            ..UpdateMessage::default()
        }
    }

    #[test]
    fn test_specific_update_restyles() {
        let mut page = Page::parse(PAGE).unwrap();
        let mut updater = LiveUpdater::new(UpdaterSettings::default());
        let now = Instant::now();

        let outcome = updater.apply(&mut page, &update(vec![entry("Card", "Title", 3)]), now);
        assert!(!outcome.fallback);
        assert!(updater.take_events().is_empty());

        let h2 = page.select("h2")[0];
        let element = page.element(h2).unwrap();
        assert_eq!(element.style("font-size").as_deref(), Some("13px"));
        assert_eq!(element.attr(UPDATED_ATTR), Some("true"));
        assert_eq!(element.style("background-color").as_deref(), Some(HIGHLIGHT_COLOR));
        assert!(outcome.restyled.iter().all(|r| r.font_px == 13));
    }

    #[test]
    fn test_empty_updates_fall_back_exactly_once() {
        let mut page = Page::parse(PAGE).unwrap();
        let mut updater = LiveUpdater::new(UpdaterSettings::default());

        let outcome = updater.apply(&mut page, &update(Vec::new()), Instant::now());
        assert!(outcome.fallback);
        assert_eq!(updater.take_events(), [PageEvent::Refresh]);

        // marker-attribute sweep: 10 + 4
        assert_eq!(outcome.restyled.len(), 1);
        assert_eq!(outcome.restyled[0].font_px, 14);
        assert_eq!(outcome.restyled[0].kind, MatchKind::DataAttribute);
    }

    #[test]
    fn test_unmatched_updates_fall_back() {
        let mut page = Page::parse(PAGE).unwrap();
        let mut updater = LiveUpdater::new(UpdaterSettings::default());

        let outcome = updater.apply(&mut page, &update(vec![entry("Nav", "Logo", 1)]), Instant::now());
        assert!(outcome.fallback);
        assert_eq!(updater.take_events(), [PageEvent::Refresh]);
    }

    #[test]
    fn test_tick_restores_highlight_and_drops_toast() {
        let mut page = Page::parse(PAGE).unwrap();
        let mut updater = LiveUpdater::new(UpdaterSettings::default());
        let now = Instant::now();

        updater.apply(&mut page, &update(vec![entry("Card", "Title", 1)]), now);
        assert!(updater.toast().is_some());
        assert!(updater.pending_highlights() > 0);
        assert_eq!(updater.next_deadline(), Some(now + Duration::from_secs(1)));

        updater.tick(&mut page, now + Duration::from_millis(500));
        assert!(updater.pending_highlights() > 0);

        updater.tick(&mut page, now + Duration::from_secs(1));
        assert_eq!(updater.pending_highlights(), 0);
        assert!(updater.toast().is_some());

        let h2 = page.select("h2")[0];
        let div = page.select("div")[0];
        assert_eq!(
            page.element(h2).unwrap().style("background-color").as_deref(),
            Some("white")
        );
        assert_eq!(page.element(div).unwrap().style("background-color"), None);

        updater.tick(&mut page, now + Duration::from_secs(3));
        assert!(updater.toast().is_none());
        assert_eq!(updater.next_deadline(), None);
    }

    #[test]
    fn test_custom_base_px() {
        let mut page = Page::parse(PAGE).unwrap();
        let settings = UpdaterSettings {
            base_px: 13,
            ..UpdaterSettings::default()
        };
        let mut updater = LiveUpdater::new(settings);
        let outcome = updater.apply(&mut page, &update(vec![entry("Card", "Title", -1)]), Instant::now());
        assert!(outcome.restyled.iter().all(|r| r.font_px == 12));
    }
}
