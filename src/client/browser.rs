//! Browser consumer: keeps an HTML snapshot restyled with every update.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use super::Consumer;
use crate::dom::{LiveUpdater, Page, PageEvent, UpdaterSettings};
use crate::reload::message::ServerMessage;
use crate::{debug, log};

pub struct BrowserConsumer {
    page: Page,
    path: PathBuf,
    write: bool,
    updater: LiveUpdater,
}

impl BrowserConsumer {
    pub fn open(path: &Path, write: bool, settings: UpdaterSettings) -> Result<Self> {
        let html = fs::read_to_string(path)
            .with_context(|| format!("failed to read page `{}`", path.display()))?;
        let page = Page::parse(&html)?;
        Ok(Self {
            page,
            path: path.to_path_buf(),
            write,
            updater: LiveUpdater::new(settings),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    fn write_back(&self) {
        if !self.write {
            return;
        }
        if let Err(e) = fs::write(&self.path, self.page.to_html()) {
            log!("error"; "failed to write `{}`: {}", self.path.display(), e);
        }
    }
}

impl Consumer for BrowserConsumer {
    fn on_connected(&mut self) {
        log!("client"; "restyling {}", self.path.display());
    }

    fn on_message(&mut self, msg: ServerMessage, now: Instant) {
        let update = match msg {
            ServerMessage::FontConfigUpdated(update) => update,
            ServerMessage::Connected { server_info } => {
                debug!("client"; "server {} {}", server_info.name, server_info.version);
                return;
            }
            other => {
                debug!("client"; "ignoring {:?}", other);
                return;
            }
        };

        let outcome = self.updater.apply(&mut self.page, &update, now);
        for event in self.updater.take_events() {
            match event {
                PageEvent::Refresh => debug!("client"; "dispatched refresh event"),
            }
        }
        if outcome.fallback {
            log!("client"; "no element matched, refreshed {} marked element(s)", outcome.restyled.len());
        } else {
            log!("client"; "restyled {} element(s)", outcome.restyled.len());
        }
        if let Some(toast) = self.updater.toast() {
            log!("toast"; "{}", toast.message);
        }
        if let Some(debug_matches) = &update.debug_matches {
            for m in debug_matches {
                debug!(
                    "client"; "{} - {} ({:+}) at {} {}",
                    m.component_name, m.element_name, m.relative_size_value, m.path, m.match_pattern
                );
            }
        }

        self.write_back();
    }

    fn tick(&mut self, now: Instant) {
        let before = self.updater.pending_highlights();
        self.updater.tick(&mut self.page, now);
        if self.updater.pending_highlights() != before {
            self.write_back();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reload::message::{UpdateEntry, UpdateMessage};
    use std::time::Duration;
    use tempfile::TempDir;

    fn update() -> ServerMessage {
        ServerMessage::FontConfigUpdated(UpdateMessage {
            updates: vec![UpdateEntry {
                component_name: "Card".into(),
                element_name: "Title".into(),
                relative_size_value: 2,
                selector: Some("h2.title".into()),
                path: None,
                match_pattern: None,
                line_content: None,
            }],
            ..UpdateMessage::default()
        })
    }

    #[test]
    fn test_update_writes_page_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, r#"<div><h2 class="title">Title</h2></div>"#).unwrap();

        let mut consumer =
            BrowserConsumer::open(&path, true, UpdaterSettings::default()).unwrap();
        let now = Instant::now();
        consumer.on_message(update(), now);

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("font-size: 12px"));
        assert!(written.contains("background-color: #fffacd"));

        consumer.tick(now + Duration::from_secs(2));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("font-size: 12px"));
        assert!(!written.contains("#fffacd"));
    }

    #[test]
    fn test_read_only_page_is_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.html");
        let html = r#"<div><h2 class="title">Title</h2></div>"#;
        fs::write(&path, html).unwrap();

        let mut consumer =
            BrowserConsumer::open(&path, false, UpdaterSettings::default()).unwrap();
        consumer.on_message(update(), Instant::now());

        assert_eq!(fs::read_to_string(&path).unwrap(), html);
        let h2 = consumer.page().select("h2")[0];
        assert_eq!(
            consumer.page().element(h2).unwrap().style("font-size").as_deref(),
            Some("12px")
        );
    }

    #[test]
    fn test_missing_page_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(BrowserConsumer::open(&dir.path().join("nope.html"), false, UpdaterSettings::default()).is_err());
    }
}
