//! `font-tool watch` and `font-tool status`

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel;

use super::print_json;
use crate::client::browser::BrowserConsumer;
use crate::client::editor::EditorConsumer;
use crate::client::{self, Consumer};
use crate::config::ToolConfig;
use crate::dom::UpdaterSettings;
use crate::reload::message::{Capabilities, ClientMessage, ServerMessage};
use crate::{debug, log, shutdown};

/// How long `status` waits for the reply.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Consume updates until Ctrl+C.
///
/// `--page` restyles an HTML snapshot, `--editor` reports marker positions,
/// otherwise updates are only logged.
pub fn run_watch(config: &ToolConfig, page: Option<&Path>, write: bool, editor: bool) -> Result<()> {
    let settings = &config.client;
    let caps = Capabilities {
        debug: settings.debug,
        details: true,
    };

    let (cancel_tx, cancel_rx) = channel::bounded::<()>(1);
    shutdown::register_cancel(cancel_tx);

    match (page, editor) {
        (Some(path), _) => {
            let mut consumer = BrowserConsumer::open(path, write, UpdaterSettings::from(settings))?;
            client::run(settings, &ClientMessage::browser(caps), &mut consumer, &cancel_rx);
        }
        (None, true) => {
            let mut consumer = EditorConsumer::new(&config.root);
            client::run(settings, &ClientMessage::editor(caps), &mut consumer, &cancel_rx);
        }
        (None, false) => {
            client::run(settings, &ClientMessage::browser(caps), &mut LogConsumer, &cancel_rx);
        }
    }

    Ok(())
}

/// Print the status of the server at `[client]` host/port.
pub fn run_status(config: &ToolConfig) -> Result<()> {
    let url = config.client.url();
    let status = client::query_status(&url, STATUS_TIMEOUT)
        .with_context(|| format!("no font-tool server answered at {url}"))?;

    log!(
        "status";
        "{} on port {}, {} client(s), {} mode",
        if status.running { "running" } else { "stopped" },
        status.port,
        status.client_count,
        if status.mode.notifies() { "notify" } else { "direct" }
    );
    print_json(&status, false)
}

/// Logs each update.
struct LogConsumer;

impl Consumer for LogConsumer {
    fn on_message(&mut self, msg: ServerMessage, _now: Instant) {
        match msg {
            ServerMessage::FontConfigUpdated(update) => {
                log!("client"; "{} update(s) in {} file(s)", update.updates.len(), update.updated_files.len());
                for entry in &update.updates {
                    log!(
                        "client";
                        "{} - {}: fontSize{:+}",
                        entry.component_name, entry.element_name, entry.relative_size_value
                    );
                }
            }
            other => debug!("client"; "{:?}", other),
        }
    }
}
