//! `font-tool serve`
//!
//! Notify mode runs the notification bus next to the control API; direct
//! mode only runs the control API and writes files.

use anyhow::Result;

use crate::config::cfg;
use crate::control::{ControlContext, ControlServer};
use crate::reload::NotifyBus;
use crate::workspace::Workspace;
use crate::{log, shutdown};

pub fn run_serve() -> Result<()> {
    let config = cfg();
    let serve = &config.serve;
    let workspace = Workspace::from_config(&config);
    if !workspace.root().is_dir() {
        log!("warning"; "project root {} is not a directory", workspace.root().display());
    }

    let bus = if serve.mode.notifies() {
        Some(NotifyBus::start(serve.interface, serve.port, serve.mode)?)
    } else {
        log!("serve"; "direct mode: files are patched, clients are not notified");
        None
    };

    let control = ControlServer::bind(serve.interface, serve.control_port)?;
    shutdown::register_server(control.handle());
    log!("serve"; "project root {}", workspace.root().display());

    let ctx = ControlContext {
        workspace: &workspace,
        mode: serve.mode,
        bus: bus.as_ref(),
        channel_port: serve.port,
    };
    control.run(&ctx);

    if let Some(bus) = bus {
        bus.shutdown();
    }
    Ok(())
}
