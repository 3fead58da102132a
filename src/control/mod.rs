//! HTTP control API.
//!
//! | route          | method | body / query              | reply            |
//! |----------------|--------|---------------------------|------------------|
//! | `/scan`        | GET    |                           | `ScanReport`     |
//! | `/apply`       | POST   | `ApplyRequest` JSON       | `BatchReport`    |
//! | `/status`      | GET    |                           | `Status`         |
//! | `/show`        | GET    | `file=..&lines=3,7`       | `ShowReport`     |
//!
//! Requests are handled one at a time on the calling thread. In notify mode a
//! successful apply is broadcast on the notification bus.

mod query;
mod response;


use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Result;
use tiny_http::{Method, Request, Server};

use crate::config::ServeMode;
use crate::locate::ContextError;
use crate::patch::ApplyRequest;
use crate::reload::NotifyBus;
use crate::reload::message::{Status, UpdateMessage};
use crate::workspace::Workspace;
use crate::{debug, log, shutdown};
use query::{Query, split_url};
use response::{
    respond_error, respond_json, respond_method_not_allowed, respond_not_found, respond_unavailable,
};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Everything a request handler needs.
pub struct ControlContext<'a> {
    pub workspace: &'a Workspace,
    pub mode: ServeMode,
    /// Running notification bus (notify mode only).
    pub bus: Option<&'a NotifyBus>,
    /// Configured channel port, reported when no bus runs.
    pub channel_port: u16,
}

impl ControlContext<'_> {
    fn status(&self) -> Status {
        match self.bus {
            Some(bus) => bus.status(),
            None => Status {
                running: false,
                port: self.channel_port,
                client_count: 0,
                mode: self.mode,
            },
        }
    }
}

/// Bound control server.
pub struct ControlServer {
    server: Arc<Server>,
    addr: SocketAddr,
}

impl ControlServer {
    /// Bind `base_port`, falling back to the next ports when busy.
    pub fn bind(interface: IpAddr, base_port: u16) -> Result<Self> {
        let (server, addr) = bind_with_retry(interface, base_port, MAX_PORT_RETRIES)?;
        Ok(Self {
            server: Arc::new(server),
            addr,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shared handle, for shutdown registration.
    pub fn handle(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Serve requests until the server is unblocked.
    pub fn run(&self, ctx: &ControlContext) {
        log!("control"; "http://{}", self.addr);
        for request in self.server.incoming_requests() {
            if let Err(e) = handle_request(request, ctx) {
                log!("control"; "request error: {e}");
            }
        }
    }
}

/// Bind to the specified interface and port, trying up to `attempts`
/// consecutive ports.
fn bind_with_retry(interface: IpAddr, base_port: u16, attempts: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("control"; "port {} in use, using {} instead", base_port, port);
                }
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind control server after {} attempts (from port {}): {}",
        attempts,
        base_port,
        last_error.map_or_else(|| "no port tried".to_string(), |e| e.to_string())
    ))
}

fn handle_request(request: Request, ctx: &ControlContext) -> Result<()> {
    if shutdown::is_shutdown() {
        return respond_unavailable(request);
    }

    let method = request.method().clone();
    let url = request.url().to_string();
    let (path, raw_query) = split_url(&url);
    debug!("control"; "{} {}", method, url);

    match (method, path) {
        (Method::Get, "/scan") => respond_json(request, 200, &ctx.workspace.scan()),
        (Method::Post, "/apply") => handle_apply(request, ctx),
        (Method::Get, "/status") => respond_json(request, 200, &ctx.status()),
        (Method::Get, "/show") => handle_show(request, ctx, &Query::parse(raw_query)),
        (_, "/apply") => respond_method_not_allowed(request, "POST"),
        (_, "/scan" | "/status" | "/show") => respond_method_not_allowed(request, "GET"),
        _ => respond_not_found(request),
    }
}

fn handle_apply(mut request: Request, ctx: &ControlContext) -> Result<()> {
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        return respond_error(request, 400, &format!("unreadable body: {e}"));
    }

    let apply = match ApplyRequest::from_json(&body) {
        Ok(apply) => apply,
        Err(e) => return respond_error(request, 400, &format!("invalid apply request: {e}")),
    };

    let report = ctx.workspace.apply(&apply);
    report.display_status();

    if let Some(bus) = ctx.bus
        && ctx.mode.notifies()
        && !report.applied.is_empty()
    {
        bus.broadcast(UpdateMessage::from_report(&report));
    }

    respond_json(request, 200, &report)
}

fn handle_show(request: Request, ctx: &ControlContext, query: &Query) -> Result<()> {
    let Some(file) = query.get("file").filter(|f| !f.trim().is_empty()) else {
        return respond_error(request, 400, "missing `file` parameter");
    };

    match ctx.workspace.show(file, &query.lines("lines")) {
        Ok(report) => respond_json(request, 200, &report),
        Err(e @ ContextError::NotFound(_)) => respond_error(request, 404, &e.to_string()),
        Err(e @ ContextError::NoLines(_)) => respond_error(request, 400, &e.to_string()),
        Err(e @ ContextError::Io(..)) => respond_error(request, 500, &e.to_string()),
    }
}
