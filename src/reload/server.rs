//! WebSocket listener for the notification channel.
//!
//! Each accepted stream completes its WebSocket handshake on its own thread,
//! bounded by [`HANDSHAKE_TIMEOUT`]; only finished connections reach the hub.

use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::hub::{HubMsg, ServerState};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// A peer must finish the WebSocket handshake within this time.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the acceptor thread. Returns the port actually bound.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    hub_tx: mpsc::Sender<HubMsg>,
    state: Arc<ServerState>,
) -> Result<u16> {
    let (listener, actual_port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
    listener.set_nonblocking(true)?;
    if actual_port != base_port {
        crate::log!("ws"; "port {} in use, using {} instead", base_port, actual_port);
    }

    std::thread::spawn(move || {
        while state.is_running() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("ws"; "client connected: {}", addr);

                    let hub_tx = hub_tx.clone();
                    std::thread::spawn(move || match handshake(stream) {
                        Ok(ws) => {
                            if hub_tx.blocking_send(HubMsg::AddClient(ws)).is_err() {
                                crate::debug!("ws"; "hub closed, connection dropped");
                            }
                        }
                        Err(e) => crate::log!("ws"; "handshake with {} failed: {}", addr, e),
                    });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => {
                    crate::log!("ws"; "accept error: {}", e);
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    });

    Ok(actual_port)
}

/// Blocking WebSocket handshake with read and write deadlines.
fn handshake(stream: TcpStream) -> Result<WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(HANDSHAKE_TIMEOUT))?;
    stream.set_write_timeout(Some(HANDSHAKE_TIMEOUT))?;
    let ws = tungstenite::accept(stream).map_err(|e| anyhow::anyhow!("{e}"))?;
    ws.get_ref().set_read_timeout(None)?;
    ws.get_ref().set_write_timeout(None)?;
    Ok(ws)
}

/// Try binding to port, retry with incremented port if in use
pub(crate) fn try_bind_port(
    interface: IpAddr,
    base_port: u16,
    max_retries: u16,
) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
