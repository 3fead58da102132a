//! Notification hub actor.
//!
//! Owns the connected clients and fans `font-config-updated` messages out to
//! them, personalised by the capabilities each client negotiated.
//!
//! ```text
//! handshake --[AddClient]--> Hub --[broadcast]--> Clients
//! apply     --[Broadcast]--> Hub        ^            |
//!                                       +--[reader]--+  (handshake, status, heartbeat)
//! ```

mod client_io;
mod delivery;

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;

use super::message::{Capabilities, Status, UpdateMessage};
use crate::config::ServeMode;

pub use client_io::respond;

/// Messages to the hub.
#[derive(Debug)]
pub enum HubMsg {
    /// Connection whose WebSocket handshake completed.
    AddClient(WebSocket<TcpStream>),
    /// Deliver an update to every client.
    Broadcast(UpdateMessage),
    Shutdown,
}

/// State shared by the hub, the acceptor and status queries.
#[derive(Debug)]
pub struct ServerState {
    port: AtomicU16,
    clients: AtomicUsize,
    running: AtomicBool,
    mode: ServeMode,
}

impl ServerState {
    pub fn new(mode: ServeMode) -> Self {
        Self {
            port: AtomicU16::new(0),
            clients: AtomicUsize::new(0),
            running: AtomicBool::new(true),
            mode,
        }
    }

    pub fn set_port(&self, port: u16) {
        self.port.store(port, Ordering::SeqCst);
    }

    pub fn port(&self) -> u16 {
        self.port.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn set_client_count(&self, count: usize) {
        self.clients.store(count, Ordering::SeqCst);
    }

    pub fn status(&self) -> Status {
        Status {
            running: self.is_running(),
            port: self.port(),
            client_count: self.clients.load(Ordering::SeqCst),
            mode: self.mode,
        }
    }
}

/// A connected client and what it negotiated.
struct RegisteredClient {
    ws: WebSocket<TcpStream>,
    caps: Capabilities,
}

pub struct Hub {
    rx: mpsc::Receiver<HubMsg>,
    clients: Arc<Mutex<Vec<RegisteredClient>>>,
    state: Arc<ServerState>,
}

impl Hub {
    pub fn new(rx: mpsc::Receiver<HubMsg>, state: Arc<ServerState>) -> Self {
        Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            state,
        }
    }

    /// Run the hub event loop until shutdown or all senders are gone.
    pub async fn run(mut self) {
        let clients_for_reader = Arc::clone(&self.clients);
        let state_for_reader = Arc::clone(&self.state);
        std::thread::spawn(move || {
            Self::client_reader_loop(clients_for_reader, state_for_reader);
        });

        while let Some(msg) = self.rx.recv().await {
            match msg {
                HubMsg::AddClient(ws) => self.add_client(ws),
                HubMsg::Broadcast(update) => self.broadcast(&update),
                HubMsg::Shutdown => break,
            }
        }

        crate::debug!("ws"; "shutting down");
        self.state.stop();
        let mut clients = self.clients.lock();
        for mut client in clients.drain(..) {
            let _ = client.ws.close(None);
        }
        self.state.set_client_count(0);
    }
}
