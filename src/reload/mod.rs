//! Notification bus.
//!
//! # Modules
//!
//! - [`message`]: wire protocol (handshake, updates, status)
//! - [`hub`]: actor owning the client registry and delivery
//! - [`server`]: TCP acceptor with port fallback
//!
//! [`NotifyBus`] is the handle the rest of the program uses: start it once,
//! broadcast the update built from each apply batch, query its status.

pub mod hub;
pub mod message;
pub mod server;

use std::net::IpAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::config::ServeMode;
use hub::{Hub, HubMsg, ServerState};
use message::{Status, UpdateMessage};

/// Channel buffer between producers and the hub.
const CHANNEL_BUFFER: usize = 64;

pub struct NotifyBus {
    tx: mpsc::Sender<HubMsg>,
    state: Arc<ServerState>,
    handle: Option<JoinHandle<()>>,
}

impl NotifyBus {
    /// Bind the notification channel (`port`, then the next ports) and start
    /// the hub on its own runtime thread.
    pub fn start(interface: IpAddr, port: u16, mode: ServeMode) -> Result<Self> {
        let (tx, rx) = mpsc::channel::<HubMsg>(CHANNEL_BUFFER);
        let state = Arc::new(ServerState::new(mode));

        let actual_port = server::start_ws_server(interface, port, tx.clone(), Arc::clone(&state))?;
        state.set_port(actual_port);

        let hub = Hub::new(rx, Arc::clone(&state));
        let handle = thread::spawn(move || run_hub(hub));

        crate::log!("ws"; "notification channel on ws://{}:{}", interface, actual_port);
        Ok(Self {
            tx,
            state,
            handle: Some(handle),
        })
    }

    pub fn port(&self) -> u16 {
        self.state.port()
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// Queue an update for every connected client. Never blocks or fails
    /// the caller: a full queue drops the update.
    pub fn broadcast(&self, update: UpdateMessage) {
        match self.tx.try_send(HubMsg::Broadcast(update)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                crate::log!("ws"; "hub queue full, update dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                crate::log!("ws"; "hub stopped, update dropped");
            }
        }
    }

    /// Stop accepting, close all clients, wait for the hub (max 2 seconds).
    pub fn shutdown(self) {
        let Self { tx, state, handle } = self;
        state.stop();
        // a full queue still drains: the hub also stops once every sender is gone
        let _ = tx.try_send(HubMsg::Shutdown);
        drop(tx);

        let Some(handle) = handle else {
            return;
        };
        for _ in 0..40 {
            if handle.is_finished() {
                let _ = handle.join();
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
    }
}

fn run_hub(hub: Hub) {
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            crate::log!("error"; "failed to create tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(hub.run());
}

#[cfg(test)]
mod tests;
