//! Ctrl+C handling for the long-running commands.
//!
//! `serve` registers its control server (unblocked on shutdown), `watch`
//! registers a cancel sender for the client loop. Before either is
//! registered, Ctrl+C exits the process directly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::Sender;
use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Cancel signal for the client loop
static CANCEL_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let mut registered = false;
        if let Some(tx) = CANCEL_TX.get() {
            let _ = tx.send(());
            registered = true;
        }
        if let Some(server) = SERVER.get() {
            crate::log!("serve"; "shutting down...");
            server.unblock();
            registered = true;
        }

        if !registered {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the control server; Ctrl+C unblocks its request loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Register the client loop's cancel sender.
pub fn register_cancel(tx: Sender<()>) {
    let _ = CANCEL_TX.set(tx);
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_shutdown_by_default() {
        assert!(!is_shutdown());
    }

    #[test]
    fn test_register_cancel_keeps_first() {
        let (tx1, rx1) = crossbeam::channel::unbounded();
        let (tx2, _rx2) = crossbeam::channel::unbounded();
        register_cancel(tx1);
        register_cancel(tx2);

        CANCEL_TX.get().unwrap().send(()).unwrap();
        assert!(rx1.try_recv().is_ok());
    }
}
