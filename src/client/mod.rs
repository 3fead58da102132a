//! Consumers of the notification channel.
//!
//! [`run`] owns one connection: it connects, hands every server message to a
//! [`Consumer`], and reconnects through the [`Supervisor`] until cancelled.
//!
//! - [`browser`]: restyles an HTML snapshot with the live DOM updater
//! - [`editor`]: reports `@font-tool` positions in updated files

pub mod browser;
mod channel;
pub mod editor;
mod error;
pub mod supervisor;

pub use channel::Channel;
pub use error::ChannelError;
pub use supervisor::{ChannelState, Supervisor};

use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError, TryRecvError};

use crate::config::ClientConfig;
use crate::reload::message::{ClientMessage, ServerMessage, Status};
use crate::utils::now_millis;
use crate::{debug, log};

/// Read/idle granularity of the client loop.
const POLL: Duration = Duration::from_millis(100);

pub trait Consumer {
    fn on_connected(&mut self) {}

    fn on_message(&mut self, msg: ServerMessage, now: Instant);

    /// Called on every loop turn to expire timers.
    fn tick(&mut self, _now: Instant) {}
}

/// Drive one channel until `cancel` fires (or its sender is dropped).
pub fn run(
    config: &ClientConfig,
    hello: &ClientMessage,
    consumer: &mut dyn Consumer,
    cancel: &Receiver<()>,
) {
    let url = config.url();
    let mut supervisor = Supervisor::new(config.reconnect_delay());
    let mut channel: Option<Channel> = None;
    let mut first_attempt = true;

    loop {
        let now = Instant::now();

        match channel.as_mut() {
            Some(open) => {
                if !matches!(cancel.try_recv(), Err(TryRecvError::Empty)) {
                    break;
                }
                match open.recv(POLL) {
                    Ok(Some(msg)) => consumer.on_message(msg, Instant::now()),
                    Ok(None) => {}
                    Err(e) => {
                        log!(
                            "client"; "{}, reconnecting in {}s",
                            e, config.reconnect_delay().as_secs()
                        );
                        channel = None;
                        supervisor.on_close(Instant::now());
                    }
                }
            }
            None => {
                let due = first_attempt || supervisor.poll(now);
                if due && supervisor.begin_connect() {
                    first_attempt = false;
                    match Channel::connect(&url, hello) {
                        Ok(open) => {
                            supervisor.on_open();
                            log!("client"; "connected to {}", url);
                            consumer.on_connected();
                            channel = Some(open);
                        }
                        Err(e) => {
                            log!(
                                "client"; "{}, retrying in {}s",
                                e, config.reconnect_delay().as_secs()
                            );
                            supervisor.on_close(Instant::now());
                        }
                    }
                } else {
                    match cancel.recv_timeout(POLL) {
                        Err(RecvTimeoutError::Timeout) => {}
                        _ => break,
                    }
                }
            }
        }

        consumer.tick(Instant::now());
    }

    supervisor.disconnect();
    if let Some(open) = channel.take() {
        open.close();
    }
    debug!("client"; "stopped ({:?})", supervisor.state());
}

/// Ask a running server for its status over the notification channel.
pub fn query_status(url: &str, timeout: Duration) -> Result<Status, ChannelError> {
    let mut channel = Channel::connect(
        url,
        &ClientMessage::GetStatus {
            timestamp: now_millis(),
        },
    )?;

    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(ServerMessage::Status(status)) = channel.recv(POLL)? {
            channel.close();
            return Ok(status);
        }
    }

    channel.close();
    Err(ChannelError::Timeout(timeout))
}
