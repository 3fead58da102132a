//! Reconnection supervisor.
//!
//! `Disconnected → Connecting → Connected → Disconnected`. Every close or
//! error schedules one reconnect after a fixed delay; a successful open or a
//! manual [`Supervisor::disconnect`] cancels it. No backoff, no retry limit.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug)]
pub struct Supervisor {
    state: ChannelState,
    delay: Duration,
    reconnect_at: Option<Instant>,
    stopped: bool,
}

impl Supervisor {
    pub fn new(delay: Duration) -> Self {
        Self {
            state: ChannelState::Disconnected,
            delay,
            reconnect_at: None,
            stopped: false,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Pending reconnect deadline.
    pub fn reconnect_at(&self) -> Option<Instant> {
        self.reconnect_at
    }

    /// Enter `Connecting`. Refused while a connection is open or opening,
    /// or after a manual disconnect.
    pub fn begin_connect(&mut self) -> bool {
        if self.stopped || self.state != ChannelState::Disconnected {
            return false;
        }
        self.state = ChannelState::Connecting;
        self.reconnect_at = None;
        true
    }

    pub fn on_open(&mut self) {
        self.state = ChannelState::Connected;
        self.reconnect_at = None;
    }

    /// Close or error: back to `Disconnected` with one reconnect scheduled.
    pub fn on_close(&mut self, now: Instant) {
        self.state = ChannelState::Disconnected;
        if !self.stopped {
            self.reconnect_at = Some(now + self.delay);
        }
    }

    /// True once when the scheduled reconnect is due; the timer is consumed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.reconnect_at {
            Some(at) if at <= now && !self.stopped => {
                self.reconnect_at = None;
                true
            }
            _ => false,
        }
    }

    /// Manual shutdown: cancel the pending reconnect and stay down.
    pub fn disconnect(&mut self) {
        self.stopped = true;
        self.reconnect_at = None;
        self.state = ChannelState::Disconnected;
    }

    /// Undo a manual disconnect.
    pub fn resume(&mut self) {
        self.stopped = false;
    }
}
