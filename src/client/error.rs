use thiserror::Error;

/// Notification channel failures on the client side. Never fatal: the
/// supervisor schedules a reconnect.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to connect to {0}")]
    Connect(String, #[source] tungstenite::Error),

    #[error("failed to send message")]
    Send(#[source] tungstenite::Error),

    #[error("connection closed")]
    Closed,

    #[error("no reply within {0:?}")]
    Timeout(std::time::Duration),
}
