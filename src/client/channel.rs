//! Client end of the notification channel.

use std::net::TcpStream;
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::ChannelError;
use crate::debug;
use crate::reload::message::{ClientMessage, ServerMessage};

pub struct Channel {
    ws: WebSocket<MaybeTlsStream<TcpStream>>,
}

impl Channel {
    /// Connect and send the handshake.
    pub fn connect(url: &str, hello: &ClientMessage) -> Result<Self, ChannelError> {
        let (ws, _) =
            tungstenite::connect(url).map_err(|e| ChannelError::Connect(url.to_string(), e))?;
        let mut channel = Self { ws };
        channel.send(hello)?;
        Ok(channel)
    }

    pub fn send(&mut self, msg: &ClientMessage) -> Result<(), ChannelError> {
        self.ws
            .send(Message::Text(msg.to_json().into()))
            .map_err(ChannelError::Send)
    }

    /// Wait up to `timeout` for one server message.
    ///
    /// `Ok(None)` on timeout, on non-text frames and on malformed payloads
    /// (discarded).
    pub fn recv(&mut self, timeout: Duration) -> Result<Option<ServerMessage>, ChannelError> {
        if let MaybeTlsStream::Plain(stream) = self.ws.get_ref() {
            let _ = stream.set_read_timeout(Some(timeout));
        }

        match self.ws.read() {
            Ok(Message::Text(text)) => match ServerMessage::from_json(text.as_str()) {
                Ok(msg) => Ok(Some(msg)),
                Err(e) => {
                    debug!("client"; "discarding malformed message: {}", e);
                    Ok(None)
                }
            },
            Ok(Message::Close(_)) => Err(ChannelError::Closed),
            Ok(_) => Ok(None),
            Err(tungstenite::Error::Io(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(_) => Err(ChannelError::Closed),
        }
    }

    pub fn close(mut self) {
        let _ = self.ws.close(None);
        let _ = self.ws.flush();
    }
}
