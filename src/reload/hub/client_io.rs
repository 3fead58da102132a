use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::{Hub, RegisteredClient, ServerState};
use crate::reload::message::{Capabilities, ClientMessage, ServerMessage, Status};

/// Reply to one client message, updating the connection's capabilities.
pub fn respond(caps: &mut Capabilities, msg: ClientMessage, status: Status) -> Option<ServerMessage> {
    match msg {
        ClientMessage::ClientConnected { capabilities, .. }
        | ClientMessage::CursorPluginConnected { capabilities, .. } => {
            *caps = Capabilities::from_flags(&capabilities);
            Some(ServerMessage::connected())
        }
        ClientMessage::GetStatus { .. } => Some(ServerMessage::Status(status)),
        ClientMessage::EnableDebugMode { enabled } | ClientMessage::SetDebugMode { enabled } => {
            caps.debug = enabled;
            None
        }
        ClientMessage::Heartbeat => Some(ServerMessage::heartbeat_response()),
    }
}

impl Hub {
    /// Register a client whose WebSocket handshake already completed.
    pub(super) fn add_client(&self, mut ws: WebSocket<TcpStream>) {
        if let Err(e) = ws.get_ref().set_nonblocking(true) {
            crate::log!("ws"; "dropping client: {}", e);
            return;
        }

        // Read the hello right away so an update broadcast just after
        // connecting already sees the negotiated capabilities
        let mut caps = Capabilities::default();
        if let Some(text) = Self::try_read_initial(&mut ws) {
            let mut status = self.state.status();
            status.client_count = self.clients.lock().len() + 1;
            Self::handle_text(&mut ws, &mut caps, &text, status);
        }

        let mut clients = self.clients.lock();
        clients.push(RegisteredClient { ws, caps });
        self.state.set_client_count(clients.len());
        crate::debug!("ws"; "client connected (total: {}, {:?})", clients.len(), caps);
    }

    /// Background thread reading client messages (non-blocking poll).
    pub(super) fn client_reader_loop(clients: Arc<Mutex<Vec<RegisteredClient>>>, state: Arc<ServerState>) {
        while state.is_running() {
            std::thread::sleep(Duration::from_millis(100));

            let mut clients_guard = clients.lock();
            let count = clients_guard.len();
            let mut disconnected = Vec::new();

            for (i, client) in clients_guard.iter_mut().enumerate() {
                loop {
                    match client.ws.read() {
                        Ok(Message::Text(text)) => {
                            let mut status = state.status();
                            status.client_count = count;
                            Self::handle_text(&mut client.ws, &mut client.caps, text.as_str(), status);
                        }
                        Ok(Message::Close(_)) => {
                            disconnected.push(i);
                            break;
                        }
                        Ok(_) => {}
                        Err(tungstenite::Error::Io(ref e))
                            if e.kind() == std::io::ErrorKind::WouldBlock =>
                        {
                            break;
                        }
                        Err(_) => {
                            disconnected.push(i);
                            break;
                        }
                    }
                }
            }

            for i in disconnected.into_iter().rev() {
                clients_guard.remove(i);
                crate::debug!("ws"; "client disconnected (total: {})", clients_guard.len());
            }
            state.set_client_count(clients_guard.len());
        }
    }

    /// Parse one message and send the reply, if any. Malformed messages are
    /// dropped without touching the connection.
    fn handle_text(ws: &mut WebSocket<TcpStream>, caps: &mut Capabilities, text: &str, status: Status) {
        let msg = match ClientMessage::from_json(text) {
            Ok(msg) => msg,
            Err(e) => {
                crate::debug!("ws"; "discarding message: {}", e);
                return;
            }
        };

        if let Some(reply) = respond(caps, msg, status)
            && let Err(e) = ws.send(Message::Text(reply.to_json().into()))
        {
            crate::debug!("ws"; "reply failed: {}", e);
        }
    }

    fn try_read_initial(ws: &mut WebSocket<TcpStream>) -> Option<String> {
        for _ in 0..5 {
            match ws.read() {
                Ok(Message::Text(text)) => return Some(text.as_str().to_string()),
                Err(tungstenite::Error::Io(ref e))
                    if e.kind() == std::io::ErrorKind::WouldBlock =>
                {
                    std::thread::sleep(Duration::from_millis(5));
                }
                _ => break,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServeMode;
    use crate::reload::message::Capability;

    fn status() -> Status {
        Status {
            running: true,
            port: 28888,
            client_count: 1,
            mode: ServeMode::Notify,
        }
    }

    #[test]
    fn test_handshake_sets_capabilities() {
        let mut caps = Capabilities::default();
        let reply = respond(
            &mut caps,
            ClientMessage::CursorPluginConnected {
                version: "1.0".into(),
                capabilities: vec![Capability::UpdateDetails],
            },
            status(),
        );
        assert!(matches!(reply, Some(ServerMessage::Connected { .. })));
        assert!(caps.details);
        assert!(!caps.debug);
    }

    #[test]
    fn test_debug_toggle_has_no_reply() {
        let mut caps = Capabilities::default();
        assert!(respond(&mut caps, ClientMessage::EnableDebugMode { enabled: true }, status()).is_none());
        assert!(caps.debug);
        respond(&mut caps, ClientMessage::SetDebugMode { enabled: false }, status());
        assert!(!caps.debug);
    }

    #[test]
    fn test_status_and_heartbeat() {
        let mut caps = Capabilities::default();
        let reply = respond(&mut caps, ClientMessage::GetStatus { timestamp: 0 }, status());
        assert_eq!(reply, Some(ServerMessage::Status(status())));
        let reply = respond(&mut caps, ClientMessage::Heartbeat, status());
        assert!(matches!(reply, Some(ServerMessage::HeartbeatResponse { .. })));
    }
}
