use rustc_hash::FxHashMap;
use tungstenite::protocol::Message;

use super::Hub;
use crate::reload::message::{Capabilities, ServerMessage, UpdateMessage};

impl Hub {
    /// Send an update to every client. A failing client is dropped and the
    /// rest still receive the message.
    pub(super) fn broadcast(&self, update: &UpdateMessage) {
        let mut clients = self.clients.lock();
        let count = clients.len();

        if count == 0 {
            crate::debug!("ws"; "no clients connected");
            return;
        }

        let mut payloads: FxHashMap<Capabilities, String> = FxHashMap::default();
        clients.retain_mut(|client| {
            let payload = payloads.entry(client.caps).or_insert_with(|| {
                ServerMessage::FontConfigUpdated(update.personalize(client.caps, count)).to_json()
            });

            match client.ws.send(Message::Text(payload.clone().into())) {
                Ok(_) => true,
                Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => true,
                Err(e) => {
                    crate::log!("ws"; "dropping client: {}", e);
                    false
                }
            }
        });

        self.state.set_client_count(clients.len());
        crate::debug!("ws"; "broadcast {} update(s) to {} clients", update.updates.len(), count);
    }
}
