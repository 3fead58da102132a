use std::net::{IpAddr, Ipv4Addr, TcpListener, TcpStream};
use std::time::Duration;

use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::message::{Capabilities, ClientMessage, ServerMessage, UpdateEntry, UpdateMessage};
use super::*;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

type Client = WebSocket<MaybeTlsStream<TcpStream>>;

fn start() -> NotifyBus {
    NotifyBus::start(LOCALHOST, 0, ServeMode::Notify).unwrap()
}

fn connect(port: u16) -> Client {
    let (ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
    if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    }
    ws
}

fn send(ws: &mut Client, msg: &ClientMessage) {
    ws.send(Message::Text(msg.to_json().into())).unwrap();
}

fn recv(ws: &mut Client) -> ServerMessage {
    loop {
        if let Message::Text(text) = ws.read().unwrap() {
            return ServerMessage::from_json(text.as_str()).unwrap();
        }
    }
}

fn handshake(ws: &mut Client, caps: Capabilities) {
    send(ws, &ClientMessage::browser(caps));
    assert!(matches!(recv(ws), ServerMessage::Connected { .. }));
}

fn update() -> UpdateMessage {
    UpdateMessage {
        timestamp: 1,
        updated_files: vec!["Card.tsx".into()],
        updates: vec![UpdateEntry {
            component_name: "Card".into(),
            element_name: "Title".into(),
            relative_size_value: 3,
            selector: Some("h2".into()),
            path: Some("Card.tsx:4".into()),
            match_pattern: None,
            line_content: None,
        }],
        ..UpdateMessage::default()
    }
}

#[test]
fn test_busy_port_reported_through_status() {
    let busy = TcpListener::bind((LOCALHOST, 0)).unwrap();
    let base = busy.local_addr().unwrap().port();

    let bus = NotifyBus::start(LOCALHOST, base, ServeMode::Notify).unwrap();
    assert_ne!(bus.port(), base);
    assert!(bus.port() > base);

    let mut ws = connect(bus.port());
    send(&mut ws, &ClientMessage::GetStatus { timestamp: 0 });
    let ServerMessage::Status(status) = recv(&mut ws) else {
        panic!("expected status");
    };
    assert!(status.running);
    assert_eq!(status.port, bus.port());
    assert_eq!(status.client_count, 1);
    assert_eq!(status.mode, ServeMode::Notify);

    bus.shutdown();
}

#[test]
fn test_broadcast_personalized_per_client() {
    let bus = start();
    let mut plain = connect(bus.port());
    handshake(&mut plain, Capabilities::default());
    let mut debug = connect(bus.port());
    handshake(&mut debug, Capabilities { debug: true, details: true });

    bus.broadcast(update());

    let ServerMessage::FontConfigUpdated(got) = recv(&mut plain) else {
        panic!("expected update");
    };
    assert_eq!(got.updates.len(), 1);
    assert!(got.updates[0].selector.is_none());
    assert!(got.client_count.is_none());

    let ServerMessage::FontConfigUpdated(got) = recv(&mut debug) else {
        panic!("expected update");
    };
    assert_eq!(got.updates[0].selector.as_deref(), Some("h2"));
    assert_eq!(got.client_count, Some(2));
    assert_eq!(got.debug_matches.map(|m| m.len()), Some(1));

    bus.shutdown();
}

#[test]
fn test_dead_client_does_not_block_others() {
    let bus = start();
    let mut gone = connect(bus.port());
    handshake(&mut gone, Capabilities::default());
    let mut alive = connect(bus.port());
    handshake(&mut alive, Capabilities::default());
    drop(gone);

    bus.broadcast(update());
    bus.broadcast(update());

    for _ in 0..2 {
        assert!(matches!(recv(&mut alive), ServerMessage::FontConfigUpdated(_)));
    }
    bus.shutdown();
}

#[test]
fn test_broadcast_without_clients() {
    let bus = start();
    bus.broadcast(update());
    assert_eq!(bus.status().client_count, 0);
    bus.shutdown();
}

#[test]
fn test_heartbeat_and_malformed() {
    let bus = start();
    let mut ws = connect(bus.port());
    ws.send(Message::Text("{not json".into())).unwrap();
    send(&mut ws, &ClientMessage::Heartbeat);
    assert!(matches!(recv(&mut ws), ServerMessage::HeartbeatResponse { .. }));
    bus.shutdown();
}

#[test]
fn test_silent_peer_does_not_stall_other_clients() {
    let bus = start();
    // connects at TCP level but never sends the upgrade request
    let _silent = TcpStream::connect((LOCALHOST, bus.port())).unwrap();
    std::thread::sleep(Duration::from_millis(200));

    let mut ws = connect(bus.port());
    handshake(&mut ws, Capabilities::default());
    bus.broadcast(update());
    assert!(matches!(recv(&mut ws), ServerMessage::FontConfigUpdated(_)));
    assert_eq!(bus.status().client_count, 1);

    bus.shutdown();
}
