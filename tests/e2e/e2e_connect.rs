//! Connection lifecycle against real sockets: waiting, fatal errors, handshake.

use std::io::Write;
use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use policy_client::{ClientConfig, Connector, Endpoint, Error, Payload, Value, WebsocketClientPolicy};
use tungstenite::Message;

use crate::fixture::{init_logging, serve_policy, unused_port, Reply};

/// The client keeps waiting while the port refuses, then connects once the server is up.
#[test]
fn test_waits_for_late_server() {
    init_logging();
    let port = unused_port();

    let mut metadata = Payload::new();
    metadata.insert("ready".to_string(), Value::Bool(true));

    let expected = metadata.clone();
    let starter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        let listener = TcpListener::bind(("127.0.0.1", port)).expect("Port was taken");
        serve_policy(listener, metadata, |_| Reply::Error("unused".into()))
    });

    let config = ClientConfig {
        host: "127.0.0.1".to_string(),
        port: Some(port),
        ..Default::default()
    };
    let endpoint = config.endpoint().unwrap();
    let connector = Connector::new().retry_delay(Duration::from_millis(50));

    let started = Instant::now();
    let client = WebsocketClientPolicy::with_connector(endpoint, &connector).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(client.server_metadata(), &expected);

    drop(client);
    starter.join().unwrap().join();
}

/// A peer that accepts TCP but never speaks WebSocket fails on the first attempt.
#[test]
fn test_non_websocket_peer_is_fatal() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        stream
            .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
            .unwrap();
        // Any further attempt would be refused once the listener is dropped
    });

    let endpoint = Endpoint::new("127.0.0.1").unwrap().with_port(port);
    let connector = Connector::new().retry_delay(Duration::from_millis(10));
    let result = WebsocketClientPolicy::with_connector(endpoint, &connector);

    match result {
        Err(Error::WebSocket(_)) => {}
        Err(other) => panic!("Expected WebSocket error, got {}", other),
        Ok(_) => panic!("Expected connect to fail"),
    }
    server.join().unwrap();
}

/// A textual first frame aborts construction instead of being decoded as metadata.
#[test]
fn test_text_handshake_is_fatal() {
    init_logging();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut socket = tungstenite::accept(stream).unwrap();
        socket
            .send(Message::Text("invalid api key".to_string()))
            .unwrap();
        // Drain until the client closes
        while let Ok(message) = socket.read() {
            if message.is_close() {
                break;
            }
        }
    });

    let endpoint = Endpoint::new("127.0.0.1").unwrap().with_port(port);
    match WebsocketClientPolicy::connect(endpoint) {
        Err(Error::Handshake(message)) => assert!(message.contains("invalid api key")),
        Err(other) => panic!("Expected handshake error, got {}", other),
        Ok(_) => panic!("Expected connect to fail"),
    }
    server.join().unwrap();
}
