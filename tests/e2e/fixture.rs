use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use policy_client::{Codec, MsgpackCodec, Payload};
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::http::header::AUTHORIZATION;
use tungstenite::Message;

pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A port with nothing listening on it.
pub(crate) fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind probe listener");
    listener.local_addr().expect("No local address").port()
}

/// What the fake policy server answers to one observation.
pub(crate) enum Reply {
    Action(Payload),
    Error(String),
}

/// Everything the fake policy server observed.
#[derive(Default)]
pub(crate) struct ServerLog {
    pub(crate) authorization: Option<String>,
    pub(crate) observations: Vec<Payload>,
}

pub(crate) struct PolicyServer {
    pub(crate) port: u16,
    pub(crate) log: Arc<Mutex<ServerLog>>,
    handle: Option<JoinHandle<()>>,
}

impl PolicyServer {
    /// Wait for the client to disconnect and the server thread to finish.
    pub(crate) fn join(mut self) -> Arc<Mutex<ServerLog>> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("Policy server thread panicked");
        }
        Arc::clone(&self.log)
    }
}

/// Serve exactly one WebSocket client on an ephemeral loopback port.
pub(crate) fn spawn_policy_server<F>(metadata: Payload, respond: F) -> PolicyServer
where
    F: Fn(&Payload) -> Reply + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind policy server");
    serve_policy(listener, metadata, respond)
}

/// Serve exactly one WebSocket client on an already bound listener.
pub(crate) fn serve_policy<F>(listener: TcpListener, metadata: Payload, respond: F) -> PolicyServer
where
    F: Fn(&Payload) -> Reply + Send + 'static,
{
    let port = listener.local_addr().expect("No local address").port();
    let log = Arc::new(Mutex::new(ServerLog::default()));
    let server_log = Arc::clone(&log);

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("Failed to accept client");

        let record_auth = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            server_log.lock().unwrap().authorization = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Ok(response)
        };
        let mut socket =
            tungstenite::accept_hdr(stream, record_auth).expect("WebSocket upgrade failed");

        let handshake = MsgpackCodec.encode(&metadata).unwrap();
        socket.send(Message::Binary(handshake)).unwrap();

        loop {
            match socket.read() {
                Ok(Message::Binary(data)) => {
                    let observation = MsgpackCodec.decode(&data).expect("Undecodable observation");
                    let reply = match respond(&observation) {
                        Reply::Action(action) => {
                            Message::Binary(MsgpackCodec.encode(&action).unwrap())
                        }
                        Reply::Error(message) => Message::Text(message),
                    };
                    server_log.lock().unwrap().observations.push(observation);
                    socket.send(reply).unwrap();
                }
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            }
        }
    });

    PolicyServer {
        port,
        log,
        handle: Some(handle),
    }
}

/// One request seen by the fake HTTP server.
#[derive(Debug, Clone)]
pub(crate) struct HttpRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) body: String,
}

pub(crate) struct HttpServer {
    pub(crate) port: u16,
    handle: JoinHandle<Vec<HttpRequest>>,
}

impl HttpServer {
    pub(crate) fn join(self) -> Vec<HttpRequest> {
        self.handle.join().expect("HTTP server thread panicked")
    }
}

/// Answer `/health` with `health_status` and `/act` with the given status and JSON body.
///
/// Serves `connections` requests, one per connection, then stops.
pub(crate) fn spawn_http_server(
    health_status: u16,
    act_status: u16,
    act_body: String,
    connections: usize,
) -> HttpServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind HTTP server");
    let port = listener.local_addr().expect("No local address").port();

    let handle = thread::spawn(move || {
        let mut requests = Vec::new();
        for _ in 0..connections {
            let (mut stream, _) = listener.accept().expect("Failed to accept HTTP client");
            let request = read_request(&mut stream);

            let (status, body) = if request.path == "/health" {
                (health_status, "ok".to_string())
            } else {
                (act_status, act_body.clone())
            };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason(status),
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            requests.push(request);
        }
        requests
    });

    HttpServer { port, handle }
}

fn read_request(stream: &mut TcpStream) -> HttpRequest {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).unwrap();
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap();
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).unwrap();

    HttpRequest {
        method,
        path,
        body: String::from_utf8(body).unwrap(),
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}
