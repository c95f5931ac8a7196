//! Framed byte streams to the inference server.
//!
//! [`Dialer`] opens a [`FrameStream`] to an [`Endpoint`]; the default pair is
//! [`WsDialer`] / [`WsStream`], a blocking `tungstenite` socket.

use std::io::ErrorKind;
use std::net::TcpStream;

use tungstenite::client::IntoClientRequest;
use tungstenite::http::header::AUTHORIZATION;
use tungstenite::http::HeaderValue;
use tungstenite::protocol::WebSocketConfig;
use tungstenite::{HandshakeError, Message, WebSocket};

use crate::error::{Error, Result};
use crate::transport::endpoints::Endpoint;

/// A data frame received from the server, classified before any decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Structured payload
    Binary(Vec<u8>),
    /// Server-side error message
    Text(String),
}

/// One exclusively owned, ordered, bidirectional frame channel.
pub trait FrameStream {
    /// Send one binary frame. Blocks until the frame is written.
    fn send_binary(&mut self, payload: Vec<u8>) -> Result<()>;

    /// Block until the next data frame arrives.
    fn recv(&mut self) -> Result<Frame>;

    /// Close the stream. Idempotent; errors are ignored.
    fn close(&mut self);
}

/// Opens frame streams to an endpoint.
///
/// A refused TCP connection must be reported as [`Error::ConnectionRefused`]
/// so the connector can keep waiting for the server.
pub trait Dialer {
    type Stream: FrameStream;

    fn dial(&self, endpoint: &Endpoint) -> Result<Self::Stream>;
}

/// Dials `ws://` endpoints with `tungstenite`.
///
/// Connections carry no size limit and negotiate no extensions, so frames are
/// never compressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsDialer;

impl Dialer for WsDialer {
    type Stream = WsStream;

    fn dial(&self, endpoint: &Endpoint) -> Result<WsStream> {
        let uri = endpoint.ws_uri();

        let mut request = uri.as_str().into_client_request()?;
        if let Some(authorization) = endpoint.authorization() {
            let value = HeaderValue::from_str(&authorization)
                .map_err(|e| Error::Config(format!("Invalid API key: {}", e)))?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let stream = TcpStream::connect(endpoint.socket_addr()).map_err(|e| {
            if e.kind() == ErrorKind::ConnectionRefused {
                Error::ConnectionRefused(uri.clone())
            } else {
                Error::Io(e)
            }
        })?;
        stream.set_nodelay(true)?;

        let mut config = WebSocketConfig::default();
        config.max_message_size = None;
        config.max_frame_size = None;

        let (socket, _response) =
            tungstenite::client::client_with_config(request, stream, Some(config)).map_err(
                |e| match e {
                    HandshakeError::Failure(e) => Error::WebSocket(e),
                    HandshakeError::Interrupted(_) => {
                        Error::Handshake("WebSocket upgrade interrupted".into())
                    }
                },
            )?;

        Ok(WsStream {
            socket,
            closed: false,
        })
    }
}

/// A connected WebSocket over a blocking TCP stream.
pub struct WsStream {
    socket: WebSocket<TcpStream>,
    closed: bool,
}

impl FrameStream for WsStream {
    fn send_binary(&mut self, payload: Vec<u8>) -> Result<()> {
        self.socket.send(Message::Binary(payload))?;
        Ok(())
    }

    fn recv(&mut self) -> Result<Frame> {
        loop {
            match self.socket.read()? {
                Message::Binary(data) => return Ok(Frame::Binary(data)),
                Message::Text(text) => return Ok(Frame::Text(text)),
                Message::Close(_) => return Err(Error::ConnectionClosed),
                // Ping/Pong are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.socket.close(None);
        let _ = self.socket.flush();
    }
}

impl Drop for WsStream {
    fn drop(&mut self) {
        self.close();
    }
}
