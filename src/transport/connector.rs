//! Connection lifecycle: wait for the server, then read its metadata.

use std::thread;
use std::time::Duration;

use crate::codec::{Codec, MsgpackCodec, Payload};
use crate::defaults;
use crate::error::{Error, Result};
use crate::transport::endpoints::Endpoint;
use crate::transport::stream::{Dialer, Frame, FrameStream, WsDialer};

/// Opens the persistent connection and performs the metadata handshake.
#[derive(Debug, Clone)]
pub struct Connector<D = WsDialer, C = MsgpackCodec> {
    dialer: D,
    codec: C,
    retry_delay: Duration,
}

impl Connector {
    /// WebSocket dialer, msgpack codec and the default retry delay.
    pub fn new() -> Self {
        Self::with_parts(WsDialer, MsgpackCodec)
    }
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dialer, C: Codec> Connector<D, C> {
    pub fn with_parts(dialer: D, codec: C) -> Self {
        Self {
            dialer,
            codec,
            retry_delay: defaults::retry_delay(),
        }
    }

    /// Set the fixed delay between refused connection attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Block until the server accepts a connection, then read the handshake.
    ///
    /// Refused connections are retried forever at a fixed interval; every
    /// other dial error is returned immediately.
    pub fn connect(&self, endpoint: &Endpoint) -> Result<(D::Stream, Payload)> {
        let mut stream = self.wait_for_server(endpoint)?;

        match self.handshake(&mut stream) {
            Ok(metadata) => {
                log::debug!(
                    "Connected to {} ({} metadata keys)",
                    endpoint.ws_uri(),
                    metadata.len()
                );
                Ok((stream, metadata))
            }
            Err(e) => {
                stream.close();
                Err(e)
            }
        }
    }

    fn wait_for_server(&self, endpoint: &Endpoint) -> Result<D::Stream> {
        log::info!("Waiting for server at {}...", endpoint.ws_uri());

        loop {
            match self.dialer.dial(endpoint) {
                Ok(stream) => return Ok(stream),
                Err(Error::ConnectionRefused(_)) => {
                    log::info!("Still waiting for server...");
                    thread::sleep(self.retry_delay);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn handshake(&self, stream: &mut D::Stream) -> Result<Payload> {
        match stream.recv()? {
            Frame::Binary(data) => self.codec.decode(&data),
            Frame::Text(text) => Err(Error::Handshake(format!(
                "Expected binary metadata frame, got text: {}",
                text
            ))),
        }
    }
}
