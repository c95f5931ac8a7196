//! Policy client over a persistent WebSocket connection.

use crate::codec::{Codec, MsgpackCodec};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::policy::{Action, HttpPolicy, Observation, Policy, ServerMetadata};
use crate::transport::{Connector, Dialer, Endpoint, Frame, FrameStream, WsStream};

/// Queries a remote policy server over one long-lived connection.
///
/// Construction blocks until the server is reachable and its metadata has
/// been received. Each [`infer`](Self::infer) is a full request/response
/// round trip; `&mut self` keeps calls on the connection strictly sequential.
/// Dropping the client closes the connection.
pub struct WebsocketClientPolicy<S: FrameStream = WsStream, C: Codec = MsgpackCodec> {
    endpoint: Endpoint,
    stream: S,
    codec: C,
    server_metadata: ServerMetadata,
}

impl WebsocketClientPolicy {
    /// Connect with the default WebSocket transport and msgpack codec.
    pub fn connect(endpoint: Endpoint) -> Result<Self> {
        Self::with_connector(endpoint, &Connector::new())
    }

    /// Connect using the endpoint and retry delay from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::with_connector(config.endpoint()?, &config.connector())
    }
}

impl<S: FrameStream, C: Codec + Clone> WebsocketClientPolicy<S, C> {
    /// Connect through a custom connector (transport and codec).
    pub fn with_connector<D>(endpoint: Endpoint, connector: &Connector<D, C>) -> Result<Self>
    where
        D: Dialer<Stream = S>,
    {
        let (stream, server_metadata) = connector.connect(&endpoint)?;

        Ok(Self {
            endpoint,
            stream,
            codec: connector.codec().clone(),
            server_metadata,
        })
    }
}

impl<S: FrameStream, C: Codec> WebsocketClientPolicy<S, C> {
    /// Metadata received in the handshake.
    pub fn server_metadata(&self) -> &ServerMetadata {
        &self.server_metadata
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Send one observation and wait for the matching action.
    ///
    /// A textual reply is the server reporting an error; it becomes
    /// [`Error::Server`] and the connection stays usable.
    pub fn infer(&mut self, observation: &Observation) -> Result<Action> {
        let request = self.codec.encode(observation)?;
        self.stream.send_binary(request)?;

        match self.stream.recv()? {
            Frame::Binary(data) => self.codec.decode(&data),
            Frame::Text(message) => Err(Error::Server(message)),
        }
    }

    /// No protocol effect; the server keeps no per-client episode state.
    pub fn reset(&mut self) {}

    /// Query the server's HTTP fallback instead of the open connection.
    ///
    /// Requires the endpoint to carry a port.
    pub fn get_action(&self, observation: &Observation) -> Result<Action> {
        HttpPolicy::new(self.endpoint.clone())?.call(observation)
    }
}

impl<S: FrameStream, C: Codec> Policy for WebsocketClientPolicy<S, C> {
    fn infer(&mut self, observation: &Observation) -> Result<Action> {
        WebsocketClientPolicy::infer(self, observation)
    }

    fn reset(&mut self) {
        WebsocketClientPolicy::reset(self)
    }
}

impl<S: FrameStream, C: Codec> Drop for WebsocketClientPolicy<S, C> {
    fn drop(&mut self) {
        self.stream.close();
    }
}
