//! Policy clients.
//!
//! Every client exposes the same two-method [`Policy`] capability, so a
//! control loop can swap the WebSocket client for the HTTP fallback (or a
//! local stub) without changing.

mod asynchronous;
mod http;
mod websocket;

pub use asynchronous::AsyncPolicy;
pub use http::{call_http, HttpPolicy};
pub use websocket::WebsocketClientPolicy;

use crate::codec::Payload;
use crate::error::Result;

/// Input to a single inference call.
pub type Observation = Payload;
/// Decoded inference result.
pub type Action = Payload;
/// Metadata the server sends once per connection.
pub type ServerMetadata = Payload;

/// Something that maps observations to actions.
pub trait Policy {
    /// Run one inference round trip.
    fn infer(&mut self, observation: &Observation) -> Result<Action>;

    /// Clear client-local episode state.
    fn reset(&mut self);
}
