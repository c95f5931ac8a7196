//! Persistent-connection transport to the inference server.
//!
//! A [`Connector`] dials an [`Endpoint`] through a [`Dialer`], waiting while
//! the server refuses connections, and reads the metadata handshake. The
//! resulting [`FrameStream`] carries one binary request and one reply per call.

pub mod connector;
pub mod endpoints;
pub mod stream;

pub use connector::Connector;
pub use endpoints::Endpoint;
pub use stream::{Dialer, Frame, FrameStream, WsDialer, WsStream};
