//! Payload codecs.
//!
//! The WebSocket path carries msgpack-numpy frames ([`MsgpackCodec`]); the
//! HTTP fallback carries json-numpy bodies ([`json`]).

pub mod json;
pub mod msgpack;
pub mod value;

pub use msgpack::MsgpackCodec;
pub use value::{ByteOrder, DType, Element, NdArray, Payload, Value};

use crate::error::Result;

/// Serializes a payload mapping to and from one binary buffer.
pub trait Codec {
    fn encode(&self, payload: &Payload) -> Result<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> Result<Payload>;
}
