//! Policy client - Rust client for remote robot-policy inference servers.
//!
//! A control loop connects once, receives the server's metadata, then calls
//! [`WebsocketClientPolicy::infer`] with an observation and gets an action
//! back over the same connection.
//!
//! ```no_run
//! use policy_client::{Endpoint, NdArray, Observation, WebsocketClientPolicy};
//!
//! # fn main() -> policy_client::Result<()> {
//! let endpoint = Endpoint::new("localhost")?.with_port(8000);
//! let mut policy = WebsocketClientPolicy::connect(endpoint)?;
//!
//! let mut obs = Observation::new();
//! obs.insert("state".to_string(), NdArray::new(vec![7], &[0.0f32; 7])?.into());
//! obs.insert("prompt".to_string(), "fold the towel".into());
//!
//! let action = policy.infer(&obs)?;
//! println!("{:?}", action.get("actions"));
//! # Ok(())
//! # }
//! ```

mod defaults;
pub mod error;

pub mod codec;
pub mod config;
pub mod policy;
pub mod transport;

pub use error::{Error, Result};

pub use codec::{ByteOrder, Codec, DType, Element, MsgpackCodec, NdArray, Payload, Value};
pub use config::ClientConfig;
pub use policy::{
    call_http, Action, AsyncPolicy, HttpPolicy, Observation, Policy, ServerMetadata,
    WebsocketClientPolicy,
};
pub use transport::{Connector, Dialer, Endpoint, Frame, FrameStream, WsDialer, WsStream};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
