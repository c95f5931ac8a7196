//! Default values for endpoints and connection behavior.

use std::time::Duration;

pub const HOST: &str = "0.0.0.0";
pub const RETRY_DELAY_SECS: u64 = 5;

/// TCP port dialed when a `ws://` URI carries no explicit port.
pub const WS_PORT: u16 = 80;

pub const HEALTH_PATH: &str = "/health";
pub const ACT_PATH: &str = "/act";

pub fn host() -> String { HOST.to_string() }
pub fn retry_delay_secs() -> u64 { RETRY_DELAY_SECS }
pub fn retry_delay() -> Duration { Duration::from_secs(RETRY_DELAY_SECS) }
