//! Client configuration.
//!
//! Values come from serde (any format the caller likes) or from
//! `POLICY_CLIENT_*` environment variables layered over the defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};
use crate::transport::{Connector, Endpoint};

pub const HOST_ENV: &str = "POLICY_CLIENT_HOST";
pub const PORT_ENV: &str = "POLICY_CLIENT_PORT";
pub const API_KEY_ENV: &str = "POLICY_CLIENT_API_KEY";
pub const RETRY_DELAY_ENV: &str = "POLICY_CLIENT_RETRY_DELAY_SECS";

/// Where to find the policy server and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "defaults::host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "defaults::retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: None,
            api_key: None,
            retry_delay_secs: defaults::RETRY_DELAY_SECS,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by any `POLICY_CLIENT_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(host) = lookup(HOST_ENV) {
            self.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.port = Some(parse_var(PORT_ENV, &port)?);
        }
        if let Some(api_key) = lookup(API_KEY_ENV) {
            self.api_key = Some(api_key).filter(|key| !key.is_empty());
        }
        if let Some(delay) = lookup(RETRY_DELAY_ENV) {
            self.retry_delay_secs = parse_var(RETRY_DELAY_ENV, &delay)?;
        }
        Ok(self)
    }

    pub fn endpoint(&self) -> Result<Endpoint> {
        let mut endpoint = Endpoint::new(self.host.clone())?;
        if let Some(port) = self.port {
            endpoint = endpoint.with_port(port);
        }
        if let Some(api_key) = &self.api_key {
            endpoint = endpoint.with_api_key(api_key.clone());
        }
        Ok(endpoint)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// A WebSocket connector using the configured retry delay.
    pub fn connector(&self) -> Connector {
        Connector::new().retry_delay(self.retry_delay())
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {}='{}': {}", name, value, e)))
}
