//! Endpoint definitions for the inference server.
//!
//! One endpoint describes one server: the persistent WebSocket URI and the
//! HTTP fallback URLs are both derived from it.

use crate::defaults;
use crate::error::{Error, Result};

/// Address and credentials of a single inference server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: Option<u16>,
    api_key: Option<String>,
}

impl Endpoint {
    /// Create an endpoint for `host` with no port and no API key.
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::Config("Host must not be empty".into()));
        }

        Ok(Self {
            host,
            port: None,
            api_key: None,
        })
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The WebSocket URI; the port is omitted when none is configured.
    pub fn ws_uri(&self) -> String {
        match self.port {
            Some(port) => format!("ws://{}:{}", self.host, port),
            None => format!("ws://{}", self.host),
        }
    }

    /// Host and port to open the TCP stream against.
    pub(crate) fn socket_addr(&self) -> (&str, u16) {
        (&self.host, self.port.unwrap_or(defaults::WS_PORT))
    }

    /// `Authorization` header value, present only when an API key is set.
    pub fn authorization(&self) -> Option<String> {
        self.api_key.as_ref().map(|key| format!("Api-Key {}", key))
    }

    /// The fallback HTTP URL for `path`. The fallback path requires a port.
    pub fn http_url(&self, path: &str) -> Result<String> {
        let port = self.port.ok_or_else(|| {
            Error::Config("Port must be specified to use the HTTP fallback".into())
        })?;
        Ok(format!("http://{}:{}{}", self.host, port, path))
    }

    pub fn health_url(&self) -> Result<String> {
        self.http_url(defaults::HEALTH_PATH)
    }

    pub fn act_url(&self) -> Result<String> {
        self.http_url(defaults::ACT_PATH)
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: None,
            api_key: None,
        }
    }
}
