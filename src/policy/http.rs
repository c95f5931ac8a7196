//! Stateless HTTP fallback for servers without a WebSocket endpoint.
//!
//! One call is a health probe followed by a single `/act` POST. Any reply
//! other than exactly 200 degrades to an empty action instead of an error,
//! other 2xx statuses included.

use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::json;

use crate::codec::json as json_numpy;
use crate::error::Result;
use crate::policy::{Action, Observation, Policy};
use crate::transport::Endpoint;

/// Run one fallback call against `endpoint`.
///
/// Fails with a configuration error before any network activity when the
/// endpoint has no port.
pub fn call_http(client: &Client, observation: &Observation, endpoint: &Endpoint) -> Result<Action> {
    let health_url = endpoint.health_url()?;
    let act_url = endpoint.act_url()?;
    let body = json!({ "observation": json_numpy::to_json(observation)? });

    // The probe is informational; its outcome never gates the call
    match client.get(&health_url).send() {
        Ok(response) => {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            log::info!("Health check response: {} - {}", status, text);
        }
        Err(e) => log::warn!("Health check against {} failed: {}", health_url, e),
    }

    let started = Instant::now();
    let response = client.post(&act_url).json(&body).send()?;
    log::debug!("Action round trip to {} took {:?}", act_url, started.elapsed());

    let status = response.status();
    if status != StatusCode::OK {
        let text = response.text().unwrap_or_default();
        log::warn!("Fallback request failed: {} - {}", status, text);
        return Ok(Action::new());
    }

    let action: serde_json::Value = response.json()?;
    json_numpy::from_json(action)
}

/// [`Policy`] over the HTTP fallback path.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
    client: Client,
    endpoint: Endpoint,
}

impl HttpPolicy {
    /// Create a fallback client. The endpoint must carry a port.
    pub fn new(endpoint: Endpoint) -> Result<Self> {
        let client = Client::builder().build()?;
        Self::with_client(client, endpoint)
    }

    /// Use a preconfigured HTTP client (proxies, timeouts, TLS).
    pub fn with_client(client: Client, endpoint: Endpoint) -> Result<Self> {
        endpoint.act_url()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn call(&self, observation: &Observation) -> Result<Action> {
        call_http(&self.client, observation, &self.endpoint)
    }
}

impl Policy for HttpPolicy {
    fn infer(&mut self, observation: &Observation) -> Result<Action> {
        self.call(observation)
    }

    fn reset(&mut self) {}
}
