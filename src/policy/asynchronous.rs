//! Async boundary around blocking policies.
//!
//! The protocol itself is synchronous. `AsyncPolicy` moves each call onto
//! tokio's blocking pool so it can be awaited, and lets the caller impose a
//! deadline the core does not have.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::policy::{Action, Observation, Policy};

/// Runs a blocking [`Policy`] from async code.
///
/// Calls are serialized through a mutex, so clones share one connection and
/// never interleave on it.
pub struct AsyncPolicy<P> {
    inner: Arc<Mutex<P>>,
}

impl<P> Clone for AsyncPolicy<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Policy + Send + 'static> AsyncPolicy<P> {
    pub fn new(policy: P) -> Self {
        Self {
            inner: Arc::new(Mutex::new(policy)),
        }
    }

    pub async fn infer(&self, observation: Observation) -> Result<Action> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut policy = inner.lock().map_err(|_| Error::LockPoisoned)?;
            policy.infer(&observation)
        })
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
    }

    /// Like [`infer`](Self::infer), but gives up after `timeout`.
    ///
    /// The blocked call is not cancelled: it keeps the policy locked until
    /// the server answers, and the next call waits for it.
    pub async fn infer_timeout(&self, observation: Observation, timeout: Duration) -> Result<Action> {
        tokio::time::timeout(timeout, self.infer(observation))
            .await
            .map_err(|_| Error::Timeout)?
    }

    pub async fn reset(&self) -> Result<()> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            inner.lock().map_err(|_| Error::LockPoisoned)?.reset();
            Ok(())
        })
        .await
        .map_err(|e| Error::TaskJoin(e.to_string()))?
    }

    /// Recover the wrapped policy.
    ///
    /// Returns `None` while clones or a timed-out call still hold it, or if a
    /// call panicked.
    pub fn into_inner(self) -> Option<P> {
        Arc::try_unwrap(self.inner).ok()?.into_inner().ok()
    }
}
