//! Dispatch pipeline and screen lifetimes.
//!
//! # Design
//! `Dispatcher` runs build → transport → parse → resolve for any endpoint.
//! Each screen owns a `Screen` handle: its state behind a mutex plus a
//! cancellation token. Closing the screen cancels the token; a dispatch
//! racing with the close returns `None` and its result is dropped, so a
//! late response can never touch a screen that is gone.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::client::FarmClient;
use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::request::RequestBuilder;
use crate::resolve::{resolve, Fallback, Resolution};
use crate::session::SessionContext;
use crate::transport::Transport;

pub struct Dispatcher<T> {
    client: FarmClient,
    transport: T,
    max_image_bytes: usize,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Self {
        Self {
            client: FarmClient::from_config(config),
            transport,
            max_image_bytes: config.max_image_bytes,
        }
    }

    pub fn client(&self) -> &FarmClient {
        &self.client
    }

    /// Request builder bound to `session` and this dispatcher's limits.
    pub fn builder<'a>(&self, session: &'a SessionContext) -> RequestBuilder<'a> {
        RequestBuilder::new(session, self.max_image_bytes)
    }

    /// One exchange for `endpoint`, without any fallback applied.
    pub async fn send<E: Endpoint + Sync>(&self, endpoint: &E) -> Result<E::Response> {
        let request = self.client.build(endpoint)?;
        tracing::debug!(endpoint = E::NAME, url = %request.url, "dispatching");
        let response = self.transport.execute(request).await?;
        self.client.parse::<E>(response)
    }

    /// Send `endpoint` and resolve the outcome with its failure policy.
    ///
    /// Returns `None` when `cancel` fires before or during the exchange.
    pub async fn dispatch<E: Fallback + Sync>(
        &self,
        endpoint: &E,
        cancel: &CancellationToken,
    ) -> Option<Resolution<E::Response>> {
        if cancel.is_cancelled() {
            return None;
        }
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            outcome = self.send(endpoint) => outcome,
        };
        if cancel.is_cancelled() || matches!(outcome, Err(ApiError::Cancelled)) {
            tracing::debug!(endpoint = E::NAME, "screen closed; discarding result");
            return None;
        }
        Some(resolve(endpoint, outcome, Utc::now()))
    }
}

#[cfg(feature = "reqwest-transport")]
impl Dispatcher<crate::transport::ReqwestTransport> {
    /// Dispatcher over reqwest for the process-wide configuration.
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::global()?;
        let transport = crate::transport::ReqwestTransport::new(config)?;
        Ok(Self::new(config, transport))
    }
}

/// Pure state transition for a screen.
pub trait Reducer: Sized {
    type Event;

    fn reduce(self, event: Self::Event) -> Self;
}

/// Submission phase shared by every screen. `Submitting` blocks further
/// submits; any resolution returns the screen to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
}

/// Shared handle to one mounted screen.
#[derive(Debug)]
pub struct Screen<S> {
    state: Arc<Mutex<S>>,
    token: CancellationToken,
}

impl<S> Clone for Screen<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            token: self.token.clone(),
        }
    }
}

impl<S: Reducer + Clone> Screen<S> {
    pub fn mount(initial: S) -> Self {
        Self {
            state: Arc::new(Mutex::new(initial)),
            token: CancellationToken::new(),
        }
    }

    pub fn snapshot(&self) -> S {
        self.lock().clone()
    }

    /// Feed `event` through the reducer. Ignored once the screen is closed.
    pub fn apply(&self, event: S::Event) {
        if self.is_closed() {
            return;
        }
        let mut guard = self.lock();
        let current = guard.clone();
        *guard = current.reduce(event);
    }

    /// Run `f` against the current state while holding the lock, then apply
    /// the event it returns, if any. Used for check-then-transition steps.
    pub fn transition<R>(&self, f: impl FnOnce(&S) -> (Option<S::Event>, R)) -> R {
        let mut guard = self.lock();
        let (event, out) = f(&guard);
        if let Some(event) = event {
            if !self.token.is_cancelled() {
                let current = guard.clone();
                *guard = current.reduce(event);
            }
        }
        out
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn close(&self) {
        self.token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    fn lock(&self) -> MutexGuard<'_, S> {
        // A panic inside a reducer leaves the previous state in place.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
