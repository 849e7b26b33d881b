//! API client core for the farming assistant app.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network; a [`Transport`] performs the round-trip. On top of
//! that sit the per-screen reducers and controllers that keep the chat,
//! disease, translator, weather and profile screens consistent.
//!
//! # Design
//! - `FarmClient` is stateless: it holds only `base_url`. Each route is an
//!   [`Endpoint`] with typed body and response.
//! - `RequestBuilder` owns every validation rule, so nothing malformed
//!   reaches the transport.
//! - Every outcome is a [`Resolution`]: live data, a flagged stand-in, or a
//!   user-facing alert. Which one is decided per endpoint by [`Fallback`].
//! - Screen state changes only through pure reducers; a closed screen
//!   drops late results.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod request;
pub mod resolve;
pub mod screen;
pub mod session;
pub mod transport;
pub mod types;

pub use client::FarmClient;
pub use config::ClientConfig;
pub use dispatch::{Dispatcher, Phase, Reducer, Screen};
pub use endpoint::Endpoint;
pub use error::{ApiError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{ProfileDraft, ProfileSave, RequestBuilder};
pub use resolve::{resolve, Alert, Fallback, Permission, Resolution};
pub use session::{IdentityProvider, SessionContext, StaticIdentity};
#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;
pub use transport::Transport;
