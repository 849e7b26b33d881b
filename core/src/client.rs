//! Stateless HTTP request builder and response parser for the farm assistant
//! backend.
//!
//! # Design
//! `FarmClient` holds only a `base_url` and carries no mutable state between
//! calls. `build` turns any [`Endpoint`] into an `HttpRequest`; `parse`
//! consumes the matching `HttpResponse`. The caller executes the round-trip
//! in between, keeping this type deterministic and free of I/O.

use crate::config::ClientConfig;
use crate::endpoint::Endpoint;
use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse};

/// Synchronous, stateless client for the farm assistant API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmClient {
    base_url: String,
}

impl FarmClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(&config.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build<E: Endpoint>(&self, endpoint: &E) -> Result<HttpRequest> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let (headers, body) = match endpoint.body() {
            Some(payload) => {
                let body =
                    serde_json::to_string(payload)
                        .map_err(|e| ApiError::SerializationError(e.to_string()))?;
                (
                    vec![("content-type".to_string(), "application/json".to_string())],
                    Some(body),
                )
            }
            None => (Vec::new(), None),
        };
        tracing::debug!(endpoint = E::NAME, method = %E::METHOD, %url, "built request");
        Ok(HttpRequest {
            method: E::METHOD,
            url,
            headers,
            body,
        })
    }

    pub fn parse<E: Endpoint>(&self, response: HttpResponse) -> Result<E::Response> {
        check_status(&response)?;
        E::decode(&response.body)
    }
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
