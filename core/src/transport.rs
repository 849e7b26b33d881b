//! Executing `HttpRequest` values against the network.
//!
//! The core never performs I/O on its own; a [`Transport`] does. Hosts that
//! own their networking stack (the mobile shell over FFI) skip this module
//! and feed responses straight into `FarmClient::parse`. Each call is one
//! exchange: no retries, no backoff.

use async_trait::async_trait;

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request/response exchange. Non-2xx statuses are returned
    /// as data; only failures that produce no response are errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(feature = "reqwest-transport")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest-transport")]
mod reqwest_transport {
    use async_trait::async_trait;

    use super::Transport;
    use crate::config::ClientConfig;
    use crate::error::{ApiError, Result};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// `reqwest`-backed transport with the configured request timeout.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        pub fn new(config: &ClientConfig) -> Result<Self> {
            let client = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()
                .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;
            Ok(Self { client })
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            let method = match request.method {
                HttpMethod::Get => reqwest::Method::GET,
                HttpMethod::Post => reqwest::Method::POST,
                HttpMethod::Put => reqwest::Method::PUT,
            };
            let mut builder = self.client.request(method, &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    ApiError::Transport(format!("timed out: {}", request.url))
                } else {
                    ApiError::Transport(e.to_string())
                }
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(k, v)| {
                    v.to_str()
                        .ok()
                        .map(|v| (k.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Transport(format!("failed to read body: {e}")))?;

            Ok(HttpResponse { status, headers, body })
        }
    }
}
