//! Vaultward Venue - REST client for the trading venue.
//!
//! Order placement and cancellation go through a [`VenueTransport`] seam
//! so tests can script responses. The client retries transient 5xx
//! replies a bounded number of times with a delay, records how many
//! transport attempts a call took, and treats every other failure as
//! final for that call only.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use vaultward_types::{CancelScope, PlaceOrderArgs};

#[derive(Error, Debug)]
pub enum VenueError {
    #[error("venue transport: {0}")]
    Transport(String),
    /// Non-retryable status (4xx and friends).
    #[error("venue HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The retry budget ran out on transient failures.
    #[error("venue still failing after {attempts} attempts: HTTP {status}: {body}")]
    Exhausted {
        attempts: u32,
        status: u16,
        body: String,
    },
}

pub type Result<T> = std::result::Result<T, VenueError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueMethod {
    Post,
    Delete,
}

/// One REST call before authentication headers are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueRequest {
    pub method: VenueMethod,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueResponse {
    pub status: u16,
    pub body: String,
}

/// A completed venue call with its transport attempt count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueOutcome {
    pub status: u16,
    pub body: String,
    pub attempts: u32,
}

/// Raw transport seam, mockable in tests.
#[async_trait]
pub trait VenueTransport: Send + Sync {
    async fn execute(&self, request: &VenueRequest) -> Result<VenueResponse>;
}

/// Static credential set the venue authenticates with.
#[derive(Debug, Clone)]
pub struct VenueAuth {
    pub api_key: String,
    pub secret: String,
    pub passphrase: String,
}

/// reqwest-backed transport attaching the static auth headers.
pub struct HttpVenueTransport {
    client: reqwest::Client,
    base_url: String,
    auth: VenueAuth,
}

impl HttpVenueTransport {
    pub fn new(base_url: impl Into<String>, auth: VenueAuth) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            auth,
        }
    }
}

#[async_trait]
impl VenueTransport for HttpVenueTransport {
    async fn execute(&self, request: &VenueRequest) -> Result<VenueResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = match request.method {
            VenueMethod::Post => self.client.post(&url),
            VenueMethod::Delete => self.client.delete(&url),
        };
        let mut builder = builder
            .header("X-API-KEY", &self.auth.api_key)
            .header("X-API-SECRET", &self.auth.secret)
            .header("X-API-PASSPHRASE", &self.auth.passphrase);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder
            .send()
            .await
            .map_err(|error| VenueError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|error| VenueError::Transport(error.to_string()))?;
        Ok(VenueResponse { status, body })
    }
}

/// Venue client with bounded transient retry.
pub struct VenueClient<T> {
    transport: T,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<T: VenueTransport> VenueClient<T> {
    pub fn new(transport: T, max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            transport,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub async fn place_order(&self, order: &PlaceOrderArgs) -> Result<VenueOutcome> {
        self.request(VenueRequest {
            method: VenueMethod::Post,
            path: "/orders".to_string(),
            body: Some(json!(order)),
        })
        .await
    }

    pub async fn cancel_orders(&self, scope: &CancelScope) -> Result<VenueOutcome> {
        let request = match scope {
            CancelScope::ByIds { ids } => VenueRequest {
                method: VenueMethod::Delete,
                path: "/orders".to_string(),
                body: Some(json!({ "ids": ids })),
            },
            CancelScope::ByMarket { market } => VenueRequest {
                method: VenueMethod::Delete,
                path: format!("/orders/market/{market}"),
                body: None,
            },
            CancelScope::All => VenueRequest {
                method: VenueMethod::Delete,
                path: "/orders/all".to_string(),
                body: None,
            },
        };
        self.request(request).await
    }

    async fn request(&self, request: VenueRequest) -> Result<VenueOutcome> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let response = self.transport.execute(&request).await?;
            if (200..300).contains(&response.status) {
                debug!(path = %request.path, attempts, "venue call succeeded");
                return Ok(VenueOutcome {
                    status: response.status,
                    body: response.body,
                    attempts,
                });
            }
            if response.status >= 500 && attempts < self.max_attempts {
                warn!(
                    path = %request.path,
                    status = response.status,
                    attempts,
                    "transient venue failure, retrying"
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            if response.status >= 500 {
                return Err(VenueError::Exhausted {
                    attempts,
                    status: response.status,
                    body: response.body,
                });
            }
            return Err(VenueError::Http {
                status: response.status,
                body: response.body,
            });
        }
    }
}
