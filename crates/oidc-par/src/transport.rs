//! Back-channel Transport
//!
//! [`ParTransport`] is the single capability the client needs from HTTP: POST
//! a form body and hand back status plus body bytes. [`HttpTransport`] is the
//! reqwest-backed implementation.
//!
//! ## Security Configuration
//!
//! The default client:
//! - does NOT follow redirects (SSRF protection per OAuth2 security guidance)
//! - uses rustls for TLS
//! - times out after 30 seconds

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use http::header::{ACCEPT, CONTENT_TYPE};
use thiserror::Error;

/// Content type of a PAR request body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Default request timeout for [`HttpTransport::new`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// Request execution failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Response body read failed
    #[error("Failed to read response body: {0}")]
    BodyRead(String),

    /// Request was cancelled before it completed
    #[error("Request cancelled")]
    Cancelled,

    /// Failure reported by a custom transport
    #[error("{0}")]
    Other(Box<dyn StdError + Send + Sync>),
}

/// Status and body of a back-channel response
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Raw response body
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Build a response from parts
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Body decoded as UTF-8, with invalid sequences replaced
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// POST capability used by [`ParClient`](crate::ParClient)
///
/// Implementations must be safe for concurrent use; the client shares one
/// transport across all in-flight pushes. Retry and timeout policy belong here,
/// not in the client.
#[async_trait]
pub trait ParTransport: Send + Sync + fmt::Debug {
    /// POST `body` as `application/x-www-form-urlencoded` to `url`
    async fn post_form(&self, url: &str, body: String)
    -> Result<TransportResponse, TransportError>;
}

/// reqwest-backed [`ParTransport`]
#[derive(Clone)]
pub struct HttpTransport {
    inner: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with security-hardened defaults
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom request timeout
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let inner = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self { inner })
    }

    /// Wrap an existing reqwest client
    ///
    /// # Warning
    /// Ensure the client is configured with `redirect::Policy::none()`;
    /// a redirected PAR push would resend the form body, client secret included.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("inner", &"<reqwest::Client>")
            .finish()
    }
}

#[async_trait]
impl ParTransport for HttpTransport {
    async fn post_form(
        &self,
        url: &str,
        body: String,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::BodyRead(e.to_string()))?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }
}
