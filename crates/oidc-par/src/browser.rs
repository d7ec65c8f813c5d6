//! Front-channel launcher contract
//!
//! The client never drives a user agent itself. A [`Browser`] opens the
//! authorize URL, waits for the redirect back to `end_url`, and reports the
//! full callback URL. Its presence is a precondition for pushing.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Default time a browser may take to complete the front channel
pub const DEFAULT_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

/// What the browser should open and where it should stop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Authorize URL carrying `client_id` and `request_uri`
    pub start_url: String,
    /// Redirect URI prefix that ends the flow
    pub end_url: String,
    /// Upper bound for the whole interaction
    pub timeout: Duration,
}

impl BrowserOptions {
    /// Options with the default timeout
    pub fn new(start_url: impl Into<String>, end_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            end_url: end_url.into(),
            timeout: DEFAULT_BROWSER_TIMEOUT,
        }
    }
}

/// How a browser interaction ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserResultType {
    /// The redirect to `end_url` was captured
    Success,
    /// The authorize page failed with an HTTP error
    HttpError,
    /// The user closed the window or declined
    UserCancel,
    /// `timeout` elapsed
    Timeout,
    /// Anything else
    UnknownError,
}

impl BrowserResultType {
    /// Snake-case code used when reporting a failed interaction
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HttpError => "http_error",
            Self::UserCancel => "user_cancel",
            Self::Timeout => "timeout",
            Self::UnknownError => "unknown_error",
        }
    }
}

/// Outcome of a browser interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserResult {
    /// How the interaction ended
    pub result_type: BrowserResultType,
    /// Captured callback URL on success
    pub response: Option<String>,
    /// Diagnostic on failure
    pub error: Option<String>,
}

impl BrowserResult {
    /// Successful interaction that captured `callback_url`
    pub fn success(callback_url: impl Into<String>) -> Self {
        Self {
            result_type: BrowserResultType::Success,
            response: Some(callback_url.into()),
            error: None,
        }
    }

    /// Failed interaction
    pub fn failure(result_type: BrowserResultType, error: impl Into<String>) -> Self {
        Self {
            result_type,
            response: None,
            error: Some(error.into()),
        }
    }
}

/// User-agent launcher for the front channel
#[async_trait]
pub trait Browser: Send + Sync + fmt::Debug {
    /// Open `options.start_url` and wait for the redirect to `options.end_url`
    async fn invoke(&self, options: BrowserOptions) -> BrowserResult;
}
