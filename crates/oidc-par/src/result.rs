//! Outcome of a pushed authorization request

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::state::ParState;

/// Successful PAR endpoint response (RFC 9126 Section 2.2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParResponse {
    /// Handle that replaces the authorization parameters on the front channel
    pub request_uri: String,
    /// Lifetime of `request_uri` in seconds
    pub expires_in: u64,
}

/// OAuth 2.0 error response body (RFC 6749 Section 5.2)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code
    pub error: String,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
    /// Page with more information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

/// Result of [`ParClient::push_authorization`](crate::ParClient::push_authorization)
///
/// Exactly one of `request_uri` or `error` is set. `state` is always present
/// since it is computed before the request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParResult {
    /// Issued `request_uri`
    pub request_uri: Option<String>,
    /// Lifetime of `request_uri` in seconds
    pub expires_in: Option<u64>,
    /// Correlation state to persist until the callback
    pub state: ParState,
    /// Raw response body when the PAR endpoint rejected the request
    pub error: Option<String>,
    /// HTTP status of the rejection
    pub error_status: Option<u16>,
}

impl ParResult {
    pub(crate) fn success(state: ParState, response: ParResponse) -> Self {
        Self {
            request_uri: Some(response.request_uri),
            expires_in: Some(response.expires_in),
            state,
            error: None,
            error_status: None,
        }
    }

    pub(crate) fn failure(state: ParState, status: u16, body: String) -> Self {
        Self {
            request_uri: None,
            expires_in: None,
            state,
            error: Some(body),
            error_status: Some(status),
        }
    }

    /// Whether the PAR endpoint rejected the request
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Front-channel URL to send the user agent to, or `None` after a rejection
    ///
    /// # Errors
    ///
    /// Returns [`ParError::InvalidUrl`](crate::ParError::InvalidUrl) if the
    /// stored start URL does not parse.
    pub fn authorize_url(&self) -> Result<Option<String>> {
        self.request_uri
            .as_deref()
            .map(|request_uri| self.state.authorize_url(request_uri))
            .transpose()
    }

    /// Structured view of `error` when the body is an RFC 6749 error object
    #[must_use]
    pub fn error_response(&self) -> Option<ErrorResponse> {
        self.error
            .as_deref()
            .and_then(|body| serde_json::from_str(body).ok())
    }
}
