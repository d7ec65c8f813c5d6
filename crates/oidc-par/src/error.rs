//! Error types for the PAR client
//!
//! Expected outcomes (the PAR endpoint rejecting a request) are values on
//! [`ParResult`](crate::ParResult). Everything here is an actual failure.

use thiserror::Error;

use crate::transport::TransportError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ParError>;

/// PAR client errors
#[derive(Debug, Error)]
pub enum ParError {
    /// Client is misconfigured; no network activity took place
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Back-channel request failed (network, DNS, cancellation)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// PAR endpoint answered 2xx with a body that is not a valid PAR response
    #[error("Malformed PAR response (HTTP {status}): {reason}")]
    MalformedResponse {
        /// HTTP status of the response
        status: u16,
        /// Parser diagnostic
        reason: String,
    },

    /// A URL could not be parsed or assembled
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ParError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Whether this error was raised before any request was sent
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Reasons an authorization callback is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallbackError {
    /// Callback URL did not parse
    #[error("Invalid callback URL: {0}")]
    InvalidUrl(String),

    /// Authorization server reported an error on the front channel
    #[error("Authorization failed: {error}{}", description_suffix(.description))]
    Authorization {
        /// `error` parameter
        error: String,
        /// `error_description` parameter
        description: Option<String>,
    },

    /// Callback carried no `state`
    #[error("Missing state parameter")]
    MissingState,

    /// Callback `state` differs from the stored one
    #[error("State parameter does not match")]
    StateMismatch,

    /// Callback carried no authorization `code`
    #[error("Missing authorization code")]
    MissingCode,
}

fn description_suffix(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" - {d}"))
        .unwrap_or_default()
}

impl CallbackError {
    /// OAuth-style error code for this rejection
    #[must_use]
    pub fn error_code(&self) -> &str {
        match self {
            Self::Authorization { error, .. } => error,
            Self::InvalidUrl(_) | Self::MissingState | Self::MissingCode => "invalid_callback",
            Self::StateMismatch => "invalid_state",
        }
    }
}
