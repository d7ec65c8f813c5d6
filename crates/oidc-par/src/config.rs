//! PAR Client Configuration
//!
//! Static, read-only settings shared by every push a [`ParClient`](crate::ParClient)
//! performs. Empty strings mean "not configured" and suppress the matching
//! request parameter.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ParError, Result};

/// Default length of the anti-forgery `state` value
pub const DEFAULT_STATE_LENGTH: usize = 16;

/// Accepted range for [`ParClientOptions::state_length`]
pub const STATE_LENGTH_RANGE: std::ops::RangeInclusive<usize> = 8..=512;

/// PAR client options
///
/// # Example
///
/// ```rust
/// use oidc_par::ParClientOptions;
///
/// let options = ParClientOptions::new(
///     "web-app",
///     "https://as.example.com/par",
///     "https://as.example.com/authorize",
/// )
/// .with_scope("openid profile")
/// .with_resource("https://api.example.com")
/// .with_redirect_uri("https://app.example.com/callback");
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParClientOptions {
    /// Client ID
    #[serde(default)]
    pub client_id: String,
    /// Client secret; leave empty for public clients
    #[serde(
        default = "empty_secret",
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub client_secret: SecretString,
    /// Space-delimited scope string
    #[serde(default)]
    pub scope: String,
    /// Resource indicators (RFC 8707), sent in order
    #[serde(default)]
    pub resources: Vec<String>,
    /// Redirect URI registered for this client
    #[serde(default)]
    pub redirect_uri: String,
    /// Where the provider should send the user after logout
    #[serde(default)]
    pub post_logout_redirect_uri: String,
    /// Length of the generated `state` value
    #[serde(default = "default_state_length")]
    pub state_length: usize,
    /// Pushed authorization request endpoint (RFC 9126)
    pub par_endpoint: String,
    /// Authorization endpoint the user agent is sent to
    pub authorize_endpoint: String,
}

fn empty_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_state_length() -> usize {
    DEFAULT_STATE_LENGTH
}

// Custom serialization for SecretString
fn serialize_secret<S>(secret: &SecretString, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(secret.expose_secret())
}

// Custom deserialization for SecretString
fn deserialize_secret<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    Ok(SecretString::new(s))
}

impl ParClientOptions {
    /// Create options with the required endpoints and defaults elsewhere
    pub fn new(
        client_id: impl Into<String>,
        par_endpoint: impl Into<String>,
        authorize_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: empty_secret(),
            scope: String::new(),
            resources: Vec::new(),
            redirect_uri: String::new(),
            post_logout_redirect_uri: String::new(),
            state_length: DEFAULT_STATE_LENGTH,
            par_endpoint: par_endpoint.into(),
            authorize_endpoint: authorize_endpoint.into(),
        }
    }

    /// Set the client secret (confidential clients only)
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = SecretString::new(secret.into());
        self
    }

    /// Set the scope string
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Append one resource indicator
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resources.push(resource.into());
        self
    }

    /// Replace the resource indicators
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Set the redirect URI
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Set the post-logout redirect URI
    pub fn with_post_logout_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.post_logout_redirect_uri = uri.into();
        self
    }

    /// Set the `state` length
    pub fn with_state_length(mut self, length: usize) -> Self {
        self.state_length = length;
        self
    }

    /// Whether a client secret is configured
    #[must_use]
    pub fn has_client_secret(&self) -> bool {
        !self.client_secret.expose_secret().is_empty()
    }

    /// Check the options before any request is made
    ///
    /// # Errors
    ///
    /// Returns [`ParError::Configuration`] if:
    /// - `par_endpoint` or `authorize_endpoint` is not an absolute http(s) URL
    /// - `state_length` is outside [`STATE_LENGTH_RANGE`]
    /// - `redirect_uri` or `post_logout_redirect_uri` is set but does not parse
    pub fn validate(&self) -> Result<()> {
        validate_endpoint("par_endpoint", &self.par_endpoint)?;
        validate_endpoint("authorize_endpoint", &self.authorize_endpoint)?;

        if !STATE_LENGTH_RANGE.contains(&self.state_length) {
            return Err(ParError::configuration(format!(
                "state_length must be between {} and {}, got {}",
                STATE_LENGTH_RANGE.start(),
                STATE_LENGTH_RANGE.end(),
                self.state_length
            )));
        }

        validate_optional_uri("redirect_uri", &self.redirect_uri)?;
        validate_optional_uri("post_logout_redirect_uri", &self.post_logout_redirect_uri)?;

        Ok(())
    }
}

fn validate_endpoint(name: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| ParError::configuration(format!("Invalid {name} '{value}': {e}")))?;

    match url.scheme() {
        "https" | "http" => Ok(()),
        scheme => Err(ParError::configuration(format!(
            "Unsupported {name} scheme: {scheme}. Use https or http"
        ))),
    }
}

fn validate_optional_uri(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ParError::configuration(format!("Invalid {name} '{value}': {e}")))
}
