//! Correlation state carried across the front-channel redirect
//!
//! A [`ParState`] is created once per authorization attempt, before the push.
//! The caller persists it (short-lived session, signed cookie) until the
//! callback arrives, then consumes it once through [`ParState::validate_callback`].
//!
//! # PKCE Code Verifier Storage
//!
//! `code_verifier` must never reach the user agent. Keep the serialized state
//! server-side or encrypted, and discard it after the callback is processed.

use std::fmt;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use url::Url;

use crate::error::{CallbackError, ParError, Result};
use crate::params::{ParameterSet, keys};

/// State that must survive between the push and the authorization callback
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParState {
    /// Anti-forgery value echoed back on the callback
    pub state: String,
    /// Redirect URI copied from configuration
    pub redirect_uri: String,
    /// PKCE code verifier (never sent in the push)
    pub code_verifier: String,
    /// Authorization endpoint the user agent will be sent to
    pub start_url: String,
    /// Parameters as pushed to the PAR endpoint
    pub parameters: ParameterSet,
}

// Manual Debug impl to keep the verifier out of logs
impl fmt::Debug for ParState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParState")
            .field("state", &self.state)
            .field("redirect_uri", &self.redirect_uri)
            .field("code_verifier", &"[REDACTED]")
            .field("start_url", &self.start_url)
            .field("parameters", &self.parameters)
            .finish()
    }
}

impl ParState {
    /// Front-channel URL for a `request_uri` issued by the PAR endpoint
    ///
    /// Per RFC 9126 Section 4 the authorization request carries only
    /// `client_id` and `request_uri`.
    ///
    /// # Errors
    ///
    /// Returns [`ParError::InvalidUrl`] if `start_url` does not parse.
    pub fn authorize_url(&self, request_uri: &str) -> Result<String> {
        let mut url = Url::parse(&self.start_url)
            .map_err(|e| ParError::InvalidUrl(format!("{}: {e}", self.start_url)))?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(client_id) = self.parameters.get(keys::CLIENT_ID) {
                query.append_pair(keys::CLIENT_ID, client_id);
            }
            query.append_pair(keys::REQUEST_URI, request_uri);
        }

        Ok(url.into())
    }

    /// Validate the URL the user agent was redirected to
    ///
    /// Parameters are read from the query, or from the fragment when the query
    /// carries no `code`, `state` or `error` (a redirect URI may have its own
    /// query). `state` is compared in constant time.
    ///
    /// # Errors
    ///
    /// - [`CallbackError::InvalidUrl`] if the callback does not parse
    /// - [`CallbackError::Authorization`] if the server returned `error`
    /// - [`CallbackError::MissingState`] / [`CallbackError::StateMismatch`]
    /// - [`CallbackError::MissingCode`]
    pub fn validate_callback(
        &self,
        callback_url: &str,
    ) -> std::result::Result<AuthorizeCallback, CallbackError> {
        let url =
            Url::parse(callback_url).map_err(|e| CallbackError::InvalidUrl(e.to_string()))?;

        let mut params = ParameterSet::from_form_urlencoded(url.query().unwrap_or_default());
        if !carries_response(&params)
            && let Some(fragment) = url.fragment()
        {
            params = ParameterSet::from_form_urlencoded(fragment);
        }

        if let Some(error) = params.get(keys::ERROR) {
            return Err(CallbackError::Authorization {
                error: error.to_string(),
                description: params.get(keys::ERROR_DESCRIPTION).map(str::to_string),
            });
        }

        let state = params.get(keys::STATE).ok_or(CallbackError::MissingState)?;
        if !bool::from(state.as_bytes().ct_eq(self.state.as_bytes())) {
            return Err(CallbackError::StateMismatch);
        }

        let code = params.get(keys::CODE).ok_or(CallbackError::MissingCode)?;

        Ok(AuthorizeCallback {
            code: code.to_string(),
            state: state.to_string(),
            issuer: params.get(keys::ISSUER).map(str::to_string),
            code_verifier: self.code_verifier.clone(),
            redirect_uri: self.redirect_uri.clone(),
        })
    }
}

fn carries_response(params: &ParameterSet) -> bool {
    [keys::CODE, keys::STATE, keys::ERROR]
        .iter()
        .any(|key| params.contains_key(key))
}

/// A validated authorization callback, ready for token exchange
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizeCallback {
    /// Authorization code
    pub code: String,
    /// Echoed anti-forgery value (already verified)
    pub state: String,
    /// `iss` parameter when the server sends one (RFC 9207)
    pub issuer: Option<String>,
    /// PKCE verifier from the stored state
    pub code_verifier: String,
    /// Redirect URI to repeat at the token endpoint
    pub redirect_uri: String,
}

impl fmt::Debug for AuthorizeCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizeCallback")
            .field("code", &"[REDACTED]")
            .field("state", &self.state)
            .field("issuer", &self.issuer)
            .field("code_verifier", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}
