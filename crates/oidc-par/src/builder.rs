//! PAR request parameter construction
//!
//! Produces the exact form body pushed to the PAR endpoint. The order below is
//! fixed so that pushed bodies are reproducible:
//!
//! 1. `response_type=code`
//! 2. `state`
//! 3. `code_challenge`
//! 4. `code_challenge_method=S256`
//! 5. `client_id` (if configured)
//! 6. `client_secret` (if configured; confidential clients only)
//! 7. `scope` (if configured)
//! 8. one `resource` per configured resource, in order
//! 9. `redirect_uri` (if configured)
//! 10. caller-supplied extra parameters, verbatim
//!
//! Extra parameters are appended, never merged: a caller-supplied `scope`
//! produces a second `scope` entry after the configured one.

use secrecy::ExposeSecret;
use tracing::trace;

use crate::config::ParClientOptions;
use crate::crypto::CODE_CHALLENGE_METHOD_S256;
use crate::params::{ParameterSet, keys};

/// The only response type this client requests
pub const RESPONSE_TYPE_CODE: &str = "code";

/// Assemble the PAR push parameters
pub fn build_parameters(
    state: &str,
    code_challenge: &str,
    extra: Option<&ParameterSet>,
    options: &ParClientOptions,
) -> ParameterSet {
    trace!("build_parameters");

    let extra_len = extra.map_or(0, ParameterSet::len);
    let mut params = ParameterSet::with_capacity(9 + options.resources.len() + extra_len);

    params.add(keys::RESPONSE_TYPE, RESPONSE_TYPE_CODE);
    params.add(keys::STATE, state);
    params.add(keys::CODE_CHALLENGE, code_challenge);
    params.add(keys::CODE_CHALLENGE_METHOD, CODE_CHALLENGE_METHOD_S256);

    params.add_if_present(keys::CLIENT_ID, &options.client_id);
    params.add_if_present(keys::CLIENT_SECRET, options.client_secret.expose_secret());
    params.add_if_present(keys::SCOPE, &options.scope);

    for resource in &options.resources {
        params.add(keys::RESOURCE, resource.as_str());
    }

    params.add_if_present(keys::REDIRECT_URI, &options.redirect_uri);

    if let Some(extra) = extra {
        params.extend(extra.iter());
    }

    params
}
