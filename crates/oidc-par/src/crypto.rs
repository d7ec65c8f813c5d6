//! PKCE and anti-forgery state generation
//!
//! [`CryptoProvider`] is the randomness capability the client consumes. The
//! default implementation uses the `oauth2` crate's PKCE support (RFC 7636,
//! S256) and the thread-local CSPRNG for the `state` value.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use oauth2::{PkceCodeChallenge, PkceCodeVerifier};
use rand::RngCore;

/// The only code challenge method this client sends
pub const CODE_CHALLENGE_METHOD_S256: &str = "S256";

/// PKCE verifier and its derived challenge
#[derive(Clone, PartialEq, Eq)]
pub struct PkceData {
    /// Code verifier; stays with the client until token exchange
    pub code_verifier: String,
    /// `BASE64URL(SHA256(code_verifier))`, sent with the push
    pub code_challenge: String,
}

impl fmt::Debug for PkceData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkceData")
            .field("code_verifier", &"[REDACTED]")
            .field("code_challenge", &self.code_challenge)
            .finish()
    }
}

/// Randomness capability used once per push attempt
///
/// Implementations have no side effects beyond consuming randomness. A broken
/// random source is not recoverable, so these methods do not return errors.
pub trait CryptoProvider: Send + Sync + fmt::Debug {
    /// Generate a fresh PKCE verifier/challenge pair
    fn create_pkce_data(&self) -> PkceData;

    /// Generate a URL-safe random token of exactly `length` characters
    fn create_state(&self, length: usize) -> String;
}

/// CSPRNG-backed [`CryptoProvider`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultCryptoProvider;

impl CryptoProvider for DefaultCryptoProvider {
    fn create_pkce_data(&self) -> PkceData {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();

        PkceData {
            code_verifier: verifier.secret().clone(),
            code_challenge: challenge.as_str().to_string(),
        }
    }

    fn create_state(&self, length: usize) -> String {
        // Every 3 random bytes become 4 base64url characters
        let mut bytes = vec![0u8; length.div_ceil(4) * 3];
        rand::rng().fill_bytes(&mut bytes);

        let mut state = URL_SAFE_NO_PAD.encode(&bytes);
        state.truncate(length);
        state
    }
}

/// Derive the S256 code challenge for a verifier
#[must_use]
pub fn code_challenge_s256(code_verifier: &str) -> String {
    PkceCodeChallenge::from_code_verifier_sha256(&PkceCodeVerifier::new(
        code_verifier.to_string(),
    ))
    .as_str()
    .to_string()
}
