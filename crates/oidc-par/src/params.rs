//! Ordered Authorization Parameters
//!
//! Authorization requests are form bodies, and form bodies are ordered lists
//! of pairs in which a key may repeat (RFC 8707 `resource` is the usual
//! example). [`ParameterSet`] keeps exactly that shape: insertion order is
//! preserved and duplicate keys are never merged.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

/// Well-known parameter names used on the PAR and authorize endpoints
pub mod keys {
    /// `response_type`
    pub const RESPONSE_TYPE: &str = "response_type";
    /// `state`
    pub const STATE: &str = "state";
    /// `code_challenge` (RFC 7636)
    pub const CODE_CHALLENGE: &str = "code_challenge";
    /// `code_challenge_method` (RFC 7636)
    pub const CODE_CHALLENGE_METHOD: &str = "code_challenge_method";
    /// `client_id`
    pub const CLIENT_ID: &str = "client_id";
    /// `client_secret`
    pub const CLIENT_SECRET: &str = "client_secret";
    /// `scope`
    pub const SCOPE: &str = "scope";
    /// `resource` (RFC 8707), may repeat
    pub const RESOURCE: &str = "resource";
    /// `redirect_uri`
    pub const REDIRECT_URI: &str = "redirect_uri";
    /// `request_uri` (RFC 9126)
    pub const REQUEST_URI: &str = "request_uri";
    /// `code`
    pub const CODE: &str = "code";
    /// `iss` (RFC 9207)
    pub const ISSUER: &str = "iss";
    /// `error`
    pub const ERROR: &str = "error";
    /// `error_description`
    pub const ERROR_DESCRIPTION: &str = "error_description";
    /// `id_token_hint`
    pub const ID_TOKEN_HINT: &str = "id_token_hint";
    /// `post_logout_redirect_uri`
    pub const POST_LOGOUT_REDIRECT_URI: &str = "post_logout_redirect_uri";
    /// `code_verifier`
    pub const CODE_VERIFIER: &str = "code_verifier";
}

/// Parameter values never printed by `Debug`
const REDACTED_KEYS: &[&str] = &[keys::CLIENT_SECRET, keys::CODE_VERIFIER];

/// Ordered multi-map of string parameters
///
/// # Example
///
/// ```rust
/// use oidc_par::ParameterSet;
///
/// let mut params = ParameterSet::new();
/// params.add("resource", "https://api.example.com");
/// params.add("resource", "https://files.example.com");
///
/// assert_eq!(params.get_all("resource").count(), 2);
/// assert_eq!(
///     params.to_form_urlencoded(),
///     "resource=https%3A%2F%2Fapi.example.com&resource=https%3A%2F%2Ffiles.example.com"
/// );
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    entries: Vec<(String, String)>,
}

impl ParameterSet {
    /// Create an empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty parameter set with room for `capacity` pairs
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a pair; an existing entry with the same key is kept
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Append a pair only when `value` is non-empty
    ///
    /// Omitting a parameter and sending it with an empty value are different
    /// requests for most authorization servers.
    pub fn add_if_present(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.add(key, value);
        }
    }

    /// Number of pairs, counting repeated keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no pairs
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First value recorded for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value recorded for `key`, in insertion order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether at least one pair uses `key`
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Serialize as an `application/x-www-form-urlencoded` body
    #[must_use]
    pub fn to_form_urlencoded(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Parse an `application/x-www-form-urlencoded` string
    ///
    /// Order and duplicate keys are kept as they appear in the input.
    #[must_use]
    pub fn from_form_urlencoded(input: &str) -> Self {
        form_urlencoded::parse(input.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|(k, v)| {
                if REDACTED_KEYS.contains(&k) {
                    (k, "[REDACTED]")
                } else {
                    (k, v)
                }
            }))
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for ParameterSet {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for ParameterSet {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = (&'a str, &'a str);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (String, String)>,
        fn(&'a (String, String)) -> (&'a str, &'a str),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn as_pair(entry: &(String, String)) -> (&str, &str) {
            (entry.0.as_str(), entry.1.as_str())
        }
        self.entries
            .iter()
            .map(as_pair as fn(&'a (String, String)) -> (&'a str, &'a str))
    }
}
