//! Pushed Authorization Request client (RFC 9126)
//!
//! Each push is an independent attempt:
//!
//! ```text
//! Created -> CryptoGenerated -> ParametersBuilt -> RequestSent -> Succeeded | Failed
//! ```
//!
//! The client holds no mutable state, so one instance can serve concurrent
//! pushes as long as its transport can.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

use crate::browser::{Browser, BrowserOptions, BrowserResultType};
use crate::builder::build_parameters;
use crate::config::ParClientOptions;
use crate::crypto::{CryptoProvider, DefaultCryptoProvider};
use crate::error::{CallbackError, ParError, Result};
use crate::params::{ParameterSet, keys};
use crate::result::{ParResponse, ParResult};
use crate::state::{AuthorizeCallback, ParState};
use crate::transport::{HttpTransport, ParTransport, TransportError, TransportResponse};

/// Logout request parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutRequest {
    /// ID token previously issued to the client
    pub id_token_hint: Option<String>,
    /// Opaque value returned on the post-logout redirect
    pub state: Option<String>,
}

/// Outcome of a full front-channel round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeResponse {
    /// Callback validated against the pushed state
    Authorized(AuthorizeCallback),
    /// Push rejected, browser interaction failed, or callback rejected
    Failed {
        /// Error code, or the raw PAR error body
        error: String,
        /// Additional detail when available
        description: Option<String>,
    },
}

/// PAR client
///
/// # Example
///
/// ```rust,no_run
/// use oidc_par::{ParClient, ParClientOptions, ParameterSet};
/// # use oidc_par::{Browser, BrowserOptions, BrowserResult};
/// # #[derive(Debug)]
/// # struct SystemBrowser;
/// # #[async_trait::async_trait]
/// # impl Browser for SystemBrowser {
/// #     async fn invoke(&self, _: BrowserOptions) -> BrowserResult { unimplemented!() }
/// # }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ParClientOptions::new(
///     "web-app",
///     "https://as.example.com/par",
///     "https://as.example.com/authorize",
/// )
/// .with_scope("openid profile")
/// .with_redirect_uri("https://app.example.com/callback");
///
/// let client = ParClient::new(options)?.with_browser(SystemBrowser);
///
/// let mut extra = ParameterSet::new();
/// extra.add("prompt", "login");
///
/// let result = client.push_authorization(Some(&extra)).await?;
/// match result.authorize_url()? {
///     Some(url) => println!("Redirect to {url}"),
///     None => println!("PAR rejected: {:?}", result.error),
/// }
///
/// // Persist result.state until the callback arrives
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ParClient {
    options: Arc<ParClientOptions>,
    transport: Arc<dyn ParTransport>,
    crypto: Arc<dyn CryptoProvider>,
    browser: Option<Arc<dyn Browser>>,
}

impl std::fmt::Debug for ParClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParClient")
            .field("options", &self.options)
            .field("transport", &self.transport)
            .field("crypto", &self.crypto)
            .field("browser", &self.browser.as_ref().map(|_| "<dyn Browser>"))
            .finish()
    }
}

impl ParClient {
    /// Create a client with the default transport and crypto provider
    ///
    /// No browser is configured; pushes fail until one is set with
    /// [`ParClient::with_browser`].
    ///
    /// # Errors
    ///
    /// Returns [`ParError::Configuration`] if the options are invalid, or
    /// [`ParError::Transport`] if the HTTP client cannot be built.
    pub fn new(options: ParClientOptions) -> Result<Self> {
        let transport = HttpTransport::new()?;
        Self::with_transport(options, transport)
    }

    /// Create a client with a caller-supplied transport
    ///
    /// # Errors
    ///
    /// Returns [`ParError::Configuration`] if the options are invalid.
    pub fn with_transport(
        options: ParClientOptions,
        transport: impl ParTransport + 'static,
    ) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            options: Arc::new(options),
            transport: Arc::new(transport),
            crypto: Arc::new(DefaultCryptoProvider),
            browser: None,
        })
    }

    /// Replace the crypto provider
    pub fn with_crypto(mut self, crypto: impl CryptoProvider + 'static) -> Self {
        self.crypto = Arc::new(crypto);
        self
    }

    /// Set the front-channel launcher
    pub fn with_browser(mut self, browser: impl Browser + 'static) -> Self {
        self.browser = Some(Arc::new(browser));
        self
    }

    /// Set a shared front-channel launcher
    pub fn with_shared_browser(mut self, browser: Arc<dyn Browser>) -> Self {
        self.browser = Some(browser);
        self
    }

    /// Client options
    #[must_use]
    pub fn options(&self) -> &ParClientOptions {
        &self.options
    }

    /// Push the authorization parameters to the PAR endpoint
    ///
    /// A rejection by the PAR endpoint is not an error: it is returned as
    /// [`ParResult::error`] with the raw response body.
    ///
    /// # Errors
    ///
    /// - [`ParError::Configuration`] if no browser is configured (nothing is sent)
    /// - [`ParError::Transport`] if the request fails
    /// - [`ParError::MalformedResponse`] if a 2xx body is not a PAR response or
    ///   carries an empty `request_uri`
    pub async fn push_authorization(&self, extra: Option<&ParameterSet>) -> Result<ParResult> {
        self.push(extra, None).await
    }

    /// [`push_authorization`](Self::push_authorization) that aborts when `cancellation` fires
    ///
    /// # Errors
    ///
    /// As [`push_authorization`](Self::push_authorization), plus
    /// [`TransportError::Cancelled`] when cancelled before the response arrives.
    pub async fn push_authorization_with_cancellation(
        &self,
        extra: Option<&ParameterSet>,
        cancellation: &CancellationToken,
    ) -> Result<ParResult> {
        self.push(extra, Some(cancellation)).await
    }

    async fn push(
        &self,
        extra: Option<&ParameterSet>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ParResult> {
        trace!("push_authorization");

        self.browser()?;

        let state = self.create_par_state(extra);
        let response = self.send(&state, cancellation).await?;
        let status = response.status.as_u16();

        if !response.status.is_success() {
            warn!(
                endpoint = %self.options.par_endpoint,
                status,
                "PAR endpoint rejected the request"
            );
            return Ok(ParResult::failure(state, status, response.body_text()));
        }

        let par: ParResponse = serde_json::from_slice(&response.body).map_err(|e| {
            ParError::MalformedResponse {
                status,
                reason: e.to_string(),
            }
        })?;

        if par.request_uri.is_empty() {
            return Err(ParError::MalformedResponse {
                status,
                reason: "request_uri is empty".to_string(),
            });
        }

        debug!(expires_in = par.expires_in, "PAR request accepted");

        Ok(ParResult::success(state, par))
    }

    async fn send(
        &self,
        state: &ParState,
        cancellation: Option<&CancellationToken>,
    ) -> Result<TransportResponse> {
        let body = state.parameters.to_form_urlencoded();
        let request = self.transport.post_form(&self.options.par_endpoint, body);

        let response = match cancellation {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => return Err(TransportError::Cancelled.into()),
                response = request => response?,
            },
            None => request.await?,
        };

        Ok(response)
    }

    /// Generate PKCE data and `state`, and build the parameters to push
    ///
    /// Every call produces a fresh, independent [`ParState`].
    pub fn create_par_state(&self, extra: Option<&ParameterSet>) -> ParState {
        trace!("create_par_state");

        let pkce = self.crypto.create_pkce_data();
        let state = self.crypto.create_state(self.options.state_length);
        let parameters = build_parameters(&state, &pkce.code_challenge, extra, &self.options);

        let par_state = ParState {
            state,
            redirect_uri: self.options.redirect_uri.clone(),
            code_verifier: pkce.code_verifier,
            start_url: self.options.authorize_endpoint.clone(),
            parameters,
        };

        debug!(?par_state, "Created PAR state");

        par_state
    }

    /// Push, run the browser, and validate the callback
    ///
    /// Stops short of token exchange; the returned callback carries the code,
    /// verifier and redirect URI needed for it.
    ///
    /// # Errors
    ///
    /// Same as [`push_authorization`](Self::push_authorization). Browser and
    /// callback failures are reported as [`AuthorizeResponse::Failed`].
    pub async fn authorize(&self, extra: Option<&ParameterSet>) -> Result<AuthorizeResponse> {
        trace!("authorize");

        let browser = self.browser()?;
        let result = self.push_authorization(extra).await?;

        let Some(start_url) = result.authorize_url()? else {
            return Ok(AuthorizeResponse::Failed {
                error: result.error.unwrap_or_default(),
                description: result.error_status.map(|s| format!("HTTP {s}")),
            });
        };

        let options = BrowserOptions::new(start_url, result.state.redirect_uri.clone());
        let browser_result = browser.invoke(options).await;

        match (browser_result.result_type, browser_result.response) {
            (BrowserResultType::Success, Some(callback_url)) => {
                match result.state.validate_callback(&callback_url) {
                    Ok(callback) => Ok(AuthorizeResponse::Authorized(callback)),
                    Err(e) => {
                        warn!(error = %e, "Authorization callback rejected");
                        let description = match &e {
                            CallbackError::Authorization { description, .. } => {
                                description.clone()
                            }
                            other => Some(other.to_string()),
                        };
                        Ok(AuthorizeResponse::Failed {
                            error: e.error_code().to_string(),
                            description,
                        })
                    }
                }
            }
            (BrowserResultType::Success, None) => Ok(AuthorizeResponse::Failed {
                error: BrowserResultType::UnknownError.as_str().to_string(),
                description: Some("Browser reported success without a callback URL".to_string()),
            }),
            (result_type, _) => Ok(AuthorizeResponse::Failed {
                error: result_type.as_str().to_string(),
                description: browser_result.error,
            }),
        }
    }

    /// End-session URL using the configured post-logout redirect URI
    ///
    /// # Errors
    ///
    /// Returns [`ParError::InvalidUrl`] if `endpoint` does not parse.
    pub fn end_session_url(&self, endpoint: &str, request: &LogoutRequest) -> Result<String> {
        trace!("end_session_url");

        build_end_session_url(
            endpoint,
            request.id_token_hint.as_deref(),
            Some(self.options.post_logout_redirect_uri.as_str()),
            request.state.as_deref(),
        )
    }

    fn browser(&self) -> Result<&Arc<dyn Browser>> {
        self.browser
            .as_ref()
            .ok_or_else(|| ParError::configuration("No browser configured"))
    }
}

/// Format an OpenID Connect RP-initiated logout URL
///
/// Parameters are appended in the order `id_token_hint`,
/// `post_logout_redirect_uri`, `state`; absent or empty values are skipped.
///
/// # Errors
///
/// Returns [`ParError::InvalidUrl`] if `endpoint` does not parse.
pub fn build_end_session_url(
    endpoint: &str,
    id_token_hint: Option<&str>,
    post_logout_redirect_uri: Option<&str>,
    state: Option<&str>,
) -> Result<String> {
    let mut url =
        Url::parse(endpoint).map_err(|e| ParError::InvalidUrl(format!("{endpoint}: {e}")))?;

    let mut params = ParameterSet::with_capacity(3);
    params.add_if_present(keys::ID_TOKEN_HINT, id_token_hint.unwrap_or_default());
    params.add_if_present(
        keys::POST_LOGOUT_REDIRECT_URI,
        post_logout_redirect_uri.unwrap_or_default(),
    );
    params.add_if_present(keys::STATE, state.unwrap_or_default());

    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserResult;
    use crate::crypto::PkceData;
    use async_trait::async_trait;
    use http::StatusCode;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct RecordingTransport {
        calls: AtomicUsize,
        bodies: Mutex<Vec<String>>,
        status: Option<StatusCode>,
        body: &'static str,
    }

    impl RecordingTransport {
        fn responding(status: StatusCode, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status: Some(status),
                body,
                ..Self::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ParTransport for Arc<RecordingTransport> {
        async fn post_form(
            &self,
            _url: &str,
            body: String,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies.lock().unwrap().push(body);
            Ok(TransportResponse::new(
                self.status.unwrap_or(StatusCode::OK),
                self.body,
            ))
        }
    }

    #[derive(Debug, Default)]
    struct PendingTransport {
        started: Arc<AtomicBool>,
    }

    #[async_trait]
    impl ParTransport for PendingTransport {
        async fn post_form(
            &self,
            _url: &str,
            _body: String,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.started.store(true, Ordering::SeqCst);
            std::future::pending::<std::result::Result<TransportResponse, TransportError>>().await
        }
    }

    #[derive(Debug)]
    struct FixedCrypto;

    impl CryptoProvider for FixedCrypto {
        fn create_pkce_data(&self) -> PkceData {
            PkceData {
                code_verifier: "verifier".to_string(),
                code_challenge: "challenge".to_string(),
            }
        }

        fn create_state(&self, length: usize) -> String {
            "s".repeat(length)
        }
    }

    #[derive(Debug)]
    struct ScriptedBrowser(BrowserResult);

    #[async_trait]
    impl Browser for ScriptedBrowser {
        async fn invoke(&self, _options: BrowserOptions) -> BrowserResult {
            self.0.clone()
        }
    }

    fn options() -> ParClientOptions {
        ParClientOptions::new(
            "web",
            "https://as.example.com/par",
            "https://as.example.com/authorize",
        )
        .with_redirect_uri("https://app.example.com/cb")
        .with_post_logout_redirect_uri("https://app.example.com/bye")
        .with_state_length(8)
    }

    const ACCEPTED: &str = r#"{"request_uri":"urn:ietf:params:oauth:request_uri:abc","expires_in":60}"#;

    #[tokio::test]
    async fn test_missing_browser_fails_before_network() {
        let transport = RecordingTransport::responding(StatusCode::CREATED, ACCEPTED);
        let client = ParClient::with_transport(options(), transport.clone()).unwrap();

        let err = client.push_authorization(None).await.unwrap_err();

        assert!(err.is_configuration());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_push_success() {
        let transport = RecordingTransport::responding(StatusCode::CREATED, ACCEPTED);
        let client = ParClient::with_transport(options(), transport.clone())
            .unwrap()
            .with_crypto(FixedCrypto)
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        let result = client.push_authorization(None).await.unwrap();

        assert_eq!(
            result.request_uri.as_deref(),
            Some("urn:ietf:params:oauth:request_uri:abc")
        );
        assert_eq!(result.expires_in, Some(60));
        assert_eq!(result.error, None);
        assert_eq!(result.state.state, "ssssssss");
        assert_eq!(result.state.code_verifier, "verifier");
        assert_eq!(result.state.start_url, "https://as.example.com/authorize");
        assert_eq!(transport.calls(), 1);

        let body = transport.bodies.lock().unwrap()[0].clone();
        assert_eq!(body, result.state.parameters.to_form_urlencoded());
        assert!(!body.contains("verifier"));
    }

    #[tokio::test]
    async fn test_push_rejection_is_a_value() {
        let transport =
            RecordingTransport::responding(StatusCode::BAD_REQUEST, r#"{"error":"invalid_request"}"#);
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        let result = client.push_authorization(None).await.unwrap();

        assert_eq!(result.error.as_deref(), Some(r#"{"error":"invalid_request"}"#));
        assert_eq!(result.error_status, Some(400));
        assert_eq!(result.request_uri, None);
        assert_eq!(result.expires_in, None);
        assert!(!result.state.state.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_fatal() {
        let transport = RecordingTransport::responding(StatusCode::OK, "not json");
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        let err = client.push_authorization(None).await.unwrap_err();
        assert!(matches!(err, ParError::MalformedResponse { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_pending_request() {
        let transport = PendingTransport::default();
        let started = transport.started.clone();
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        let token = CancellationToken::new();
        let push = tokio::spawn({
            let token = token.clone();
            async move {
                client
                    .push_authorization_with_cancellation(None, &token)
                    .await
            }
        });

        while !started.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        token.cancel();

        let err = push.await.unwrap().unwrap_err();
        assert!(matches!(err, ParError::Transport(TransportError::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_request_uri_is_malformed() {
        let transport =
            RecordingTransport::responding(StatusCode::OK, r#"{"request_uri":"","expires_in":60}"#);
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        let err = client.push_authorization(None).await.unwrap_err();
        assert!(matches!(err, ParError::MalformedResponse { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_each_push_gets_fresh_state() {
        let transport = RecordingTransport::responding(StatusCode::CREATED, ACCEPTED);
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        let a = client.push_authorization(None).await.unwrap();
        let b = client.push_authorization(None).await.unwrap();

        assert_ne!(a.state.state, b.state.state);
        assert_ne!(a.state.code_verifier, b.state.code_verifier);
    }

    #[tokio::test]
    async fn test_authorize_round_trip() {
        let transport = RecordingTransport::responding(StatusCode::CREATED, ACCEPTED);
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_crypto(FixedCrypto)
            .with_browser(ScriptedBrowser(BrowserResult::success(
                "https://app.example.com/cb?code=c0de&state=ssssssss",
            )));

        match client.authorize(None).await.unwrap() {
            AuthorizeResponse::Authorized(callback) => {
                assert_eq!(callback.code, "c0de");
                assert_eq!(callback.code_verifier, "verifier");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authorize_reports_state_mismatch() {
        let transport = RecordingTransport::responding(StatusCode::CREATED, ACCEPTED);
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_crypto(FixedCrypto)
            .with_browser(ScriptedBrowser(BrowserResult::success(
                "https://app.example.com/cb?code=c0de&state=forged",
            )));

        let response = client.authorize(None).await.unwrap();
        assert!(matches!(
            response,
            AuthorizeResponse::Failed { ref error, .. } if error == "invalid_state"
        ));
    }

    #[tokio::test]
    async fn test_authorize_reports_browser_failure_and_push_rejection() {
        let transport = RecordingTransport::responding(StatusCode::CREATED, ACCEPTED);
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::failure(
                BrowserResultType::UserCancel,
                "closed",
            )));

        assert_eq!(
            client.authorize(None).await.unwrap(),
            AuthorizeResponse::Failed {
                error: "user_cancel".to_string(),
                description: Some("closed".to_string()),
            }
        );

        let transport = RecordingTransport::responding(StatusCode::BAD_REQUEST, "denied");
        let client = ParClient::with_transport(options(), transport)
            .unwrap()
            .with_browser(ScriptedBrowser(BrowserResult::success("unused")));

        assert_eq!(
            client.authorize(None).await.unwrap(),
            AuthorizeResponse::Failed {
                error: "denied".to_string(),
                description: Some("HTTP 400".to_string()),
            }
        );
    }

    #[test]
    fn test_end_session_url() {
        let client = ParClient::with_transport(
            options(),
            RecordingTransport::responding(StatusCode::OK, ""),
        )
        .unwrap();

        let url = client
            .end_session_url(
                "https://as.example.com/logout",
                &LogoutRequest {
                    id_token_hint: Some("eyJ.token".to_string()),
                    state: Some("xyz".to_string()),
                },
            )
            .unwrap();

        assert_eq!(
            url,
            "https://as.example.com/logout?id_token_hint=eyJ.token&post_logout_redirect_uri=https%3A%2F%2Fapp.example.com%2Fbye&state=xyz"
        );
    }

    #[test]
    fn test_end_session_url_without_parameters() {
        assert_eq!(
            build_end_session_url("https://as.example.com/logout", None, Some(""), None).unwrap(),
            "https://as.example.com/logout"
        );
        assert!(matches!(
            build_end_session_url("logout", None, None, None),
            Err(ParError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_invalid_options_are_rejected() {
        let mut bad = options();
        bad.par_endpoint = String::new();
        let err = ParClient::with_transport(bad, PendingTransport::default()).unwrap_err();
        assert!(err.is_configuration());
    }
}
