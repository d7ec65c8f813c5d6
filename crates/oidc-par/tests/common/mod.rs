//! Common test utilities for integration tests
//!
//! Provides a mock authorization server exposing a PAR endpoint, plus a
//! scripted browser so the client's precondition is satisfied.

#![allow(dead_code)]

use async_trait::async_trait;
use oidc_par::{Browser, BrowserOptions, BrowserResult, ParClient, ParClientOptions};
use serde_json::json;
use std::sync::Mutex;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

pub const REQUEST_URI: &str = "urn:ietf:params:oauth:request_uri:abc";

/// Mock authorization server with a PAR endpoint
pub struct MockParServer {
    pub server: MockServer,
    pub par_endpoint: String,
    pub authorize_endpoint: String,
}

impl MockParServer {
    /// Start a new mock authorization server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();

        Self {
            server,
            par_endpoint: format!("{}/par", base_url),
            authorize_endpoint: format!("{}/authorize", base_url),
        }
    }

    /// Options pointing at this server for a confidential client
    pub fn options(&self) -> ParClientOptions {
        ParClientOptions::new("test_client_id", &self.par_endpoint, &self.authorize_endpoint)
            .with_client_secret("test_client_secret")
            .with_scope("openid profile")
            .with_redirect_uri("http://localhost:3000/callback")
    }

    /// Client wired to this server with a browser that records its input
    pub fn client(&self, options: ParClientOptions) -> (ParClient, std::sync::Arc<RecordingBrowser>) {
        let browser = std::sync::Arc::new(RecordingBrowser::default());
        let client = ParClient::new(options)
            .expect("valid options")
            .with_shared_browser(browser.clone());
        (client, browser)
    }

    /// Mock a successful PAR response (RFC 9126 Section 2.2)
    pub async fn mock_par_success(&self, request_uri: &str, expires_in: u64) {
        self.mock_par_success_with_status(201, request_uri, expires_in)
            .await;
    }

    /// Mock a successful PAR response with a specific 2xx status
    pub async fn mock_par_success_with_status(
        &self,
        status: u16,
        request_uri: &str,
        expires_in: u64,
    ) {
        Mock::given(method("POST"))
            .and(path("/par"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "request_uri": request_uri,
                "expires_in": expires_in,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mock a PAR error response with a raw body
    pub async fn mock_par_error(&self, status: u16, body: &str) {
        Mock::given(method("POST"))
            .and(path("/par"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_raw(body.as_bytes().to_vec(), "application/json"),
            )
            .mount(&self.server)
            .await;
    }

    /// Form pairs of every request received by the PAR endpoint
    pub async fn pushed_forms(&self) -> Vec<Vec<(String, String)>> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == "/par")
            .map(|request| {
                url::form_urlencoded::parse(&request.body)
                    .into_owned()
                    .collect()
            })
            .collect()
    }
}

/// Browser double that echoes a fixed callback and records what it was given
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    pub invocations: Mutex<Vec<BrowserOptions>>,
    pub callback: Mutex<Option<String>>,
}

impl RecordingBrowser {
    pub fn respond_with(&self, callback: impl Into<String>) {
        *self.callback.lock().unwrap() = Some(callback.into());
    }
}

#[async_trait]
impl Browser for RecordingBrowser {
    async fn invoke(&self, options: BrowserOptions) -> BrowserResult {
        self.invocations.lock().unwrap().push(options);
        match self.callback.lock().unwrap().clone() {
            Some(callback) => BrowserResult::success(callback),
            None => BrowserResult::failure(oidc_par::BrowserResultType::Timeout, "no callback"),
        }
    }
}
