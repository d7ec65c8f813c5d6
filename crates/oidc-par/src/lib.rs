//! # OIDC PAR - Pushed Authorization Request Client
//!
//! Client side of OAuth 2.0 Pushed Authorization Requests (RFC 9126) with
//! PKCE (RFC 7636, S256) and anti-forgery `state`.
//!
//! Instead of placing authorization parameters on the front-channel URL, the
//! client POSTs them to the authorization server's PAR endpoint and receives a
//! short-lived `request_uri`. The browser is then sent to the authorize
//! endpoint carrying only `client_id` and that handle.
//!
//! ## Architecture
//!
//! - [`params`] - Ordered multi-valued parameter set (`resource` may repeat)
//! - [`crypto`] - PKCE and `state` generation behind [`CryptoProvider`]
//! - [`config`] - Client options and validation
//! - [`builder`] - Deterministic PAR form body construction
//! - [`transport`] - Back-channel HTTP behind [`ParTransport`] (reqwest by default)
//! - [`browser`] - Front-channel launcher contract
//! - [`state`] - Correlation state persisted across the redirect, callback validation
//! - [`result`] - Push outcome
//! - [`client`] - [`ParClient`] orchestration
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oidc_par::{BrowserOptions, BrowserResult, ParClient, ParClientOptions};
//!
//! #[derive(Debug)]
//! struct PrintingBrowser;
//!
//! #[async_trait::async_trait]
//! impl oidc_par::Browser for PrintingBrowser {
//!     async fn invoke(&self, options: BrowserOptions) -> BrowserResult {
//!         println!("Open {}", options.start_url);
//!         BrowserResult::success("https://app.example.com/cb?code=..&state=..")
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ParClientOptions::new(
//!     "web-app",
//!     "https://as.example.com/par",
//!     "https://as.example.com/authorize",
//! )
//! .with_scope("openid")
//! .with_resource("https://api.example.com")
//! .with_redirect_uri("https://app.example.com/cb");
//!
//! let client = ParClient::new(options)?.with_browser(PrintingBrowser);
//! let result = client.push_authorization(None).await?;
//!
//! if let Some(url) = result.authorize_url()? {
//!     println!("Send the user agent to {url}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Standards Compliance
//!
//! - **RFC 6749** - OAuth 2.0 Authorization Framework
//! - **RFC 7636** - Proof Key for Code Exchange (PKCE)
//! - **RFC 8707** - Resource Indicators for OAuth 2.0
//! - **RFC 9126** - OAuth 2.0 Pushed Authorization Requests
//! - **RFC 9207** - Authorization Server Issuer Identification
//! - **OpenID Connect RP-Initiated Logout 1.0**

pub mod browser;
pub mod builder;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod params;
pub mod result;
pub mod state;
pub mod transport;

#[doc(inline)]
pub use browser::{Browser, BrowserOptions, BrowserResult, BrowserResultType};
#[doc(inline)]
pub use client::{AuthorizeResponse, LogoutRequest, ParClient, build_end_session_url};
#[doc(inline)]
pub use config::ParClientOptions;
#[doc(inline)]
pub use crypto::{CryptoProvider, DefaultCryptoProvider, PkceData};
#[doc(inline)]
pub use error::{CallbackError, ParError, Result};
#[doc(inline)]
pub use params::ParameterSet;
#[doc(inline)]
pub use result::{ErrorResponse, ParResponse, ParResult};
#[doc(inline)]
pub use state::{AuthorizeCallback, ParState};
#[doc(inline)]
pub use transport::{HttpTransport, ParTransport, TransportError, TransportResponse};
