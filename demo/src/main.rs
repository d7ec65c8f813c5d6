//! PAR demo
//!
//! Pushes an authorization request to a real authorization server and prints
//! what a relying party would do next. Logs go to stderr (`RUST_LOG`), results
//! go to stdout as JSON.

mod cli;

use async_trait::async_trait;
use clap::Parser;
use oidc_par::{
    AuthorizeResponse, Browser, BrowserOptions, BrowserResult, BrowserResultType, ParClient,
    build_end_session_url,
};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command, LogoutArgs, PushArgs, load_options};

/// Browser that asks the operator to open the URL and paste the callback
#[derive(Debug)]
struct ConsoleBrowser;

#[async_trait]
impl Browser for ConsoleBrowser {
    async fn invoke(&self, options: BrowserOptions) -> BrowserResult {
        eprintln!("Open this URL in a browser:\n\n  {}\n", options.start_url);
        eprintln!("Paste the URL you were redirected to ({}...):", options.end_url);

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        let read = reader.read_line(&mut line);

        match tokio::time::timeout(options.timeout, read).await {
            Err(_) => BrowserResult::failure(BrowserResultType::Timeout, "no callback pasted"),
            Ok(Err(e)) => BrowserResult::failure(BrowserResultType::UnknownError, e.to_string()),
            Ok(Ok(0)) => BrowserResult::failure(BrowserResultType::UserCancel, "stdin closed"),
            Ok(Ok(_)) => BrowserResult::success(line.trim()),
        }
    }
}

fn client(args: &PushArgs) -> anyhow::Result<ParClient> {
    let options = load_options(&args.config)?;
    info!(par_endpoint = %options.par_endpoint, "Loaded client options");

    Ok(ParClient::new(options)?.with_browser(ConsoleBrowser))
}

async fn push(args: PushArgs) -> anyhow::Result<()> {
    let client = client(&args)?;
    let extra = args.extra();

    let result = client.push_authorization(extra.as_ref()).await?;

    let output = match result.authorize_url()? {
        Some(url) => json!({
            "authorize_url": url,
            "expires_in": result.expires_in,
            "state": result.state,
        }),
        None => json!({
            "status": result.error_status,
            "error": result.error,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn login(args: PushArgs) -> anyhow::Result<()> {
    let client = client(&args)?;
    let extra = args.extra();

    let output = match client.authorize(extra.as_ref()).await? {
        AuthorizeResponse::Authorized(callback) => json!({
            "code": callback.code,
            "iss": callback.issuer,
            "redirect_uri": callback.redirect_uri,
            "code_verifier": "[REDACTED]",
        }),
        AuthorizeResponse::Failed { error, description } => json!({
            "error": error,
            "error_description": description,
        }),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn logout(args: LogoutArgs) -> anyhow::Result<()> {
    let url = build_end_session_url(
        &args.endpoint,
        args.id_token_hint.as_deref(),
        args.post_logout_redirect_uri.as_deref(),
        args.state.as_deref(),
    )?;

    println!("{url}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Push(args) => push(args).await,
        Command::Login(args) => login(args).await,
        Command::Logout(args) => logout(args),
    }
}
