//! Command-line arguments and configuration loading

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use config::{Config, Environment, File, FileFormat};
use oidc_par::{ParClientOptions, ParameterSet};

/// Environment prefix overriding file settings (e.g. `PAR_CLIENT_ID`)
pub const ENV_PREFIX: &str = "PAR";

#[derive(Parser, Debug)]
#[command(
    name = "par-demo",
    version,
    about = "Push OAuth 2.0 authorization requests (RFC 9126) from the command line"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Push once and print the authorize URL and correlation state
    Push(PushArgs),

    /// Push, open the authorize URL, and validate the pasted callback
    Login(PushArgs),

    /// Print an RP-initiated logout URL
    Logout(LogoutArgs),
}

#[derive(Args, Debug)]
pub struct PushArgs {
    /// Client options file (toml, yaml or json)
    #[arg(long, short = 'c')]
    pub config: PathBuf,

    /// Extra authorization parameter, repeatable
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,
}

impl PushArgs {
    pub fn extra(&self) -> Option<ParameterSet> {
        if self.params.is_empty() {
            return None;
        }
        Some(self.params.iter().cloned().collect())
    }
}

#[derive(Args, Debug)]
pub struct LogoutArgs {
    /// End-session endpoint of the authorization server
    #[arg(long)]
    pub endpoint: String,

    #[arg(long)]
    pub id_token_hint: Option<String>,

    #[arg(long)]
    pub post_logout_redirect_uri: Option<String>,

    #[arg(long)]
    pub state: Option<String>,
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{input}`"))
}

/// Load client options from a file, with `PAR_*` environment overrides
pub fn load_options(path: &Path) -> anyhow::Result<ParClientOptions> {
    let format = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => FileFormat::Toml,
        Some("yaml" | "yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        _ => bail!("Unsupported config format: {}", path.display()),
    };

    let path_str = path
        .to_str()
        .with_context(|| format!("Non UTF-8 config path: {}", path.display()))?;

    let config = Config::builder()
        .add_source(File::new(path_str, format))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("resources"),
        )
        .build()
        .with_context(|| format!("Failed to read {}", path.display()))?;

    config
        .try_deserialize()
        .context("Invalid client options")
}
