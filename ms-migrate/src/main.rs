use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ms_migrate::meraki::{ApiKey, MerakiClient};
use ms_migrate::settings::{default_settings, load_settings, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod display_cmd;
mod migrate_cmd;
mod tag_cmd;

use cli::{Cli, Command};

const API_KEY_ENV: &str = "MERAKI_DASHBOARD_API_KEY";

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.quiet());

    let settings = resolve_settings(cli.config.as_deref())?;
    let api_key = resolve_api_key(cli.api_key)?;
    let client = MerakiClient::new(&settings.dashboard, api_key)
        .context("failed to initialise dashboard client")?;

    match cli.command {
        Command::Display(args) => display_cmd::run_display(args, &client),
        Command::Migrate(args) => migrate_cmd::run_migrate(args, &client, &settings),
        Command::Tag(args) => tag_cmd::run_tag(args, &client),
    }
}

fn init_logging(quiet: bool) {
    let default_filter = if quiet {
        "ms_migrate=warn,switchport_core=warn"
    } else {
        "ms_migrate=info,switchport_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Ok(load_settings(path)?),
        None => Ok(default_settings()),
    }
}

fn resolve_api_key(flag: Option<String>) -> Result<ApiKey> {
    match flag.filter(|key| !key.trim().is_empty()) {
        Some(key) => Ok(ApiKey::new(key.trim())),
        None => bail!(
            "no API key provided; set the environment variable {API_KEY_ENV} or pass --api-key"
        ),
    }
}
