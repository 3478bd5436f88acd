use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ms-migrate", version)]
#[command(about = "Migration utility for Meraki switches")]
pub struct Cli {
    /// Dashboard API key.
    #[arg(
        short = 'a',
        long,
        env = "MERAKI_DASHBOARD_API_KEY",
        hide_env_values = true,
        global = true
    )]
    pub api_key: Option<String>,
    /// Settings file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Display switch configuration by serial.
    Display(DisplayArgs),
    /// Copy device and port configuration from one switch to another.
    ///
    /// The target is only modified when its name differs from its MAC
    /// address, it carries the "undeployed" tag, and the port counts match
    /// one of: 8 -> 8, 24 -> 24, 48 -> 48, 24 -> 48 (port 1 is duplicated
    /// to ports 25-48) or 48 -> 24 (source ports 25-48 are ignored).
    Migrate(MigrateArgs),
    /// Add "undeployed" to the tags of a switch.
    Tag(TagArgs),
}

impl Command {
    pub fn quiet(&self) -> bool {
        match self {
            Command::Migrate(args) => args.quiet,
            Command::Display(_) | Command::Tag(_) => false,
        }
    }
}

#[derive(Parser, Debug)]
pub struct DisplayArgs {
    /// Serial number of the switch.
    pub serial: String,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Serial number of the switch to copy configuration from.
    pub source_serial: String,
    /// Serial number of the switch to copy configuration to.
    pub target_serial: String,
    /// Organization id; enables the dashboard clone when both switches are the same model.
    #[arg(short = 'o', long, visible_alias = "organization-id")]
    pub org_id: Option<String>,
    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
    /// Suppress dashboard request logging and response bodies.
    #[arg(short, long)]
    pub quiet: bool,
    /// Check preconditions and show the port plan without changing anything.
    #[arg(long)]
    pub dry_run: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct TagArgs {
    /// Serial number of the switch.
    pub serial: String,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
