//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strider - Offline asset cache worker for GoWalking
///
/// Installs versioned asset caches, purges stale ones on activation and
/// answers requests cache-first with an offline fallback.
#[derive(Parser, Debug)]
#[command(name = "strider")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STRIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .strider.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the configured version and seed its cache from the manifest
    Install(InstallArgs),

    /// Activate the waiting version and purge stale caches
    Activate,

    /// Send a request through the worker
    Fetch(FetchArgs),

    /// Inspect or clear Named Caches
    Caches(CachesArgs),

    /// Simulate a push message and show the resulting notification
    Push(PushArgs),

    /// Simulate a notification click
    Click(ClickArgs),

    /// Show registration, caches and recent lifecycle events
    Status,

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Stay in the waiting state instead of activating immediately
    #[arg(long)]
    pub no_activate: bool,

    /// Reinstall even if this version is already active
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL or path relative to the application origin
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Treat as a top-level document navigation
    #[arg(long)]
    pub navigate: bool,

    /// Simulate having no network connectivity
    #[arg(long)]
    pub offline: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the caches command
#[derive(Parser, Debug)]
pub struct CachesArgs {
    /// Subcommand for caches
    #[command(subcommand)]
    pub action: CachesAction,
}

/// Caches subcommands
#[derive(Subcommand, Debug)]
pub enum CachesAction {
    /// List all Named Caches
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one cache
    Show {
        /// Cache name (version tag)
        name: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete caches
    Clear {
        /// Keep the active and waiting versions' caches
        #[arg(long)]
        stale: bool,
    },
}

/// Arguments for the push command
#[derive(Parser, Debug)]
pub struct PushArgs {
    /// Push payload text (the default message is used when omitted)
    pub body: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the click command
#[derive(Parser, Debug)]
pub struct ClickArgs {
    /// Action identifier (explore, close); omit for a body click
    pub action: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}
