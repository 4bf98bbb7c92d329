use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "boardsmith")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative Trello provisioning from a JSON orders file", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: <config dir>/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply an orders file to Trello
    Apply(ApplyArgs),

    /// Parse and validate an orders file without contacting Trello
    Check {
        /// Orders file (JSON)
        orders: PathBuf,
    },

    /// List boards visible to your token
    Boards {
        #[command(flatten)]
        auth: AuthArgs,

        /// Include closed boards
        #[arg(short, long)]
        all: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Orders file (JSON)
    pub orders: PathBuf,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// Look everything up but change nothing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Trello credentials; fall back to config.toml when absent
#[derive(Args, Clone, Default)]
pub struct AuthArgs {
    /// Trello API key
    #[arg(long, env = "BOARDSMITH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Trello API token
    #[arg(long, env = "BOARDSMITH_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,
}
