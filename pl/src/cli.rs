//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Perflog - live, pausable performance log
#[derive(Parser, Debug)]
#[command(
    name = "pl",
    about = "Replay and inspect performance measurement logs",
    version,
    after_help = "Logs are written to: ~/.local/share/perflog/logs/perflog.log"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Feed a JSONL stream of host messages through a panel and print the rows
    Replay {
        /// Input file, or `-` for stdin
        #[arg(required = true)]
        input: String,

        /// Start with the connection up (panel starts active)
        #[arg(long)]
        connected: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the rows held by the persistence mirror
    Show {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Empty the persistence mirror
    Clear,
}

/// Output format for printed rows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" | "jsonl" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}
