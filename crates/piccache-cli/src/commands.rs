//! CLI command definitions.

use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the caching proxy
    Serve {
        /// Address to listen on, overriding server.bind
        #[arg(long)]
        bind: Option<String>,

        /// Cache root directory, overriding store.root
        #[arg(long)]
        cache_root: Option<PathBuf>,
    },

    /// Fetch a URL into the cache and print the outcome
    Warm {
        /// External media URL
        url: String,
    },

    /// Show where a URL is stored, without touching the network
    Locate {
        /// External media URL
        url: String,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
