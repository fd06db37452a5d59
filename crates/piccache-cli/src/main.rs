//! Piccache CLI entrypoint.

use anyhow::Context;
use clap::Parser;
use piccache_core::Config;
use piccache_core::config::DEFAULT_CONFIG_PATH;
use std::path::PathBuf;

mod commands;
mod handlers;
mod logging;

use commands::{Commands, ConfigCommands, LogFormat};

#[derive(Parser)]
#[command(name = "piccache")]
#[command(author, version, about = "Self-hosted media-caching proxy", long_about = None)]
struct Cli {
    /// Configuration document
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    match cli.command {
        Commands::Serve { bind, cache_root } => {
            apply_overrides(&mut config, bind, cache_root);
            handlers::serve(config).await?
        }
        Commands::Warm { url } => handlers::warm(&config, &url).await?,
        Commands::Locate { url } => handlers::locate(&config, &url)?,
        Commands::Config { command } => match command {
            ConfigCommands::Show => handlers::show_config(&config)?,
        },
    }

    Ok(())
}

/// Command-line flags take precedence over the configuration document.
fn apply_overrides(config: &mut Config, bind: Option<String>, cache_root: Option<PathBuf>) {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(root) = cache_root {
        config.store.root = root;
    }
}
