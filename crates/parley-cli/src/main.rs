//! `parley` -- watch Slack conversations by polling.
//!
//! Provides the following subcommands:
//!
//! - `parley watch` -- Poll enabled channels and print new messages as JSON lines.
//! - `parley channels status` -- Show channel configuration status.

use clap::{Parser, Subcommand};

mod commands;
mod config_loader;

/// Slack message discovery by polling.
#[derive(Parser)]
#[command(name = "parley", about = "Slack message discovery by polling", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Poll channels and print delivered messages until Ctrl+C.
    Watch(commands::watch::WatchArgs),

    /// Inspect channel configuration.
    Channels {
        #[command(subcommand)]
        action: ChannelsAction,
    },
}

/// Subcommands for `parley channels`.
#[derive(Subcommand)]
enum ChannelsAction {
    /// Show channel status table.
    Status {
        /// Config file path (overrides auto-discovery).
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries message output; logs go to stderr.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Watch(args) => {
            commands::watch::run(args).await?;
        }
        Commands::Channels { action } => match action {
            ChannelsAction::Status { config } => {
                if config.is_none()
                    && let Some(path) = commands::discover_config_path()
                {
                    tracing::debug!(path = %path.display(), "using discovered config");
                }
                let cfg = commands::load_config(config.as_deref()).await?;
                commands::channels::channels_status(&cfg);
            }
        },
    }

    Ok(())
}
