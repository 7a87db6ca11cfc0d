//! Stratwatch CLI
//!
//! Command-line interface for watching remote strategy jobs.

mod commands;
mod config;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stratwatch")]
#[command(about = "Watch remote trading strategy jobs", long_about = None)]
struct Cli {
    /// Base URL of the strategy API
    #[arg(
        long,
        env = "STRATWATCH_API_URL",
        default_value = "http://localhost:8080"
    )]
    api_url: String,

    /// Access token sent with every request
    #[arg(long, env = "STRATWATCH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        access_token: cli.access_token,
    };

    handle_command(cli.command, &config).await
}
