//! Keyward - authenticated HTTP requests from the command line
//!
//! Main entry point for the keyward CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::prelude::*;

mod commands;

use commands::{config, request, token};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Keyward - authenticated HTTP requests from the command line
#[derive(Parser)]
#[command(name = "keyward")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of discovery
    #[arg(long, global = true, env = "KEYWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL, overriding the config files
    #[arg(long, global = true, env = "KEYWARD_BASE_URL")]
    pub base_url: Option<String>,

    /// Also write JSON logs to daily files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send an authenticated request and print the response body
    Request(request::RequestArgs),

    /// Establish a session and show token expiry
    Token(token::TokenArgs),

    /// Configuration inspection
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console logs go to stderr so stdout stays parseable
    let filter = if cli.verbose {
        "keyward=debug,keyward_client=debug,keyward_config=debug,info"
    } else {
        "keyward=info,keyward_client=warn,keyward_config=warn,warn"
    };

    let (file_layer, _guard) = match &cli.log_dir {
        Some(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "keyward.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "keyward=trace,keyward_client=trace,keyward_config=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(file_layer)
        .init();

    let ctx = commands::Context::load(
        cli.config.as_deref(),
        cli.base_url,
        cli.json,
        cli.verbose,
    )?;

    match cli.command {
        Commands::Request(args) => request::run(args, &ctx).await,
        Commands::Token(args) => token::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
