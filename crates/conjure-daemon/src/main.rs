//! Conjure Daemon - Main entry point
//!
//! Serves the prompt resolution API and the AR web front end.

mod api;
mod config;
mod describe;
mod server;
mod state;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "conjure")]
#[command(about = "Prompt-to-model resolution server for AR placement")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "conjure.toml")]
    config: PathBuf,

    /// Bind address for web server
    #[arg(short, long)]
    bind: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Resolve a single prompt, print the result, and exit
    #[arg(long, value_name = "PROMPT")]
    resolve: Option<String>,

    /// Write a default configuration file to --config and exit
    #[arg(long)]
    write_default_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Conjure v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = config::load_config(&args.config)?;

    // Override bind address if specified
    if let Some(bind) = args.bind {
        config.daemon.bind = bind;
    }

    info!(
        bind = %config.daemon.bind,
        tls = config.daemon.tls.is_some(),
        catalog = %config.catalog.path,
        "Configuration loaded"
    );

    // Create application state
    let state = state::AppState::new(config)?;

    if let Some(prompt) = args.resolve {
        // One-shot mode
        let resolution = state.service.resolve(&prompt).await?;
        println!("Category:    {}", resolution.matched_category);
        println!("URL:         {}", resolution.asset_url);
        println!("Score:       {}", resolution.score);
        println!("AI text:     {}", resolution.ai_generated());
        println!("Description: {}", resolution.description);
    } else {
        server::run(state).await?;
    }

    Ok(())
}
