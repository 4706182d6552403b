//! PDF relay service.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                     PDF RELAY                     │
//!                    │                                                   │
//!   GET ?url=...     │  ┌─────────┐    ┌──────────┐    ┌─────────────┐   │
//!   ─────────────────┼─▶│  http   │───▶│  target  │───▶│  upstream   │───┼──▶ object
//!                    │  │ server  │    │  checks  │    │ (no redirs) │   │    store
//!                    │  └─────────┘    └──────────┘    └──────┬──────┘   │
//!                    │                                        │          │
//!   PDF (streamed)   │  ┌─────────┐    ┌──────────┐           │          │
//!   ◀────────────────┼──│envelope │◀───│ response │◀──────────┘          │
//!                    │  │ headers │    │  checks  │                      │
//!                    │  └─────────┘    └──────────┘                      │
//!                    │                                                   │
//!                    │   config · observability · lifecycle · net/tls    │
//!                    └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use pdf_relay::config::load_config;
use pdf_relay::lifecycle::startup;
use pdf_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "pdf-relay")]
#[command(about = "Validating relay for CMS-hosted PDF assets", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        pdf_relay::config::validation::validate_config(&config)
            .map_err(pdf_relay::config::ConfigError::Validation)?;
    }

    init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pdf-relay starting");

    startup::serve(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
