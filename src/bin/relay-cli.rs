use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pdf_relay::config::load_config;
use pdf_relay::relay::target::validate_target;
use pdf_relay::relay::RelayPolicy;
use serde_json::{json, Map, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Operator CLI for the PDF relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a target URL against the configured policy without fetching it
    Check {
        url: String,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Fetch a target through a running relay and report the response
    Fetch {
        url: String,

        /// Relay endpoint, including its route
        #[arg(short, long, default_value = "http://localhost:8080/api/pdf")]
        relay: String,

        /// Write the body to this file on success
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { url, config } => {
            let config = load_config(config.as_deref())?;
            let policy = RelayPolicy::from_config(&config.relay, &config.timeouts);

            let report = match validate_target(&url, &policy) {
                Ok(target) => json!({
                    "allowed": true,
                    "host": target.host(),
                    "segments": target.segments(),
                }),
                Err(e) => json!({
                    "allowed": false,
                    "status": e.status_code().as_u16(),
                    "reason": e.to_string(),
                }),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Fetch { url, relay, output } => {
            let client = reqwest::Client::new();
            let res = client.get(&relay).query(&[("url", url.as_str())]).send().await?;

            let status = res.status();
            let mut headers = Map::new();
            for (name, value) in res.headers() {
                headers.insert(
                    name.to_string(),
                    Value::String(value.to_str().unwrap_or("<binary>").to_string()),
                );
            }

            let body = res.bytes().await?;
            let mut report = json!({
                "status": status.as_u16(),
                "headers": headers,
                "bytes": body.len(),
            });

            if status.is_success() {
                if let Some(path) = output {
                    tokio::fs::write(&path, &body).await?;
                    report["saved_to"] = Value::String(path.display().to_string());
                }
            } else {
                report["reason"] = Value::String(String::from_utf8_lossy(&body).into_owned());
            }

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
