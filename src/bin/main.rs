//! One-shot chat from the command line.
//!
//! Reads a `/api/chat` body from the file given as first argument, or from
//! stdin, and prints the reply JSON.

use finance_chat_assistant::{agent::ChatOrchestrator, api::parse_chat_request, config::AppConfig};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let raw = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path).await?,
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            buffer
        }
    };

    let body: serde_json::Value = serde_json::from_str(&raw)?;
    let request = parse_chat_request(&body)?;

    let config = AppConfig::from_env()?;
    let orchestrator = ChatOrchestrator::from_config(&config)?;

    info!(turns = request.messages.len(), "Running chat request");
    let reply = orchestrator.handle(&request).await?;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}
