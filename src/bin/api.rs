use finance_chat_assistant::{agent::ChatOrchestrator, api::start_server, config::AppConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables before reading RUST_LOG
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("Finance chat assistant - API server");
    info!(
        port = config.port,
        provider = ?config.provider,
        model = %config.model,
        "Configuration loaded"
    );

    let orchestrator = Arc::new(ChatOrchestrator::from_config(&config)?);

    start_server(orchestrator, config.port).await?;

    Ok(())
}
