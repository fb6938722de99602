use financial_decision_orchestrator::{api::start_server, AppConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("🚀 Financial Decision Orchestrator - API Server");
    info!("📍 Port: {}", config.port);

    let service = Arc::new(config.build_service()?);

    info!(agents = service.agent_set(), "✅ Decision service initialized");
    info!("📡 Starting API server...");

    start_server(service, config.port).await?;

    Ok(())
}
