use trivia_voice_router::{api::start_server, config::AppConfig, ClassificationPipeline};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    info!("Trivia Voice Router - API Server");
    info!("Port: {}", config.port);

    let oracle = config.build_oracle()?;
    let pipeline = Arc::new(
        ClassificationPipeline::new(oracle).with_oracle_timeout(config.oracle_timeout),
    );

    info!("Pipeline initialized, starting API server...");

    start_server(pipeline, config.port).await?;

    Ok(())
}
