use anyhow::{Context, Result};
use dotenvy::dotenv;
use ollama_gateway::models::config::Config;
use ollama_gateway::{AppState, OllamaClient, router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    dotenv().ok();
    let config = Config::from_env();
    info!("upstream ollama daemon: {}", config.upstream_url);

    let client = OllamaClient::new(&config.upstream_url)?;
    let app = router(AppState { client })
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind to address: {}", config.listen_addr))?;
    info!("gateway listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
