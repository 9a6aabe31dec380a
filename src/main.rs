use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use breedquiz::{
    api,
    queue::{QueueConfig, RoundQueue},
    source::SourceConfig,
    state::AppState,
};

/// Default listen port
const DEFAULT_PORT: u16 = 6574;

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breedquiz=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting breedquiz...");

    let source_config = SourceConfig::from_env();
    let source = match source_config.build_source() {
        Ok(source) => source,
        Err(e) => {
            tracing::error!("Failed to initialize data source: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Using data source: {}", source.name());

    let queue = match RoundQueue::new(source, QueueConfig::from_env()).await {
        Ok(queue) => queue,
        Err(e) => {
            tracing::error!("Failed to initialize round queue: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(queue));

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let port = std::env::var("BREEDQUIZ_PORT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
    }
}
