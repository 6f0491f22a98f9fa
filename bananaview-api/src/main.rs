//! BananaView API Server Entry Point
//!
//! Bootstraps configuration, restores the cache snapshot, spawns the
//! resolution worker, refreshes the translation tables, and starts the
//! Axum HTTP server.

use std::sync::Arc;

use clap::Parser;

use bananaview_api::{create_api_router, words, ApiConfig, ApiError, ApiResult, AppState};
use bananaview_core::{build_pipeline, CoreConfig, HttpFetcher, SubcategoryFetcher};

#[derive(Debug, Parser)]
#[command(name = "bananaview-api", version, about = "BananaView backend API")]
struct Cli {
    /// Also serve the companion frontend (index.html and /static)
    #[arg(long)]
    serve: bool,
}

#[tokio::main]
async fn main() -> ApiResult<()> {
    let cli = Cli::parse();
    init_tracing();

    let core_config = CoreConfig::from_env();
    let mut api_config = ApiConfig::from_env();
    if cli.serve {
        api_config.serve_frontend = true;
    }

    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| ApiError::internal_error(format!("Failed to create HTTP client: {}", e)))?;

    let fetcher: Arc<dyn SubcategoryFetcher> = Arc::new(HttpFetcher::new(
        client.clone(),
        core_config.upstream_url.clone(),
    ));
    let (resolver, worker) = build_pipeline(core_config, fetcher);
    tokio::spawn(worker.run());

    words::refresh_translation_tables(&client, &api_config).await;

    let state = AppState::new(resolver);
    let app = create_api_router(state, &api_config);

    let addr = api_config.bind_addr()?;
    tracing::info!(
        %addr,
        serve_frontend = api_config.serve_frontend,
        "Starting BananaView API server"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
