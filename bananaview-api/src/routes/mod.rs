//! REST API Routes Module
//!
//! Includes:
//! - The batch subcategory lookup endpoint
//! - Health check endpoints
//! - Optional frontend serving (`/` and `/static`) behind the
//!   `serve_frontend` flag
//! - CORS and request tracing layers

pub mod health;
pub mod subcat;

use axum::{http::Method, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::ApiConfig;
use crate::state::AppState;

// Re-export route creation functions for convenience
pub use health::create_router as health_router;
pub use subcat::create_router as subcat_router;

/// Create the complete API router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    let mut router = Router::new()
        .nest("/api", subcat_router(state.clone()))
        .nest("/health", health_router(state));

    if config.serve_frontend {
        router = router
            .route_service(
                "/",
                ServeFile::new(config.frontend_dir.join("index.html")),
            )
            .nest_service("/static", ServeDir::new(&config.static_dir));
    }

    router.layer(cors).layer(TraceLayer::new_for_http())
}
