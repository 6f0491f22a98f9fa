//! Shared application state for Axum routers.

use std::sync::Arc;

use bananaview_core::Resolver;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Coordinator for the subcategory resolution pipeline.
    pub resolver: Arc<Resolver>,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(resolver: Arc<Resolver>) -> Self {
        Self {
            resolver,
            start_time: std::time::Instant::now(),
        }
    }
}
