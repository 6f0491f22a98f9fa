//! BananaView API - HTTP layer for the subcategory proxy.
//!
//! This crate exposes the batch lookup endpoint backed by the
//! resolution pipeline in `bananaview-core`, plus health checks,
//! optional frontend serving, and the startup translation-table ETL.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod words;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_api_router;
pub use state::AppState;
