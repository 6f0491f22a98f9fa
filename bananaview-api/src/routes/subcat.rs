//! Batch Subcategory Lookup Endpoint
//!
//! `GET /api/subcat?ids=<comma-separated integers>` answers with a JSON
//! object keyed by id-as-string. Non-numeric tokens are silently
//! dropped; a missing or all-garbage `ids` parameter yields `{}`.
//! Responses are never cacheable: pending entries flip to resolved as
//! the worker drains the queue and clients are expected to poll.

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use bananaview_core::ResolutionStatus;

use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubcatQuery {
    #[serde(default)]
    pub ids: Option<String>,
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /api/subcat - Resolve a batch of item ids
pub async fn subcat(
    State(state): State<AppState>,
    Query(query): Query<SubcatQuery>,
) -> impl IntoResponse {
    let ids = query.ids.as_deref().map(parse_ids).unwrap_or_default();
    let statuses = state.resolver.resolve(&ids).await;

    (
        [(header::CACHE_CONTROL, "no-store")],
        Json(render_statuses(&statuses)),
    )
}

/// Parse the comma-separated `ids` parameter, silently dropping tokens
/// that are not non-negative integers.
fn parse_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|token| token.trim().parse().ok())
        .collect()
}

/// Render statuses into the wire object, keyed by id-as-string.
fn render_statuses(statuses: &HashMap<u64, ResolutionStatus>) -> Value {
    let mut body = Map::with_capacity(statuses.len());
    for (item_id, status) in statuses {
        let rendered = serde_json::to_value(status).unwrap_or_else(|e| {
            tracing::warn!(item_id = *item_id, error = %e, "Failed to serialize status");
            Value::Null
        });
        body.insert(item_id.to_string(), rendered);
    }
    Value::Object(body)
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/subcat", get(subcat))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ids_drops_garbage() {
        assert_eq!(parse_ids("100,200"), vec![100, 200]);
        assert_eq!(parse_ids("100, abc ,300,-5,1.5"), vec![100, 300]);
        assert_eq!(parse_ids("abc,,  ,"), Vec::<u64>::new());
        assert_eq!(parse_ids(""), Vec::<u64>::new());
    }

    #[test]
    fn test_parse_ids_tolerates_whitespace() {
        assert_eq!(parse_ids(" 7 , 8 "), vec![7, 8]);
    }

    #[test]
    fn test_render_statuses_keys_by_string_id() {
        let mut statuses = HashMap::new();
        statuses.insert(100, ResolutionStatus::pending());
        statuses.insert(200, ResolutionStatus::resolved("WeaponMod", json!(5)));

        let body = render_statuses(&statuses);

        assert_eq!(
            body,
            json!({
                "100": { "status": "pending" },
                "200": { "category": "WeaponMod", "catid": 5 }
            })
        );
    }

    #[test]
    fn test_render_empty_statuses() {
        assert_eq!(render_statuses(&HashMap::new()), json!({}));
    }
}
