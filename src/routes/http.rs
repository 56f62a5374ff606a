// GET handlers: version, metrics snapshot

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::AppState;
use crate::version::{NAME, VERSION};

/// GET /version: service name and version from Cargo metadata.
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenQuery {
    token: Option<String>,
}

/// GET /api/metrics: one fresh snapshot. Probe failures still answer 200 with
/// `meta.status = "partial"`; only a failed scaffold is a 500.
pub(super) async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TokenQuery>,
) -> Response {
    if let Some(expected) = state.config.server.auth_token.as_deref()
        && !authorized(expected, &headers, query.token.as_deref())
    {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "unauthorized" })),
        )
            .into_response();
    }

    match state.aggregator.collect().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "snapshot collection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "collection-failed",
                    "message": format!("{e:#}"),
                })),
            )
                .into_response()
        }
    }
}

/// Accepts `Authorization: Bearer <token>` or `?token=<token>`.
fn authorized(expected: &str, headers: &HeaderMap, query_token: Option<&str>) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .or(query_token)
        .is_some_and(|t| t == expected)
}
