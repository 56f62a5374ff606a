// HTTP routes: the transport around Aggregator::collect

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregator::Aggregator;
use crate::config::AppConfig;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) aggregator: Arc<Aggregator>,
    pub(crate) config: AppConfig,
}

pub fn app(aggregator: Arc<Aggregator>, config: AppConfig) -> Router {
    let state = AppState { aggregator, config };
    Router::new()
        .route("/", get(|| async { "hoststat is running" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/metrics", get(http::metrics_handler)) // GET /api/metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
