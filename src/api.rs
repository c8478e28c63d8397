pub(crate) mod analyze;
pub(crate) mod form;
pub(crate) mod health;
pub(crate) mod metrics;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::app::AppState;

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form::index))
        .route("/v1/analyze", post(analyze::analyze_comment))
        .route("/health/ready", get(health::ready))
        .route("/health/live", get(health::live))
        .route("/metrics", get(metrics::exporter))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
