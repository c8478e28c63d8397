use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::warn;

use crate::{app::AppState, artifacts::ArtifactState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) struct HealthReport {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl HealthReport {
    fn ready() -> Self {
        Self {
            status: "ready",
            detail: None,
        }
    }

    fn degraded(detail: impl Into<String>) -> Self {
        Self {
            status: "degraded",
            detail: Some(detail.into()),
        }
    }
}

pub(crate) async fn ready(
    State(state): State<AppState>,
) -> Result<Json<HealthReport>, (StatusCode, Json<HealthReport>)> {
    let artifact_state = state.artifact_state();
    state
        .telemetry()
        .record_ready_probe(artifact_state.is_available());

    match artifact_state {
        ArtifactState::Available(_) => Ok(Json(HealthReport::ready())),
        ArtifactState::Unavailable { reason } => {
            warn!(%reason, "readiness check failed: model artifacts unavailable");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport::degraded(format!("model_artifacts: {reason}"))),
            ))
        }
    }
}

pub(crate) async fn live(State(state): State<AppState>) -> Json<HealthReport> {
    state.telemetry().record_live_probe();
    Json(HealthReport {
        status: "live",
        detail: None,
    })
}
