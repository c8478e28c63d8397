use std::time::Instant;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{analysis::AnalysisOutcome, app::AppState, observability::AUDIT_TARGET};

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeRequest {
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    request_id: Uuid,
    status: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    toxicity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cleaned: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_version: Option<String>,
}

pub(crate) async fn analyze_comment(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let request_id = Uuid::now_v7();
    let metrics = state.telemetry().metrics();
    let analyzer = state.analyzer();

    let started = Instant::now();
    let outcome = analyzer.analyze(&payload.comment);
    let elapsed = started.elapsed().as_secs_f64();

    let status_code = match &outcome {
        AnalysisOutcome::Unavailable => {
            metrics.unavailable_total.inc();
            debug!(%request_id, "analysis refused: model artifacts unavailable");
            StatusCode::SERVICE_UNAVAILABLE
        }
        AnalysisOutcome::Empty => {
            metrics.empty_submissions_total.inc();
            debug!(%request_id, "empty submission");
            StatusCode::OK
        }
        AnalysisOutcome::Scored(assessment) => {
            metrics.record_assessment(assessment, elapsed);
            info!(
                target: AUDIT_TARGET,
                %request_id,
                verdict = assessment.verdict.as_str(),
                score = assessment.score.value(),
                comment_chars = payload.comment.chars().count(),
                cleaned_chars = assessment.cleaned.len(),
                elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
                "comment assessed"
            );
            StatusCode::OK
        }
    };

    let assessment = outcome.assessment();
    let body = AnalyzeResponse {
        request_id,
        status: outcome.status(),
        message: outcome.message(),
        hint: outcome.hint(),
        toxicity_score: assessment.map(|a| a.score.rounded()),
        progress: assessment.map(|a| a.score.progress()),
        cleaned: assessment.map(|a| a.cleaned.clone()),
        model_version: assessment
            .and(analyzer.model_version())
            .map(str::to_string),
    };

    (status_code, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use axum::{body::Body, http::Request, http::StatusCode};
    use rstest::rstest;
    use tower::ServiceExt;

    use crate::{
        app::{ComponentRegistry, build_router},
        artifacts::ArtifactPaths,
        config::Config,
    };

    fn app_with_artifacts_in(dir: &Path) -> axum::Router {
        let config = Config::default().with_artifact_paths(ArtifactPaths::in_dir(dir));
        build_router(ComponentRegistry::build(config).expect("registry builds"))
    }

    fn fixture_app() -> axum::Router {
        app_with_artifacts_in(Path::new(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures"
        )))
    }

    async fn post_comment(app: axum::Router, comment: &str) -> (StatusCode, serde_json::Value) {
        let body = serde_json::json!({ "comment": comment }).to_string();
        let request = Request::post("/v1/analyze")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request builds");

        let response = app.oneshot(request).await.expect("request succeeds");
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let payload: serde_json::Value = serde_json::from_slice(&body_bytes).expect("valid json");
        (status, payload)
    }

    #[tokio::test]
    async fn toxic_comment_is_blocked_with_hint() {
        let (status, payload) =
            post_comment(fixture_app(), "You are so STUPID!!! visit www.spam.com").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "blocked");
        assert_eq!(payload["message"], "BLOCKED: High toxicity detected.");
        assert_eq!(
            payload["hint"],
            "Please rephrase your message to be more respectful."
        );
        assert_eq!(payload["cleaned"], "you are so stupid visit");
        let score = payload["toxicity_score"].as_f64().expect("score");
        assert!(score >= 50.0 && score <= 100.0);
        assert_eq!(payload["model_version"], "fixture-2026.10");
    }

    #[tokio::test]
    async fn respectful_comment_is_approved() {
        let (status, payload) =
            post_comment(fixture_app(), "Thank you for sharing, great work!").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "approved");
        assert!(payload.get("hint").is_none());
        let score = payload["toxicity_score"].as_f64().expect("score");
        assert!(score < 50.0);
        let progress = payload["progress"].as_u64().expect("progress");
        assert!(progress <= 100);
    }

    #[tokio::test]
    async fn empty_comment_is_not_scored() {
        let (status, payload) = post_comment(fixture_app(), "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "empty");
        assert_eq!(payload["message"], "Please enter some text first.");
        assert!(payload.get("toxicity_score").is_none());
        assert!(payload.get("progress").is_none());
    }

    #[rstest]
    #[case("")]
    #[case("you are stupid")]
    #[tokio::test]
    async fn missing_artifacts_report_unavailable(#[case] comment: &str) {
        let dir = tempfile::tempdir().expect("tempdir");
        let (status, payload) = post_comment(app_with_artifacts_in(dir.path()), comment).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["status"], "unavailable");
        assert_eq!(
            payload["message"],
            "ERROR: Model files not found! Please check the path and file names."
        );
        assert!(payload.get("toxicity_score").is_none());
    }

    #[tokio::test]
    async fn scoring_updates_prometheus_counters() {
        let app = fixture_app();
        let (status, _) = post_comment(app.clone(), "idiot").await;
        assert_eq!(status, StatusCode::OK);

        let response = app
            .oneshot(Request::get("/metrics").body(Body::empty()).expect("request"))
            .await
            .expect("request succeeds");
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let exposition = String::from_utf8(body_bytes.to_vec()).expect("utf8");

        assert!(exposition.contains("respect_guard_analyses_total 1"));
        assert!(exposition.contains("respect_guard_artifacts_loaded 1"));
    }
}
