use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;

use crate::{
    analysis::CommentAnalyzer,
    api,
    artifacts::{ArtifactLoader, ArtifactState},
    config::Config,
    observability::Telemetry,
};

#[derive(Clone)]
pub(crate) struct AppState {
    registry: Arc<ComponentRegistry>,
}

pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    loader: ArtifactLoader,
    analyzer: CommentAnalyzer,
}

impl AppState {
    pub(crate) fn new(registry: ComponentRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub(crate) fn telemetry(&self) -> &Telemetry {
        &self.registry.telemetry
    }

    pub(crate) fn analyzer(&self) -> &CommentAnalyzer {
        &self.registry.analyzer
    }

    pub(crate) fn artifact_state(&self) -> &ArtifactState {
        self.registry.artifact_state()
    }
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// アーティファクトはここで一度だけロードする。ロードに失敗してもエラーにはせず、
    /// 採点機能だけを無効化した状態で起動する。
    ///
    /// # Errors
    /// Telemetry の初期化に失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new(&config).context("failed to initialise telemetry")?;
        let loader = ArtifactLoader::new(config.artifact_paths());
        let state = loader.load();
        telemetry.metrics().set_artifacts_loaded(state.is_available());
        let analyzer = CommentAnalyzer::from_state(state);

        Ok(Self {
            config,
            telemetry,
            loader,
            analyzer,
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn artifact_state(&self) -> &ArtifactState {
        self.loader.load()
    }

    #[must_use]
    pub fn analyzer(&self) -> &CommentAnalyzer {
        &self.analyzer
    }
}

pub fn build_router(registry: ComponentRegistry) -> Router {
    let state = AppState::new(registry);
    api::router(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::ArtifactPaths;

    #[test]
    fn registry_builds_without_artifacts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::default().with_artifact_paths(ArtifactPaths::in_dir(dir.path()));

        let registry = ComponentRegistry::build(config).expect("registry builds");

        assert!(!registry.artifact_state().is_available());
        assert!(!registry.analyzer().is_available());
        let state = AppState::new(registry);
        assert!(
            (state.telemetry().metrics().artifacts_loaded.get()).abs() < f64::EPSILON,
            "gauge should report missing artifacts"
        );
    }

    #[test]
    fn registry_loads_fixture_artifacts() {
        let config = Config::default().with_artifact_paths(ArtifactPaths::in_dir(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures"
        )));

        let registry = ComponentRegistry::build(config).expect("registry builds");

        assert!(registry.artifact_state().is_available());
        assert!(registry.analyzer().is_available());
        assert_eq!(registry.analyzer().model_version(), Some("fixture-2026.10"));
    }
}
