use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

use crate::artifacts::{ArtifactPaths, DEFAULT_CLASSIFIER_PATH, DEFAULT_VECTORIZER_PATH};

#[cfg(test)]
use once_cell::sync::Lazy;
#[cfg(test)]
pub(crate) static ENV_MUTEX: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    http_bind: SocketAddr,
    classifier_path: PathBuf,
    vectorizer_path: PathBuf,
    otel_exporter_endpoint: Option<String>,
    otel_sampling_ratio: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {source}")]
    Invalid {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Config {
    /// 環境変数から RespectGuard の設定値を読み込み、検証する。
    ///
    /// 必須の環境変数はなく、未設定の項目には既定値を使う。
    ///
    /// # Errors
    /// アドレスや数値のパースに失敗した場合は [`ConfigError`] を返す。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_bind = parse_socket_addr("RESPECT_GUARD_HTTP_BIND", "0.0.0.0:8501")?;
        let classifier_path = parse_path("RESPECT_GUARD_CLASSIFIER_PATH", DEFAULT_CLASSIFIER_PATH)?;
        let vectorizer_path = parse_path("RESPECT_GUARD_VECTORIZER_PATH", DEFAULT_VECTORIZER_PATH)?;

        // OpenTelemetry settings
        let otel_exporter_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let otel_sampling_ratio = parse_ratio("OTEL_SAMPLING_RATIO", 1.0)?;

        Ok(Self {
            http_bind,
            classifier_path,
            vectorizer_path,
            otel_exporter_endpoint,
            otel_sampling_ratio,
        })
    }

    /// アーティファクトのパスだけを差し替えた設定を返す。
    #[must_use]
    pub fn with_artifact_paths(mut self, paths: ArtifactPaths) -> Self {
        self.classifier_path = paths.classifier;
        self.vectorizer_path = paths.vectorizer;
        self
    }

    #[must_use]
    pub fn http_bind(&self) -> SocketAddr {
        self.http_bind
    }

    #[must_use]
    pub fn classifier_path(&self) -> &PathBuf {
        &self.classifier_path
    }

    #[must_use]
    pub fn vectorizer_path(&self) -> &PathBuf {
        &self.vectorizer_path
    }

    #[must_use]
    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::new(self.classifier_path.clone(), self.vectorizer_path.clone())
    }

    #[must_use]
    pub fn otel_exporter_endpoint(&self) -> Option<&str> {
        self.otel_exporter_endpoint.as_deref()
    }

    #[must_use]
    pub fn otel_sampling_ratio(&self) -> f64 {
        self.otel_sampling_ratio
    }
}

impl Default for Config {
    fn default() -> Self {
        let paths = ArtifactPaths::default();
        Self {
            http_bind: SocketAddr::from(([0, 0, 0, 0], 8501)),
            classifier_path: paths.classifier,
            vectorizer_path: paths.vectorizer,
            otel_exporter_endpoint: None,
            otel_sampling_ratio: 1.0,
        }
    }
}

fn parse_socket_addr(name: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());

    raw.parse().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })
}

fn parse_path(name: &'static str, default: &str) -> Result<PathBuf, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    if raw.trim().is_empty() {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("path must not be empty"),
        });
    }
    Ok(PathBuf::from(raw))
}

fn parse_ratio(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    let parsed = raw.parse::<f64>().map_err(|error| ConfigError::Invalid {
        name,
        source: anyhow::Error::new(error),
    })?;
    if !(0.0..=1.0).contains(&parsed) {
        return Err(ConfigError::Invalid {
            name,
            source: anyhow::anyhow!("value must be between 0.0 and 1.0"),
        });
    }
    Ok(parsed)
}
