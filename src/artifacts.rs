//! 学習済みアーティファクト（ベクトライザと分類器）のロードとキャッシュ。
//!
//! 2つのファイルは必ず揃ってロードされる。どちらかが欠けている、読めない、
//! もしくは互いに整合しない場合は両方とも利用不可として扱う。
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{error, info};

use crate::classification::{
    features::{TfidfVectorizer, VectorizerArtifact},
    model::{ClassifierArtifact, LogisticModel},
};

pub const DEFAULT_CLASSIFIER_PATH: &str = "data/toxic_classifier_model.json";
pub const DEFAULT_VECTORIZER_PATH: &str = "data/tfidf_vectorizer.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {path:?}")]
    Missing { path: PathBuf },
    #[error("failed to read artifact {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

impl ArtifactError {
    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid(detail.into())
    }
}

/// 分類器とベクトライザのファイルパスの組。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub vectorizer: PathBuf,
}

impl ArtifactPaths {
    #[must_use]
    pub fn new(classifier: impl Into<PathBuf>, vectorizer: impl Into<PathBuf>) -> Self {
        Self {
            classifier: classifier.into(),
            vectorizer: vectorizer.into(),
        }
    }

    /// 同一ディレクトリ内の既定ファイル名を指すパスを作る。
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(
            dir.join("toxic_classifier_model.json"),
            dir.join("tfidf_vectorizer.json"),
        )
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(DEFAULT_CLASSIFIER_PATH, DEFAULT_VECTORIZER_PATH)
    }
}

/// ロード済みで読み取り専用の学習済みオブジェクト一式。
#[derive(Debug)]
pub struct ModelArtifacts {
    vectorizer: TfidfVectorizer,
    classifier: LogisticModel,
}

impl ModelArtifacts {
    /// メモリ上のオブジェクトから組み立てる。次元数の一致を検証する。
    ///
    /// # Errors
    /// ベクトライザの語彙サイズと分類器の係数数が異なる場合は [`ArtifactError::Invalid`] を返す。
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: LogisticModel,
    ) -> Result<Self, ArtifactError> {
        if vectorizer.dim() != classifier.dim() {
            return Err(ArtifactError::invalid(format!(
                "vectorizer produces {} features but classifier expects {}",
                vectorizer.dim(),
                classifier.dim()
            )));
        }
        Ok(Self {
            vectorizer,
            classifier,
        })
    }

    /// 両方のファイルを読み込み、検証する。
    ///
    /// # Errors
    /// ファイルが存在しない、読めない、JSON として不正、もしくは内容が整合しない場合にエラーを返す。
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let classifier: ClassifierArtifact = read_json(&paths.classifier)?;
        let vectorizer: VectorizerArtifact = read_json(&paths.vectorizer)?;
        Self::new(
            TfidfVectorizer::from_artifact(vectorizer)?,
            LogisticModel::from_artifact(classifier)?,
        )
    }

    #[must_use]
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    #[must_use]
    pub fn classifier(&self) -> &LogisticModel {
        &self.classifier
    }

    /// 表示用のモデルバージョン。分類器側の値を優先する。
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.classifier.version().or(self.vectorizer.version())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            ArtifactError::Missing {
                path: path.to_path_buf(),
            }
        } else {
            ArtifactError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// ロード結果。利用可能か、理由付きで利用不可のどちらか。
#[derive(Debug, Clone)]
pub enum ArtifactState {
    Available(Arc<ModelArtifacts>),
    Unavailable { reason: String },
}

impl ArtifactState {
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    #[must_use]
    pub fn artifacts(&self) -> Option<Arc<ModelArtifacts>> {
        match self {
            Self::Available(artifacts) => Some(Arc::clone(artifacts)),
            Self::Unavailable { .. } => None,
        }
    }
}

/// プロセス生存期間中に一度だけアーティファクトをロードするローダー。
///
/// 初回の [`ArtifactLoader::load`] だけが I/O を行い、以降は失敗結果も含めてキャッシュを返す。
#[derive(Debug)]
pub struct ArtifactLoader {
    paths: ArtifactPaths,
    state: OnceCell<ArtifactState>,
}

impl ArtifactLoader {
    #[must_use]
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            state: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// キャッシュ済みの状態を返す。未ロードなら一度だけロードする。
    ///
    /// エラーは呼び出し元に伝播させず、[`ArtifactState::Unavailable`] に変換する。
    pub fn load(&self) -> &ArtifactState {
        self.state.get_or_init(|| match ModelArtifacts::load(&self.paths) {
            Ok(artifacts) => {
                info!(
                    classifier = %self.paths.classifier.display(),
                    vectorizer = %self.paths.vectorizer.display(),
                    features = artifacts.vectorizer().dim(),
                    version = artifacts.version().unwrap_or("unversioned"),
                    "model artifacts loaded"
                );
                ArtifactState::Available(Arc::new(artifacts))
            }
            Err(err) => {
                error!(error = %err, "model artifacts unavailable; scoring disabled");
                ArtifactState::Unavailable {
                    reason: err.to_string(),
                }
            }
        })
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.state.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_point_into_data_dir() {
        let paths = ArtifactPaths::default();
        assert_eq!(
            paths.classifier,
            PathBuf::from("data/toxic_classifier_model.json")
        );
        assert_eq!(paths.vectorizer, PathBuf::from("data/tfidf_vectorizer.json"));
        assert_eq!(ArtifactPaths::in_dir("data"), paths);
    }

    #[test]
    fn missing_file_maps_to_missing_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = ModelArtifacts::load(&ArtifactPaths::in_dir(dir.path()))
            .expect_err("no artifacts present");
        assert!(matches!(error, ArtifactError::Missing { .. }));
    }

    #[test]
    fn loader_defers_io_until_first_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = ArtifactLoader::new(ArtifactPaths::in_dir(dir.path()));
        assert!(!loader.is_loaded());
        assert!(!loader.load().is_available());
        assert!(loader.is_loaded());
    }

    #[test]
    fn dimension_mismatch_is_invalid() {
        let vectorizer = TfidfVectorizer::from_parts(
            std::collections::HashMap::from([("you".to_string(), 0)]),
            vec![1.0],
            (1, 1),
            false,
            crate::classification::features::Norm::L2,
        )
        .expect("valid vectorizer");
        let classifier = LogisticModel::new(vec![1.0, 2.0], 0.0).expect("valid model");
        let error = ModelArtifacts::new(vectorizer, classifier).expect_err("mismatch");
        assert!(matches!(error, ArtifactError::Invalid(_)));
    }
}
