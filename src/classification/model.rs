// 二値ロジスティック回帰による毒性分類モデル。
use serde::Deserialize;

use super::features::FeatureVector;
use crate::artifacts::ArtifactError;

#[derive(Debug, Deserialize)]
pub(crate) struct ClassifierArtifact {
    coef: Vec<f64>,
    intercept: f64,
    #[serde(default = "default_classes")]
    classes: Vec<serde_json::Value>,
    #[serde(default)]
    version: Option<String>,
}

fn default_classes() -> Vec<serde_json::Value> {
    vec![serde_json::Value::from(0), serde_json::Value::from(1)]
}

impl ClassifierArtifact {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coef.is_empty() {
            return Err(ArtifactError::invalid("classifier has no coefficients"));
        }
        if let Some(bad) = self.coef.iter().position(|w| !w.is_finite()) {
            return Err(ArtifactError::invalid(format!(
                "coefficient at column {bad} is not finite"
            )));
        }
        if !self.intercept.is_finite() {
            return Err(ArtifactError::invalid("intercept is not finite"));
        }
        if self.classes.len() != 2 {
            return Err(ArtifactError::invalid(format!(
                "expected a binary classifier, found {} classes",
                self.classes.len()
            )));
        }
        Ok(())
    }
}

/// 学習済みのロジスティック回帰モデル。`predict_proba` は toxic クラス（index 1）の確率を返す。
#[derive(Debug, Clone)]
pub struct LogisticModel {
    coef: Vec<f64>,
    intercept: f64,
    version: Option<String>,
}

impl LogisticModel {
    /// # Errors
    /// 係数や切片が有限でない場合は [`ArtifactError::Invalid`] を返す。
    pub fn new(coef: Vec<f64>, intercept: f64) -> Result<Self, ArtifactError> {
        Self::from_artifact(ClassifierArtifact {
            coef,
            intercept,
            classes: default_classes(),
            version: None,
        })
    }

    pub(crate) fn from_artifact(artifact: ClassifierArtifact) -> Result<Self, ArtifactError> {
        artifact.validate()?;
        Ok(Self {
            coef: artifact.coef,
            intercept: artifact.intercept,
            version: artifact.version,
        })
    }

    #[must_use]
    pub fn dim(&self) -> usize {
        self.coef.len()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// 特徴ベクトルに対する toxic クラスの確率（0.0〜1.0）。
    ///
    /// 次元数はロード時に検証済みであること。範囲外の列は無視する。
    #[must_use]
    pub fn predict_proba(&self, features: &FeatureVector) -> f64 {
        debug_assert_eq!(features.dim(), self.dim(), "feature dimension mismatch");
        let mut logit = self.intercept;
        for (index, value) in features.iter() {
            if let Some(weight) = self.coef.get(index) {
                logit += weight * value;
            }
        }
        sigmoid(logit)
    }
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
