//! コメント毒性判定のための高水準API。
//!
//! clean → vectorize → predict → threshold の順に処理する。
use std::{fmt, sync::Arc};

use serde::Serialize;

use crate::artifacts::ModelArtifacts;

pub mod features;
pub mod model;
pub mod normalize;

pub use normalize::clean;

/// この値以上のスコアはブロックされる。呼び出しごとの調整はできない。
pub const BLOCK_THRESHOLD: f64 = 50.0;

/// toxic クラスである確率を百分率で表したもの（0〜100）。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ToxicityScore(f64);

impl ToxicityScore {
    /// 確率（0.0〜1.0）から百分率のスコアを作る。範囲外や NaN は丸める。
    #[must_use]
    pub fn from_probability(probability: f64) -> Self {
        Self::from_percent(probability * 100.0)
    }

    /// 百分率の値から直接作る。
    #[must_use]
    pub fn from_percent(percent: f64) -> Self {
        if percent.is_nan() {
            return Self(0.0);
        }
        Self(percent.clamp(0.0, 100.0))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// プログレスバー用の整数値（切り捨て）。
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn progress(self) -> u8 {
        self.0.trunc() as u8
    }

    /// 小数第1位で丸めた表示用の値。
    #[must_use]
    pub fn rounded(self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }
}

impl fmt::Display for ToxicityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

/// 最終的な判定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Approved,
    Blocked,
}

impl Verdict {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Blocked => "blocked",
        }
    }
}

/// スコアを固定しきい値と比較して判定する。
#[must_use]
pub fn decide(score: ToxicityScore) -> Verdict {
    if score.value() >= BLOCK_THRESHOLD {
        Verdict::Blocked
    } else {
        Verdict::Approved
    }
}

/// 1件の評価結果。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub cleaned: String,
    pub score: ToxicityScore,
    pub verdict: Verdict,
}

/// ロード済みアーティファクトを使ってコメントを採点する。
///
/// アーティファクトの有無は構築前に呼び出し側が確認すること。
#[derive(Debug, Clone)]
pub struct ToxicityScorer {
    artifacts: Arc<ModelArtifacts>,
}

impl ToxicityScorer {
    #[must_use]
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }

    #[must_use]
    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// 生のコメントを採点する。
    #[must_use]
    pub fn score(&self, raw: &str) -> ToxicityScore {
        self.score_cleaned(&clean(raw))
    }

    /// 正規化・採点・判定をまとめて行う。
    #[must_use]
    pub fn evaluate(&self, raw: &str) -> Assessment {
        let cleaned = clean(raw);
        let score = self.score_cleaned(&cleaned);
        Assessment {
            cleaned,
            score,
            verdict: decide(score),
        }
    }

    fn score_cleaned(&self, cleaned: &str) -> ToxicityScore {
        let features = self.artifacts.vectorizer().transform(cleaned);
        let probability = self.artifacts.classifier().predict_proba(&features);
        ToxicityScore::from_probability(probability)
    }
}
