//! フォーム送信1件ぶんの判定フロー。
//!
//! アーティファクトの有無と入力の有無を確認してから採点パイプラインを呼び出し、
//! フロントエンドが表示する状態（blocked / approved / empty / unavailable）を返す。
use crate::{
    artifacts::ArtifactState,
    classification::{Assessment, ToxicityScorer, Verdict},
};

pub const UNAVAILABLE_MESSAGE: &str =
    "ERROR: Model files not found! Please check the path and file names.";
pub const EMPTY_MESSAGE: &str = "Please enter some text first.";
pub const BLOCKED_MESSAGE: &str = "BLOCKED: High toxicity detected.";
pub const BLOCKED_HINT: &str = "Please rephrase your message to be more respectful.";
pub const APPROVED_MESSAGE: &str = "APPROVED: This comment looks respectful.";

/// 1件の送信に対する結果。
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// モデルが読み込まれていないため採点できない。
    Unavailable,
    /// 入力が空。パイプラインは呼び出していない。
    Empty,
    Scored(Assessment),
}

impl AnalysisOutcome {
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Empty => "empty",
            Self::Scored(assessment) => assessment.verdict.as_str(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Unavailable => UNAVAILABLE_MESSAGE,
            Self::Empty => EMPTY_MESSAGE,
            Self::Scored(assessment) => match assessment.verdict {
                Verdict::Blocked => BLOCKED_MESSAGE,
                Verdict::Approved => APPROVED_MESSAGE,
            },
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Scored(assessment) if assessment.verdict == Verdict::Blocked => {
                Some(BLOCKED_HINT)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn assessment(&self) -> Option<&Assessment> {
        match self {
            Self::Scored(assessment) => Some(assessment),
            _ => None,
        }
    }
}

/// ロード状態に応じて採点の可否を切り替えるアナライザ。
#[derive(Debug, Clone)]
pub struct CommentAnalyzer {
    scorer: Option<ToxicityScorer>,
    model_version: Option<String>,
}

impl CommentAnalyzer {
    #[must_use]
    pub fn from_state(state: &ArtifactState) -> Self {
        let scorer = state.artifacts().map(ToxicityScorer::new);
        let model_version = scorer
            .as_ref()
            .and_then(|scorer| scorer.artifacts().version().map(str::to_string));
        Self {
            scorer,
            model_version,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.scorer.is_some()
    }

    #[must_use]
    pub fn model_version(&self) -> Option<&str> {
        self.model_version.as_deref()
    }

    /// 生の入力を判定する。空文字列は採点せず [`AnalysisOutcome::Empty`] を返す。
    #[must_use]
    pub fn analyze(&self, raw: &str) -> AnalysisOutcome {
        let Some(scorer) = &self.scorer else {
            return AnalysisOutcome::Unavailable;
        };
        if raw.is_empty() {
            return AnalysisOutcome::Empty;
        }
        AnalysisOutcome::Scored(scorer.evaluate(raw))
    }
}
