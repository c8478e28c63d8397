/// Prometheusメトリクス定義。
use prometheus::{
    Counter, Gauge, Histogram, Registry, exponential_buckets, histogram_opts, linear_buckets,
    register_counter_with_registry, register_gauge_with_registry,
    register_histogram_with_registry,
};
use std::sync::Arc;

use crate::classification::{Assessment, Verdict};

/// メトリクスコレクター。コメント本文は一切記録しない。
#[derive(Debug, Clone)]
pub struct Metrics {
    // カウンター
    pub analyses_total: Counter,
    pub blocked_total: Counter,
    pub approved_total: Counter,
    pub empty_submissions_total: Counter,
    pub unavailable_total: Counter,

    // ヒストグラム
    pub toxicity_score: Histogram,
    pub scoring_duration: Histogram,

    // ゲージ
    pub artifacts_loaded: Gauge,
}

impl Metrics {
    /// 新しいメトリクスコレクターを作成し、指定のレジストリに登録する。
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            analyses_total: register_counter_with_registry!(
                "respect_guard_analyses_total",
                "Total number of comments scored",
                registry
            )?,
            blocked_total: register_counter_with_registry!(
                "respect_guard_blocked_total",
                "Total number of comments blocked",
                registry
            )?,
            approved_total: register_counter_with_registry!(
                "respect_guard_approved_total",
                "Total number of comments approved",
                registry
            )?,
            empty_submissions_total: register_counter_with_registry!(
                "respect_guard_empty_submissions_total",
                "Submissions rejected because no text was entered",
                registry
            )?,
            unavailable_total: register_counter_with_registry!(
                "respect_guard_unavailable_total",
                "Submissions refused because model artifacts are missing",
                registry
            )?,
            toxicity_score: register_histogram_with_registry!(
                histogram_opts!(
                    "respect_guard_toxicity_score",
                    "Distribution of toxicity scores in percent",
                    linear_buckets(10.0, 10.0, 9)?
                ),
                registry
            )?,
            scoring_duration: register_histogram_with_registry!(
                histogram_opts!(
                    "respect_guard_scoring_duration_seconds",
                    "Time spent cleaning, vectorizing and scoring one comment",
                    exponential_buckets(0.000_01, 4.0, 10)?
                ),
                registry
            )?,
            artifacts_loaded: register_gauge_with_registry!(
                "respect_guard_artifacts_loaded",
                "1 when the classifier and vectorizer are loaded, otherwise 0",
                registry
            )?,
        })
    }

    /// 採点結果を記録する。
    pub fn record_assessment(&self, assessment: &Assessment, elapsed_secs: f64) {
        self.analyses_total.inc();
        match assessment.verdict {
            Verdict::Blocked => self.blocked_total.inc(),
            Verdict::Approved => self.approved_total.inc(),
        }
        self.toxicity_score.observe(assessment.score.value());
        self.scoring_duration.observe(elapsed_secs);
    }

    pub fn set_artifacts_loaded(&self, loaded: bool) {
        self.artifacts_loaded.set(if loaded { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::ToxicityScore;

    #[test]
    fn record_assessment_splits_by_verdict() {
        let metrics = Metrics::new(Arc::new(Registry::new())).expect("metrics register");
        let blocked = Assessment {
            cleaned: "you are stupid".to_string(),
            score: ToxicityScore::from_percent(91.0),
            verdict: Verdict::Blocked,
        };
        let approved = Assessment {
            cleaned: "thank you".to_string(),
            score: ToxicityScore::from_percent(3.0),
            verdict: Verdict::Approved,
        };

        metrics.record_assessment(&blocked, 0.0001);
        metrics.record_assessment(&approved, 0.0001);
        metrics.record_assessment(&approved, 0.0001);

        assert!((metrics.analyses_total.get() - 3.0).abs() < f64::EPSILON);
        assert!((metrics.blocked_total.get() - 1.0).abs() < f64::EPSILON);
        assert!((metrics.approved_total.get() - 2.0).abs() < f64::EPSILON);
        assert_eq!(metrics.toxicity_score.get_sample_count(), 3);
    }

    #[test]
    fn registering_twice_in_one_registry_fails() {
        let registry = Arc::new(Registry::new());
        let _first = Metrics::new(Arc::clone(&registry)).expect("first registration");
        assert!(Metrics::new(registry).is_err());
    }
}
