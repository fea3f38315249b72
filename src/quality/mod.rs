//! Quality Analyzer
//!
//! Samples amplitudes evenly across a file, computes descriptive statistics
//! and rates five factors against the threshold profile of the detected
//! survey type. An empty or entirely non-finite sample produces an invalid
//! verdict instead of an error.

pub mod amplitude;
pub mod factors;
pub mod profiles;

pub use amplitude::compute_amplitude_stats;
pub use factors::{aggregate, evaluate_factors, FactorAssessment};
pub use profiles::profile_for;

use std::collections::BTreeMap;
use tracing::debug;

use crate::acquisition::{TraceSample, TraceSampler};
use crate::config::QualityConfig;
use crate::reader::TraceHandle;
use crate::types::{
    CheckSeverity, ConfidenceLevel, FactorRating, QualityCategory, QualityCheck, QualityRating,
    QualityResult, SurveyType,
};

#[derive(Debug, Clone)]
pub struct QualityAnalyzer {
    config: QualityConfig,
}

impl QualityAnalyzer {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QualityConfig {
        &self.config
    }

    /// Sample up to `max_traces` traces from an open file and rate them.
    pub fn assess(
        &self,
        handle: &dyn TraceHandle,
        survey_type: SurveyType,
        max_traces: usize,
    ) -> QualityResult {
        let sample = TraceSampler::new(max_traces, self.config.amplitude_decimation).sample(handle);
        self.assess_sample(&sample, survey_type)
    }

    /// Rate an already drawn trace sample.
    pub fn assess_sample(&self, sample: &TraceSample, survey_type: SurveyType) -> QualityResult {
        let profile = profile_for(survey_type);
        let confidence = sampling_confidence(sample.sampled_fraction());

        let Some(stats) = compute_amplitude_stats(sample) else {
            return invalid_sample(sample, survey_type, confidence);
        };

        let factors = evaluate_factors(&stats, sample.total_traces, survey_type, &profile);
        let ratings: Vec<FactorRating> = factors.iter().map(|f| f.rating).collect();
        let overall_rating = aggregate(&ratings);

        let mut checks: Vec<QualityCheck> = factors.iter().map(FactorAssessment::to_check).collect();
        if sample.traces_skipped > 0 {
            checks.push(QualityCheck {
                severity: CheckSeverity::Warning,
                category: QualityCategory::Sampling,
                message: format!("{} sampled traces unreadable", sample.traces_skipped),
            });
        }

        debug!(
            survey_type = %survey_type,
            rating = %overall_rating,
            dynamic_range_db = stats.dynamic_range_db,
            zero_pct = stats.zero_percentage,
            "Quality assessed"
        );

        QualityResult {
            overall_rating,
            rating_factors: factors.iter().map(|f| (f.category, f.rating)).collect(),
            confidence,
            checks,
            survey_type,
            profile,
            amplitude_stats: Some(stats),
            traces_sampled: sample.traces_sampled,
            total_traces: sample.total_traces,
        }
    }
}

/// >10% of traces read: high; >1%: medium; otherwise low
pub fn sampling_confidence(sampled_fraction: f64) -> ConfidenceLevel {
    if sampled_fraction > 0.10 {
        ConfidenceLevel::High
    } else if sampled_fraction > 0.01 {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::Low
    }
}

fn invalid_sample(
    sample: &TraceSample,
    survey_type: SurveyType,
    confidence: ConfidenceLevel,
) -> QualityResult {
    let message = if sample.traces_sampled == 0 {
        format!(
            "No readable traces ({} of {} unreadable)",
            sample.traces_skipped, sample.total_traces
        )
    } else {
        format!(
            "No finite amplitude values in {} samples ({} NaN, {} infinite)",
            sample.total_values, sample.nan_count, sample.inf_count
        )
    };
    let mut rating_factors = BTreeMap::new();
    rating_factors.insert(QualityCategory::Sampling, FactorRating::Corrupted);

    QualityResult {
        overall_rating: QualityRating::Invalid,
        rating_factors,
        confidence: confidence.min(ConfidenceLevel::Low),
        checks: vec![QualityCheck {
            severity: CheckSeverity::Critical,
            category: QualityCategory::Sampling,
            message,
        }],
        survey_type,
        profile: profile_for(survey_type),
        amplitude_stats: None,
        traces_sampled: sample.traces_sampled,
        total_traces: sample.total_traces,
    }
}
