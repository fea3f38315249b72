//! The five QC factors and their aggregation into an overall rating.
//!
//! Each factor is rated on its own against the survey-type profile. Labels
//! are monotone in the underlying metric, which keeps the overall rating
//! monotone too.

use crate::config::defaults::{EPSILON, GOOD_FACTOR_FRACTION};
use crate::types::{
    AmplitudeStats, CheckSeverity, FactorRating, QualityCategory, QualityCheck, QualityRating,
    QualityThresholdProfile, SurveyType,
};

/// Rated factor plus the report line describing it
#[derive(Debug, Clone, PartialEq)]
pub struct FactorAssessment {
    pub category: QualityCategory,
    pub rating: FactorRating,
    pub message: String,
}

impl FactorAssessment {
    fn new(category: QualityCategory, rating: FactorRating, message: String) -> Self {
        Self {
            category,
            rating,
            message,
        }
    }

    pub fn to_check(&self) -> QualityCheck {
        QualityCheck {
            severity: severity_for(self.rating),
            category: self.category,
            message: self.message.clone(),
        }
    }
}

pub fn severity_for(rating: FactorRating) -> CheckSeverity {
    match rating {
        FactorRating::Excellent | FactorRating::Good | FactorRating::Normal => CheckSeverity::Info,
        FactorRating::Fair => CheckSeverity::Warning,
        FactorRating::Poor => CheckSeverity::Error,
        FactorRating::Corrupted => CheckSeverity::Critical,
    }
}

pub fn rate_dynamic_range(db: f64, profile: &QualityThresholdProfile) -> FactorAssessment {
    let min = profile.min_dynamic_range_db;
    let rating = if db >= min + 20.0 {
        FactorRating::Excellent
    } else if db >= min {
        FactorRating::Good
    } else if db >= min - 10.0 {
        FactorRating::Fair
    } else {
        FactorRating::Poor
    };
    FactorAssessment::new(
        QualityCategory::DynamicRange,
        rating,
        format!("Dynamic range {db:.1} dB (minimum {min:.0} dB): {rating}"),
    )
}

/// Muted zones are expected in raw and stacked data, so zero samples up to
/// the profile limit rate `normal` there and the penalty beyond it is softer.
pub fn rate_zero_percentage(
    pct: f64,
    profile: &QualityThresholdProfile,
    survey_type: SurveyType,
) -> FactorAssessment {
    let max = profile.max_zero_percent;
    let lenient = survey_type.expects_muting();
    let rating = if pct <= max * 0.25 {
        FactorRating::Excellent
    } else if pct <= max * 0.5 {
        FactorRating::Good
    } else if pct <= max {
        if lenient {
            FactorRating::Normal
        } else {
            FactorRating::Fair
        }
    } else if lenient && pct <= max * 1.5 {
        FactorRating::Fair
    } else {
        FactorRating::Poor
    };
    let note = if rating == FactorRating::Normal {
        ", expected muting"
    } else {
        ""
    };
    FactorAssessment::new(
        QualityCategory::ZeroPercentage,
        rating,
        format!("Zero samples {pct:.1}% (limit {max:.0}%): {rating}{note}"),
    )
}

pub fn rate_amplitude_range(range: f64, profile: &QualityThresholdProfile) -> FactorAssessment {
    let (rating, message) = if range <= EPSILON {
        (FactorRating::Poor, "Amplitude range is flat".to_string())
    } else if range > profile.max_amplitude_range {
        (
            FactorRating::Fair,
            format!(
                "Amplitude range {range:.3e} exceeds plausible {:.0e}",
                profile.max_amplitude_range
            ),
        )
    } else {
        (
            FactorRating::Good,
            format!("Amplitude range {range:.3e} plausible"),
        )
    };
    FactorAssessment::new(QualityCategory::AmplitudeRange, rating, message)
}

pub fn rate_integrity(nan_count: usize, inf_count: usize) -> FactorAssessment {
    if nan_count > 0 || inf_count > 0 {
        FactorAssessment::new(
            QualityCategory::DataIntegrity,
            FactorRating::Corrupted,
            format!("Data integrity fault: {nan_count} NaN and {inf_count} infinite samples"),
        )
    } else {
        FactorAssessment::new(
            QualityCategory::DataIntegrity,
            FactorRating::Good,
            "No NaN or infinite samples".to_string(),
        )
    }
}

pub fn rate_trace_count(total_traces: usize, profile: &QualityThresholdProfile) -> FactorAssessment {
    let min = profile.min_traces;
    let rating = if total_traces >= min * 10 {
        FactorRating::Excellent
    } else if total_traces >= min {
        FactorRating::Good
    } else if total_traces * 2 >= min {
        FactorRating::Fair
    } else {
        FactorRating::Poor
    };
    FactorAssessment::new(
        QualityCategory::TraceCount,
        rating,
        format!("{total_traces} traces (minimum {min}): {rating}"),
    )
}

/// Rate all five factors, in report order
pub fn evaluate_factors(
    stats: &AmplitudeStats,
    total_traces: usize,
    survey_type: SurveyType,
    profile: &QualityThresholdProfile,
) -> Vec<FactorAssessment> {
    vec![
        rate_dynamic_range(stats.dynamic_range_db, profile),
        rate_zero_percentage(stats.zero_percentage, profile, survey_type),
        rate_amplitude_range(stats.amplitude_range(), profile),
        rate_integrity(stats.nan_count, stats.inf_count),
        rate_trace_count(total_traces, profile),
    ]
}

/// Corrupted wins outright, then two poor, then two excellent, then the
/// good-or-better share.
pub fn aggregate(ratings: &[FactorRating]) -> QualityRating {
    if ratings.is_empty() || ratings.contains(&FactorRating::Corrupted) {
        return QualityRating::Invalid;
    }
    let count = |r: FactorRating| ratings.iter().filter(|x| **x == r).count();
    if count(FactorRating::Poor) >= 2 {
        return QualityRating::Poor;
    }
    if count(FactorRating::Excellent) >= 2 {
        return QualityRating::Excellent;
    }
    let good = ratings.iter().filter(|r| r.is_good_or_better()).count();
    if good as f64 / ratings.len() as f64 >= GOOD_FACTOR_FRACTION {
        QualityRating::Good
    } else {
        QualityRating::Fair
    }
}
