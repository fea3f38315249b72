//! Quality-control types: amplitude statistics, threshold profiles and the
//! rated quality verdict.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ConfidenceLevel, SurveyType};

/// Fixed percentile set reported for every amplitude sample
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Percentiles {
    pub p1: f64,
    pub p5: f64,
    pub p10: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Amplitude statistics over the bounded trace sample of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmplitudeStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub rms: f64,
    pub percentiles: Percentiles,
    /// Only computed when more than ten finite values are present
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub dynamic_range_db: f64,
    pub signal_to_noise: f64,
    /// Over the full (non-decimated) sample
    pub zero_percentage: f64,
    pub nan_count: usize,
    pub inf_count: usize,
    /// Finite values in the working set
    pub sample_count: usize,
}

impl AmplitudeStats {
    pub fn amplitude_range(&self) -> f64 {
        self.max - self.min
    }

    pub fn has_integrity_fault(&self) -> bool {
        self.nan_count > 0 || self.inf_count > 0
    }
}

/// Per-survey-type QC thresholds. Static configuration, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholdProfile {
    pub min_dynamic_range_db: f64,
    pub max_zero_percent: f64,
    pub min_traces: usize,
    pub max_amplitude_range: f64,
}

/// The five independently rated QC factors, plus the sampling pseudo-factor
/// used by the invalid-sample verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityCategory {
    DynamicRange,
    ZeroPercentage,
    AmplitudeRange,
    DataIntegrity,
    TraceCount,
    Sampling,
}

impl QualityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DynamicRange => "dynamic_range",
            Self::ZeroPercentage => "zero_percentage",
            Self::AmplitudeRange => "amplitude_range",
            Self::DataIntegrity => "data_integrity",
            Self::TraceCount => "trace_count",
            Self::Sampling => "sampling",
        }
    }
}

impl std::fmt::Display for QualityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label assigned to a single factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorRating {
    Excellent,
    Good,
    /// Outside the strict band but expected for this survey type
    Normal,
    Fair,
    Poor,
    Corrupted,
}

impl FactorRating {
    pub fn is_good_or_better(&self) -> bool {
        matches!(self, Self::Excellent | Self::Good | Self::Normal)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Normal => "normal",
            Self::Fair => "fair",
            Self::Poor => "poor",
            Self::Corrupted => "corrupted",
        }
    }
}

impl std::fmt::Display for FactorRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall verdict. Variant order is significant: `Invalid` is the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityRating {
    Invalid,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl QualityRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Poor => "poor",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl std::fmt::Display for QualityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// One line of the QC report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub severity: CheckSeverity,
    pub category: QualityCategory,
    pub message: String,
}

/// Rated quality verdict for one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityResult {
    pub overall_rating: QualityRating,
    pub rating_factors: BTreeMap<QualityCategory, FactorRating>,
    pub confidence: ConfidenceLevel,
    pub checks: Vec<QualityCheck>,
    /// Survey type whose profile was applied
    pub survey_type: SurveyType,
    pub profile: QualityThresholdProfile,
    pub amplitude_stats: Option<AmplitudeStats>,
    pub traces_sampled: usize,
    pub total_traces: usize,
}

impl QualityResult {
    pub fn is_invalid(&self) -> bool {
        self.overall_rating == QualityRating::Invalid
    }
}
