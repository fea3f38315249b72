//! Geometry types: sampled trace headers, derived statistics and the
//! classification verdict.

use serde::{Deserialize, Serialize};

use super::{ConfidenceLevel, PrimarySorting, StackType, SurveyType};

/// Header fields of one sampled trace.
///
/// Integer header words are rounded to `i64`; coordinates keep full precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceHeaderRecord {
    pub trace_index: usize,
    pub inline: i64,
    pub crossline: i64,
    pub cdp: i64,
    pub field_record: i64,
    pub shot_point: i64,
    pub source_x: f64,
    pub source_y: f64,
    pub receiver_x: f64,
    pub receiver_y: f64,
    pub offset: i64,
}

/// Evenly-strided sample of trace headers from one file
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceHeaderSample {
    /// Successfully read records, in trace order
    pub records: Vec<TraceHeaderRecord>,
    /// Distance between sampled trace indices
    pub stride: usize,
    /// Total traces declared by the file
    pub total_traces: usize,
    /// Sampled traces whose headers could not be read
    pub skipped: usize,
}

impl TraceHeaderSample {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Inclusive min/max of an integer header field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRange {
    pub min: i64,
    pub max: i64,
}

impl FieldRange {
    pub fn span(&self) -> i64 {
        self.max - self.min
    }
}

/// Which coordinate pair fed the spread/PCA computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSource {
    Source,
    Receiver,
}

/// Extent of the sampled coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSpread {
    pub source: CoordinateSource,
    pub x_range: f64,
    pub y_range: f64,
}

/// Principal-component split of the coordinate cloud
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PcaResult {
    /// λ1 / (λ1 + λ2)
    pub major_variance: f64,
    /// λ2 / (λ1 + λ2)
    pub minor_variance: f64,
    /// Covariance eigenvalues, descending
    pub eigenvalues: [f64; 2],
    /// Number of coordinate points used
    pub points: usize,
}

/// Read-only aggregates derived from a [`TraceHeaderSample`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeometryStats {
    pub traces_sampled: usize,
    pub unique_inlines: usize,
    pub unique_crosslines: usize,
    pub unique_cdps: usize,
    pub unique_field_records: usize,
    pub unique_shot_points: usize,
    pub unique_offsets: usize,
    /// Traces with a non-zero offset
    pub nonzero_offset_count: usize,
    /// Distinct values among non-zero offsets
    pub unique_nonzero_offsets: usize,
    /// Share of sampled traces carrying the most frequent CDP
    pub dominant_cdp_fraction: f64,
    pub inline_range: Option<FieldRange>,
    pub crossline_range: Option<FieldRange>,
    pub cdp_range: Option<FieldRange>,
    pub field_record_range: Option<FieldRange>,
    pub offset_range: Option<FieldRange>,
    pub coordinate_spread: Option<CoordinateSpread>,
    /// `None` when fewer than three distinct points or zero total variance
    pub pca: Option<PcaResult>,
}

impl GeometryStats {
    pub fn major_variance(&self) -> Option<f64> {
        self.pca.map(|p| p.major_variance)
    }
}

/// Verdict of the geometry classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub survey_type: SurveyType,
    pub primary_sorting: PrimarySorting,
    pub stack_type: StackType,
    pub confidence: ConfidenceLevel,
    /// Label of the rule that accepted the sample
    pub method: String,
    /// Ordered evidence trail; every confidence step is backed by an entry
    pub evidence: Vec<String>,
    pub traces_analyzed: usize,
    #[serde(default)]
    pub traces_skipped: usize,
    /// Statistics the verdict was derived from
    #[serde(default)]
    pub geometry: Option<GeometryStats>,
}

impl ClassificationResult {
    /// All-undetermined verdict with a single explanatory note
    pub fn undetermined(note: impl Into<String>, traces_skipped: usize) -> Self {
        Self {
            survey_type: SurveyType::Undetermined,
            primary_sorting: PrimarySorting::Undetermined,
            stack_type: StackType::Undetermined,
            confidence: ConfidenceLevel::VeryLow,
            method: "insufficient_data".to_string(),
            evidence: vec![note.into()],
            traces_analyzed: 0,
            traces_skipped,
            geometry: None,
        }
    }

    /// True when the evidence trail is long enough for the stated confidence
    pub fn evidence_supports_confidence(&self) -> bool {
        self.evidence.len() >= self.confidence.rank().max(1)
    }
}
