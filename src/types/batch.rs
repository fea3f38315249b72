//! Batch types: per-file reports, the FileTask record and the survey summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::{
    ClassificationResult, ConfidenceLevel, GeometryStats, PrimarySorting, QualityRating,
    QualityResult, StackType, SurveyType,
};

/// Operation requested for each file of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    /// Classification plus QC on a small trace sample
    #[default]
    Quick,
    /// Classification plus QC on the configured trace sample
    Full,
    /// Classification only
    Geometry,
    /// QC only
    Amplitudes,
    /// Header statistics only
    Headers,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
            Self::Geometry => "geometry",
            Self::Amplitudes => "amplitudes",
            Self::Headers => "headers",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file output shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub analysis_type: AnalysisType,
    pub file_size_bytes: u64,
    pub survey_type: SurveyType,
    pub primary_sorting: PrimarySorting,
    pub stack_type: StackType,
    pub confidence: ConfidenceLevel,
    pub classification_details: Option<ClassificationResult>,
    pub quality_assessment: Option<QualityResult>,
    pub header_summary: Option<GeometryStats>,
    pub traces_analyzed: usize,
    /// Wall time of the operation, rounded to milliseconds
    pub processing_time_seconds: f64,
}

impl FileReport {
    pub fn quality_rating(&self) -> Option<QualityRating> {
        self.quality_assessment.as_ref().map(|q| q.overall_rating)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Success,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// The operation returned an error
    Operation,
    /// No completion within the per-task timeout
    Timeout,
    /// The operation panicked inside the worker
    Panicked,
    /// Never started because the error-rate breaker tripped
    Cancelled,
    /// Submitted but never picked up by a worker
    Stalled,
}

/// Failure attached to a single FileTask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskError {
    pub kind: TaskErrorKind,
    pub message: String,
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// One unit of batch work, owned by the orchestrator for a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTask {
    pub id: u64,
    pub path: PathBuf,
    pub operation: AnalysisType,
    /// Zero for the first submission, incremented per retry
    pub attempt: u32,
    pub file_size_bytes: u64,
    pub status: TaskStatus,
    pub result: Option<FileReport>,
    pub error: Option<TaskError>,
    pub processing_time: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Completed,
    /// Error-rate breaker stopped dispatch
    Halted,
    NoValidFiles,
}

/// File rejected during pre-validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedFile {
    pub path: PathBuf,
    pub reasons: Vec<String>,
}

/// Terminal failure record in the summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub kind: TaskErrorKind,
    pub message: String,
    pub attempts: u32,
}

/// Recorded when failed/total exceeded the configured error threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBreach {
    pub failed: usize,
    pub total: usize,
    pub ratio: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Throughput {
    pub mb_per_second: f64,
    pub files_per_minute: f64,
    pub wall_time_seconds: f64,
}

/// Aggregate over the terminal FileTasks of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySummary {
    pub status: BatchStatus,
    pub pattern: String,
    pub analysis_type: AnalysisType,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Files matched by discovery
    pub total_files: usize,
    /// Files that passed pre-validation
    pub valid_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    pub cancelled_files: usize,
    /// Resubmissions performed across the batch
    pub retried_attempts: usize,
    pub total_size_bytes: u64,
    pub processed_size_bytes: u64,
    pub survey_type_distribution: BTreeMap<SurveyType, usize>,
    pub quality_distribution: BTreeMap<QualityRating, usize>,
    pub throughput: Throughput,
    pub total_processing_seconds: f64,
    pub excluded_files: Vec<ExcludedFile>,
    pub failures: Vec<FailedFile>,
    pub threshold_breach: Option<ThresholdBreach>,
    /// Validator issues reported when no file survived pre-validation
    pub validation_issues: Vec<String>,
}
