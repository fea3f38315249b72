//! Survey summary aggregation
//!
//! Built once from the terminal tasks of a run. Every aggregate is a count,
//! an integer sum, a `Duration` sum or a sorted collection, so the result
//! does not depend on task order.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{
    AnalysisType, BatchStatus, ExcludedFile, FailedFile, FileTask, QualityRating, SurveySummary,
    SurveyType, TaskErrorKind, TaskStatus, ThresholdBreach, Throughput,
};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Run-level facts the tasks themselves do not carry
#[derive(Debug, Clone)]
pub struct RunContext {
    pub pattern: String,
    pub analysis_type: AnalysisType,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub wall_time: Duration,
    /// Files matched by discovery
    pub total_files: usize,
    pub excluded_files: Vec<ExcludedFile>,
    pub halted: bool,
    pub threshold_breach: Option<ThresholdBreach>,
}

impl SurveySummary {
    /// Aggregate one terminal task per file.
    pub fn from_tasks(ctx: RunContext, tasks: &[FileTask]) -> Self {
        let mut survey_type_distribution: BTreeMap<SurveyType, usize> = BTreeMap::new();
        let mut quality_distribution: BTreeMap<QualityRating, usize> = BTreeMap::new();
        let mut failures: Vec<FailedFile> = Vec::new();
        let mut successful_files = 0;
        let mut cancelled_files = 0;
        let mut retried_attempts = 0;
        let mut total_size_bytes = 0u64;
        let mut processed_size_bytes = 0u64;
        let mut processing = Duration::ZERO;

        for task in tasks {
            total_size_bytes += task.file_size_bytes;
            retried_attempts += task.attempt as usize;
            if let Some(t) = task.processing_time {
                processing += t;
            }

            match task.status {
                TaskStatus::Success => {
                    successful_files += 1;
                    processed_size_bytes += task.file_size_bytes;
                    if let Some(report) = &task.result {
                        *survey_type_distribution.entry(report.survey_type).or_insert(0) += 1;
                        if let Some(rating) = report.quality_rating() {
                            *quality_distribution.entry(rating).or_insert(0) += 1;
                        }
                    }
                }
                TaskStatus::Error => {
                    let (kind, message) = task
                        .error
                        .as_ref()
                        .map(|e| (e.kind, e.message.clone()))
                        .unwrap_or((TaskErrorKind::Operation, "unknown error".to_string()));
                    if kind == TaskErrorKind::Cancelled {
                        cancelled_files += 1;
                    }
                    failures.push(FailedFile {
                        path: task.path.clone(),
                        kind,
                        message,
                        attempts: task.attempt + 1,
                    });
                }
                TaskStatus::Pending | TaskStatus::Running => {}
            }
        }
        failures.sort_by(|a, b| a.path.cmp(&b.path).then(a.attempts.cmp(&b.attempts)));
        let failed_files = failures.len() - cancelled_files;

        let mut excluded_files = ctx.excluded_files;
        excluded_files.sort_by(|a, b| a.path.cmp(&b.path));

        let wall = ctx.wall_time.as_secs_f64();
        let throughput = if wall > 0.0 {
            Throughput {
                mb_per_second: processed_size_bytes as f64 / BYTES_PER_MB / wall,
                files_per_minute: successful_files as f64 / wall * 60.0,
                wall_time_seconds: wall,
            }
        } else {
            Throughput::default()
        };

        Self {
            status: if ctx.halted {
                BatchStatus::Halted
            } else {
                BatchStatus::Completed
            },
            pattern: ctx.pattern,
            analysis_type: ctx.analysis_type,
            started_at: ctx.started_at,
            finished_at: ctx.finished_at,
            total_files: ctx.total_files,
            valid_files: tasks.len(),
            successful_files,
            failed_files,
            cancelled_files,
            retried_attempts,
            total_size_bytes,
            processed_size_bytes,
            survey_type_distribution,
            quality_distribution,
            throughput,
            total_processing_seconds: processing.as_secs_f64(),
            excluded_files,
            failures,
            threshold_breach: ctx.threshold_breach,
            validation_issues: Vec::new(),
        }
    }

    /// Explicit result for a run where nothing survived discovery and
    /// pre-validation.
    pub fn no_valid_files(ctx: RunContext, validation_issues: Vec<String>) -> Self {
        let mut summary = Self::from_tasks(ctx, &[]);
        summary.status = BatchStatus::NoValidFiles;
        summary.validation_issues = validation_issues;
        summary
    }

    pub fn failure_ratio(&self) -> f64 {
        if self.valid_files == 0 {
            0.0
        } else {
            self.failed_files as f64 / self.valid_files as f64
        }
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
