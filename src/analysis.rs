//! Per-file analysis
//!
//! `SurveyAnalyzer` wires validator, classifier and quality analyzer over
//! one reader and exposes the operations a calling layer invokes:
//! `classify_survey`, `assess_quality` and `analyze`. It is also the
//! default [`FileProcessor`] of the batch orchestrator.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

use crate::acquisition::{FileValidator, HeaderSampler, ValidationError};
use crate::batch::FileProcessor;
use crate::config::SurveyConfig;
use crate::geometry::{compute_geometry_stats, ClassificationCache, GeometryClassifier};
use crate::quality::QualityAnalyzer;
use crate::reader::{FormatError, TraceHandle, TraceReader};
use crate::types::{
    AnalysisType, ClassificationResult, ConfidenceLevel, FileReport, PrimarySorting,
    QualityResult, StackType, SurveyType,
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{} failed validation: {}", path.display(), issues.join("; "))]
    Invalid {
        path: std::path::PathBuf,
        issues: Vec<String>,
    },

    #[error(transparent)]
    Format(#[from] FormatError),
}

pub struct SurveyAnalyzer {
    reader: Arc<dyn TraceReader>,
    validator: FileValidator,
    classifier: GeometryClassifier,
    quality: QualityAnalyzer,
    max_traces_per_file: usize,
}

impl SurveyAnalyzer {
    pub fn new(reader: Arc<dyn TraceReader>, config: &SurveyConfig) -> Self {
        Self::with_classifier(
            Arc::clone(&reader),
            config,
            GeometryClassifier::new(config.classifier.clone()),
        )
    }

    /// Use a caller-owned classification cache
    pub fn with_cache(
        reader: Arc<dyn TraceReader>,
        config: &SurveyConfig,
        cache: Arc<dyn ClassificationCache>,
    ) -> Self {
        Self::with_classifier(
            reader,
            config,
            GeometryClassifier::with_cache(config.classifier.clone(), cache),
        )
    }

    fn with_classifier(
        reader: Arc<dyn TraceReader>,
        config: &SurveyConfig,
        classifier: GeometryClassifier,
    ) -> Self {
        Self {
            validator: FileValidator::new(Arc::clone(&reader), config.validation.clone()),
            reader,
            classifier,
            quality: QualityAnalyzer::new(config.quality.clone()),
            max_traces_per_file: config.batch.max_traces_per_file,
        }
    }

    pub fn validator(&self) -> &FileValidator {
        &self.validator
    }

    pub fn classifier(&self) -> &GeometryClassifier {
        &self.classifier
    }

    /// Validate, then open. Validation issues block analysis.
    fn open_validated(&self, path: &Path) -> Result<Box<dyn TraceHandle>, AnalysisError> {
        let report = self.validator.validate(path)?;
        if !report.is_valid() {
            return Err(AnalysisError::Invalid {
                path: path.to_path_buf(),
                issues: report.issues,
            });
        }
        for w in &report.warnings {
            debug!(path = %path.display(), warning = %w, "Validation warning");
        }
        Ok(self.reader.open(path)?)
    }

    pub fn classify_survey(&self, path: &Path) -> Result<ClassificationResult, AnalysisError> {
        let handle = self.open_validated(path)?;
        Ok(self.classifier.classify_file(path, handle.as_ref()))
    }

    /// Classify (or reuse the cached verdict), then rate quality with the
    /// configured per-file trace budget.
    pub fn assess_quality(&self, path: &Path) -> Result<QualityResult, AnalysisError> {
        let handle = self.open_validated(path)?;
        let classification = self.classifier.classify_file(path, handle.as_ref());
        Ok(self
            .quality
            .assess(handle.as_ref(), classification.survey_type, self.max_traces_per_file))
    }

    pub fn analyze(&self, path: &Path, operation: AnalysisType) -> Result<FileReport, AnalysisError> {
        let started = Instant::now();
        let file_size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        let handle = self.open_validated(path)?;
        let h = handle.as_ref();

        let mut report = FileReport {
            path: path.to_path_buf(),
            analysis_type: operation,
            file_size_bytes,
            survey_type: SurveyType::Undetermined,
            primary_sorting: PrimarySorting::Undetermined,
            stack_type: StackType::Undetermined,
            confidence: ConfidenceLevel::VeryLow,
            classification_details: None,
            quality_assessment: None,
            header_summary: None,
            traces_analyzed: 0,
            processing_time_seconds: 0.0,
        };

        match operation {
            AnalysisType::Quick | AnalysisType::Full => {
                let budget = if operation == AnalysisType::Quick {
                    self.quality.config().quick_trace_sample.min(self.max_traces_per_file)
                } else {
                    self.max_traces_per_file
                };
                let classification = self.classifier.classify_file(path, h);
                let quality = self.quality.assess(h, classification.survey_type, budget);
                report.traces_analyzed = classification.traces_analyzed.max(quality.traces_sampled);
                report.apply_classification(classification);
                report.quality_assessment = Some(quality);
            }
            AnalysisType::Geometry => {
                let classification = self.classifier.classify_file(path, h);
                report.traces_analyzed = classification.traces_analyzed;
                report.apply_classification(classification);
            }
            AnalysisType::Amplitudes => {
                let survey_type = self
                    .classifier
                    .cached(path)
                    .map_or(SurveyType::Undetermined, |c| c.survey_type);
                let quality = self.quality.assess(h, survey_type, self.max_traces_per_file);
                report.survey_type = survey_type;
                report.traces_analyzed = quality.traces_sampled;
                report.quality_assessment = Some(quality);
            }
            AnalysisType::Headers => {
                let sample = HeaderSampler::new(self.classifier.config().max_header_samples).sample(h);
                let stats = compute_geometry_stats(&sample);
                report.traces_analyzed = stats.traces_sampled;
                report.header_summary = Some(stats);
            }
        }

        report.processing_time_seconds = round_millis(started.elapsed().as_secs_f64());
        info!(
            path = %path.display(),
            operation = %operation,
            survey_type = %report.survey_type,
            rating = report.quality_rating().map(|r| r.as_str()).unwrap_or("-"),
            secs = report.processing_time_seconds,
            "File analyzed"
        );
        Ok(report)
    }
}

fn round_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}

impl FileReport {
    fn apply_classification(&mut self, c: ClassificationResult) {
        self.survey_type = c.survey_type;
        self.primary_sorting = c.primary_sorting;
        self.stack_type = c.stack_type;
        self.confidence = c.confidence;
        self.classification_details = Some(c);
    }
}

impl FileProcessor for SurveyAnalyzer {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport> {
        Ok(self.analyze(path, operation)?)
    }

    fn reclaim(&self) {
        let dropped = self.classifier.cache().len();
        self.classifier.clear_cache();
        debug!(dropped, "Classification cache cleared");
    }
}
