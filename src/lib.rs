//! SeisQC: Seismic Survey Classification and Quality Control
//!
//! Header-driven survey geometry classification, survey-type-calibrated
//! amplitude QC and a governed batch runner over many trace files.
//!
//! ## Architecture
//!
//! - **Reader**: contract for the upstream trace/header reader, plus an in-memory reader
//! - **Acquisition**: structural file validation and bounded trace/header sampling
//! - **Geometry**: header statistics, coordinate PCA and an ordered rule cascade
//! - **Quality**: amplitude statistics scored against per-survey-type profiles
//! - **Batch**: discovery, bounded worker pool, error-rate breaker, summary
//!
//! ```no_run
//! use std::sync::Arc;
//! use seisqc::{run_batch, MemoryReader, SurveyConfig};
//!
//! let reader = Arc::new(MemoryReader::new());
//! let summary = run_batch(reader, "/data/survey/*.sgy", &SurveyConfig::load())?;
//! println!("{}", summary.to_json_pretty()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod acquisition;
pub mod analysis;
pub mod batch;
pub mod config;
pub mod geometry;
pub mod quality;
pub mod reader;
pub mod telemetry;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, SurveyConfig};

// Re-export commonly used types
pub use types::{
    AnalysisType, ClassificationResult, ConfidenceLevel, FileReport, FileTask, PrimarySorting,
    QualityRating, QualityResult, StackType, SurveySummary, SurveyType,
};

// Re-export components
pub use acquisition::{FileValidator, ValidationReport};
pub use analysis::{AnalysisError, SurveyAnalyzer};
pub use batch::{run_batch, BatchError, BatchOrchestrator, FileProcessor};
pub use geometry::GeometryClassifier;
pub use quality::QualityAnalyzer;
pub use reader::{FormatError, MemoryReader, TraceHandle, TraceReader};
