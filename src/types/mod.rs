//! Shared data structures for seismic survey QC
//!
//! - `survey`: survey type / sorting / stack / confidence enums
//! - `geometry`: TraceHeaderSample, GeometryStats, ClassificationResult
//! - `quality`: AmplitudeStats, QualityThresholdProfile, QualityResult
//! - `batch`: FileTask, FileReport, SurveySummary

mod survey;
mod geometry;
mod quality;
mod batch;

pub use survey::*;
pub use geometry::*;
pub use quality::*;
pub use batch::*;
