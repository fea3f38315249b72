//! System-wide default constants.
//!
//! Grouped by subsystem. Every value here is the built-in default of a
//! `SurveyConfig` field unless noted otherwise.

// ============================================================================
// Batch
// ============================================================================

/// Upper bound on simultaneously running file tasks.
pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 4;

/// Process memory ceiling (GiB).
pub const DEFAULT_MAX_MEMORY_GB: f64 = 8.0;

/// Per-task timeout (seconds). One hour covers full-sample QC of very large files.
pub const DEFAULT_TIMEOUT_SECS: u64 = 3_600;

/// Failed/total ratio above which dispatch halts.
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.5;

/// Traces sampled per file for amplitude QC.
pub const DEFAULT_MAX_TRACES_PER_FILE: usize = 100;

/// Resubmissions allowed per file after the first failure.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 0;

/// Minimum interval between progress reports (seconds).
pub const DEFAULT_PROGRESS_INTERVAL_SECS: u64 = 5;

/// Interval between process memory samples (seconds).
pub const DEFAULT_MEMORY_CHECK_INTERVAL_SECS: u64 = 10;

/// Fraction of the memory ceiling above which a reclamation hint fires.
pub const MEMORY_RECLAIM_FRACTION: f64 = 0.8;

/// Per-task timeouts a submitted task may wait for a free worker before it
/// is failed as stalled.
pub const STALLED_QUEUE_TIMEOUT_FACTOR: u32 = 4;

/// Upper bound on how long the result collector blocks before re-checking
/// timeouts, progress and memory (milliseconds).
pub const RESULT_POLL_INTERVAL_MS: u64 = 250;

// ============================================================================
// Validation
// ============================================================================

/// 3200-byte textual header + 400-byte binary header.
pub const MIN_FILE_SIZE_BYTES: u64 = 3_600;

/// Hard sample-interval bounds (microseconds).
pub const MIN_SAMPLE_INTERVAL_US: u32 = 1;
pub const MAX_SAMPLE_INTERVAL_US: u32 = 100_000;

/// Typical acquisition window, 0.5 ms to 20 ms (microseconds).
pub const NORMAL_SAMPLE_INTERVAL_MIN_US: u32 = 500;
pub const NORMAL_SAMPLE_INTERVAL_MAX_US: u32 = 20_000;

/// Hard upper bound on samples per trace.
pub const MAX_SAMPLE_COUNT: usize = 50_000;

/// Sample counts above this draw a warning.
pub const WARN_SAMPLE_COUNT: usize = 10_000;

/// IBM float, int32, int16, fixed-point w/ gain, int8.
pub const STANDARD_FORMAT_CODES: &[i16] = &[1, 2, 3, 5, 8];

// ============================================================================
// Geometry classifier
// ============================================================================

/// Distinct values needed before a header family counts as varying.
pub const MIN_UNIQUE_FOR_DIMENSION: usize = 3;

/// Shot gathers cover only a handful of CDPs per sampled record set.
pub const MAX_CDPS_FOR_SHOT_GATHER: usize = 10;

/// PCA major-variance ratio above which coordinates are collinear.
pub const PCA_LINEAR_THRESHOLD: f64 = 0.9998;

/// PCA major-variance ratio below which coordinates are areal.
pub const PCA_AREAL_THRESHOLD: f64 = 0.999;

/// Share of distinct non-zero offsets above which data is prestack.
pub const PRESTACK_DISTINCT_OFFSET_FRACTION: f64 = 0.10;

/// Share of traces on one CDP that marks a CDP gather.
pub const DOMINANT_CDP_FRACTION: f64 = 0.5;

/// Distinct offsets required inside a CDP gather.
pub const MIN_DISTINCT_OFFSETS_FOR_GATHER: usize = 3;

/// Sample sizes that earn one, then two, confidence steps.
pub const LARGE_SAMPLE_TRACES: usize = 100;
pub const VERY_LARGE_SAMPLE_TRACES: usize = 1_000;

/// Headers read per file for classification.
pub const DEFAULT_MAX_HEADER_SAMPLES: usize = 2_000;

// ============================================================================
// Quality analyzer
// ============================================================================

/// Guards every log and division in amplitude statistics.
pub const EPSILON: f64 = 1e-10;

/// Trace sample for `quick` analyses.
pub const QUICK_TRACE_SAMPLE: usize = 20;

/// Keep every n-th amplitude in the statistics working set.
pub const DEFAULT_AMPLITUDE_DECIMATION: usize = 2;

/// Share of factors that must be good-or-better for an overall "good".
pub const GOOD_FACTOR_FRACTION: f64 = 0.7;
