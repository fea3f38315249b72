//! Survey QC Configuration - batch governance, classifier heuristics,
//! validator limits and QC sampling as operator-tunable TOML values
//!
//! Each struct implements `Default` with the values from `config::defaults`,
//! so a missing or empty config file changes nothing.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::*;
use crate::types::AnalysisType;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SEISQC_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "survey_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for classification, QC and batch runs.
///
/// Load with `SurveyConfig::load()` which searches:
/// 1. `$SEISQC_CONFIG` env var
/// 2. `./survey_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub quality: QualityConfig,
}

impl SurveyConfig {
    /// Load configuration using the standard search order, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_without_env();
        config.apply_env_overrides();
        config
    }

    fn load_without_env() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded survey config from SEISQC_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from SEISQC_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "SEISQC_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./survey_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded survey config from ./survey_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./survey_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No survey_config.toml found, using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Two-pass: unknown keys are reported as warnings first, then the
    /// document is deserialized and validated.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// `SEISQC_MAX_CONCURRENT_FILES` and `SEISQC_MAX_MEMORY_GB` take
    /// precedence over file values. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(n) = std::env::var("SEISQC_MAX_CONCURRENT_FILES")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|n| *n > 0)
        {
            info!(max_concurrent_files = n, "Override from SEISQC_MAX_CONCURRENT_FILES");
            self.batch.max_concurrent_files = n;
        }
        if let Some(gb) = std::env::var("SEISQC_MAX_MEMORY_GB")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|gb| gb.is_finite() && *gb > 0.0)
        {
            info!(max_memory_gb = gb, "Override from SEISQC_MAX_MEMORY_GB");
            self.batch.max_memory_gb = gb;
        }
    }

    /// Validate all values for internal consistency.
    ///
    /// Rules:
    /// - Concurrency, trace budgets and timeouts must be > 0
    /// - error_threshold must lie in (0, 1]
    /// - PCA areal threshold must sit below the linear threshold
    /// - Interval/sample-count windows must be ordered
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let b = &self.batch;
        if b.max_concurrent_files == 0 {
            errors.push("batch.max_concurrent_files must be > 0".to_string());
        }
        if !b.max_memory_gb.is_finite() || b.max_memory_gb <= 0.0 {
            errors.push(format!(
                "batch.max_memory_gb = {} must be a positive number",
                b.max_memory_gb
            ));
        }
        if b.timeout_seconds == 0 {
            errors.push("batch.timeout_seconds must be > 0".to_string());
        }
        if !(b.error_threshold > 0.0 && b.error_threshold <= 1.0) {
            errors.push(format!(
                "batch.error_threshold = {} must be in (0, 1]",
                b.error_threshold
            ));
        }
        if b.max_traces_per_file == 0 {
            errors.push("batch.max_traces_per_file must be > 0".to_string());
        }

        let c = &self.classifier;
        Self::check_fraction(c.pca_linear_threshold, "classifier.pca_linear_threshold", &mut errors);
        Self::check_fraction(c.pca_areal_threshold, "classifier.pca_areal_threshold", &mut errors);
        if c.pca_areal_threshold >= c.pca_linear_threshold {
            errors.push(format!(
                "classifier.pca_areal_threshold ({:.4}) must be below pca_linear_threshold ({:.4})",
                c.pca_areal_threshold, c.pca_linear_threshold
            ));
        }
        Self::check_fraction(
            c.prestack_distinct_offset_fraction,
            "classifier.prestack_distinct_offset_fraction",
            &mut errors,
        );
        Self::check_fraction(c.dominant_cdp_fraction, "classifier.dominant_cdp_fraction", &mut errors);
        if c.min_unique_for_dimension < 2 {
            errors.push("classifier.min_unique_for_dimension must be >= 2".to_string());
        }
        if c.max_header_samples == 0 {
            errors.push("classifier.max_header_samples must be > 0".to_string());
        }
        if c.very_large_sample_traces <= c.large_sample_traces {
            errors.push(format!(
                "classifier.very_large_sample_traces ({}) must be > large_sample_traces ({})",
                c.very_large_sample_traces, c.large_sample_traces
            ));
        }

        let v = &self.validation;
        if v.min_sample_interval_us > v.max_sample_interval_us {
            errors.push("validation.min_sample_interval_us must be <= max_sample_interval_us".to_string());
        }
        if v.normal_interval_min_us > v.normal_interval_max_us {
            errors.push("validation.normal_interval_min_us must be <= normal_interval_max_us".to_string());
        }
        if v.warn_sample_count > v.max_sample_count {
            errors.push("validation.warn_sample_count must be <= max_sample_count".to_string());
        }

        let q = &self.quality;
        if q.quick_trace_sample == 0 {
            errors.push("quality.quick_trace_sample must be > 0".to_string());
        }
        if q.amplitude_decimation == 0 {
            errors.push("quality.amplitude_decimation must be >= 1".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_fraction(value: f64, name: &str, errors: &mut Vec<String>) {
        // NaN comparisons silently pass, catch them explicitly
        if !value.is_finite() || value <= 0.0 || value >= 1.0 {
            errors.push(format!("{name} = {value} must be a finite fraction in (0, 1)"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Batch
// ============================================================================

/// Batch orchestration and governance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_concurrent_files: usize,
    pub max_memory_gb: f64,
    /// Per-task timeout
    pub timeout_seconds: u64,
    pub default_analysis_type: AnalysisType,
    pub max_traces_per_file: usize,
    /// Keep dispatching after the error threshold is exceeded
    pub continue_on_error: bool,
    /// failed/total ratio that halts further dispatch
    pub error_threshold: f64,
    pub max_retry_attempts: u32,
    pub progress_interval_secs: u64,
    pub memory_check_interval_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            max_memory_gb: DEFAULT_MAX_MEMORY_GB,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            default_analysis_type: AnalysisType::Quick,
            max_traces_per_file: DEFAULT_MAX_TRACES_PER_FILE,
            continue_on_error: false,
            error_threshold: DEFAULT_ERROR_THRESHOLD,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            progress_interval_secs: DEFAULT_PROGRESS_INTERVAL_SECS,
            memory_check_interval_secs: DEFAULT_MEMORY_CHECK_INTERVAL_SECS,
        }
    }
}

// ============================================================================
// Geometry Classifier
// ============================================================================

/// Heuristic constants of the classification cascade.
///
/// Hand-tuned against field data; calibrate per acquisition contractor if needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub min_unique_for_dimension: usize,
    pub max_cdps_for_shot_gather: usize,
    pub pca_linear_threshold: f64,
    pub pca_areal_threshold: f64,
    pub prestack_distinct_offset_fraction: f64,
    pub dominant_cdp_fraction: f64,
    pub min_distinct_offsets_for_gather: usize,
    pub large_sample_traces: usize,
    pub very_large_sample_traces: usize,
    pub max_header_samples: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_unique_for_dimension: MIN_UNIQUE_FOR_DIMENSION,
            max_cdps_for_shot_gather: MAX_CDPS_FOR_SHOT_GATHER,
            pca_linear_threshold: PCA_LINEAR_THRESHOLD,
            pca_areal_threshold: PCA_AREAL_THRESHOLD,
            prestack_distinct_offset_fraction: PRESTACK_DISTINCT_OFFSET_FRACTION,
            dominant_cdp_fraction: DOMINANT_CDP_FRACTION,
            min_distinct_offsets_for_gather: MIN_DISTINCT_OFFSETS_FOR_GATHER,
            large_sample_traces: LARGE_SAMPLE_TRACES,
            very_large_sample_traces: VERY_LARGE_SAMPLE_TRACES,
            max_header_samples: DEFAULT_MAX_HEADER_SAMPLES,
        }
    }
}

// ============================================================================
// File Validator
// ============================================================================

/// Structural limits applied before any deep analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub min_file_size_bytes: u64,
    pub min_sample_interval_us: u32,
    pub max_sample_interval_us: u32,
    pub normal_interval_min_us: u32,
    pub normal_interval_max_us: u32,
    pub max_sample_count: usize,
    pub warn_sample_count: usize,
    pub standard_format_codes: Vec<i16>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_file_size_bytes: MIN_FILE_SIZE_BYTES,
            min_sample_interval_us: MIN_SAMPLE_INTERVAL_US,
            max_sample_interval_us: MAX_SAMPLE_INTERVAL_US,
            normal_interval_min_us: NORMAL_SAMPLE_INTERVAL_MIN_US,
            normal_interval_max_us: NORMAL_SAMPLE_INTERVAL_MAX_US,
            max_sample_count: MAX_SAMPLE_COUNT,
            warn_sample_count: WARN_SAMPLE_COUNT,
            standard_format_codes: STANDARD_FORMAT_CODES.to_vec(),
        }
    }
}

// ============================================================================
// Quality Analyzer
// ============================================================================

/// Amplitude sampling for QC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Trace budget for `quick` analyses
    pub quick_trace_sample: usize,
    /// Keep every n-th amplitude in the statistics working set (1 = all)
    pub amplitude_decimation: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            quick_trace_sample: QUICK_TRACE_SAMPLE,
            amplitude_decimation: DEFAULT_AMPLITUDE_DECIMATION,
        }
    }
}
