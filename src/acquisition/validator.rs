//! File Validator
//!
//! Lightweight structural pre-check run before any deep analysis. Missing
//! files, files too small to hold the file headers and files the reader
//! refuses to open are fatal for that file. Everything else is reported as
//! `issues` (block analysis) or `warnings` (advisory).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::reader::{FormatError, TraceHandle, TraceReader};

/// Binary-header scalars reported by the reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderInfo {
    pub trace_count: usize,
    pub sample_count: usize,
    pub sample_interval_us: u32,
    pub format_code: i16,
    /// sample_count x sample_interval, in milliseconds
    pub record_length_ms: f64,
}

impl HeaderInfo {
    pub fn from_handle(handle: &dyn TraceHandle) -> Self {
        let sample_count = handle.sample_count();
        let sample_interval_us = handle.sample_interval();
        Self {
            trace_count: handle.trace_count(),
            sample_count,
            sample_interval_us,
            format_code: handle.format_code(),
            record_length_ms: sample_count as f64 * f64::from(sample_interval_us) / 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub path: PathBuf,
    pub accessible: bool,
    pub size_reasonable: bool,
    /// The reader accepted the file structure
    pub structurally_valid: bool,
    pub file_size_bytes: u64,
    /// Irregularities that block downstream analysis
    pub issues: Vec<String>,
    /// Advisory irregularities
    pub warnings: Vec<String>,
    pub header_info: Option<HeaderInfo>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.structurally_valid && self.issues.is_empty()
    }
}

/// Fatal validation outcomes for a single file
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot stat {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File {} too small ({size} bytes, minimum {min} bytes for file headers)", path.display())]
    TooSmall { path: PathBuf, size: u64, min: u64 },

    #[error("Cannot open {}: {source}", path.display())]
    Unopenable {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
}

/// Structural pre-check over the reader contract
#[derive(Clone)]
pub struct FileValidator {
    reader: Arc<dyn TraceReader>,
    config: ValidationConfig,
}

impl FileValidator {
    pub fn new(reader: Arc<dyn TraceReader>, config: ValidationConfig) -> Self {
        Self { reader, config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn validate(&self, path: &Path) -> Result<ValidationReport, ValidationError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ValidationError::NotFound(path.to_path_buf())
            } else {
                ValidationError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        let size = metadata.len();
        if size < self.config.min_file_size_bytes {
            return Err(ValidationError::TooSmall {
                path: path.to_path_buf(),
                size,
                min: self.config.min_file_size_bytes,
            });
        }

        let handle = self
            .reader
            .open(path)
            .map_err(|source| ValidationError::Unopenable {
                path: path.to_path_buf(),
                source,
            })?;
        let info = HeaderInfo::from_handle(handle.as_ref());
        drop(handle);

        let (issues, warnings) = self.check_header(&info);
        debug!(
            path = %path.display(),
            traces = info.trace_count,
            issues = issues.len(),
            warnings = warnings.len(),
            "Validated"
        );

        Ok(ValidationReport {
            path: path.to_path_buf(),
            accessible: true,
            size_reasonable: true,
            structurally_valid: true,
            file_size_bytes: size,
            issues,
            warnings,
            header_info: Some(info),
        })
    }

    /// Range checks on the binary-header scalars. Returns (issues, warnings).
    pub fn check_header(&self, info: &HeaderInfo) -> (Vec<String>, Vec<String>) {
        let c = &self.config;
        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        if info.trace_count == 0 {
            issues.push("File declares zero traces".to_string());
        }

        let dt = info.sample_interval_us;
        if dt < c.min_sample_interval_us || dt > c.max_sample_interval_us {
            issues.push(format!(
                "Sample interval {dt} us outside [{}, {}]",
                c.min_sample_interval_us, c.max_sample_interval_us
            ));
        } else if dt < c.normal_interval_min_us || dt > c.normal_interval_max_us {
            warnings.push(format!(
                "Unusual sample interval {:.3} ms (typical {:.1}-{:.0} ms)",
                f64::from(dt) / 1000.0,
                f64::from(c.normal_interval_min_us) / 1000.0,
                f64::from(c.normal_interval_max_us) / 1000.0
            ));
        }

        let ns = info.sample_count;
        if ns == 0 || ns > c.max_sample_count {
            issues.push(format!(
                "Sample count {ns} outside [1, {}]",
                c.max_sample_count
            ));
        } else if ns > c.warn_sample_count {
            warnings.push(format!("Large sample count {ns} per trace"));
        }

        if !c.standard_format_codes.contains(&info.format_code) {
            warnings.push(format!("Non-standard data format code {}", info.format_code));
        }

        (issues, warnings)
    }
}
