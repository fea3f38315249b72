//! Trace reader contract
//!
//! The byte layout of a trace file is decoded by an external reader. This
//! module fixes the contract the rest of the crate consumes: a [`TraceReader`]
//! opens a path into a [`TraceHandle`], which exposes the binary-header
//! scalars plus per-trace header words and samples. Closing is `Drop`.

pub mod memory;

pub use memory::{MemoryReader, SyntheticSurvey};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Trace header words the classifier reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderField {
    Inline,
    Crossline,
    Cdp,
    FieldRecord,
    ShotPoint,
    SourceX,
    SourceY,
    ReceiverX,
    ReceiverY,
    Offset,
}

impl HeaderField {
    pub const ALL: [HeaderField; 10] = [
        Self::Inline,
        Self::Crossline,
        Self::Cdp,
        Self::FieldRecord,
        Self::ShotPoint,
        Self::SourceX,
        Self::SourceY,
        Self::ReceiverX,
        Self::ReceiverY,
        Self::Offset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Crossline => "crossline",
            Self::Cdp => "cdp",
            Self::FieldRecord => "field_record",
            Self::ShotPoint => "shot_point",
            Self::SourceX => "source_x",
            Self::SourceY => "source_y",
            Self::ReceiverX => "receiver_x",
            Self::ReceiverY => "receiver_y",
            Self::Offset => "offset",
        }
    }
}

/// The file is not a structurally valid trace file, or one of its traces
/// cannot be decoded.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid trace file {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Trace {index} out of range (file has {count} traces)")]
    TraceOutOfRange { index: usize, count: usize },

    #[error("Trace {index} unreadable: {reason}")]
    UnreadableTrace { index: usize, reason: String },
}

/// Opens trace files. Shared across worker threads.
pub trait TraceReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn TraceHandle>, FormatError>;
}

/// An open trace file. Dropping the handle closes it.
pub trait TraceHandle: Send {
    fn trace_count(&self) -> usize;

    /// Samples per trace
    fn sample_count(&self) -> usize;

    /// Sample interval in microseconds
    fn sample_interval(&self) -> u32;

    /// Data sample format code from the binary header
    fn format_code(&self) -> i16;

    fn header_field(&self, trace_index: usize, field: HeaderField) -> Result<f64, FormatError>;

    fn trace_samples(&self, trace_index: usize) -> Result<Vec<f32>, FormatError>;
}
