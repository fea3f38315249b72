//! Trace file acquisition
//!
//! Structural validation of candidate files and bounded sampling of trace
//! headers and amplitudes through the reader contract.

pub mod sampler;
pub mod validator;

pub use sampler::{sample_indices, HeaderSampler, TraceSample, TraceSampler};
pub use validator::{FileValidator, HeaderInfo, ValidationError, ValidationReport};
