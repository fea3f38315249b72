//! Header and trace samplers
//!
//! Both samplers read an evenly spaced, bounded subset of traces through the
//! reader contract. Unreadable traces are skipped and counted, never fatal.

use tracing::debug;

use crate::reader::{FormatError, HeaderField, TraceHandle};
use crate::types::{TraceHeaderRecord, TraceHeaderSample};

/// Evenly spaced trace indices: stride `max(1, total / max)`, at most `max`
/// indices. Returns (indices, stride).
pub fn sample_indices(total: usize, max: usize) -> (Vec<usize>, usize) {
    if total == 0 || max == 0 {
        return (Vec::new(), 1);
    }
    let stride = (total / max).max(1);
    let indices = (0..total).step_by(stride).take(max).collect();
    (indices, stride)
}

// ============================================================================
// Header Sampler
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct HeaderSampler {
    max_samples: usize,
}

impl HeaderSampler {
    pub fn new(max_samples: usize) -> Self {
        Self { max_samples }
    }

    pub fn sample(&self, handle: &dyn TraceHandle) -> TraceHeaderSample {
        let total = handle.trace_count();
        let (indices, stride) = sample_indices(total, self.max_samples);
        let mut records = Vec::with_capacity(indices.len());
        let mut skipped = 0;

        for idx in indices {
            match read_record(handle, idx) {
                Ok(record) => records.push(record),
                Err(e) => {
                    debug!(trace = idx, error = %e, "Skipping unreadable trace header");
                    skipped += 1;
                }
            }
        }

        TraceHeaderSample {
            records,
            stride,
            total_traces: total,
            skipped,
        }
    }
}

fn read_record(handle: &dyn TraceHandle, idx: usize) -> Result<TraceHeaderRecord, FormatError> {
    let int = |field: HeaderField| -> Result<i64, FormatError> {
        let v = handle.header_field(idx, field)?;
        if v.is_finite() {
            Ok(v.round() as i64)
        } else {
            Err(FormatError::UnreadableTrace {
                index: idx,
                reason: format!("non-finite {} header", field.as_str()),
            })
        }
    };
    let coord = |field: HeaderField| -> Result<f64, FormatError> {
        let v = handle.header_field(idx, field)?;
        if v.is_finite() {
            Ok(v)
        } else {
            Err(FormatError::UnreadableTrace {
                index: idx,
                reason: format!("non-finite {} header", field.as_str()),
            })
        }
    };

    Ok(TraceHeaderRecord {
        trace_index: idx,
        inline: int(HeaderField::Inline)?,
        crossline: int(HeaderField::Crossline)?,
        cdp: int(HeaderField::Cdp)?,
        field_record: int(HeaderField::FieldRecord)?,
        shot_point: int(HeaderField::ShotPoint)?,
        source_x: coord(HeaderField::SourceX)?,
        source_y: coord(HeaderField::SourceY)?,
        receiver_x: coord(HeaderField::ReceiverX)?,
        receiver_y: coord(HeaderField::ReceiverY)?,
        offset: int(HeaderField::Offset)?,
    })
}

// ============================================================================
// Trace Sampler
// ============================================================================

/// Amplitude working set drawn from a bounded trace sample
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSample {
    /// Every `decimation`-th value of the flattened sample, non-finite included
    pub values: Vec<f64>,
    /// Values read before decimation
    pub total_values: usize,
    /// Exact zeros over the full sample
    pub zero_count: usize,
    pub nan_count: usize,
    pub inf_count: usize,
    pub traces_sampled: usize,
    pub traces_skipped: usize,
    pub total_traces: usize,
}

impl TraceSample {
    pub fn zero_percentage(&self) -> f64 {
        if self.total_values == 0 {
            0.0
        } else {
            self.zero_count as f64 / self.total_values as f64 * 100.0
        }
    }

    /// Share of the file's traces that were read
    pub fn sampled_fraction(&self) -> f64 {
        if self.total_traces == 0 {
            0.0
        } else {
            self.traces_sampled as f64 / self.total_traces as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TraceSampler {
    max_traces: usize,
    decimation: usize,
}

impl TraceSampler {
    pub fn new(max_traces: usize, decimation: usize) -> Self {
        Self {
            max_traces,
            decimation: decimation.max(1),
        }
    }

    pub fn sample(&self, handle: &dyn TraceHandle) -> TraceSample {
        let total = handle.trace_count();
        let (indices, _) = sample_indices(total, self.max_traces);
        let mut out = TraceSample {
            total_traces: total,
            ..Default::default()
        };

        for idx in indices {
            let samples = match handle.trace_samples(idx) {
                Ok(s) => s,
                Err(e) => {
                    debug!(trace = idx, error = %e, "Skipping unreadable trace");
                    out.traces_skipped += 1;
                    continue;
                }
            };
            out.traces_sampled += 1;

            for &a in &samples {
                if a.is_nan() {
                    out.nan_count += 1;
                } else if a.is_infinite() {
                    out.inf_count += 1;
                } else if a == 0.0 {
                    out.zero_count += 1;
                }
                if out.total_values % self.decimation == 0 {
                    out.values.push(f64::from(a));
                }
                out.total_values += 1;
            }
        }

        out
    }
}
