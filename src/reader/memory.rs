//! In-memory trace reader
//!
//! `MemoryReader` maps paths to [`SyntheticSurvey`]s so that validation,
//! classification, QC and batch runs can be exercised without a binary
//! decoder. The builders lay out the acquisition geometries the classifier
//! distinguishes: a 3D inline/crossline grid, a 2D CDP line, raw shot
//! gathers and a single CDP gather.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use super::{FormatError, HeaderField, TraceHandle, TraceReader};
use crate::types::TraceHeaderRecord;

/// Amplitude generator: `(trace_index, sample_index) -> amplitude`
pub type AmplitudeFn = Arc<dyn Fn(usize, usize) -> f32 + Send + Sync>;

const BASE_X: f64 = 450_000.0;
const BASE_Y: f64 = 6_780_000.0;
const BIN_SIZE: f64 = 25.0;

/// Sparse reflectivity with a weak sinusoidal background. Deterministic.
fn default_waveform(trace: usize, sample: usize) -> f32 {
    let background = ((sample as f32) * 0.13 + (trace as f32) * 0.7).sin() * 4.0;
    if sample % 151 == 17 {
        let polarity = if (sample / 151 + trace) % 2 == 0 { 1.0 } else { -1.0 };
        background + polarity * 800.0
    } else {
        background
    }
}

/// Header and amplitude content of one synthetic file
#[derive(Clone)]
pub struct SyntheticSurvey {
    headers: Vec<TraceHeaderRecord>,
    sample_count: usize,
    sample_interval_us: u32,
    format_code: i16,
    amplitudes: AmplitudeFn,
    unreadable: BTreeSet<usize>,
}

impl std::fmt::Debug for SyntheticSurvey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntheticSurvey")
            .field("traces", &self.headers.len())
            .field("sample_count", &self.sample_count)
            .field("sample_interval_us", &self.sample_interval_us)
            .field("format_code", &self.format_code)
            .field("unreadable", &self.unreadable.len())
            .finish_non_exhaustive()
    }
}

impl SyntheticSurvey {
    /// Survey with explicit headers, 4 ms sampling and IBM float format
    pub fn from_headers(headers: Vec<TraceHeaderRecord>, sample_count: usize) -> Self {
        Self {
            headers,
            sample_count,
            sample_interval_us: 4_000,
            format_code: 1,
            amplitudes: Arc::new(default_waveform),
            unreadable: BTreeSet::new(),
        }
    }

    /// Poststack 3D volume: `inlines x crosslines` bins on a square grid
    pub fn grid_3d(inlines: usize, crosslines: usize, sample_count: usize) -> Self {
        let mut headers = Vec::with_capacity(inlines * crosslines);
        for il in 0..inlines {
            for xl in 0..crosslines {
                let x = BASE_X + xl as f64 * BIN_SIZE;
                let y = BASE_Y + il as f64 * BIN_SIZE;
                headers.push(TraceHeaderRecord {
                    trace_index: headers.len(),
                    inline: 1_000 + il as i64,
                    crossline: 2_000 + xl as i64,
                    cdp: (il * crosslines + xl + 1) as i64,
                    source_x: x,
                    source_y: y,
                    receiver_x: x,
                    receiver_y: y,
                    ..Default::default()
                });
            }
        }
        Self::from_headers(headers, sample_count)
    }

    /// Poststack 2D line with one trace per CDP along a straight east-west line
    pub fn line_2d(cdps: usize, sample_count: usize) -> Self {
        let headers = (0..cdps)
            .map(|i| {
                let x = BASE_X + i as f64 * (BIN_SIZE / 2.0);
                TraceHeaderRecord {
                    trace_index: i,
                    cdp: 100 + i as i64,
                    shot_point: 100 + (i / 2) as i64,
                    source_x: x,
                    source_y: BASE_Y,
                    receiver_x: x,
                    receiver_y: BASE_Y,
                    ..Default::default()
                }
            })
            .collect();
        Self::from_headers(headers, sample_count)
    }

    /// Raw field records shot along a straight line. The CDP word is left
    /// unset, as is usual for field data.
    pub fn shot_gathers(shots: usize, channels: usize, sample_count: usize) -> Self {
        let mut headers = Vec::with_capacity(shots * channels);
        for shot in 0..shots {
            let sx = BASE_X + shot as f64 * 50.0;
            for ch in 0..channels {
                let offset = (ch as i64 + 1) * 50;
                headers.push(TraceHeaderRecord {
                    trace_index: headers.len(),
                    field_record: 1 + shot as i64,
                    shot_point: 1 + shot as i64,
                    source_x: sx,
                    source_y: BASE_Y,
                    receiver_x: sx + offset as f64,
                    receiver_y: BASE_Y,
                    offset,
                    ..Default::default()
                });
            }
        }
        Self::from_headers(headers, sample_count)
    }

    /// One CDP gather of `fold` traces with symmetric source/receiver pairs
    pub fn cdp_gather(cdp: i64, fold: usize, sample_count: usize) -> Self {
        let headers = (0..fold)
            .map(|i| {
                let half = (i as f64 + 1.0) * 25.0;
                TraceHeaderRecord {
                    trace_index: i,
                    cdp,
                    source_x: BASE_X - half,
                    source_y: BASE_Y,
                    receiver_x: BASE_X + half,
                    receiver_y: BASE_Y,
                    offset: (2.0 * half) as i64,
                    ..Default::default()
                }
            })
            .collect();
        Self::from_headers(headers, sample_count)
    }

    pub fn with_amplitudes(
        mut self,
        f: impl Fn(usize, usize) -> f32 + Send + Sync + 'static,
    ) -> Self {
        self.amplitudes = Arc::new(f);
        self
    }

    pub fn with_sample_interval(mut self, interval_us: u32) -> Self {
        self.sample_interval_us = interval_us;
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    pub fn with_format_code(mut self, code: i16) -> Self {
        self.format_code = code;
        self
    }

    /// Mark traces whose header and samples fail to decode
    pub fn with_unreadable_traces(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.unreadable.extend(indices);
        self
    }

    pub fn trace_count(&self) -> usize {
        self.headers.len()
    }

    fn check_trace(&self, index: usize) -> Result<&TraceHeaderRecord, FormatError> {
        let record = self.headers.get(index).ok_or(FormatError::TraceOutOfRange {
            index,
            count: self.headers.len(),
        })?;
        if self.unreadable.contains(&index) {
            return Err(FormatError::UnreadableTrace {
                index,
                reason: "corrupt trace header".to_string(),
            });
        }
        Ok(record)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Survey(Arc<SyntheticSurvey>),
    Corrupt(String),
}

/// Path-keyed in-memory reader
#[derive(Debug, Default)]
pub struct MemoryReader {
    entries: RwLock<HashMap<PathBuf, Entry>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, survey: SyntheticSurvey) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), Entry::Survey(Arc::new(survey)));
    }

    /// Register a path that fails to open with a `FormatError`
    pub fn insert_corrupt(&self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), Entry::Corrupt(reason.into()));
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TraceReader for MemoryReader {
    fn open(&self, path: &Path) -> Result<Box<dyn TraceHandle>, FormatError> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned();
        match entry {
            Some(Entry::Survey(survey)) => Ok(Box::new(MemoryHandle { survey })),
            Some(Entry::Corrupt(reason)) => Err(FormatError::Invalid {
                path: path.to_path_buf(),
                reason,
            }),
            None => Err(FormatError::Invalid {
                path: path.to_path_buf(),
                reason: "no trace data registered for path".to_string(),
            }),
        }
    }
}

struct MemoryHandle {
    survey: Arc<SyntheticSurvey>,
}

impl TraceHandle for MemoryHandle {
    fn trace_count(&self) -> usize {
        self.survey.headers.len()
    }

    fn sample_count(&self) -> usize {
        self.survey.sample_count
    }

    fn sample_interval(&self) -> u32 {
        self.survey.sample_interval_us
    }

    fn format_code(&self) -> i16 {
        self.survey.format_code
    }

    fn header_field(&self, trace_index: usize, field: HeaderField) -> Result<f64, FormatError> {
        let r = self.survey.check_trace(trace_index)?;
        Ok(match field {
            HeaderField::Inline => r.inline as f64,
            HeaderField::Crossline => r.crossline as f64,
            HeaderField::Cdp => r.cdp as f64,
            HeaderField::FieldRecord => r.field_record as f64,
            HeaderField::ShotPoint => r.shot_point as f64,
            HeaderField::SourceX => r.source_x,
            HeaderField::SourceY => r.source_y,
            HeaderField::ReceiverX => r.receiver_x,
            HeaderField::ReceiverY => r.receiver_y,
            HeaderField::Offset => r.offset as f64,
        })
    }

    fn trace_samples(&self, trace_index: usize) -> Result<Vec<f32>, FormatError> {
        self.survey.check_trace(trace_index)?;
        let f = &self.survey.amplitudes;
        Ok((0..self.survey.sample_count)
            .map(|s| f(trace_index, s))
            .collect())
    }
}
