//! Batch Orchestrator
//!
//! Runs one operation over every file matching a pattern:
//!
//! ```text
//! discover -> pre-validate (parallel) -> dispatch (bounded pool) -> summarize
//! ```
//!
//! Workers never touch shared counters. Each submitted task sends a
//! `Started` message when a worker picks it up and exactly one `Finished`
//! message afterwards; the orchestrator thread is the only owner of task
//! state. `recv_timeout` drives per-task timeouts, progress ticks and memory
//! checks from that same thread.
//!
//! The per-task timeout counts from `Started`. A task queued behind a worker
//! held by a timed-out task waits for that worker; it is failed as `Stalled`
//! only after `STALLED_QUEUE_TIMEOUT_FACTOR` timeouts without starting.
//!
//! Governance:
//! - error-rate breaker: once failed/valid exceeds `error_threshold` the breach
//!   is recorded, and unless `continue_on_error` is set every not-yet-started
//!   task is cancelled. In-flight tasks are never preempted.
//! - memory: above 80% of `max_memory_gb` the processor is asked to reclaim.
//! - retries: a failed task is resubmitted as a fresh pending task while
//!   `attempt < max_retry_attempts`.

pub mod discovery;
pub mod monitor;
pub mod progress;
pub mod summary;
pub mod task;

pub use discovery::{discover, is_seismic_file, DiscoveryError, SEISMIC_EXTENSIONS};
pub use monitor::{MemoryMonitor, MemoryProbe, MemoryReading, ProcessMemoryProbe};
pub use progress::{ProgressCallback, ProgressSnapshot, ProgressTracker};
pub use summary::RunContext;
pub use task::TaskStateError;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::acquisition::FileValidator;
use crate::analysis::SurveyAnalyzer;
use crate::config::defaults::{RESULT_POLL_INTERVAL_MS, STALLED_QUEUE_TIMEOUT_FACTOR};
use crate::config::{BatchConfig, SurveyConfig};
use crate::reader::TraceReader;
use crate::types::{
    AnalysisType, ExcludedFile, FileReport, FileTask, SurveySummary, TaskError, TaskErrorKind,
    ThresholdBreach,
};

/// Per-file operation executed inside a worker
pub trait FileProcessor: Send + Sync {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport>;

    /// Memory pressure hint. Release caches; must not block for long.
    fn reclaim(&self) {}
}

/// A pre-validated file ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
        }
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("File discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Sent by a submitted closure
enum WorkerMessage {
    Started {
        task_id: u64,
        at: Instant,
    },
    Finished {
        task_id: u64,
        outcome: Result<FileReport, TaskError>,
        elapsed: Duration,
    },
}

struct InFlight {
    slot: usize,
    submitted: Instant,
    /// Set once a worker has picked the closure up
    started: Option<Instant>,
}

impl InFlight {
    /// Execution deadline once started, queue deadline before that
    fn deadline(&self, timeout: Duration, queue_timeout: Duration) -> Instant {
        match self.started {
            Some(at) => at + timeout,
            None => self.submitted + queue_timeout,
        }
    }
}

/// Mutable state of a single run, owned by the orchestrator thread
struct RunState {
    /// One task per valid file; a retry replaces the slot's task
    slots: Vec<FileTask>,
    pending: VecDeque<usize>,
    running: HashMap<u64, InFlight>,
    /// Closures handed to the pool that have not reported back yet,
    /// including ones already written off as timed out
    occupied: usize,
    next_id: u64,
    succeeded: usize,
    failed: usize,
    cancelled: usize,
    retried: usize,
    halted: bool,
    breach: Option<ThresholdBreach>,
}

impl RunState {
    fn new(entries: Vec<FileEntry>, operation: AnalysisType) -> Self {
        let slots: Vec<FileTask> = entries
            .into_iter()
            .enumerate()
            .map(|(i, e)| FileTask::new(i as u64, e.path, operation, e.size_bytes))
            .collect();
        let total = slots.len();
        Self {
            slots,
            pending: (0..total).collect(),
            running: HashMap::new(),
            occupied: 0,
            next_id: total as u64,
            succeeded: 0,
            failed: 0,
            cancelled: 0,
            retried: 0,
            halted: false,
            breach: None,
        }
    }

    fn total(&self) -> usize {
        self.slots.len()
    }

    fn is_done(&self) -> bool {
        self.running.is_empty() && (self.pending.is_empty() || self.halted)
    }

    fn snapshot(&self, elapsed: Duration) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.succeeded + self.failed + self.cancelled,
            succeeded: self.succeeded,
            failed: self.failed,
            running: self.running.len(),
            pending: self.pending.len(),
            total: self.total(),
            elapsed,
        }
    }

    fn record_success(&mut self, slot: usize, report: FileReport, elapsed: Duration) {
        let task = &mut self.slots[slot];
        match task.succeed(report, elapsed) {
            Ok(()) => self.succeeded += 1,
            Err(e) => warn!(error = %e, "Dropping result for task in unexpected state"),
        }
    }

    fn record_failure(
        &mut self,
        slot: usize,
        error: TaskError,
        elapsed: Duration,
        config: &BatchConfig,
    ) {
        let task = &mut self.slots[slot];
        if let Err(e) = task.fail(error.clone(), elapsed) {
            warn!(error = %e, "Dropping failure for task in unexpected state");
            return;
        }
        warn!(
            path = %task.path.display(),
            attempt = task.attempt,
            kind = ?error.kind,
            error = %error.message,
            "File task failed"
        );

        if task.attempt < config.max_retry_attempts && !self.halted {
            match task.retry(self.next_id) {
                Ok(next) => {
                    debug!(path = %next.path.display(), attempt = next.attempt, "Resubmitting file");
                    self.next_id += 1;
                    self.slots[slot] = next;
                    self.pending.push_back(slot);
                    self.retried += 1;
                    return;
                }
                Err(e) => warn!(error = %e, "Retry refused"),
            }
        }

        self.failed += 1;
        let total = self.total();
        let ratio = self.failed as f64 / total as f64;
        if ratio > config.error_threshold && self.breach.is_none() {
            self.breach = Some(ThresholdBreach {
                failed: self.failed,
                total,
                ratio,
                threshold: config.error_threshold,
            });
            if config.continue_on_error {
                warn!(
                    failed = self.failed,
                    total,
                    ratio,
                    threshold = config.error_threshold,
                    "Error threshold exceeded, continuing (continue_on_error)"
                );
            } else {
                warn!(
                    failed = self.failed,
                    total,
                    ratio,
                    threshold = config.error_threshold,
                    cancelled = self.pending.len(),
                    "Error threshold exceeded, halting dispatch"
                );
                self.halt();
            }
        }
    }

    fn halt(&mut self) {
        self.halted = true;
        let reason = "Cancelled: batch error threshold exceeded";
        while let Some(slot) = self.pending.pop_front() {
            match self.slots[slot].cancel(reason) {
                Ok(()) => self.cancelled += 1,
                Err(e) => warn!(error = %e, "Cannot cancel task"),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}

/// Bounded-concurrency batch runner
pub struct BatchOrchestrator {
    processor: Arc<dyn FileProcessor>,
    validator: FileValidator,
    config: BatchConfig,
    progress_callback: Option<ProgressCallback>,
    memory_monitor: MemoryMonitor,
}

impl BatchOrchestrator {
    pub fn new(processor: Arc<dyn FileProcessor>, validator: FileValidator, config: BatchConfig) -> Self {
        let memory_monitor = MemoryMonitor::new(config.max_memory_gb);
        Self {
            processor,
            validator,
            config,
            progress_callback: None,
            memory_monitor,
        }
    }

    /// Orchestrator running a `SurveyAnalyzer` over `reader`
    pub fn for_reader(reader: Arc<dyn TraceReader>, config: &SurveyConfig) -> Self {
        let analyzer = SurveyAnalyzer::new(Arc::clone(&reader), config);
        let validator = analyzer.validator().clone();
        Self::new(Arc::new(analyzer), validator, config.batch.clone())
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.memory_monitor = MemoryMonitor::with_probe(probe, self.config.max_memory_gb);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Discover, pre-validate and process every file matching `pattern`.
    /// `operation` defaults to `batch.default_analysis_type`.
    pub fn run(
        &mut self,
        pattern: &str,
        operation: Option<AnalysisType>,
    ) -> Result<SurveySummary, BatchError> {
        let operation = operation.unwrap_or(self.config.default_analysis_type);
        let started_at = Utc::now();
        let clock = Instant::now();

        let candidates = discover(pattern)?;
        info!(pattern, candidates = candidates.len(), operation = %operation, "Starting batch");

        let (entries, excluded) = self.prevalidate(&candidates);
        if entries.is_empty() {
            let mut issues: Vec<String> = excluded
                .iter()
                .flat_map(|e| {
                    e.reasons
                        .iter()
                        .map(move |r| format!("{}: {r}", e.path.display()))
                })
                .collect();
            if candidates.is_empty() {
                issues.push(format!("No seismic files match '{pattern}'"));
            }
            warn!(pattern, excluded = excluded.len(), "No valid files to process");
            let ctx = RunContext {
                pattern: pattern.to_string(),
                analysis_type: operation,
                started_at,
                finished_at: Utc::now(),
                wall_time: clock.elapsed(),
                total_files: candidates.len(),
                excluded_files: excluded,
                halted: false,
                threshold_breach: None,
            };
            return Ok(SurveySummary::no_valid_files(ctx, issues));
        }

        self.execute(pattern, candidates.len(), entries, excluded, operation, started_at, clock)
    }

    /// Process already validated entries. `label` is reported as the pattern.
    pub fn run_entries(
        &mut self,
        label: &str,
        entries: Vec<FileEntry>,
        operation: AnalysisType,
    ) -> Result<SurveySummary, BatchError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        if entries.is_empty() {
            let ctx = RunContext {
                pattern: label.to_string(),
                analysis_type: operation,
                started_at,
                finished_at: Utc::now(),
                wall_time: clock.elapsed(),
                total_files: 0,
                excluded_files: Vec::new(),
                halted: false,
                threshold_breach: None,
            };
            return Ok(SurveySummary::no_valid_files(
                ctx,
                vec!["No files supplied".to_string()],
            ));
        }
        let total = entries.len();
        self.execute(label, total, entries, Vec::new(), operation, started_at, clock)
    }

    fn prevalidate(&self, candidates: &[PathBuf]) -> (Vec<FileEntry>, Vec<ExcludedFile>) {
        let validator = &self.validator;
        let outcomes: Vec<_> = candidates
            .par_iter()
            .map(|path| (path, validator.validate(path)))
            .collect();

        let mut entries = Vec::new();
        let mut excluded = Vec::new();
        for (path, outcome) in outcomes {
            match outcome {
                Ok(report) if report.is_valid() => {
                    for w in &report.warnings {
                        debug!(path = %path.display(), warning = %w, "Validation warning");
                    }
                    entries.push(FileEntry::new(path.clone(), report.file_size_bytes));
                }
                Ok(report) => {
                    let reasons = if report.issues.is_empty() {
                        vec!["Structurally invalid".to_string()]
                    } else {
                        report.issues
                    };
                    info!(path = %path.display(), reasons = %reasons.join("; "), "Excluded at validation");
                    excluded.push(ExcludedFile {
                        path: path.clone(),
                        reasons,
                    });
                }
                Err(e) => {
                    info!(path = %path.display(), error = %e, "Excluded at validation");
                    excluded.push(ExcludedFile {
                        path: path.clone(),
                        reasons: vec![e.to_string()],
                    });
                }
            }
        }
        (entries, excluded)
    }

    fn submit(
        &self,
        pool: &ThreadPool,
        tx: &Sender<WorkerMessage>,
        task_id: u64,
        path: PathBuf,
        operation: AnalysisType,
    ) {
        let processor = Arc::clone(&self.processor);
        let tx = tx.clone();
        pool.spawn(move || {
            let started = Instant::now();
            let _ = tx.send(WorkerMessage::Started {
                task_id,
                at: started,
            });
            let outcome = match catch_unwind(AssertUnwindSafe(|| processor.process(&path, operation))) {
                Ok(Ok(report)) => Ok(report),
                Ok(Err(e)) => Err(TaskError {
                    kind: TaskErrorKind::Operation,
                    message: format!("{e:#}"),
                }),
                Err(payload) => Err(TaskError {
                    kind: TaskErrorKind::Panicked,
                    message: panic_message(payload.as_ref()),
                }),
            };
            // Receiver is gone once the run finished; a late result has nowhere to go
            let _ = tx.send(WorkerMessage::Finished {
                task_id,
                outcome,
                elapsed: started.elapsed(),
            });
        });
    }

    #[allow(clippy::too_many_arguments)]
    fn execute(
        &mut self,
        pattern: &str,
        total_files: usize,
        entries: Vec<FileEntry>,
        excluded: Vec<ExcludedFile>,
        operation: AnalysisType,
        started_at: DateTime<Utc>,
        clock: Instant,
    ) -> Result<SurveySummary, BatchError> {
        let workers = self.config.max_concurrent_files.min(entries.len()).max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("seisqc-worker-{i}"))
            .build()?;
        let timeout = Duration::from_secs(self.config.timeout_seconds);
        let queue_timeout = timeout.saturating_mul(STALLED_QUEUE_TIMEOUT_FACTOR);
        let poll = Duration::from_millis(RESULT_POLL_INTERVAL_MS);
        let memory_interval = Duration::from_secs(self.config.memory_check_interval_secs);
        let mut tracker = ProgressTracker::new(
            Duration::from_secs(self.config.progress_interval_secs),
            self.progress_callback.take(),
        );
        let mut last_memory_check = Instant::now();

        let (tx, rx) = mpsc::channel::<WorkerMessage>();
        let mut state = RunState::new(entries, operation);
        info!(files = state.total(), workers, "Dispatching batch");

        loop {
            // A free worker exists, or nothing is tracked as running and the
            // pool is held by timed-out tasks. Either way running <= workers.
            while !state.halted
                && state.running.len() < workers
                && (state.occupied < workers || state.running.is_empty())
            {
                let Some(slot) = state.pending.pop_front() else {
                    break;
                };
                let task = &mut state.slots[slot];
                if let Err(e) = task.start() {
                    warn!(error = %e, "Skipping task that cannot start");
                    continue;
                }
                let task_id = task.id;
                let path = task.path.clone();
                self.submit(&pool, &tx, task_id, path, operation);
                state.running.insert(
                    task_id,
                    InFlight {
                        slot,
                        submitted: Instant::now(),
                        started: None,
                    },
                );
                state.occupied += 1;
            }

            if state.is_done() {
                break;
            }

            let now = Instant::now();
            let wait = state
                .running
                .values()
                .map(|r| r.deadline(timeout, queue_timeout).saturating_duration_since(now))
                .min()
                .map_or(poll, |d| d.min(poll));

            match rx.recv_timeout(wait) {
                Ok(WorkerMessage::Started { task_id, at }) => {
                    if let Some(flight) = state.running.get_mut(&task_id) {
                        flight.started = Some(at);
                    }
                }
                Ok(WorkerMessage::Finished {
                    task_id,
                    outcome,
                    elapsed,
                }) => {
                    state.occupied = state.occupied.saturating_sub(1);
                    match state.running.remove(&task_id) {
                        Some(flight) => match outcome {
                            Ok(report) => state.record_success(flight.slot, report, elapsed),
                            Err(error) => {
                                state.record_failure(flight.slot, error, elapsed, &self.config)
                            }
                        },
                        None => debug!(task_id, "Ignoring late result of timed-out task"),
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = Instant::now();
            let expired: Vec<u64> = state
                .running
                .iter()
                .filter(|(_, r)| now >= r.deadline(timeout, queue_timeout))
                .map(|(id, _)| *id)
                .collect();
            for id in expired {
                if let Some(flight) = state.running.remove(&id) {
                    let (error, elapsed) = match flight.started {
                        Some(at) => (
                            TaskError {
                                kind: TaskErrorKind::Timeout,
                                message: format!("No result within {}s", timeout.as_secs()),
                            },
                            now.duration_since(at),
                        ),
                        None => (
                            TaskError {
                                kind: TaskErrorKind::Stalled,
                                message: format!(
                                    "No worker free within {}s; pool held by timed-out tasks",
                                    queue_timeout.as_secs()
                                ),
                            },
                            Duration::ZERO,
                        ),
                    };
                    state.record_failure(flight.slot, error, elapsed, &self.config);
                }
            }

            if last_memory_check.elapsed() >= memory_interval {
                last_memory_check = Instant::now();
                if let Some(reading) = self.memory_monitor.check() {
                    warn!(
                        used_mb = reading.used_bytes / (1024 * 1024),
                        ceiling_mb = reading.ceiling_bytes / (1024 * 1024),
                        "Memory above reclaim threshold, requesting reclamation"
                    );
                    self.processor.reclaim();
                }
            }

            tracker.maybe_report(state.snapshot(clock.elapsed()), Instant::now());
        }

        tracker.finish(state.snapshot(clock.elapsed()));
        self.progress_callback = tracker.into_callback();

        let ctx = RunContext {
            pattern: pattern.to_string(),
            analysis_type: operation,
            started_at,
            finished_at: Utc::now(),
            wall_time: clock.elapsed(),
            total_files,
            excluded_files: excluded,
            halted: state.halted,
            threshold_breach: state.breach,
        };
        let summary = SurveySummary::from_tasks(ctx, &state.slots);
        info!(
            status = ?summary.status,
            successful = summary.successful_files,
            failed = summary.failed_files,
            cancelled = summary.cancelled_files,
            retried = state.retried,
            mb_per_second = summary.throughput.mb_per_second,
            "Batch finished"
        );
        Ok(summary)
    }
}

/// Run a batch with the default analyzer over `reader`.
pub fn run_batch(
    reader: Arc<dyn TraceReader>,
    pattern: &str,
    config: &SurveyConfig,
) -> Result<SurveySummary, BatchError> {
    BatchOrchestrator::for_reader(reader, config).run(pattern, None)
}
