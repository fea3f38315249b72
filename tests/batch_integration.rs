//! Batch Orchestrator Integration Tests
//!
//! Dispatch bounds, the error-rate breaker, timeouts, retries, memory
//! reclamation and a discovery-to-summary run over real files on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use seisqc::acquisition::FileValidator;
use seisqc::batch::{FileEntry, MemoryProbe, ProgressSnapshot};
use seisqc::config::{BatchConfig, SurveyConfig, ValidationConfig};
use seisqc::reader::SyntheticSurvey;
use seisqc::types::{BatchStatus, TaskErrorKind};
use seisqc::{
    AnalysisType, BatchOrchestrator, ConfidenceLevel, FileProcessor, FileReport, MemoryReader,
    PrimarySorting, StackType, SurveySummary, SurveyType,
};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn report(path: &Path, operation: AnalysisType) -> FileReport {
    FileReport {
        path: path.to_path_buf(),
        analysis_type: operation,
        file_size_bytes: 0,
        survey_type: SurveyType::ThreeD,
        primary_sorting: PrimarySorting::Inline,
        stack_type: StackType::Poststack,
        confidence: ConfidenceLevel::High,
        classification_details: None,
        quality_assessment: None,
        header_summary: None,
        traces_analyzed: 10,
        processing_time_seconds: 0.0,
    }
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Fails every file whose name starts with `bad`, counts every call
#[derive(Default)]
struct CountingProcessor {
    calls: AtomicUsize,
}

impl FileProcessor for CountingProcessor {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if file_name(path).starts_with("bad") {
            anyhow::bail!("synthetic failure");
        }
        Ok(report(path, operation))
    }
}

/// Tracks how many calls overlap
#[derive(Default)]
struct ConcurrencyProbe {
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl FileProcessor for ConcurrencyProbe {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_micros(200));
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(report(path, operation))
    }
}

/// Fails the first `failures` calls per file
struct FlakyProcessor {
    failures: usize,
    seen: Mutex<HashMap<PathBuf, usize>>,
}

impl FileProcessor for FlakyProcessor {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport> {
        let attempt = {
            let mut seen = self.seen.lock().unwrap();
            let n = seen.entry(path.to_path_buf()).or_insert(0);
            *n += 1;
            *n
        };
        if attempt <= self.failures {
            anyhow::bail!("transient failure {attempt}");
        }
        Ok(report(path, operation))
    }
}

fn validator() -> FileValidator {
    FileValidator::new(Arc::new(MemoryReader::new()), ValidationConfig::default())
}

fn entries(names: &[String]) -> Vec<FileEntry> {
    names
        .iter()
        .map(|n| FileEntry::new(format!("/batch/{n}"), 1024 * 1024))
        .collect()
}

fn breaker_files() -> Vec<String> {
    (0..10)
        .map(|i| if i < 6 { format!("bad_{i}.sgy") } else { format!("ok_{i}.sgy") })
        .collect()
}

fn run(
    processor: Arc<dyn FileProcessor>,
    config: BatchConfig,
    names: &[String],
) -> SurveySummary {
    BatchOrchestrator::new(processor, validator(), config)
        .run_entries("/batch/*.sgy", entries(names), AnalysisType::Quick)
        .unwrap()
}

// ============================================================================
// Error-rate breaker
// ============================================================================

#[test]
fn breaker_halts_dispatch_after_threshold_exceeded() {
    let processor = Arc::new(CountingProcessor::default());
    let config = BatchConfig {
        max_concurrent_files: 1,
        error_threshold: 0.5,
        continue_on_error: false,
        ..BatchConfig::default()
    };
    let summary = run(processor.clone(), config, &breaker_files());

    assert_eq!(processor.calls.load(Ordering::SeqCst), 6);
    assert_eq!(summary.status, BatchStatus::Halted);
    assert_eq!(summary.failed_files, 6);
    assert_eq!(summary.cancelled_files, 4);
    assert_eq!(summary.successful_files, 0);
    let breach = summary.threshold_breach.expect("breach must be reported");
    assert_eq!(breach.failed, 6);
    assert_eq!(breach.total, 10);
    assert!(summary
        .failures
        .iter()
        .filter(|f| f.kind == TaskErrorKind::Cancelled)
        .all(|f| file_name(&f.path).starts_with("ok")));
}

#[test]
fn continue_on_error_attempts_every_file() {
    let processor = Arc::new(CountingProcessor::default());
    let config = BatchConfig {
        max_concurrent_files: 1,
        error_threshold: 0.5,
        continue_on_error: true,
        ..BatchConfig::default()
    };
    let summary = run(processor.clone(), config, &breaker_files());

    assert_eq!(processor.calls.load(Ordering::SeqCst), 10);
    assert_eq!(summary.status, BatchStatus::Completed);
    assert_eq!(summary.successful_files, 4);
    assert_eq!(summary.failed_files, 6);
    assert_eq!(summary.cancelled_files, 0);
    assert!(summary.threshold_breach.is_some());
}

// ============================================================================
// Concurrency bound
// ============================================================================

#[test]
fn thousand_files_never_exceed_four_running() {
    let processor = Arc::new(ConcurrencyProbe::default());
    let snapshots: Arc<Mutex<Vec<ProgressSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&snapshots);
    let config = BatchConfig {
        max_concurrent_files: 4,
        progress_interval_secs: 0,
        ..BatchConfig::default()
    };
    let names: Vec<String> = (0..1000).map(|i| format!("f{i:04}.sgy")).collect();

    let summary = BatchOrchestrator::new(processor.clone(), validator(), config)
        .with_progress_callback(Box::new(move |s: &ProgressSnapshot| {
            sink.lock().unwrap().push(*s)
        }))
        .run_entries("/batch/*.sgy", entries(&names), AnalysisType::Quick)
        .unwrap();

    assert_eq!(summary.successful_files, 1000);
    assert!(processor.peak.load(Ordering::SeqCst) <= 4);
    let snapshots = snapshots.lock().unwrap();
    assert!(snapshots.iter().all(|s| s.running <= 4));
    assert_eq!(snapshots.last().map(|s| s.completed), Some(1000));
}

// ============================================================================
// Timeouts, retries, panics
// ============================================================================

struct SlowProcessor;

impl FileProcessor for SlowProcessor {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport> {
        if file_name(path).starts_with("slow") {
            std::thread::sleep(Duration::from_secs(3));
        } else if file_name(path).starts_with("hang") {
            std::thread::sleep(Duration::from_secs(6));
        }
        Ok(report(path, operation))
    }
}

#[test]
fn hung_task_times_out_without_blocking_siblings() {
    let config = BatchConfig {
        max_concurrent_files: 2,
        timeout_seconds: 1,
        continue_on_error: true,
        ..BatchConfig::default()
    };
    let names = vec!["slow.sgy".to_string(), "a.sgy".to_string(), "b.sgy".to_string()];
    let summary = run(Arc::new(SlowProcessor), config, &names);

    assert_eq!(summary.successful_files, 2);
    assert_eq!(summary.failed_files, 1);
    assert_eq!(summary.failures[0].kind, TaskErrorKind::Timeout);
    assert!(file_name(&summary.failures[0].path).starts_with("slow"));
}

#[test]
fn queued_task_is_not_charged_for_a_held_worker() {
    let config = BatchConfig {
        max_concurrent_files: 1,
        timeout_seconds: 1,
        ..BatchConfig::default()
    };
    let names = vec!["slow.sgy".to_string(), "a.sgy".to_string(), "b.sgy".to_string()];
    let summary = run(Arc::new(SlowProcessor), config, &names);

    assert_eq!(summary.successful_files, 2);
    assert_eq!(summary.failed_files, 1);
    assert!(summary.threshold_breach.is_none());
    assert_eq!(summary.failures[0].kind, TaskErrorKind::Timeout);
    assert!(file_name(&summary.failures[0].path).starts_with("slow"));
}

#[test]
fn task_queued_behind_a_hung_worker_eventually_stalls() {
    let config = BatchConfig {
        max_concurrent_files: 1,
        timeout_seconds: 1,
        continue_on_error: true,
        ..BatchConfig::default()
    };
    let names = vec!["hang.sgy".to_string(), "a.sgy".to_string(), "b.sgy".to_string()];
    let summary = run(Arc::new(SlowProcessor), config, &names);

    assert_eq!(summary.successful_files, 1);
    assert_eq!(summary.failed_files, 2);
    let kinds: Vec<_> = summary
        .failures
        .iter()
        .map(|f| (file_name(&f.path).to_string(), f.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("a.sgy".to_string(), TaskErrorKind::Stalled),
            ("hang.sgy".to_string(), TaskErrorKind::Timeout),
        ]
    );
}

#[test]
fn transient_failures_are_retried_as_new_tasks() {
    let processor = Arc::new(FlakyProcessor {
        failures: 1,
        seen: Mutex::new(HashMap::new()),
    });
    let config = BatchConfig {
        max_retry_attempts: 2,
        ..BatchConfig::default()
    };
    let names = vec!["x.sgy".to_string(), "y.sgy".to_string()];
    let summary = run(processor, config, &names);

    assert_eq!(summary.successful_files, 2);
    assert_eq!(summary.failed_files, 0);
    assert_eq!(summary.retried_attempts, 2);
}

#[test]
fn retries_are_bounded() {
    let processor = Arc::new(FlakyProcessor {
        failures: usize::MAX,
        seen: Mutex::new(HashMap::new()),
    });
    let config = BatchConfig {
        max_retry_attempts: 2,
        continue_on_error: true,
        ..BatchConfig::default()
    };
    let summary = run(processor.clone(), config, &["z.sgy".to_string()]);

    assert_eq!(summary.failed_files, 1);
    assert_eq!(summary.failures[0].attempts, 3);
    assert_eq!(processor.seen.lock().unwrap()[Path::new("/batch/z.sgy")], 3);
}

// ============================================================================
// Memory governance
// ============================================================================

struct FullProbe;

impl MemoryProbe for FullProbe {
    fn used_bytes(&mut self) -> Option<u64> {
        Some(u64::MAX / 2)
    }
}

#[derive(Default)]
struct ReclaimCounter {
    reclaims: AtomicUsize,
}

impl FileProcessor for ReclaimCounter {
    fn process(&self, path: &Path, operation: AnalysisType) -> anyhow::Result<FileReport> {
        std::thread::sleep(Duration::from_millis(20));
        Ok(report(path, operation))
    }

    fn reclaim(&self) {
        self.reclaims.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn memory_pressure_requests_reclamation() {
    let processor = Arc::new(ReclaimCounter::default());
    let config = BatchConfig {
        memory_check_interval_secs: 0,
        ..BatchConfig::default()
    };
    let names: Vec<String> = (0..4).map(|i| format!("m{i}.sgy")).collect();
    let summary = BatchOrchestrator::new(processor.clone(), validator(), config)
        .with_memory_probe(Box::new(FullProbe))
        .run_entries("/batch/*.sgy", entries(&names), AnalysisType::Quick)
        .unwrap();

    assert_eq!(summary.successful_files, 4);
    assert!(processor.reclaims.load(Ordering::SeqCst) >= 1);
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn summary_does_not_depend_on_completion_order() {
    let config = BatchConfig {
        max_concurrent_files: 4,
        continue_on_error: true,
        ..BatchConfig::default()
    };
    let names: Vec<String> = (0..40)
        .map(|i| if i % 5 == 0 { format!("bad_{i:02}.sgy") } else { format!("ok_{i:02}.sgy") })
        .collect();
    let first = run(Arc::new(CountingProcessor::default()), config.clone(), &names);
    let second = run(Arc::new(CountingProcessor::default()), config, &names);

    assert_eq!(first.successful_files, second.successful_files);
    assert_eq!(first.failures, second.failures);
    assert_eq!(first.survey_type_distribution, second.survey_type_distribution);
    assert_eq!(first.total_size_bytes, second.total_size_bytes);
    assert_eq!(first.processed_size_bytes, 32 * 1024 * 1024);
}

// ============================================================================
// Discovery to summary
// ============================================================================

fn write_file(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, vec![0u8; size]).unwrap();
    path
}

#[test]
fn end_to_end_run_over_files_on_disk() {
    let dir = TempDir::new().unwrap();
    let reader = MemoryReader::new();
    reader.insert(write_file(dir.path(), "cube.sgy", 8192), SyntheticSurvey::grid_3d(12, 9, 200));
    reader.insert(write_file(dir.path(), "line.sgy", 8192), SyntheticSurvey::line_2d(120, 200));
    reader.insert_corrupt(write_file(dir.path(), "broken.sgy", 8192), "bad binary header");
    write_file(dir.path(), "tiny.sgy", 100);
    write_file(dir.path(), "notes.txt", 8192);

    let config = SurveyConfig::default();
    let pattern = format!("{}/*.sgy", dir.path().display());
    let summary = BatchOrchestrator::for_reader(Arc::new(reader), &config)
        .run(&pattern, Some(AnalysisType::Full))
        .unwrap();

    assert_eq!(summary.status, BatchStatus::Completed);
    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.valid_files, 2);
    assert_eq!(summary.successful_files, 2);
    assert_eq!(summary.excluded_files.len(), 2);
    assert_eq!(summary.survey_type_distribution.get(&SurveyType::ThreeD), Some(&1));
    assert_eq!(summary.survey_type_distribution.get(&SurveyType::TwoD), Some(&1));
    assert_eq!(summary.quality_distribution.values().sum::<usize>(), 2);
    assert!(summary.finished_at >= summary.started_at);

    let json = summary.to_json_pretty().unwrap();
    assert!(json.contains("\"survey_type_distribution\""));
    assert!(json.contains("\"throughput\""));
}

#[test]
fn pattern_without_valid_files_returns_explicit_result() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "tiny.sgy", 10);

    let pattern = format!("{}/*.sgy", dir.path().display());
    let summary = seisqc::run_batch(Arc::new(MemoryReader::new()), &pattern, &SurveyConfig::default())
        .unwrap();

    assert_eq!(summary.status, BatchStatus::NoValidFiles);
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.valid_files, 0);
    assert_eq!(summary.validation_issues.len(), 1);
    assert!(summary.validation_issues[0].contains("too small"));
}

#[test]
fn empty_match_returns_explicit_result() {
    let dir = TempDir::new().unwrap();
    let pattern = format!("{}/*.segy", dir.path().display());
    let summary = seisqc::run_batch(Arc::new(MemoryReader::new()), &pattern, &SurveyConfig::default())
        .unwrap();
    assert_eq!(summary.status, BatchStatus::NoValidFiles);
    assert_eq!(summary.total_files, 0);
}
