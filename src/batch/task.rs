//! FileTask state machine
//!
//! pending -> running -> {success, error}. A pending task may also move
//! straight to error when the breaker cancels it before it starts. Retries
//! never reopen a task; they produce a fresh pending task with the attempt
//! counter incremented.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::{AnalysisType, FileReport, FileTask, TaskError, TaskErrorKind, TaskStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaskStateError {
    #[error("task {id}: cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: u64,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("task {id}: only failed tasks can be retried (status {status:?})")]
    NotRetryable { id: u64, status: TaskStatus },
}

impl FileTask {
    pub fn new(id: u64, path: PathBuf, operation: AnalysisType, file_size_bytes: u64) -> Self {
        Self {
            id,
            path,
            operation,
            attempt: 0,
            file_size_bytes,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            processing_time: None,
        }
    }

    fn transition(&mut self, allowed_from: TaskStatus, to: TaskStatus) -> Result<(), TaskStateError> {
        if self.status != allowed_from {
            return Err(TaskStateError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), TaskStateError> {
        self.transition(TaskStatus::Pending, TaskStatus::Running)
    }

    pub fn succeed(&mut self, report: FileReport, elapsed: Duration) -> Result<(), TaskStateError> {
        self.transition(TaskStatus::Running, TaskStatus::Success)?;
        self.result = Some(report);
        self.processing_time = Some(elapsed);
        Ok(())
    }

    pub fn fail(&mut self, error: TaskError, elapsed: Duration) -> Result<(), TaskStateError> {
        self.transition(TaskStatus::Running, TaskStatus::Error)?;
        self.error = Some(error);
        self.processing_time = Some(elapsed);
        Ok(())
    }

    /// Terminal error for a task that never started
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), TaskStateError> {
        self.transition(TaskStatus::Pending, TaskStatus::Error)?;
        self.error = Some(TaskError {
            kind: TaskErrorKind::Cancelled,
            message: reason.into(),
        });
        Ok(())
    }

    /// Fresh pending task for the same file
    pub fn retry(&self, new_id: u64) -> Result<FileTask, TaskStateError> {
        if self.status != TaskStatus::Error {
            return Err(TaskStateError::NotRetryable {
                id: self.id,
                status: self.status,
            });
        }
        let mut next = FileTask::new(new_id, self.path.clone(), self.operation, self.file_size_bytes);
        next.attempt = self.attempt + 1;
        Ok(next)
    }

    pub fn is_cancelled(&self) -> bool {
        self.error
            .as_ref()
            .is_some_and(|e| e.kind == TaskErrorKind::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> FileTask {
        FileTask::new(1, PathBuf::from("/a.sgy"), AnalysisType::Quick, 4096)
    }

    fn err() -> TaskError {
        TaskError {
            kind: TaskErrorKind::Operation,
            message: "boom".into(),
        }
    }

    #[test]
    fn test_happy_path() {
        let mut t = task();
        t.start().unwrap();
        assert_eq!(t.status, TaskStatus::Running);
        t.fail(err(), Duration::from_millis(5)).unwrap();
        assert!(t.status.is_terminal());
        assert_eq!(t.processing_time, Some(Duration::from_millis(5)));
    }

    #[test]
    fn test_illegal_transitions() {
        let mut t = task();
        assert!(t.fail(err(), Duration::ZERO).is_err());
        t.start().unwrap();
        assert!(t.start().is_err());
        assert!(t.cancel("late").is_err());
    }

    #[test]
    fn test_cancel_only_pending() {
        let mut t = task();
        t.cancel("breaker").unwrap();
        assert_eq!(t.status, TaskStatus::Error);
        assert!(t.is_cancelled());
    }

    #[test]
    fn test_retry_creates_new_pending_task() {
        let mut t = task();
        assert!(t.retry(2).is_err());
        t.start().unwrap();
        t.fail(err(), Duration::ZERO).unwrap();
        let next = t.retry(2).unwrap();
        assert_eq!(next.id, 2);
        assert_eq!(next.attempt, 1);
        assert_eq!(next.status, TaskStatus::Pending);
        assert_eq!(t.status, TaskStatus::Error);
    }
}
