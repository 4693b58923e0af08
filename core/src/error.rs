use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by a single task execution.
///
/// These never unwind past the supervisor/coordinator boundary; each one is
/// converted into a [`TaskOutcome`](crate::task::TaskOutcome) entry.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("required tool missing: {0}")]
    DependencyMissing(String),
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("{0}")]
    Failure(String),
    #[error("run deadline exceeded")]
    Cancelled,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TaskError {
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Failure(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Report text derives from these Display forms; the exact wording is
    // asserted by the coordinator and supervisor tests too.
    #[test]
    fn task_error_display_forms() {
        assert_eq!(
            TaskError::Timeout(Duration::from_secs(5)).to_string(),
            "timed out after 5s"
        );
        assert_eq!(TaskError::Cancelled.to_string(), "run deadline exceeded");
        assert_eq!(
            TaskError::DependencyMissing("winpmem".into()).to_string(),
            "required tool missing: winpmem"
        );
    }
}

/// Run-level errors. Only `SynthesisIo` aborts a run; everything upstream
/// degrades into task outcomes or warnings instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(String),
    #[error("cannot persist report {path}: {source}")]
    SynthesisIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid phase transition: {0}")]
    Phase(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
