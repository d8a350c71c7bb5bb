use change_summary_path::PathError;
use thiserror::Error;

use crate::scheduler::CheckpointReport;

/// Error type callbacks return. Observers are single-threaded, so no `Send`.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// Failure to construct an observer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error(transparent)]
    InvalidPath(#[from] PathError),
    #[error("cannot observe properties of a {type_name} value")]
    NotAnObject { type_name: &'static str },
    #[error("provided value is not an array (found {type_name})")]
    NotAnArray { type_name: &'static str },
}

/// A callback returned an error while its observer reported.
///
/// The observer stays active; the error is collected into the surrounding
/// [`CheckpointReport`].
#[derive(Debug, Error)]
#[error("callback of observer {observer} failed: {source}")]
pub struct CallbackError {
    pub observer: u64,
    #[source]
    pub source: BoxError,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint did not settle within {cycles} cycles")]
    CycleLimit {
        cycles: usize,
        report: CheckpointReport,
    },
}

impl CheckpointError {
    /// The report of the passes that did run.
    pub fn report(&self) -> &CheckpointReport {
        match self {
            CheckpointError::CycleLimit { report, .. } => report,
        }
    }

    pub fn into_report(self) -> CheckpointReport {
        match self {
            CheckpointError::CycleLimit { report, .. } => report,
        }
    }
}
