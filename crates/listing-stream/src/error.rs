use std::path::PathBuf;
use thiserror::Error as ThisError;

/// Failures of the record source.  Both variants abort the simulation.
#[derive(ThisError, Debug)]
pub enum SourceError {
    #[error("dataset `{}` not found", path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read dataset `{}`: {error}", path.display())]
    Read { path: PathBuf, error: csv::Error },
    #[error("dataset reader task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failure while writing a snapshot.  Retried on the next interval.
#[derive(ThisError, Debug)]
pub enum PersistError {
    #[error("could not encode snapshot: {0}")]
    Encode(#[from] csv::Error),
    #[error("could not write snapshot to `{}`: {error}", path.display())]
    Io {
        path: PathBuf,
        error: std::io::Error,
    },
}

#[derive(ThisError, Debug)]
pub enum ReportError {
    #[error("could not read snapshot file `{}`: {error}", path.display())]
    Read { path: PathBuf, error: csv::Error },
}
