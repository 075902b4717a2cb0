//! Periodically writes the latest aggregate snapshot to a CSV file.

use crate::config::PipelineConfig;
use crate::error::PersistError;
use crate::handler::Snapshot;
use csv::{Writer as CsvWriter, WriterBuilder as CsvWriterBuilder};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::select;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// How a snapshot reached the output file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// The file did not exist and was created with a header row.
    Created,
    /// The snapshot was appended to the existing file, without a header.
    Appended,
}

/// Returns a CSV writer with our style for `inner`.
fn make_csv_writer(inner: Vec<u8>, has_headers: bool) -> CsvWriter<Cursor<Vec<u8>>> {
    CsvWriterBuilder::new()
        .has_headers(has_headers)
        .from_writer(Cursor::new(inner))
}

/// Writes every row of `snapshot` to `path`.
///
/// The file is created with a header row if it does not exist; otherwise the
/// rows are appended after the previous snapshots.
pub async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<WriteMode, PersistError> {
    let io_error = |error| PersistError::Io {
        path: path.to_path_buf(),
        error,
    };

    let exists = tokio::fs::try_exists(path).await.map_err(io_error)?;
    let mut writer = make_csv_writer(Vec::new(), !exists);
    for row in snapshot.snapshot_rows() {
        writer.serialize(row)?;
    }
    let buffer = writer
        .into_inner()
        .map_err(|e| io_error(e.into_error()))?
        .into_inner();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(io_error)?;
    file.write_all(&buffer).await.map_err(io_error)?;
    file.flush().await.map_err(io_error)?;

    Ok(if exists {
        WriteMode::Appended
    } else {
        WriteMode::Created
    })
}

/// Writes the latest snapshot every `interval` until the handler has drained
/// the stream.
///
/// Every write holds the complete aggregate, so the output file is a
/// time-ordered log of snapshots rather than a single table.
pub struct ResultPersister {
    output: PathBuf,
    interval: Duration,
    final_snapshot: bool,
    snapshots: watch::Receiver<Snapshot>,
    drained: CancellationToken,
}

impl ResultPersister {
    pub fn new(
        config: &PipelineConfig,
        snapshots: watch::Receiver<Snapshot>,
        drained: CancellationToken,
    ) -> Self {
        Self {
            output: config.output.clone(),
            interval: config.persist_interval(),
            final_snapshot: config.final_snapshot,
            snapshots,
            drained,
        }
    }

    /// Returns the number of snapshots written.
    pub async fn run(self) -> usize {
        info!(output = %self.output.display(), "starting aggregation");

        let mut written = 0;
        while !self.drained.is_cancelled() {
            if self.persist_latest().await {
                written += 1;
            }
            select! {
                _ = sleep(self.interval) => {}
                _ = self.drained.cancelled() => {}
            }
        }

        if self.final_snapshot && self.persist_latest().await {
            written += 1;
        }
        info!(snapshots = written, "final aggregation completed");
        written
    }

    /// Writes the latest snapshot if it has any rows.  Returns `true` if a
    /// snapshot was written.
    async fn persist_latest(&self) -> bool {
        let snapshot = self.snapshots.borrow().clone();
        if snapshot.is_empty() {
            return false;
        }

        match write_snapshot(&self.output, &snapshot).await {
            Ok(WriteMode::Created) => {
                info!(output = %self.output.display(), rows = snapshot.len(), "aggregated data saved");
                true
            }
            Ok(WriteMode::Appended) => {
                info!(output = %self.output.display(), rows = snapshot.len(), "aggregated data appended");
                true
            }
            Err(error) => {
                error!(%error, "error during aggregation");
                false
            }
        }
    }
}
