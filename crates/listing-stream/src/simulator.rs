//! Replays the listings dataset as a stream of records.

use crate::completion::Completion;
use crate::config::{PipelineConfig, SourceFailurePolicy};
use crate::model::Record;
use crate::source::read_dataset_async;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Producer side of the pipeline.
///
/// Pushes the dataset onto the aggregation channel `batch_size` records at a
/// time, pausing for `batch_delay` after each batch, and raises the
/// completion signal after the last one.
pub struct StreamSimulator {
    dataset: PathBuf,
    batch_size: usize,
    batch_delay: Duration,
    on_failure: SourceFailurePolicy,
    sender: UnboundedSender<Record>,
    completion: Completion,
}

impl StreamSimulator {
    pub fn new(
        config: &PipelineConfig,
        sender: UnboundedSender<Record>,
        completion: Completion,
    ) -> Self {
        Self {
            dataset: config.dataset.clone(),
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
            on_failure: config.on_source_failure,
            sender,
            completion,
        }
    }

    /// Streams the dataset and returns the number of records pushed.
    ///
    /// If the dataset cannot be read, nothing is pushed.  With
    /// [`SourceFailurePolicy::Wait`] the completion signal is then never
    /// raised, and the downstream workers keep waiting for it.  If the
    /// channel closes before the dataset is exhausted, the stream is marked
    /// as failed.
    pub async fn run(self) -> usize {
        info!(dataset = %self.dataset.display(), "simulating stream");

        let records = match read_dataset_async(&self.dataset).await {
            Ok(records) => records,
            Err(error) => {
                error!(%error, "error during streaming simulation");
                if self.on_failure == SourceFailurePolicy::Abort {
                    warn!("signalling downstream workers that the stream failed");
                    self.completion.fail();
                }
                return 0;
            }
        };

        let mut streamed = 0;
        let mut records = records.into_iter();
        loop {
            let batch = records.by_ref().take(self.batch_size).collect::<Vec<_>>();
            if batch.is_empty() {
                break;
            }
            let len = batch.len();
            for record in batch {
                if self.sender.send(record).is_err() {
                    // Only happens if the handler went away early.
                    warn!(streamed, "aggregation channel closed, stopping stream");
                    self.completion.fail();
                    return streamed;
                }
                streamed += 1;
            }
            info!(records = len, "streamed batch to the queue");
            sleep(self.batch_delay).await;
        }

        self.completion.finish();
        info!(records = streamed, "all data has been streamed");
        streamed
    }
}
