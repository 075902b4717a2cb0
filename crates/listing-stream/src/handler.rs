//! Consumer side of the pipeline: buffers records, aggregates them in
//! batches and publishes snapshots of the global aggregate.

use crate::aggregate::GlobalAggregate;
use crate::batch::process_batch;
use crate::completion::Completion;
use crate::config::PipelineConfig;
use crate::model::Record;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::{mpsc::UnboundedReceiver, watch};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Immutable copy of the global aggregate, taken after a merge.
pub type Snapshot = Arc<GlobalAggregate>;

/// Counters returned by [`StreamHandler::run`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HandlerStats {
    pub records_received: usize,
    pub batches_processed: usize,
}

/// Sole consumer of the aggregation channel and sole owner of the global
/// aggregate.
pub struct StreamHandler {
    receiver: UnboundedReceiver<Record>,
    completion: Completion,
    snapshots: watch::Sender<Snapshot>,
    drained: CancellationToken,
    threshold: usize,
    poll_timeout: Duration,
    aggregate: GlobalAggregate,
}

impl StreamHandler {
    pub fn new(
        config: &PipelineConfig,
        receiver: UnboundedReceiver<Record>,
        completion: Completion,
        snapshots: watch::Sender<Snapshot>,
        drained: CancellationToken,
    ) -> Self {
        Self {
            receiver,
            completion,
            snapshots,
            drained,
            threshold: config.buffer_threshold.max(1),
            poll_timeout: config.poll_timeout(),
            aggregate: GlobalAggregate::new(config.merge_policy),
        }
    }

    /// Runs until the completion signal is raised and the channel is empty.
    ///
    /// A batch is aggregated when the buffer reaches the threshold, or as
    /// soon as the signal is raised while records are buffered.  The
    /// `drained` token is cancelled when this returns.
    pub async fn run(mut self) -> HandlerStats {
        let _drained = self.drained.clone().drop_guard();
        info!("stream handler started");

        let mut stats = HandlerStats::default();
        let mut buffer = Vec::with_capacity(self.threshold);
        let mut producer_gone = false;

        loop {
            let finished = self.completion.is_finished();
            if buffer.len() >= self.threshold || (finished && !buffer.is_empty()) {
                self.process(&mut buffer, &mut stats);
            }
            if finished && self.receiver.is_empty() {
                break;
            }

            select! {
                received = self.receiver.recv(), if !producer_gone => match received {
                    Some(record) => {
                        stats.records_received += 1;
                        buffer.push(record);
                    }
                    // Without the completion signal this only waits; the
                    // signal is the one thing that ends the loop.
                    None => producer_gone = true,
                },
                _ = self.completion.finished(), if !finished => {}
                // Nothing arrived within the poll timeout; try again.
                _ = sleep(self.poll_timeout) => {}
            }
        }

        info!(
            records = stats.records_received,
            batches = stats.batches_processed,
            "stream handler finished processing"
        );
        stats
    }

    fn process(&mut self, buffer: &mut Vec<Record>, stats: &mut HandlerStats) {
        let table = process_batch(buffer);
        let keys = table.len();
        self.aggregate.merge(table);
        stats.batches_processed += 1;
        self.snapshots
            .send_replace(Arc::new(self.aggregate.clone()));
        debug!(
            records = buffer.len(),
            keys,
            total_keys = self.aggregate.len(),
            "processed a batch of records and updated aggregates"
        );
        buffer.clear();
    }
}
