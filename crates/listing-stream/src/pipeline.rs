//! Wires the simulator, handler and persister together.

use crate::aggregate::GlobalAggregate;
use crate::completion::{Completion, StreamStatus};
use crate::config::PipelineConfig;
use crate::handler::{HandlerStats, StreamHandler};
use crate::persister::ResultPersister;
use crate::simulator::StreamSimulator;
use anyhow::{Context, Result as AnyResult};
use std::sync::Arc;
use tokio::sync::{mpsc::unbounded_channel, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Outcome of a pipeline run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineReport {
    pub records_streamed: usize,
    pub handler: HandlerStats,
    pub snapshots_written: usize,
    pub status: StreamStatus,
}

pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Runs the three workers until the stream is exhausted and drained.
    ///
    /// Only bootstrap failures are returned; failures inside the workers are
    /// logged.  If the dataset cannot be read and the source failure policy
    /// is `wait`, this never returns.
    pub async fn run(self) -> AnyResult<PipelineReport> {
        let config = self.config;
        if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.with_context(|| {
                format!("failed to create output directory `{}`", parent.display())
            })?;
        }

        let (sender, receiver) = unbounded_channel();
        let completion = Completion::new();
        let drained = CancellationToken::new();
        let (snapshot_sender, snapshot_receiver) =
            watch::channel(Arc::new(GlobalAggregate::new(config.merge_policy)));

        let simulator = StreamSimulator::new(&config, sender, completion.clone());
        let handler = StreamHandler::new(
            &config,
            receiver,
            completion.clone(),
            snapshot_sender,
            drained.clone(),
        );
        let persister = ResultPersister::new(&config, snapshot_receiver, drained);

        let simulator = tokio::spawn(simulator.run());
        let handler = tokio::spawn(handler.run());
        let persister = tokio::spawn(persister.run());

        let (records_streamed, handler, snapshots_written) =
            tokio::try_join!(simulator, handler, persister).context("pipeline worker panicked")?;

        let report = PipelineReport {
            records_streamed,
            handler,
            snapshots_written,
            status: completion.status(),
        };
        info!(?report, "pipeline finished");
        Ok(report)
    }
}

#[cfg(test)]
mod test {
    use super::Pipeline;
    use crate::completion::StreamStatus;
    use crate::config::{PipelineConfig, SourceFailurePolicy};
    use crate::model::Record;
    use crate::test::{init_test_logger, write_dataset};
    use std::time::Duration;

    #[tokio::test]
    async fn creates_output_directory() {
        init_test_logger();
        let dataset = write_dataset(&[Record::new("A", "House", 60_000.0, 30.0)]);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("data").join("aggregated_results.csv");

        let report = Pipeline::new(PipelineConfig {
            dataset: dataset.path().to_path_buf(),
            output: output.clone(),
            batch_delay_ms: 5,
            poll_timeout_ms: 5,
            persist_interval_ms: 10,
            final_snapshot: true,
            ..PipelineConfig::default()
        })
        .run()
        .await
        .unwrap();

        assert_eq!(report.status, StreamStatus::Exhausted);
        assert_eq!(report.records_streamed, 1);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn missing_dataset_hangs_by_default() {
        init_test_logger();
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            dataset: dir.path().join("missing.csv"),
            output: dir.path().join("out.csv"),
            poll_timeout_ms: 5,
            persist_interval_ms: 10,
            ..PipelineConfig::default()
        });

        // The completion signal is never raised, so the run cannot end.
        let result = tokio::time::timeout(Duration::from_millis(300), pipeline.run()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_dataset_stops_with_abort_policy() {
        init_test_logger();
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PipelineConfig {
            dataset: dir.path().join("missing.csv"),
            output: dir.path().join("out.csv"),
            poll_timeout_ms: 5,
            persist_interval_ms: 10,
            on_source_failure: SourceFailurePolicy::Abort,
            ..PipelineConfig::default()
        });

        let report = tokio::time::timeout(Duration::from_secs(5), pipeline.run())
            .await
            .expect("pipeline did not stop")
            .unwrap();
        assert_eq!(report.status, StreamStatus::Failed);
        assert_eq!(report.records_streamed, 0);
        assert_eq!(report.snapshots_written, 0);
        assert!(!dir.path().join("out.csv").exists());
    }
}
