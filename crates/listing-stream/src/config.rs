//! Configuration options for the listing stream pipeline.

use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATASET_PATH: &str = "data/portugal_listings.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/aggregated_results.csv";

/// How per-batch averages are folded into the global aggregate.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Average the per-batch averages with equal weight, whatever the
    /// number of listings behind each of them.
    #[default]
    MeanOfMeans,
    /// Weight each average by the number of listings it summarizes.
    CountWeighted,
}

/// What the simulator does when the dataset cannot be read.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum SourceFailurePolicy {
    /// Log the failure and never raise the completion signal.  The handler
    /// and persister keep waiting until the process is stopped.
    #[default]
    Wait,
    /// Raise the completion signal as failed so that the downstream workers
    /// drain and stop.
    Abort,
}

/// Pipeline configuration.
#[derive(Clone, Debug, Args)]
pub struct PipelineConfig {
    /// CSV dataset to replay.
    #[arg(long, env = "LISTING_STREAM_DATASET", default_value = DEFAULT_DATASET_PATH)]
    pub dataset: PathBuf,

    /// CSV file that receives aggregate snapshots.
    #[arg(long, env = "LISTING_STREAM_OUTPUT", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Number of records pushed onto the channel between two pauses.
    #[arg(long, env = "LISTING_STREAM_BATCH_SIZE", default_value_t = 10)]
    pub batch_size: usize,

    /// Pause between two ingestion batches, in milliseconds.
    #[arg(long, env = "LISTING_STREAM_BATCH_DELAY_MS", default_value_t = 1000)]
    pub batch_delay_ms: u64,

    /// Number of buffered records that triggers an aggregation pass.
    #[arg(long, env = "LISTING_STREAM_BUFFER_THRESHOLD", default_value_t = 10)]
    pub buffer_threshold: usize,

    /// Longest wait for a single record before the handler re-checks the
    /// completion signal, in milliseconds.
    #[arg(long, env = "LISTING_STREAM_POLL_TIMEOUT_MS", default_value_t = 1000)]
    pub poll_timeout_ms: u64,

    /// Interval between two snapshot writes, in milliseconds.
    #[arg(long, env = "LISTING_STREAM_PERSIST_INTERVAL_MS", default_value_t = 30_000)]
    pub persist_interval_ms: u64,

    /// How per-batch averages are combined with the running aggregate.
    #[arg(long, env = "LISTING_STREAM_MERGE_POLICY", value_enum, default_value_t)]
    pub merge_policy: MergePolicy,

    /// What to do when the dataset cannot be read.
    #[arg(long, env = "LISTING_STREAM_ON_SOURCE_FAILURE", value_enum, default_value_t)]
    pub on_source_failure: SourceFailurePolicy,

    /// Write one more snapshot once every record has been aggregated.
    #[arg(long, env = "LISTING_STREAM_FINAL_SNAPSHOT")]
    pub final_snapshot: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            batch_size: 10,
            batch_delay_ms: 1000,
            buffer_threshold: 10,
            poll_timeout_ms: 1000,
            persist_interval_ms: 30_000,
            merge_policy: MergePolicy::default(),
            on_source_failure: SourceFailurePolicy::default(),
            final_snapshot: false,
        }
    }
}

impl PipelineConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms)
    }
}

#[cfg(test)]
mod test {
    use super::{MergePolicy, PipelineConfig, SourceFailurePolicy};
    use clap::Parser;
    use std::path::Path;
    use std::time::Duration;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        config: PipelineConfig,
    }

    #[test]
    fn defaults_match_cli_defaults() {
        let parsed = Cli::parse_from(["listing-stream"]).config;
        let default = PipelineConfig::default();
        assert_eq!(parsed.dataset, default.dataset);
        assert_eq!(parsed.output, default.output);
        assert_eq!(parsed.batch_size, default.batch_size);
        assert_eq!(parsed.batch_delay(), Duration::from_secs(1));
        assert_eq!(parsed.buffer_threshold, default.buffer_threshold);
        assert_eq!(parsed.poll_timeout(), Duration::from_secs(1));
        assert_eq!(parsed.persist_interval(), Duration::from_secs(30));
        assert_eq!(parsed.merge_policy, MergePolicy::MeanOfMeans);
        assert_eq!(parsed.on_source_failure, SourceFailurePolicy::Wait);
        assert!(!parsed.final_snapshot);
    }

    #[test]
    fn overrides() {
        let parsed = Cli::parse_from([
            "listing-stream",
            "--dataset",
            "in.csv",
            "--merge-policy",
            "count-weighted",
            "--on-source-failure",
            "abort",
            "--final-snapshot",
        ])
        .config;
        assert_eq!(parsed.dataset, Path::new("in.csv"));
        assert_eq!(parsed.merge_policy, MergePolicy::CountWeighted);
        assert_eq!(parsed.on_source_failure, SourceFailurePolicy::Abort);
        assert!(parsed.final_snapshot);
    }
}
