//! Simulated streaming aggregation of real-estate listings.
//!
//! A [`StreamSimulator`] replays a CSV dataset onto an unbounded channel in
//! timed batches.  A [`StreamHandler`] drains the channel, aggregates the
//! listings per district and property type, and publishes snapshots of the
//! running aggregate.  A [`ResultPersister`] appends the latest snapshot to
//! an output CSV file at a fixed interval.  [`Pipeline`] runs all three.

pub mod aggregate;
pub mod batch;
pub mod completion;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod model;
pub mod persister;
pub mod pipeline;
pub mod report;
pub mod simulator;
pub mod source;

#[cfg(test)]
mod test;

pub use aggregate::{AggregateTable, GlobalAggregate};
pub use batch::process_batch;
pub use completion::{Completion, StreamStatus};
pub use config::{MergePolicy, PipelineConfig, SourceFailurePolicy};
pub use handler::{HandlerStats, Snapshot, StreamHandler};
pub use model::{AggregateKey, AggregateRow, Record, SnapshotRow};
pub use persister::{write_snapshot, ResultPersister, WriteMode};
pub use pipeline::{Pipeline, PipelineReport};
pub use report::{latest_snapshot, read_snapshots, Summary, SummaryFilter};
pub use simulator::StreamSimulator;
