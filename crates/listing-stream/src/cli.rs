use clap::{Args, Parser, Subcommand, ValueHint};
use listing_stream::config::{PipelineConfig, DEFAULT_OUTPUT_PATH};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "listing-stream",
    about = "Replay a listings dataset as a stream and persist running aggregates.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Append log output to this file instead of writing it to stderr.
    #[arg(
        long,
        env = "LISTING_STREAM_LOG_FILE",
        value_hint = ValueHint::FilePath,
        global = true,
        help_heading = "Global Options"
    )]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream the dataset through the aggregation pipeline.
    ///
    /// Snapshots of the aggregate are appended to the output file until the
    /// whole dataset has been aggregated.
    Run(PipelineConfig),
    /// Summarize the latest snapshot in an output file.
    Report(ReportArgs),
}

#[derive(Args)]
pub struct ReportArgs {
    /// Snapshot file written by `run`.
    #[arg(
        long,
        env = "LISTING_STREAM_OUTPUT",
        value_hint = ValueHint::FilePath,
        default_value = DEFAULT_OUTPUT_PATH
    )]
    pub output: PathBuf,

    /// Only include these districts.  May be repeated.
    #[arg(long = "district")]
    pub districts: Vec<String>,

    /// Only include these property types.  May be repeated.
    #[arg(long = "property-type")]
    pub property_types: Vec<String>,
}
