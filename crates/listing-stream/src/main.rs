//! Command-line entry point for the listing stream pipeline.

use anyhow::Result as AnyResult;
use clap::Parser;
use listing_stream::logging::init_logging;
use listing_stream::report::{latest_snapshot, Summary, SummaryFilter};
use listing_stream::Pipeline;
use tracing::{info, warn};

mod cli;

use crate::cli::{Cli, Commands, ReportArgs};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(config) => {
            info!(?config, "starting pipeline");
            let report = Pipeline::new(config).run().await?;
            println!(
                "streamed {} records, aggregated {} batches, wrote {} snapshots",
                report.records_streamed,
                report.handler.batches_processed,
                report.snapshots_written
            );
        }
        Commands::Report(args) => report(args)?,
    }
    Ok(())
}

fn report(args: ReportArgs) -> AnyResult<()> {
    let Some(snapshot) = latest_snapshot(&args.output)? else {
        warn!(output = %args.output.display(), "no snapshot available yet");
        println!("No data available yet in `{}`.", args.output.display());
        return Ok(());
    };

    let filter = SummaryFilter {
        districts: args.districts,
        property_types: args.property_types,
    };
    let summary = Summary::new(&snapshot, &filter);
    println!("{}", summary.render(&snapshot, &filter));
    Ok(())
}
