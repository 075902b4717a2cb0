//! Test framework for the `listing-stream` crate.

use crate::model::Record;
use csv::WriterBuilder as CsvWriterBuilder;
use tempfile::NamedTempFile;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub(crate) fn init_test_logger() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("info"))
                .unwrap(),
        )
        .try_init();
}

/// Writes `records` to a temporary CSV dataset with a header row.
pub(crate) fn write_dataset(records: &[Record]) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let mut writer = CsvWriterBuilder::new()
        .has_headers(true)
        .from_writer(file.as_file());
    for record in records {
        writer.serialize(record).unwrap();
    }
    writer.flush().unwrap();
    drop(writer);
    file
}
