//! Reads the listings dataset.

use crate::{error::SourceError, model::Record};
use csv::ReaderBuilder as CsvReaderBuilder;
use std::path::Path;

/// Reads every record of the dataset at `path`, in file order.
///
/// The first row must be a header naming at least the `District`, `Type`,
/// `Price` and `LivingArea` columns.  The first malformed row fails the whole
/// read.
pub fn read_dataset(path: &Path) -> Result<Vec<Record>, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let read_error = |error| SourceError::Read {
        path: path.to_path_buf(),
        error,
    };

    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(read_error)?;

    reader
        .deserialize::<Record>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)
}

/// Reads the dataset on the blocking thread pool.
pub async fn read_dataset_async(path: &Path) -> Result<Vec<Record>, SourceError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_dataset(&path)).await?
}

#[cfg(test)]
mod test {
    use super::read_dataset;
    use crate::error::SourceError;
    use crate::model::Record;
    use crate::test::write_dataset;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_in_file_order() {
        let records = vec![
            Record::new("A", "House", 60_000.0, 30.0),
            Record::new("B", "Flat", 5_000.0, 10.0),
            Record::new("A", "House", 80_000.0, 40.0),
        ];
        let file = write_dataset(&records);
        assert_eq!(read_dataset(file.path()).unwrap(), records);
    }

    #[test]
    fn ignores_extra_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Id,District,Type,Price,LivingArea,Rooms").unwrap();
        writeln!(file, "1,Lisboa,Apartment,250000,80,3").unwrap();
        file.flush().unwrap();

        let records = read_dataset(file.path()).unwrap();
        assert_eq!(
            records,
            vec![Record::new("Lisboa", "Apartment", 250_000.0, 80.0)]
        );
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dataset(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, SourceError::NotFound { .. }));
    }

    #[test]
    fn malformed_row_fails_the_read() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "District,Type,Price,LivingArea").unwrap();
        writeln!(file, "Lisboa,Apartment,250000,80").unwrap();
        writeln!(file, "Porto,Flat").unwrap();
        file.flush().unwrap();

        let err = read_dataset(file.path()).unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }), "{err}");
    }
}
