//! Reads the snapshot log written by the persister and summarizes it.
//!
//! The output file holds one block of rows per persistence cycle.  Rows
//! inside a block are in strictly increasing key order, and keys never leave
//! the aggregate, so a row whose key does not sort after its predecessor
//! starts a new block.
//!
//! That rule only holds within one `run`.  When a later run appends to an
//! existing file and its first key sorts after the last key of the previous
//! run, the two snapshots read back as one block, and the latest snapshot
//! mixes rows from both runs.  Use a fresh output file per run to avoid it.

use crate::aggregate::Mean;
use crate::error::ReportError;
use crate::model::SnapshotRow;
use csv::ReaderBuilder as CsvReaderBuilder;
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;

/// Reads every snapshot block from `path`, oldest first.
///
/// A missing or empty file has no snapshots.
pub fn read_snapshots(path: &Path) -> Result<Vec<Vec<SnapshotRow>>, ReportError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let read_error = |error| ReportError::Read {
        path: path.to_path_buf(),
        error,
    };

    let mut reader = CsvReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_path(path)
        .map_err(read_error)?;

    let mut blocks: Vec<Vec<SnapshotRow>> = Vec::new();
    for row in reader.deserialize::<SnapshotRow>() {
        let row = row.map_err(read_error)?;
        let continues_block = blocks
            .last()
            .and_then(|block| block.last())
            .is_some_and(|prev| prev.key() < row.key());
        match blocks.last_mut() {
            Some(block) if continues_block => block.push(row),
            _ => blocks.push(vec![row]),
        }
    }
    Ok(blocks)
}

/// The most recent snapshot in `path`, if any.
pub fn latest_snapshot(path: &Path) -> Result<Option<Vec<SnapshotRow>>, ReportError> {
    Ok(read_snapshots(path)?.pop())
}

/// Restricts a summary to some districts and property types.  An empty list
/// matches everything.
#[derive(Clone, Debug, Default)]
pub struct SummaryFilter {
    pub districts: Vec<String>,
    pub property_types: Vec<String>,
}

impl SummaryFilter {
    fn matches(&self, row: &SnapshotRow) -> bool {
        (self.districts.is_empty() || self.districts.contains(&row.district))
            && (self.property_types.is_empty() || self.property_types.contains(&row.property_type))
    }
}

/// Key metrics over the rows of one snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Summary {
    pub rows: usize,
    pub avg_price: f64,
    pub avg_area: f64,
    pub avg_price_per_sqm: f64,
    pub listings: u64,
}

impl Summary {
    pub fn new(snapshot: &[SnapshotRow], filter: &SummaryFilter) -> Self {
        let mut price = Mean::default();
        let mut area = Mean::default();
        let mut price_per_sqm = Mean::default();
        let mut rows = 0;
        let mut listings = 0;

        for row in snapshot.iter().filter(|row| filter.matches(row)) {
            price.push(Some(row.avg_price));
            area.push(Some(row.avg_area));
            price_per_sqm.push(Some(row.avg_price_per_sqm));
            rows += 1;
            listings += row.count;
        }

        Self {
            rows,
            avg_price: price.value(),
            avg_area: area.value(),
            avg_price_per_sqm: price_per_sqm.value(),
            listings,
        }
    }

    /// Renders the summary followed by the snapshot rows it covers.
    pub fn render(&self, snapshot: &[SnapshotRow], filter: &SummaryFilter) -> String {
        let metrics = vec![
            ["Average Price (EUR)".to_string(), format_amount(self.avg_price)],
            ["Average Area (m²)".to_string(), format_amount(self.avg_area)],
            ["Price per m² (EUR)".to_string(), format_amount(self.avg_price_per_sqm)],
            ["Listings".to_string(), self.listings.to_string()],
        ];

        let mut rows = vec![[
            "District".to_string(),
            "Property Type".to_string(),
            "Avg Price".to_string(),
            "Avg Area".to_string(),
            "Count".to_string(),
            "Avg Price/m²".to_string(),
        ]];
        for row in snapshot.iter().filter(|row| filter.matches(row)) {
            rows.push([
                row.district.clone(),
                row.property_type.clone(),
                format_amount(row.avg_price),
                format_amount(row.avg_area),
                row.count.to_string(),
                format_amount(row.avg_price_per_sqm),
            ]);
        }

        format!(
            "{}\n{}",
            Builder::from_iter(metrics).build().with(Style::rounded()),
            Builder::from_iter(rows).build().with(Style::rounded())
        )
    }
}

fn format_amount(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{value:.0}")
    }
}
