//! Filtering and grouping of one buffered batch.

use crate::aggregate::{AggregateTable, Mean};
use crate::model::{AggregateKey, AggregateRow, Record};
use std::collections::BTreeMap;

#[derive(Default)]
struct GroupAccumulator {
    price: Mean,
    area: Mean,
    count: u64,
    price_per_sqm: Mean,
}

impl GroupAccumulator {
    fn push(&mut self, record: &Record) {
        self.price.push(record.price);
        self.area.push(record.living_area);
        self.count += 1;
        self.price_per_sqm.push(record.price_per_area());
    }

    fn finish(self) -> AggregateRow {
        AggregateRow {
            avg_price: self.price.value(),
            avg_area: self.area.value(),
            count: self.count,
            avg_price_per_sqm: self.price_per_sqm.value(),
        }
    }
}

/// Computes per-key statistics over the records of `batch` that pass the
/// filter.
///
/// Records with an empty district or property type have no key and are
/// dropped.  Every other filtered record adds one to the count of exactly
/// one row.
pub fn process_batch(batch: &[Record]) -> AggregateTable {
    let mut groups: BTreeMap<AggregateKey, GroupAccumulator> = BTreeMap::new();

    for record in batch.iter().filter(|record| record.passes_filter()) {
        if record.district.is_empty() || record.property_type.is_empty() {
            continue;
        }
        groups.entry(record.key()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, group)| (key, group.finish()))
        .collect()
}
