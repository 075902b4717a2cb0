//! The global aggregate and the arithmetic used to fold batches into it.

use crate::config::MergePolicy;
use crate::model::{AggregateKey, AggregateRow, SnapshotRow};
use std::collections::BTreeMap;

/// Aggregate rows in key order.
pub type AggregateTable = BTreeMap<AggregateKey, AggregateRow>;

/// Arithmetic mean that skips undefined values.
///
/// The mean of no defined values is `NaN`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mean {
    sum: f64,
    weight: f64,
}

impl Mean {
    pub fn push(&mut self, value: Option<f64>) {
        self.push_weighted(value, 1.0);
    }

    /// Adds `value` as if it had been pushed `weight` times.
    pub fn push_weighted(&mut self, value: Option<f64>, weight: f64) {
        if let Some(value) = value.filter(|v| !v.is_nan()) {
            self.sum += value * weight;
            self.weight += weight;
        }
    }

    pub fn value(&self) -> f64 {
        if self.weight == 0.0 {
            f64::NAN
        } else {
            self.sum / self.weight
        }
    }
}

fn defined(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Folds rows for the same key into one.
struct RowMerger {
    policy: MergePolicy,
    price: Mean,
    area: Mean,
    count: u64,
    price_per_sqm: Mean,
}

impl RowMerger {
    fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            price: Mean::default(),
            area: Mean::default(),
            count: 0,
            price_per_sqm: Mean::default(),
        }
    }

    fn push(&mut self, row: &AggregateRow) {
        let weight = match self.policy {
            MergePolicy::MeanOfMeans => 1.0,
            MergePolicy::CountWeighted => row.count as f64,
        };
        self.price.push_weighted(defined(row.avg_price), weight);
        self.area.push_weighted(defined(row.avg_area), weight);
        self.price_per_sqm
            .push_weighted(defined(row.avg_price_per_sqm), weight);
        self.count += row.count;
    }

    fn finish(&self) -> AggregateRow {
        AggregateRow {
            avg_price: self.price.value(),
            avg_area: self.area.value(),
            count: self.count,
            avg_price_per_sqm: self.price_per_sqm.value(),
        }
    }
}

/// Statistics accumulated over every batch processed so far.
///
/// Owned by the stream handler; other workers only see copies.
#[derive(Clone, Debug, Default)]
pub struct GlobalAggregate {
    policy: MergePolicy,
    rows: AggregateTable,
}

impl GlobalAggregate {
    pub fn new(policy: MergePolicy) -> Self {
        Self {
            policy,
            rows: AggregateTable::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, key: &AggregateKey) -> Option<&AggregateRow> {
        self.rows.get(key)
    }

    pub fn rows(&self) -> &AggregateTable {
        &self.rows
    }

    /// Merges the per-batch rows of one batch into the aggregate.
    ///
    /// Each key present in `batch` is regrouped from the existing row and the
    /// new one: counts are summed and averages are combined according to the
    /// merge policy.  Under [`MergePolicy::MeanOfMeans`] a batch of one
    /// listing moves an average as far as a batch of a thousand.  Keys absent
    /// from `batch` are left untouched.
    pub fn merge(&mut self, batch: AggregateTable) {
        for (key, new_row) in batch {
            let mut merger = RowMerger::new(self.policy);
            if let Some(old_row) = self.rows.get(&key) {
                merger.push(old_row);
            }
            merger.push(&new_row);
            self.rows.insert(key, merger.finish());
        }
    }

    /// Output rows in key order.
    pub fn snapshot_rows(&self) -> Vec<SnapshotRow> {
        self.rows
            .iter()
            .map(|(key, row)| SnapshotRow::new(key, row))
            .collect()
    }
}
