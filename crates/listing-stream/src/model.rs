//! Records read from the listings dataset and the aggregate rows derived
//! from them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Listings priced at or above this amount pass the batch filter.
pub const MIN_PRICE: f64 = 50_000.0;

/// Listings with at least this living area pass the batch filter.
pub const MIN_LIVING_AREA: f64 = 20.0;

/// One listing from the source dataset.
///
/// Columns other than the four below are ignored.  Numeric cells that are
/// empty or cannot be parsed are read as `None`, which never passes a
/// comparison and is skipped by every mean.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Record {
    #[serde(rename = "District")]
    pub district: String,

    #[serde(rename = "Type")]
    pub property_type: String,

    #[serde(rename = "Price", deserialize_with = "missing_as_none")]
    pub price: Option<f64>,

    #[serde(rename = "LivingArea", deserialize_with = "missing_as_none")]
    pub living_area: Option<f64>,
}

impl Record {
    pub fn new(
        district: impl Into<String>,
        property_type: impl Into<String>,
        price: f64,
        living_area: f64,
    ) -> Self {
        Self {
            district: district.into(),
            property_type: property_type.into(),
            price: Some(price),
            living_area: Some(living_area),
        }
    }

    /// Whether the record takes part in aggregation.
    ///
    /// A missing value compares false, so it can only pass through the
    /// other attribute.
    pub fn passes_filter(&self) -> bool {
        self.price.is_some_and(|price| price >= MIN_PRICE)
            || self.living_area.is_some_and(|area| area >= MIN_LIVING_AREA)
    }

    /// Price divided by living area, or `None` when the area is not
    /// positive or either value is missing.
    pub fn price_per_area(&self) -> Option<f64> {
        match (self.price, self.living_area) {
            (Some(price), Some(area)) if area > 0.0 => Some(price / area),
            _ => None,
        }
    }

    pub fn key(&self) -> AggregateKey {
        AggregateKey::new(self.district.clone(), self.property_type.clone())
    }
}

/// Reads a numeric cell, mapping empty, unparsable and NaN cells to `None`.
fn missing_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = csv::invalid_option(deserializer)?;
    Ok(value.filter(|v: &f64| !v.is_nan()))
}

/// Identifies one statistical bucket.
///
/// Keys order by district, then by property type, which is also the order
/// in which snapshot rows are written.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateKey {
    pub district: String,
    pub property_type: String,
}

impl AggregateKey {
    pub fn new(district: impl Into<String>, property_type: impl Into<String>) -> Self {
        Self {
            district: district.into(),
            property_type: property_type.into(),
        }
    }
}

impl fmt::Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.district, self.property_type)
    }
}

/// Statistics for one [`AggregateKey`].
///
/// An average is `NaN` when none of the contributing values were defined.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateRow {
    pub avg_price: f64,
    pub avg_area: f64,
    pub count: u64,
    pub avg_price_per_sqm: f64,
}

/// A row of the output file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    #[serde(rename = "District")]
    pub district: String,

    #[serde(rename = "Property_Type")]
    pub property_type: String,

    #[serde(
        rename = "Avg_Price",
        serialize_with = "nan_as_empty",
        deserialize_with = "empty_as_nan"
    )]
    pub avg_price: f64,

    #[serde(
        rename = "Avg_Area",
        serialize_with = "nan_as_empty",
        deserialize_with = "empty_as_nan"
    )]
    pub avg_area: f64,

    #[serde(rename = "Count")]
    pub count: u64,

    #[serde(
        rename = "Avg_Price_per_Sqm",
        serialize_with = "nan_as_empty",
        deserialize_with = "empty_as_nan"
    )]
    pub avg_price_per_sqm: f64,
}

impl SnapshotRow {
    pub fn new(key: &AggregateKey, row: &AggregateRow) -> Self {
        Self {
            district: key.district.clone(),
            property_type: key.property_type.clone(),
            avg_price: row.avg_price,
            avg_area: row.avg_area,
            count: row.count,
            avg_price_per_sqm: row.avg_price_per_sqm,
        }
    }

    pub fn key(&self) -> AggregateKey {
        AggregateKey::new(self.district.clone(), self.property_type.clone())
    }
}

/// Undefined averages are written as empty cells.
fn nan_as_empty<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_nan() {
        serializer.serialize_none()
    } else {
        serializer.serialize_f64(*value)
    }
}

fn empty_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
