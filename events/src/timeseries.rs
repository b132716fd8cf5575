//! Per-image region reductions, as returned by the service.

use crate::error::CollectionError;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::io::Write;

/// Property each reduced feature carries its formatted date in.
pub const DATE_PROPERTY: &str = "date";

/// Service side pattern producing [`DATE_FORMAT`] strings.
pub const DATE_PATTERN: &str = "YYYY-MM-dd";

/// chrono equivalent of [`DATE_PATTERN`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns the property maps of every feature in a materialized
/// feature collection.
fn feature_properties(collection: &Value) -> Result<Vec<&Map<String, Value>>, CollectionError> {
    let features = collection
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| CollectionError::Reduction("missing 'features' array".into()))?;
    features
        .iter()
        .map(|feature| {
            feature
                .get("properties")
                .and_then(Value::as_object)
                .ok_or_else(|| CollectionError::Reduction("feature without properties".into()))
        })
        .collect()
}

/// A `(date, value)` pair per feature, in the order the service
/// returned them.
///
/// Features without a date or without any other property are
/// skipped. The value is the first non-date property.
pub fn series_points(collection: &Value) -> Result<Vec<(String, Option<f64>)>, CollectionError> {
    let mut points = Vec::new();
    for props in feature_properties(collection)? {
        let Some(date) = props.get(DATE_PROPERTY) else {
            continue;
        };
        if props.len() < 2 {
            continue;
        }
        let date = date
            .as_str()
            .ok_or_else(|| CollectionError::Reduction(format!("non-string date {date}")))?;
        let value = props
            .iter()
            .find(|(k, _)| k.as_str() != DATE_PROPERTY)
            .and_then(|(_, v)| v.as_f64());
        points.push((date.to_owned(), value));
    }
    Ok(points)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,

    /// One entry per [`TimeSeries::columns`], `Null` where the
    /// feature lacked that property.
    pub values: Vec<Value>,
}

/// Table of reduced values, one row per image, sorted by date.
///
/// Rows sharing a date are all kept, in retrieval order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    columns: Vec<String>,
    rows: Vec<TimeSeriesRow>,
}

impl TimeSeries {
    pub fn from_features(collection: &Value) -> Result<Self, CollectionError> {
        let mut columns: Vec<String> = Vec::new();
        let mut records = Vec::new();
        for props in feature_properties(collection)? {
            let Some(date) = props.get(DATE_PROPERTY) else {
                continue;
            };
            let date = parse_date(date)?;
            for key in props.keys() {
                if key != DATE_PROPERTY && !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
            records.push((date, props));
        }

        let mut rows: Vec<TimeSeriesRow> = records
            .into_iter()
            .map(|(date, props)| TimeSeriesRow {
                date,
                values: columns
                    .iter()
                    .map(|c| props.get(c).cloned().unwrap_or(Value::Null))
                    .collect(),
            })
            .collect();
        rows.sort_by_key(|row| row.date);

        Ok(Self { columns, rows })
    }

    /// Value column names, excluding the date.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[TimeSeriesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `(date, value)` for column `name`, with non-numeric
    /// cells as `None`.
    pub fn column(&self, name: &str) -> Option<Vec<(NaiveDate, Option<f64>)>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(
            self.rows
                .iter()
                .map(|row| (row.date, row.values[idx].as_f64()))
                .collect(),
        )
    }

    /// Writes a header of `date` plus the value columns, then one
    /// record per row.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<(), CollectionError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(std::iter::once(DATE_PROPERTY).chain(self.columns.iter().map(String::as_str)))?;
        for row in &self.rows {
            let date = row.date.format(DATE_FORMAT).to_string();
            let cells = row.values.iter().map(|v| match v {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
            wtr.write_record(std::iter::once(date).chain(cells))?;
        }
        wtr.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    fn records(&self) -> impl Iterator<Item = Map<String, Value>> + '_ {
        self.rows.iter().map(|row| {
            let mut record = Map::new();
            record.insert(
                DATE_PROPERTY.to_owned(),
                Value::String(row.date.format(DATE_FORMAT).to_string()),
            );
            for (column, value) in self.columns.iter().zip(&row.values) {
                record.insert(column.clone(), value.clone());
            }
            record
        })
    }
}

/// Serializes as a list of `{ "date": ..., <column>: ... }` records.
impl Serialize for TimeSeries {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records())
    }
}

fn parse_date(value: &Value) -> Result<NaiveDate, CollectionError> {
    let text = value
        .as_str()
        .ok_or_else(|| CollectionError::Reduction(format!("non-string date {value}")))?;
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|source| CollectionError::Date {
        value: text.to_owned(),
        source,
    })
}
