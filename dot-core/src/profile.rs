//! Statistical profiles of snapshot data.
//!
//! A [`DataProfile`] stands in for the full snapshot when the data is too
//! large to send: numeric sequences become a range and mean, other sequences
//! become their most frequent values, and scalars are echoed as a sample.

use crate::types::DotData;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Disclaimer attached to profiles built from sampled data.
pub const SAMPLED_NOTE: &str = "data is sampled, not full dataset";

/// Maximum number of categories reported per field.
pub const TOP_CATEGORY_LIMIT: usize = 5;

/// Maximum number of representative rows in a profile.
pub const SAMPLED_ROW_LIMIT: usize = 3;

/// Occurrence count of one categorical value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

/// Summary of one top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProfile {
    pub key: String,
    /// `"array"` for sequences, otherwise the scalar type name
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_categories: Option<Vec<CategoryCount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_values: Option<Vec<Value>>,
}

impl FieldProfile {
    fn new(key: &str, type_tag: &str) -> Self {
        Self {
            key: key.to_string(),
            type_tag: type_tag.to_string(),
            row_count: None,
            min: None,
            max: None,
            avg: None,
            top_categories: None,
            sample_values: None,
        }
    }
}

/// Bounded summary of a whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataProfile {
    pub fields: Vec<FieldProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampled_rows: Option<Vec<DotData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Profile every top-level field of `data`.
///
/// `sampled` marks the profile as describing sampled data, which attaches
/// [`SAMPLED_NOTE`].
pub fn profile(data: &DotData, sampled: bool) -> DataProfile {
    let mut fields = Vec::with_capacity(data.len());
    let mut sampled_rows = None;

    for (key, value) in data {
        match value {
            Value::Array(items) => {
                fields.push(profile_sequence(key, items));
                // Only one field supplies sample rows; a later qualifying field
                // replaces an earlier one.
                if let Some(Value::Object(_)) = items.first() {
                    let rows: Vec<DotData> = items
                        .iter()
                        .filter_map(Value::as_object)
                        .take(SAMPLED_ROW_LIMIT)
                        .cloned()
                        .collect();
                    sampled_rows = Some(rows);
                }
            }
            scalar => {
                let mut field = FieldProfile::new(key, scalar_type_name(scalar));
                field.sample_values = Some(vec![scalar.clone()]);
                fields.push(field);
            }
        }
    }

    DataProfile {
        fields,
        sampled_rows,
        note: sampled.then(|| SAMPLED_NOTE.to_string()),
    }
}

fn profile_sequence(key: &str, items: &[Value]) -> FieldProfile {
    let mut field = FieldProfile::new(key, "array");
    field.row_count = Some(items.len());
    if items.is_empty() {
        return field;
    }

    let numbers: Vec<f64> = items.iter().filter_map(Value::as_f64).collect();
    if numbers.len() == items.len() {
        let sum: f64 = numbers.iter().sum();
        field.min = numbers.iter().copied().reduce(f64::min);
        field.max = numbers.iter().copied().reduce(f64::max);
        field.avg = Some(sum / numbers.len() as f64);
        return field;
    }

    field.top_categories = Some(top_categories(items));
    field
}

/// Most frequent values, highest count first. Ties keep first-seen order.
fn top_categories(items: &[Value]) -> Vec<CategoryCount> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for item in items {
        *counts.entry(category_text(item)).or_insert(0) += 1;
    }

    let mut ranked: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(value, count)| CategoryCount { value, count })
        .collect();
    // Stable sort: equal counts stay in encounter order
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_CATEGORY_LIMIT);
    ranked
}

fn category_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn scalar_type_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null | Value::Object(_) | Value::Array(_) => "object",
    }
}
