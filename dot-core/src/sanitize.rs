//! Sanitization of host values into a serializable, acyclic JSON tree.
//!
//! Dispatch is a single match over [`HostValue`] variants. Containers are
//! tracked on the recursion stack by identity: a container met again inside
//! its own subtree becomes [`CIRCULAR_MARKER`], while siblings that share a
//! container are serialized in full.

use crate::host::HostValue;
use crate::types::DotData;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Replacement text for a container revisited inside its own subtree.
pub const CIRCULAR_MARKER: &str = "[Circular]";

/// Largest integer a JSON number (IEEE-754 double) represents exactly.
pub const MAX_SAFE_INTEGER: i128 = 9_007_199_254_740_991;

/// Sanitize a single value. `None` means the value is absent and should be
/// omitted by the enclosing container.
pub fn sanitize(value: &HostValue) -> Option<Value> {
    Sanitizer::default().sanitize(value)
}

/// Sanitize a whole host snapshot into a key-value mapping.
pub fn sanitize_data(value: &HostValue) -> DotData {
    match sanitize(value) {
        Some(Value::Object(fields)) => fields,
        Some(other) => {
            tracing::warn!(
                kind = json_kind(&other),
                "Host snapshot is not a mapping, using empty data"
            );
            Map::new()
        }
        None => Map::new(),
    }
}

/// Recursion state for one sanitize pass.
#[derive(Debug, Default)]
pub struct Sanitizer {
    /// Containers on the current recursion path
    visiting: HashSet<usize>,
}

impl Sanitizer {
    pub fn sanitize(&mut self, value: &HostValue) -> Option<Value> {
        match value {
            HostValue::Undefined | HostValue::Function | HostValue::Symbol(_) => None,
            HostValue::Null => Some(Value::Null),
            HostValue::Bool(b) => Some(Value::Bool(*b)),
            HostValue::Number(n) => Some(number(*n)),
            HostValue::BigInt(n) => Some(big_int(*n)),
            HostValue::String(s) => Some(Value::String(s.clone())),
            HostValue::Date(d) => Some(Value::String(timestamp(d))),
            HostValue::Array(items) | HostValue::Set(items) => {
                self.within(value, |s| Value::Array(s.sequence(&items.borrow())))
            }
            HostValue::Map(entries) => self.within(value, |s| {
                let mut fields = Map::new();
                for (key, entry) in entries.borrow().iter() {
                    let Some(key) = s.key_text(key) else {
                        continue;
                    };
                    if let Some(entry) = s.sanitize(entry) {
                        fields.insert(key, entry);
                    }
                }
                Value::Object(fields)
            }),
            HostValue::Object(_) if value.is_element() => None,
            HostValue::Object(record) => self.within(value, |s| {
                let mut fields = Map::new();
                for (key, field) in record.borrow().iter() {
                    if let Some(field) = s.sanitize(field) {
                        fields.insert(key.clone(), field);
                    }
                }
                Value::Object(fields)
            }),
        }
    }

    /// Run `f` with `value` marked as visiting, or emit the circular marker
    /// when `value` is already an ancestor.
    fn within(&mut self, value: &HostValue, f: impl FnOnce(&mut Self) -> Value) -> Option<Value> {
        let id = value.container_id()?;
        if !self.visiting.insert(id) {
            return Some(Value::String(CIRCULAR_MARKER.to_string()));
        }
        let out = f(self);
        self.visiting.remove(&id);
        Some(out)
    }

    fn sequence(&mut self, items: &[HostValue]) -> Vec<Value> {
        items.iter().filter_map(|item| self.sanitize(item)).collect()
    }

    fn key_text(&mut self, key: &HostValue) -> Option<String> {
        match self.sanitize(key)? {
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

fn number(n: f64) -> Value {
    if !n.is_finite() {
        return Value::Null;
    }
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
        return Value::from(n as i64);
    }
    Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

fn big_int(n: i128) -> Value {
    if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n) {
        Value::from(n as i64)
    } else {
        Value::String(n.to_string())
    }
}

/// UTC timestamp with millisecond precision, e.g. `2024-01-02T03:04:05.678Z`.
pub fn timestamp(d: &DateTime<Utc>) -> String {
    d.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
