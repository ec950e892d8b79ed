//! Host values: the live, in-memory data an application hands to dot.
//!
//! Hosts describe their state as a [`HostValue`] tree. Containers are shared
//! cells, so a host can hand over graphs with shared or self-referential
//! nodes; the sanitizer tracks container identity to stay finite.
//!
//! ```rust
//! use dot_core::HostValue;
//!
//! let order = HostValue::object([("id", HostValue::from(7)), ("total", HostValue::from(19.5))]);
//! let state = HostValue::object([("orders", HostValue::array([order]))]);
//! assert!(state.is_container());
//! ```

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Field that marks an object as an opaque UI element (never serialized).
pub const ELEMENT_MARKER: &str = "$$typeof";

/// Shared, mutable container cell.
pub type Shared<T> = Rc<RefCell<T>>;

/// String-keyed record, insertion ordered.
pub type Record = IndexMap<String, HostValue>;

/// Pulls the current host state on demand.
pub type Selector = std::sync::Arc<dyn Fn() -> HostValue + Send + Sync>;

/// An arbitrary value from the host application.
#[derive(Clone)]
pub enum HostValue {
    /// Absent value; omitted from mappings.
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    /// Integer that may exceed the range a JSON number can carry exactly.
    BigInt(i128),
    String(String),
    Date(DateTime<Utc>),
    /// A callable. Dropped on sanitize.
    Function,
    /// Opaque identifier with an optional description. Dropped on sanitize.
    Symbol(String),
    Array(Shared<Vec<HostValue>>),
    /// Unique-value container, kept in iteration order.
    Set(Shared<Vec<HostValue>>),
    /// Associative container whose keys may be any value.
    Map(Shared<Vec<(HostValue, HostValue)>>),
    Object(Shared<Record>),
}

fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

impl HostValue {
    /// Build a plain record from `(key, value)` pairs.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, HostValue)>,
        K: Into<String>,
    {
        let record = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        HostValue::Object(shared(record))
    }

    pub fn array<I: IntoIterator<Item = HostValue>>(items: I) -> Self {
        HostValue::Array(shared(items.into_iter().collect()))
    }

    pub fn set<I: IntoIterator<Item = HostValue>>(items: I) -> Self {
        HostValue::Set(shared(items.into_iter().collect()))
    }

    pub fn map<I: IntoIterator<Item = (HostValue, HostValue)>>(entries: I) -> Self {
        HostValue::Map(shared(entries.into_iter().collect()))
    }

    /// Insert a field into an object. Returns false for non-objects.
    pub fn insert(&self, key: impl Into<String>, value: HostValue) -> bool {
        match self {
            HostValue::Object(record) => {
                record.borrow_mut().insert(key.into(), value);
                true
            }
            _ => false,
        }
    }

    /// Append to an array or set. Returns false for other values.
    pub fn push(&self, value: HostValue) -> bool {
        match self {
            HostValue::Array(items) | HostValue::Set(items) => {
                items.borrow_mut().push(value);
                true
            }
            _ => false,
        }
    }

    /// Identity of the underlying container cell, if this is a container.
    pub fn container_id(&self) -> Option<usize> {
        match self {
            HostValue::Array(cell) | HostValue::Set(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            HostValue::Map(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            HostValue::Object(cell) => Some(Rc::as_ptr(cell) as *const () as usize),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.container_id().is_some()
    }

    /// True for objects carrying the UI element marker field.
    pub fn is_element(&self) -> bool {
        match self {
            HostValue::Object(record) => record.borrow().contains_key(ELEMENT_MARKER),
            _ => false,
        }
    }
}

// Containers print shallowly: a derived impl would recurse forever on cycles.
impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "Undefined"),
            HostValue::Null => write!(f, "Null"),
            HostValue::Bool(b) => write!(f, "Bool({b})"),
            HostValue::Number(n) => write!(f, "Number({n})"),
            HostValue::BigInt(n) => write!(f, "BigInt({n})"),
            HostValue::String(s) => write!(f, "String({s:?})"),
            HostValue::Date(d) => write!(f, "Date({})", d.to_rfc3339()),
            HostValue::Function => write!(f, "Function"),
            HostValue::Symbol(s) => write!(f, "Symbol({s:?})"),
            HostValue::Array(items) => write!(f, "Array(len={})", items.borrow().len()),
            HostValue::Set(items) => write!(f, "Set(len={})", items.borrow().len()),
            HostValue::Map(entries) => write!(f, "Map(len={})", entries.borrow().len()),
            HostValue::Object(record) => {
                let record = record.borrow();
                let keys: Vec<&str> = record.keys().map(String::as_str).collect();
                write!(f, "Object({keys:?})")
            }
        }
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Number(f64::from(value))
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::BigInt(i128::from(value))
    }
}

impl From<u64> for HostValue {
    fn from(value: u64) -> Self {
        HostValue::BigInt(i128::from(value))
    }
}

impl From<i128> for HostValue {
    fn from(value: i128) -> Self {
        HostValue::BigInt(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<DateTime<Utc>> for HostValue {
    fn from(value: DateTime<Utc>) -> Self {
        HostValue::Date(value)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(HostValue::Null)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(value: Vec<T>) -> Self {
        HostValue::array(value.into_iter().map(Into::into))
    }
}

impl From<serde_json::Value> for HostValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    HostValue::BigInt(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    HostValue::BigInt(i128::from(u))
                } else {
                    HostValue::Number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => HostValue::String(s),
            Value::Array(items) => HostValue::array(items.into_iter().map(HostValue::from)),
            Value::Object(fields) => {
                HostValue::object(fields.into_iter().map(|(k, v)| (k, HostValue::from(v))))
            }
        }
    }
}
