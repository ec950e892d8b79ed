//! Versioned dashboard specifications.
//!
//! A [`DashboardSpec`] is the only thing the rest of the system trusts from a
//! backend. It is produced by [`parse_spec`], which extracts JSON from free
//! text and checks it field by field; anything less than a fully valid spec
//! is rejected.

mod catalog;
mod validate;

pub use catalog::dashboard_schema;
pub use validate::{extract_json_text, parse_spec, validate_spec, SpecError};

use crate::types::DotData;
use serde::{Deserialize, Serialize};

/// The only spec version this crate accepts.
pub const SPEC_VERSION: &str = "0.1";

/// A complete dashboard description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSpec {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    pub widgets: Vec<WidgetSpec>,
}

impl DashboardSpec {
    /// Title for display, `"Untitled"` when the backend gave none.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    /// Drop widgets beyond `max`. Returns true if any were dropped.
    pub fn truncate_widgets(&mut self, max: usize) -> bool {
        if self.widgets.len() <= max {
            return false;
        }
        self.widgets.truncate(max);
        true
    }
}

/// Grid layout hint; `columns` is 1 or 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub columns: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<Gap>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gap {
    Sm,
    Md,
    Lg,
}

/// One renderable unit, tagged by `type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WidgetSpec {
    Kpi(KpiWidget),
    Table(TableWidget),
    Bar(ChartWidget),
    Line(ChartWidget),
    Markdown(MarkdownWidget),
}

impl WidgetSpec {
    /// Wire name of the widget type.
    pub fn kind(&self) -> &'static str {
        match self {
            WidgetSpec::Kpi(_) => "kpi",
            WidgetSpec::Table(_) => "table",
            WidgetSpec::Bar(_) => "bar",
            WidgetSpec::Line(_) => "line",
            WidgetSpec::Markdown(_) => "markdown",
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            WidgetSpec::Kpi(w) => Some(&w.title),
            WidgetSpec::Table(w) => Some(&w.title),
            WidgetSpec::Bar(w) | WidgetSpec::Line(w) => Some(&w.title),
            WidgetSpec::Markdown(w) => w.title.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiWidget {
    pub title: String,
    pub items: Vec<KpiItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiItem {
    pub label: String,
    pub value: KpiValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A KPI reading: either a number or preformatted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KpiValue {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableWidget {
    pub title: String,
    pub columns: Vec<TableColumn>,
    pub rows: Vec<DotData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_rows: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub key: String,
    pub label: String,
}

/// Shared shape of bar and line charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartWidget {
    pub title: String,
    pub x_key: String,
    pub y_key: String,
    pub data: Vec<DotData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkdownWidget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
}
