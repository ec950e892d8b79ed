//! Extraction and validation of specs from raw backend text.

use super::{DashboardSpec, Gap, Layout, WidgetSpec, SPEC_VERSION};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[\w+-]*\s*(.*?)```").expect("valid regex"));

/// Why a candidate spec was rejected.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("spec must be a JSON object")]
    NotAnObject,

    #[error("spec is missing `version`")]
    MissingVersion,

    #[error("unsupported spec version {0} (expected \"0.1\")")]
    UnsupportedVersion(String),

    #[error("spec is missing a `widgets` array")]
    MissingWidgets,

    #[error("widget {index} is invalid: {reason}")]
    InvalidWidget { index: usize, reason: String },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("spec title must be a string")]
    InvalidTitle,
}

/// Pull the JSON candidate out of backend text.
///
/// The interior of the first fenced code block wins (any language tag);
/// otherwise the whole text is used. The result is trimmed.
pub fn extract_json_text(raw: &str) -> &str {
    FENCED_BLOCK
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str())
        .trim()
}

/// Extract, parse and validate a spec from raw backend text.
pub fn parse_spec(raw: &str) -> Result<DashboardSpec, SpecError> {
    let candidate = extract_json_text(raw);
    let value: Value = serde_json::from_str(candidate)?;
    validate_spec(&value)
}

/// Validate a parsed JSON value as a [`DashboardSpec`], all or nothing.
pub fn validate_spec(value: &Value) -> Result<DashboardSpec, SpecError> {
    let obj = value.as_object().ok_or(SpecError::NotAnObject)?;

    match obj.get("version") {
        None => return Err(SpecError::MissingVersion),
        Some(Value::String(v)) if v == SPEC_VERSION => {}
        Some(other) => return Err(SpecError::UnsupportedVersion(other.to_string())),
    }

    let title = match obj.get("title") {
        None | Some(Value::Null) => None,
        Some(Value::String(t)) => Some(t.clone()),
        Some(_) => return Err(SpecError::InvalidTitle),
    };

    let layout = match obj.get("layout") {
        None => None,
        Some(layout) => Some(validate_layout(layout)?),
    };

    let widgets = obj
        .get("widgets")
        .and_then(Value::as_array)
        .ok_or(SpecError::MissingWidgets)?
        .iter()
        .enumerate()
        .map(|(index, widget)| {
            serde_json::from_value::<WidgetSpec>(widget.clone()).map_err(|e| {
                SpecError::InvalidWidget {
                    index,
                    reason: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardSpec {
        version: SPEC_VERSION.to_string(),
        title,
        layout,
        widgets,
    })
}

fn validate_layout(value: &Value) -> Result<Layout, SpecError> {
    let obj = value
        .as_object()
        .ok_or_else(|| SpecError::InvalidLayout("layout must be an object".to_string()))?;

    let columns = match obj.get("columns").and_then(Value::as_u64) {
        Some(1) => 1,
        Some(2) => 2,
        _ => {
            return Err(SpecError::InvalidLayout(
                "columns must be 1 or 2".to_string(),
            ))
        }
    };

    let gap = match obj.get("gap") {
        None => None,
        Some(gap) => Some(
            serde_json::from_value::<Gap>(gap.clone())
                .map_err(|e| SpecError::InvalidLayout(format!("gap: {e}")))?,
        ),
    };

    Ok(Layout { columns, gap })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{KpiValue, WidgetSpec};
    use serde_json::json;

    const VALID: &str = r#"{"version":"0.1","widgets":[{"type":"markdown","content":"Hello"}]}"#;

    #[test]
    fn test_accepts_minimal_spec() {
        let spec = parse_spec(VALID).expect("minimal spec should parse");
        assert_eq!(spec.version, "0.1");
        assert_eq!(spec.widgets.len(), 1);
        assert_eq!(spec.widgets[0].kind(), "markdown");
    }

    #[test]
    fn test_rejects_wrong_version() {
        let err = parse_spec(r#"{"version":"1.0","widgets":[]}"#).unwrap_err();
        assert!(matches!(err, SpecError::UnsupportedVersion(_)));
    }

    #[test]
    fn test_rejects_missing_version() {
        let err = parse_spec(r#"{"widgets":[]}"#).unwrap_err();
        assert!(matches!(err, SpecError::MissingVersion));
    }

    #[test]
    fn test_rejects_unknown_widget_type() {
        let err = parse_spec(r#"{"version":"0.1","widgets":[{"type":"unknown"}]}"#).unwrap_err();
        assert!(matches!(err, SpecError::InvalidWidget { index: 0, .. }));
    }

    #[test]
    fn test_one_bad_widget_rejects_everything() {
        let raw = json!({
            "version": "0.1",
            "widgets": [
                {"type": "markdown", "content": "ok"},
                {"type": "bar", "title": "Sales", "xKey": "month", "data": []}
            ]
        });
        let err = validate_spec(&raw).unwrap_err();
        assert!(matches!(err, SpecError::InvalidWidget { index: 1, .. }));
    }

    #[test]
    fn test_rejects_missing_or_malformed_widgets() {
        assert!(matches!(
            parse_spec(r#"{"version":"0.1"}"#).unwrap_err(),
            SpecError::MissingWidgets
        ));
        assert!(matches!(
            parse_spec(r#"{"version":"0.1","widgets":{}}"#).unwrap_err(),
            SpecError::MissingWidgets
        ));
        assert!(matches!(parse_spec("[1,2]").unwrap_err(), SpecError::NotAnObject));
    }

    #[test]
    fn test_layout_columns_range() {
        let ok = json!({"version": "0.1", "layout": {"columns": 2, "gap": "md"}, "widgets": []});
        let layout = validate_spec(&ok).unwrap().layout.unwrap();
        assert_eq!(layout.columns, 2);
        assert_eq!(layout.gap, Some(Gap::Md));

        let bad = json!({"version": "0.1", "layout": {"columns": 3}, "widgets": []});
        assert!(matches!(
            validate_spec(&bad).unwrap_err(),
            SpecError::InvalidLayout(_)
        ));

        let bad_gap = json!({"version": "0.1", "layout": {"columns": 1, "gap": "xl"}, "widgets": []});
        assert!(validate_spec(&bad_gap).is_err());
    }

    #[test]
    fn test_extracts_fenced_json() {
        let tagged = format!("Here you go:\n```json\n{VALID}\n```\nEnjoy!");
        assert!(parse_spec(&tagged).is_ok());

        let bare = format!("```\n{VALID}\n```");
        assert!(parse_spec(&bare).is_ok());

        assert_eq!(extract_json_text("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_rejects_prose_without_fence() {
        let err = parse_spec("Sure! Here is a dashboard.").unwrap_err();
        assert!(matches!(err, SpecError::Json(_)));
    }

    #[test]
    fn test_kpi_items_are_typed() {
        let good = json!({
            "version": "0.1",
            "title": "Overview",
            "widgets": [{
                "type": "kpi",
                "title": "Totals",
                "items": [
                    {"label": "Revenue", "value": 1200.5, "unit": "USD"},
                    {"label": "Status", "value": "green"}
                ]
            }]
        });
        let spec = validate_spec(&good).unwrap();
        match &spec.widgets[0] {
            WidgetSpec::Kpi(kpi) => {
                assert!(matches!(kpi.items[0].value, KpiValue::Number(_)));
                assert_eq!(kpi.items[1].value, KpiValue::Text("green".to_string()));
            }
            other => panic!("expected kpi, got {other:?}"),
        }

        let bad = json!({
            "version": "0.1",
            "widgets": [{"type": "kpi", "title": "Totals", "items": [{"value": 3}]}]
        });
        assert!(validate_spec(&bad).is_err());
    }

    #[test]
    fn test_table_widget_round_trip() {
        let raw = json!({
            "version": "0.1",
            "widgets": [{
                "type": "table",
                "title": "Orders",
                "columns": [{"key": "id", "label": "ID"}],
                "rows": [{"id": 1}, {"id": 2}],
                "maxRows": 10
            }]
        });
        let spec = validate_spec(&raw).unwrap();
        assert_eq!(serde_json::to_value(&spec).unwrap(), raw);
    }

    #[test]
    fn test_rejects_non_string_title() {
        let raw = json!({"version": "0.1", "title": 5, "widgets": []});
        assert!(matches!(validate_spec(&raw).unwrap_err(), SpecError::InvalidTitle));
    }
}
