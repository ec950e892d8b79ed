//! The JSON-Schema document sent to backends as generation context.
//!
//! Validation does not consult this document; [`super::validate_spec`]
//! checks the same shape by hand.

use once_cell::sync::Lazy;
use serde_json::{json, Value};

static DASHBOARD_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["version", "widgets"],
        "properties": {
            "version": { "type": "string", "enum": [super::SPEC_VERSION] },
            "title": { "type": "string" },
            "layout": {
                "type": "object",
                "properties": {
                    "columns": { "type": "integer", "enum": [1, 2] },
                    "gap": { "type": "string", "enum": ["sm", "md", "lg"] }
                },
                "required": ["columns"]
            },
            "widgets": {
                "type": "array",
                "items": {
                    "oneOf": [
                        {
                            "type": "object",
                            "required": ["type", "title", "items"],
                            "properties": {
                                "type": { "const": "kpi" },
                                "title": { "type": "string" },
                                "items": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "required": ["label", "value"],
                                        "properties": {
                                            "label": { "type": "string" },
                                            "value": { "oneOf": [{ "type": "string" }, { "type": "number" }] },
                                            "unit": { "type": "string" }
                                        }
                                    }
                                }
                            }
                        },
                        {
                            "type": "object",
                            "required": ["type", "title", "columns", "rows"],
                            "properties": {
                                "type": { "const": "table" },
                                "title": { "type": "string" },
                                "columns": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "required": ["key", "label"],
                                        "properties": {
                                            "key": { "type": "string" },
                                            "label": { "type": "string" }
                                        }
                                    }
                                },
                                "rows": { "type": "array", "items": { "type": "object" } },
                                "maxRows": { "type": "integer" }
                            }
                        },
                        chart_schema("bar"),
                        chart_schema("line"),
                        {
                            "type": "object",
                            "required": ["type", "content"],
                            "properties": {
                                "type": { "const": "markdown" },
                                "title": { "type": "string" },
                                "content": { "type": "string" }
                            }
                        }
                    ]
                }
            }
        }
    })
});

fn chart_schema(kind: &str) -> Value {
    json!({
        "type": "object",
        "required": ["type", "title", "xKey", "yKey", "data"],
        "properties": {
            "type": { "const": kind },
            "title": { "type": "string" },
            "xKey": { "type": "string" },
            "yKey": { "type": "string" },
            "data": { "type": "array", "items": { "type": "object" } }
        }
    })
}

/// Schema document for spec version [`super::SPEC_VERSION`].
pub fn dashboard_schema() -> &'static Value {
    &DASHBOARD_SCHEMA
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_pins_version() {
        let schema = dashboard_schema();
        assert_eq!(
            schema["properties"]["version"]["enum"],
            json!([super::super::SPEC_VERSION])
        );
        assert_eq!(schema["required"], json!(["version", "widgets"]));
    }

    #[test]
    fn test_schema_lists_every_widget_type() {
        let kinds: Vec<&str> = dashboard_schema()["properties"]["widgets"]["items"]["oneOf"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|w| w["properties"]["type"]["const"].as_str())
            .collect();
        assert_eq!(kinds, vec!["kpi", "table", "bar", "line", "markdown"]);
    }
}
