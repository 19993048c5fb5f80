//! Declarative output shapes used to constrain and validate model responses.
//!
//! A [`TargetShape`] renders two ways: a `responseSchema` hint in the model
//! endpoint's OpenAPI dialect, and a JSON Schema (draft 2020-12) that gates
//! whether a response counts as usable data.

use jsonschema::Draft;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Why a raw response could not be turned into a typed value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShapeError {
    #[error("response is not valid JSON: {0}")]
    Parse(String),
    #[error("response does not match expected shape:\n- {0}")]
    Mismatch(String),
    #[error("compile shape schema: {0}")]
    Schema(String),
}

/// Expected structure of a model response.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetShape {
    String,
    Number,
    /// Number within `minimum..=maximum`.
    BoundedNumber {
        minimum: f64,
        maximum: f64,
    },
    Integer,
    Boolean,
    Array {
        items: Box<TargetShape>,
        max_items: Option<usize>,
    },
    /// Object whose named fields are all required.
    Object { fields: Vec<(String, TargetShape)> },
    Nullable(Box<TargetShape>),
}

impl TargetShape {
    pub fn array(items: TargetShape) -> Self {
        Self::Array {
            items: Box::new(items),
            max_items: None,
        }
    }

    /// Number within `0..=1`, as used for scores.
    pub fn unit_score() -> Self {
        Self::BoundedNumber {
            minimum: 0.0,
            maximum: 1.0,
        }
    }

    pub fn string_list() -> Self {
        Self::array(Self::String)
    }

    pub fn object<'a>(fields: impl IntoIterator<Item = (&'a str, TargetShape)>) -> Self {
        Self::Object {
            fields: fields
                .into_iter()
                .map(|(name, shape)| (name.to_string(), shape))
                .collect(),
        }
    }

    #[must_use]
    pub fn nullable(self) -> Self {
        Self::Nullable(Box::new(self))
    }

    /// Cap the length of an array shape. No-op for other shapes.
    #[must_use]
    pub fn with_max_items(self, limit: usize) -> Self {
        match self {
            Self::Array { items, .. } => Self::Array {
                items,
                max_items: Some(limit),
            },
            other => other,
        }
    }

    /// Schema hint sent to the model endpoint as a generation constraint.
    pub fn response_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "STRING" }),
            Self::Number => json!({ "type": "NUMBER" }),
            Self::BoundedNumber { minimum, maximum } => {
                json!({ "type": "NUMBER", "minimum": minimum, "maximum": maximum })
            }
            Self::Integer => json!({ "type": "INTEGER" }),
            Self::Boolean => json!({ "type": "BOOLEAN" }),
            Self::Array { items, max_items } => {
                let mut schema = json!({ "type": "ARRAY", "items": items.response_schema() });
                if let Some(limit) = max_items {
                    schema["maxItems"] = json!(limit);
                }
                schema
            }
            Self::Object { fields } => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|(name, shape)| (name.clone(), shape.response_schema()))
                    .collect();
                let names: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
                json!({
                    "type": "OBJECT",
                    "properties": properties,
                    "required": names,
                    "propertyOrdering": names,
                })
            }
            Self::Nullable(inner) => {
                let mut schema = inner.response_schema();
                schema["nullable"] = Value::Bool(true);
                schema
            }
        }
    }

    /// JSON Schema used to validate parsed responses.
    pub fn json_schema(&self) -> Value {
        match self {
            Self::String => json!({ "type": "string" }),
            Self::Number => json!({ "type": "number" }),
            Self::BoundedNumber { minimum, maximum } => {
                json!({ "type": "number", "minimum": minimum, "maximum": maximum })
            }
            Self::Integer => json!({ "type": "integer" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Array { items, max_items } => {
                let mut schema = json!({ "type": "array", "items": items.json_schema() });
                if let Some(limit) = max_items {
                    schema["maxItems"] = json!(limit);
                }
                schema
            }
            Self::Object { fields } => {
                let properties: Map<String, Value> = fields
                    .iter()
                    .map(|(name, shape)| (name.clone(), shape.json_schema()))
                    .collect();
                let required: Vec<&str> = fields.iter().map(|(name, _)| name.as_str()).collect();
                json!({ "type": "object", "properties": properties, "required": required })
            }
            Self::Nullable(inner) => json!({ "anyOf": [inner.json_schema(), { "type": "null" }] }),
        }
    }

    /// Human-readable rendering used in prompts.
    pub fn describe(&self) -> String {
        self.response_schema().to_string()
    }

    /// Check `instance` against this shape.
    pub fn validate(&self, instance: &Value) -> Result<(), ShapeError> {
        let compiled = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&self.json_schema())
            .map_err(|err| ShapeError::Schema(err.to_string()))?;
        let messages: Vec<String> = compiled
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect();
        if !messages.is_empty() {
            return Err(ShapeError::Mismatch(messages.join("\n- ")));
        }
        Ok(())
    }

    /// Parse raw response text and validate it against this shape.
    pub fn parse_value(&self, raw: &str) -> Result<Value, ShapeError> {
        let value: Value =
            serde_json::from_str(raw.trim()).map_err(|err| ShapeError::Parse(err.to_string()))?;
        self.validate(&value)?;
        Ok(value)
    }

    /// Convert an already validated value into its Rust type.
    pub fn decode<T: DeserializeOwned>(&self, value: Value) -> Result<T, ShapeError> {
        serde_json::from_value(value).map_err(|err| ShapeError::Mismatch(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judgment_list() -> TargetShape {
        TargetShape::array(TargetShape::object([
            ("id", TargetShape::Integer),
            ("confidenceScore", TargetShape::unit_score()),
        ]))
        .with_max_items(5)
    }

    #[test]
    fn string_list_accepts_strings_only() {
        let shape = TargetShape::string_list();
        assert!(shape.parse_value(r#"["a", "b"]"#).is_ok());
        let err = shape.parse_value(r#"["a", 3]"#).unwrap_err();
        assert!(matches!(err, ShapeError::Mismatch(_)));
    }

    #[test]
    fn non_json_is_a_parse_error() {
        let err = TargetShape::String.parse_value("not json").unwrap_err();
        assert!(matches!(err, ShapeError::Parse(_)));
    }

    #[test]
    fn nullable_string_accepts_null() {
        let shape = TargetShape::String.nullable();
        assert_eq!(shape.parse_value("null").expect("null"), Value::Null);
        assert_eq!(shape.parse_value(r#""hi""#).expect("string"), json!("hi"));
        assert!(shape.parse_value("1").is_err());
    }

    #[test]
    fn max_items_is_enforced() {
        let shape = judgment_list();
        let six: Vec<Value> = (0..6)
            .map(|id| json!({ "id": id, "confidenceScore": 0.9 }))
            .collect();
        let raw = Value::Array(six).to_string();
        assert!(matches!(
            shape.parse_value(&raw).unwrap_err(),
            ShapeError::Mismatch(_)
        ));
    }

    #[test]
    fn object_fields_are_required() {
        let shape = TargetShape::object([
            ("feedback", TargetShape::String),
            ("score", TargetShape::Number),
        ]);
        assert!(shape.parse_value(r#"{"feedback": "ok", "score": 1}"#).is_ok());
        assert!(shape.parse_value(r#"{"feedback": "ok"}"#).is_err());
    }

    #[test]
    fn unit_score_rejects_out_of_range_values() {
        let shape = TargetShape::unit_score();
        assert!(shape.parse_value("0").is_ok());
        assert!(shape.parse_value("0.75").is_ok());
        assert!(shape.parse_value("1").is_ok());
        for raw in ["7", "-0.1", "1.01"] {
            assert!(
                matches!(shape.parse_value(raw).unwrap_err(), ShapeError::Mismatch(_)),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn out_of_range_confidence_fails_the_whole_list() {
        let err = judgment_list()
            .parse_value(r#"[{"id": 0, "confidenceScore": 0.8}, {"id": 1, "confidenceScore": 3}]"#)
            .unwrap_err();
        assert!(matches!(err, ShapeError::Mismatch(_)));
    }

    #[test]
    fn response_schema_uses_endpoint_dialect() {
        let schema = judgment_list().response_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(schema["maxItems"], 5);
        assert_eq!(schema["items"]["type"], "OBJECT");
        assert_eq!(schema["items"]["required"], json!(["id", "confidenceScore"]));
        assert_eq!(
            schema["items"]["properties"]["confidenceScore"],
            json!({ "type": "NUMBER", "minimum": 0.0, "maximum": 1.0 })
        );
        assert_eq!(
            TargetShape::String.nullable().response_schema(),
            json!({ "type": "STRING", "nullable": true })
        );
    }

    #[test]
    fn decode_reports_type_mismatch() {
        let err = TargetShape::String
            .decode::<Vec<String>>(json!("text"))
            .unwrap_err();
        assert!(matches!(err, ShapeError::Mismatch(_)));
    }
}
