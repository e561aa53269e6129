use serde_json::{Map, Value};

/// Expected shape of one required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text. Scalars are stringified; lists are joined with ", ".
    Text,
    /// List of strings. A scalar is coerced to a single-element list.
    TextList,
    /// List of integers. Elements parse best-effort with a mid-range
    /// default of 5; a scalar is coerced to a single-element list.
    IntList,
    /// Nested JSON object, kept as-is if present.
    Object,
}

/// One required field of a record schema.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Deterministic default used when the field is absent or when the
    /// whole cascade bottoms out.
    pub default: Value,
}

impl FieldSpec {
    pub fn text(name: &'static str, default: &str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            default: Value::String(default.to_string()),
        }
    }

    pub fn text_list(name: &'static str, defaults: &[&str]) -> Self {
        Self {
            name,
            kind: FieldKind::TextList,
            default: Value::Array(
                defaults
                    .iter()
                    .map(|s| Value::String(s.to_string()))
                    .collect(),
            ),
        }
    }

    pub fn int_list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::IntList,
            default: Value::Array(Vec::new()),
        }
    }

    pub fn object(name: &'static str, default: Value) -> Self {
        Self {
            name,
            kind: FieldKind::Object,
            default,
        }
    }
}

/// The required-field schema a record must satisfy.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// A record containing only the defaults.
    pub fn default_record(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|f| (f.name.to_string(), f.default.clone()))
            .collect()
    }

    /// Force `record` into schema shape: add missing fields with defaults and
    /// coerce present fields to the declared kind. Guarantees the caller never
    /// needs to defensively check shape again.
    pub fn validate(&self, mut record: Map<String, Value>) -> Map<String, Value> {
        for field in &self.fields {
            let coerced = match record.remove(field.name) {
                None | Some(Value::Null) => field.default.clone(),
                Some(value) => coerce(value, field),
            };
            record.insert(field.name.to_string(), coerced);
        }
        record
    }
}

fn coerce(value: Value, field: &FieldSpec) -> Value {
    match field.kind {
        FieldKind::Text => Value::String(as_text(&value)),
        FieldKind::TextList => match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| Value::String(as_text(v))).collect())
            }
            scalar => Value::Array(vec![Value::String(as_text(&scalar))]),
        },
        FieldKind::IntList => match value {
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| Value::from(as_int(v))).collect())
            }
            scalar => Value::Array(vec![Value::from(as_int(&scalar))]),
        },
        FieldKind::Object => match value {
            obj @ Value::Object(_) => obj,
            _ => field.default.clone(),
        },
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(as_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{}: {}", k, as_text(v)))
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Best-effort integer parse with a mid-range default.
fn as_int(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or_else(|| {
            n.as_f64().map(|f| f.round() as i64).unwrap_or(5)
        }),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or_else(|_| {
            s.trim().parse::<f64>().map(|f| f.round() as i64).unwrap_or(5)
        }),
        _ => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> RecordSchema {
        RecordSchema::new(vec![
            FieldSpec::text("name", "Candidate"),
            FieldSpec::text_list("strengths", &["Not assessed"]),
            FieldSpec::int_list("scores"),
        ])
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let record = schema().validate(Map::new());
        assert_eq!(record["name"], json!("Candidate"));
        assert_eq!(record["strengths"], json!(["Not assessed"]));
        assert_eq!(record["scores"], json!([]));
    }

    #[test]
    fn test_scalar_coerced_to_singleton_list() {
        let mut raw = Map::new();
        raw.insert("strengths".into(), json!("communicates clearly"));
        let record = schema().validate(raw);
        assert_eq!(record["strengths"], json!(["communicates clearly"]));
    }

    #[test]
    fn test_int_parse_falls_back_to_midrange() {
        let mut raw = Map::new();
        raw.insert("scores".into(), json!(["8", "bogus", 3]));
        let record = schema().validate(raw);
        assert_eq!(record["scores"], json!([8, 5, 3]));
    }

    #[test]
    fn test_valid_record_is_unchanged() {
        let mut raw = Map::new();
        raw.insert("name".into(), json!("Ana"));
        raw.insert("strengths".into(), json!(["python", "go"]));
        raw.insert("scores".into(), json!([7, 9]));
        let record = schema().validate(raw.clone());
        assert_eq!(Value::Object(record), Value::Object(raw));
    }
}
