//! Record handles that field paths are resolved against
//!
//! A record exposes named fields. A field is either a scalar value, a related
//! record that can be traversed further, or a zero-argument method that is
//! only invoked when it ends a path.

use std::sync::Arc;

use super::Value;

/// Shared handle to a record
pub type RecordRef = Arc<dyn Record>;

/// Zero-argument method exposed by a record
pub type Method = Arc<dyn Fn() -> Result<Value, String> + Send + Sync>;

/// Key under which a JSON record may carry its own display text
pub const LABEL_KEY: &str = "_label";

/// Something a field name resolves to
#[derive(Clone)]
pub enum Field {
    Value(Value),
    Related(RecordRef),
    Method(Method),
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Field::Related(r) => f.debug_tuple("Related").field(&r.label()).finish(),
            Field::Method(_) => f.write_str("Method"),
        }
    }
}

/// A record in the underlying data layer
pub trait Record: Send + Sync {
    /// Look up a field by name
    fn field(&self, name: &str) -> Result<Field, ResolveError>;

    /// Text used when the record itself ends up in a cell
    fn label(&self) -> String;
}

/// Error raised while traversing a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Path has no segments
    EmptyPath,
    /// Record has no field with this name
    NoSuchField { owner: String, field: String },
    /// Tried to read a field from a scalar value
    NotARecord { value: String, field: String },
    /// Tried to read a field through an empty relation
    EmptyRelation { relation: String, field: String },
    /// Tried to read a field from a method instead of its result
    MethodHasNoFields { method: String, field: String },
    /// Method raised while being invoked
    MethodFailed { method: String, message: String },
    /// Error reported by a custom record implementation
    Other(String),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::EmptyPath => write!(f, "field path is empty"),
            ResolveError::NoSuchField { owner, field } => {
                write!(f, "'{}' has no field '{}'", owner, field)
            }
            ResolveError::NotARecord { value, field } => {
                write!(f, "value '{}' has no field '{}'", value, field)
            }
            ResolveError::EmptyRelation { relation, field } => {
                write!(f, "'{}' is empty, cannot read '{}'", relation, field)
            }
            ResolveError::MethodHasNoFields { method, field } => {
                write!(f, "method '{}' has no field '{}'", method, field)
            }
            ResolveError::MethodFailed { method, message } => {
                write!(f, "{}() failed: {}", method, message)
            }
            ResolveError::Other(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ResolveError {}

/// A record backed by a JSON object
///
/// Nested objects are related records; every other JSON value is a scalar.
/// The optional `_label` string is used as the record's display text.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    data: Arc<serde_json::Value>,
}

impl JsonRecord {
    pub fn new(data: serde_json::Value) -> Self {
        JsonRecord {
            data: Arc::new(data),
        }
    }

    /// Wrap into a shared record handle
    pub fn into_ref(self) -> RecordRef {
        Arc::new(self)
    }

    /// Underlying JSON
    pub fn data(&self) -> &serde_json::Value {
        &self.data
    }
}

impl Record for JsonRecord {
    fn field(&self, name: &str) -> Result<Field, ResolveError> {
        let obj = match self.data.as_object() {
            Some(obj) => obj,
            None => {
                return Err(ResolveError::NotARecord {
                    value: self.data.to_string(),
                    field: name.to_string(),
                });
            }
        };

        match obj.get(name) {
            Some(val @ serde_json::Value::Object(_)) => {
                Ok(Field::Related(JsonRecord::new(val.clone()).into_ref()))
            }
            Some(val) => Ok(Field::Value(Value::from_json(val))),
            None => Err(ResolveError::NoSuchField {
                owner: self.label(),
                field: name.to_string(),
            }),
        }
    }

    fn label(&self) -> String {
        match self.data.get(LABEL_KEY) {
            Some(serde_json::Value::String(label)) => label.clone(),
            _ => self.data.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_record_fields() {
        let record = JsonRecord::new(json!({
            "_label": "Jonas",
            "age": 17,
            "school": {"title": "Licėjus"}
        }));

        assert!(matches!(record.field("age"), Ok(Field::Value(Value::Int(17)))));
        match record.field("school") {
            Ok(Field::Related(school)) => {
                assert!(matches!(
                    school.field("title"),
                    Ok(Field::Value(Value::String(ref s))) if s == "Licėjus"
                ));
            }
            other => panic!("expected related record, got {:?}", other),
        }
    }

    #[test]
    fn test_json_record_missing_field() {
        let record = JsonRecord::new(json!({"_label": "Jonas"}));
        let err = record.field("age").unwrap_err();
        assert_eq!(err.to_string(), "'Jonas' has no field 'age'");
    }

    #[test]
    fn test_json_record_label_falls_back_to_json() {
        let record = JsonRecord::new(json!({"id": 1}));
        assert_eq!(record.label(), r#"{"id":1}"#);
    }
}
