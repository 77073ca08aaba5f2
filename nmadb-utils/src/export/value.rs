//! Scalar values read from records and written into sheet cells

/// A scalar value obtained from a record field
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null/empty value
    Null,
    /// String value
    String(String),
    /// Whole number (integer)
    Int(i64),
    /// Floating point
    Float(f64),
    /// Boolean
    Bool(bool),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parse from a JSON scalar
    ///
    /// Strings are kept verbatim so that cell text matches the stored text
    /// exactly. Arrays and objects fall back to their JSON text.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Value::String(json.to_string())
            }
        }
    }
}

/// Cell text of a value; every exported cell goes through this
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}
