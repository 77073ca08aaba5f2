//! Field path parsing and resolution against records

use serde::{Deserialize, Serialize};

use super::{Field, Record, ResolveError, Value};

/// Separator between path segments (`person__school__title`)
pub const SEPARATOR: &str = "__";

/// Prefix of the placeholder written into cells that failed to resolve
pub const ERROR_PREFIX: &str = "Error: ";

/// A path to a field, traversing related records
///
/// Examples:
/// - "name" -> field on the root record
/// - "person__name" -> `person` relation, then its `name` field
///
/// The last segment names the value; the preceding segments name relations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldPath {
    segments: Vec<String>,
}

/// Problems found when validating a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPathError {
    /// Path is empty
    Empty,
    /// Segment at this position is empty (e.g. "person____name")
    EmptySegment { position: usize },
}

impl std::fmt::Display for FieldPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldPathError::Empty => write!(f, "field path cannot be empty"),
            FieldPathError::EmptySegment { position } => {
                write!(f, "field path segment {} is empty", position + 1)
            }
        }
    }
}

impl std::error::Error for FieldPathError {}

impl FieldPath {
    /// Split a path on `__`
    ///
    /// Never fails: malformed paths surface as resolution errors per cell.
    pub fn split(path: &str) -> Self {
        FieldPath {
            segments: path.split(SEPARATOR).map(|s| s.to_string()).collect(),
        }
    }

    /// Split and validate a path
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        let path = FieldPath::split(path);
        path.validate()?;
        Ok(path)
    }

    /// Build a path from already separated segments
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a single-field path
    pub fn simple(field: impl Into<String>) -> Self {
        FieldPath {
            segments: vec![field.into()],
        }
    }

    /// Check that the path has no empty segments
    pub fn validate(&self) -> Result<(), FieldPathError> {
        if self.segments.is_empty() || (self.segments.len() == 1 && self.segments[0].is_empty()) {
            return Err(FieldPathError::Empty);
        }
        if let Some(position) = self.segments.iter().position(|s| s.is_empty()) {
            return Err(FieldPathError::EmptySegment { position });
        }
        Ok(())
    }

    /// Get all segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this path traverses at least one relation
    pub fn is_related(&self) -> bool {
        self.segments.len() > 1
    }

    /// Join key of the traversed relations (all segments but the last)
    pub fn related(&self) -> Option<String> {
        if !self.is_related() {
            return None;
        }
        Some(self.segments[..self.segments.len() - 1].join(SEPARATOR))
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.segments.join(SEPARATOR))
    }
}

/// Resolve a field path starting at `root`
///
/// Each segment reads a field of the record reached so far. A method at the
/// end of the path is invoked; a related record at the end yields its label.
pub fn resolve_path(root: &dyn Record, path: &FieldPath) -> Result<Value, ResolveError> {
    let (first, rest) = path.segments().split_first().ok_or(ResolveError::EmptyPath)?;

    let mut current = root.field(first)?;
    let mut current_name = first.as_str();

    for segment in rest {
        current = match current {
            Field::Related(record) => record.field(segment)?,
            Field::Value(Value::Null) => {
                return Err(ResolveError::EmptyRelation {
                    relation: current_name.to_string(),
                    field: segment.clone(),
                });
            }
            Field::Value(value) => {
                return Err(ResolveError::NotARecord {
                    value: value.to_string(),
                    field: segment.clone(),
                });
            }
            Field::Method(_) => {
                return Err(ResolveError::MethodHasNoFields {
                    method: current_name.to_string(),
                    field: segment.clone(),
                });
            }
        };
        current_name = segment.as_str();
    }

    match current {
        Field::Value(value) => Ok(value),
        Field::Related(record) => Ok(Value::String(record.label())),
        Field::Method(method) => method().map_err(|message| ResolveError::MethodFailed {
            method: current_name.to_string(),
            message,
        }),
    }
}

/// Placeholder text written into a cell instead of a value
pub fn error_placeholder(error: impl std::fmt::Display) -> String {
    format!("{}{}", ERROR_PREFIX, error)
}

/// Cell text for a resolution result; errors become placeholders
pub fn cell_text(result: Result<Value, ResolveError>) -> String {
    match result {
        Ok(value) => value.to_string(),
        Err(e) => error_placeholder(e),
    }
}

/// Resolve a path and convert the result to cell text
pub fn resolve_cell(root: &dyn Record, path: &FieldPath) -> String {
    cell_text(resolve_path(root, path))
}
