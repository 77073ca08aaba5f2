//! Query layer the exporters read records from

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result, bail};

use super::{FieldPath, JsonRecord, RecordRef, Value, resolve_path};

/// Equality filter on a field path, compared as cell text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    pub path: FieldPath,
    pub value: String,
}

impl Lookup {
    pub fn new(path: FieldPath, value: impl Into<String>) -> Self {
        Lookup {
            path,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for Lookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={:?}", self.path, self.value)
    }
}

/// Error fetching exactly one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// No record matched
    NotFound,
    /// More than one record matched
    MultipleFound { count: usize },
    /// The query layer failed
    Failed(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::NotFound => write!(f, "matching record does not exist"),
            LookupError::MultipleFound { count } => {
                write!(f, "lookup returned {} records, expected exactly one", count)
            }
            LookupError::Failed(message) => write!(f, "lookup failed: {}", message),
        }
    }
}

impl std::error::Error for LookupError {}

/// A set of records of one type
pub trait QuerySet {
    /// Hint the relations that will be traversed, so they can be fetched eagerly
    fn select_related(&mut self, related: &BTreeSet<String>);

    /// All records in the set
    fn records(&self) -> Result<Vec<RecordRef>>;

    /// Fetch the single record matching every lookup
    fn get(&self, lookups: &[Lookup]) -> Result<RecordRef, LookupError>;
}

/// Query set over records held in memory
#[derive(Clone, Default)]
pub struct MemoryQuerySet {
    records: Vec<RecordRef>,
    related: BTreeSet<String>,
}

impl MemoryQuerySet {
    pub fn new(records: Vec<RecordRef>) -> Self {
        MemoryQuerySet {
            records,
            related: BTreeSet::new(),
        }
    }

    /// Build from a JSON array of objects
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        let items = match json {
            serde_json::Value::Array(items) => items,
            other => bail!("Expected a JSON array of records, got: {}", kind_of(&other)),
        };

        let mut records = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                bail!("Record #{} is not a JSON object", idx + 1);
            }
            records.push(JsonRecord::new(item).into_ref());
        }

        Ok(MemoryQuerySet::new(records))
    }

    /// Load a JSON array of records from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read records file: {}", path.display()))?;
        let json: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse records file: {}", path.display()))?;
        let set = MemoryQuerySet::from_json(json)
            .with_context(|| format!("Invalid records file: {}", path.display()))?;
        log::debug!("Loaded {} records from {}", set.len(), path.display());
        Ok(set)
    }

    /// Keep only records whose `field` text is one of `values`
    pub fn filter_in(mut self, field: &str, values: &[String]) -> Self {
        let path = FieldPath::simple(field);
        self.records.retain(|record| {
            resolve_path(record.as_ref(), &path)
                .map(|v| values.iter().any(|text| value_matches(&v, text)))
                .unwrap_or(false)
        });
        self
    }

    /// Relations hinted through `select_related`
    pub fn related(&self) -> &BTreeSet<String> {
        &self.related
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn matches(record: &RecordRef, lookups: &[Lookup]) -> bool {
        lookups.iter().all(|lookup| {
            resolve_path(record.as_ref(), &lookup.path)
                .map(|v| value_matches(&v, &lookup.value))
                .unwrap_or(false)
        })
    }
}

/// Exact match of a stored value against cell text; null never matches
fn value_matches(value: &Value, text: &str) -> bool {
    !value.is_null() && value.to_string() == text
}

impl QuerySet for MemoryQuerySet {
    fn select_related(&mut self, related: &BTreeSet<String>) {
        // Related records are already nested in memory
        self.related.extend(related.iter().cloned());
    }

    fn records(&self) -> Result<Vec<RecordRef>> {
        Ok(self.records.clone())
    }

    fn get(&self, lookups: &[Lookup]) -> Result<RecordRef, LookupError> {
        let mut found = self
            .records
            .iter()
            .filter(|record| Self::matches(record, lookups));

        let first = found.next().ok_or(LookupError::NotFound)?;
        let extra = found.count();
        if extra > 0 {
            return Err(LookupError::MultipleFound { count: extra + 1 });
        }
        Ok(first.clone())
    }
}

fn kind_of(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> MemoryQuerySet {
        MemoryQuerySet::from_json(json!([
            {"id": 1, "person": {"name": "Ona", "age": 17}},
            {"id": 2, "person": {"name": "Jonas", "age": 16}},
            {"id": 3, "person": {"name": "Jonas", "age": 18}},
        ]))
        .unwrap()
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        let err = MemoryQuerySet::from_json(json!({"id": 1})).err().unwrap();
        assert!(err.to_string().contains("got: object"));

        let err = MemoryQuerySet::from_json(json!([1])).err().unwrap();
        assert!(err.to_string().contains("Record #1"));
    }

    #[test]
    fn test_get_exactly_one() {
        let set = people();
        let record = set
            .get(&[Lookup::new(FieldPath::split("person__name"), "Ona")])
            .unwrap();
        assert_eq!(crate::export::resolve_cell(record.as_ref(), &FieldPath::simple("id")), "1");
    }

    #[test]
    fn test_get_not_found_and_multiple() {
        let set = people();
        let missing = set.get(&[Lookup::new(FieldPath::split("person__name"), "Petras")]);
        assert_eq!(missing.err(), Some(LookupError::NotFound));

        let many = set.get(&[Lookup::new(FieldPath::split("person__name"), "Jonas")]);
        assert_eq!(many.err(), Some(LookupError::MultipleFound { count: 2 }));

        let narrowed = set.get(&[
            Lookup::new(FieldPath::split("person__name"), "Jonas"),
            Lookup::new(FieldPath::split("person__age"), "18"),
        ]);
        assert!(narrowed.is_ok());
    }

    #[test]
    fn test_empty_text_does_not_match_null() {
        let set = MemoryQuerySet::from_json(json!([
            {"name": null, "age": 40},
            {"name": "Ona", "age": 17},
        ]))
        .unwrap();

        let result = set.get(&[Lookup::new(FieldPath::simple("name"), "")]);
        assert_eq!(result.err(), Some(LookupError::NotFound));

        let blank = MemoryQuerySet::from_json(json!([{"name": "", "age": 12}])).unwrap();
        assert!(blank.get(&[Lookup::new(FieldPath::simple("name"), "")]).is_ok());
    }

    #[test]
    fn test_filter_in_ids() {
        let set = people().filter_in("id", &["1".to_string(), "3".to_string()]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_select_related_records_hint() {
        let mut set = people();
        let related: BTreeSet<String> = ["person".to_string()].into_iter().collect();
        set.select_related(&related);
        assert!(set.related().contains("person"));
    }
}
