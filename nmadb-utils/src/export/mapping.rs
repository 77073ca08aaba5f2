//! Sheet mappings: which columns an export produces and where their values come from
//!
//! The textual form has one column per line:
//!
//! ```text
//! Name: person__name
//! Age: person__age
//! ```
//!
//! Everything before the last colon is the caption, everything after it is
//! a `__`-separated field path.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{FieldPath, FieldPathError, SEPARATOR};

/// One output column: caption plus the path its values are read from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMappingEntry {
    pub caption: String,
    pub path: FieldPath,
}

impl SheetMappingEntry {
    pub fn new(caption: impl Into<String>, path: FieldPath) -> Self {
        SheetMappingEntry {
            caption: caption.into(),
            path,
        }
    }

    /// Parse a single `caption: path` line
    ///
    /// A line without a colon uses the path text as its caption.
    pub fn parse_line(line: &str) -> Self {
        let (caption, field) = match line.rfind(':') {
            Some(idx) => (line[..idx].trim(), line[idx + 1..].trim()),
            None => (line.trim(), line.trim()),
        };
        SheetMappingEntry::new(caption, FieldPath::split(field))
    }
}

impl std::fmt::Display for SheetMappingEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.caption, self.path)
    }
}

/// Ordered list of output columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetMapping {
    entries: Vec<SheetMappingEntry>,
}

impl SheetMapping {
    pub fn new(entries: Vec<SheetMappingEntry>) -> Self {
        SheetMapping { entries }
    }

    /// Parse the textual mapping, one `caption: path` per line
    ///
    /// Blank lines are skipped; every other line becomes one entry, in order.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(SheetMappingEntry::parse_line)
            .collect();
        SheetMapping { entries }
    }

    /// Default mapping for a model's list display columns
    ///
    /// The first column (the record link) is skipped. Captions are the column
    /// names with `__` shown as `:`.
    pub fn from_list_display<S: AsRef<str>>(columns: &[S]) -> Self {
        let entries = columns
            .iter()
            .skip(1)
            .map(|column| {
                let column = column.as_ref();
                SheetMappingEntry::new(column.replace(SEPARATOR, ":"), FieldPath::split(column))
            })
            .collect();
        SheetMapping { entries }
    }

    /// Serialize back into the textual form
    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn entries(&self) -> &[SheetMappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captions in column order
    pub fn captions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.caption.as_str()).collect()
    }

    /// Find the entry for a caption
    pub fn get(&self, caption: &str) -> Option<&SheetMappingEntry> {
        self.entries.iter().find(|e| e.caption == caption)
    }

    /// Relation join keys for every multi-segment path
    pub fn related(&self) -> BTreeSet<String> {
        self.entries.iter().filter_map(|e| e.path.related()).collect()
    }

    /// Entries whose paths are malformed
    pub fn problems(&self) -> Vec<(&SheetMappingEntry, FieldPathError)> {
        self.entries
            .iter()
            .filter_map(|e| e.path.validate().err().map(|err| (e, err)))
            .collect()
    }
}

impl<'a> IntoIterator for &'a SheetMapping {
    type Item = &'a SheetMappingEntry;
    type IntoIter = std::slice::Iter<'a, SheetMappingEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
