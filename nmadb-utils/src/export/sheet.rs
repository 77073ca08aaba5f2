//! In-memory sheets and spreadsheets

use std::collections::HashMap;

/// One row, keyed by column caption
pub type Row = HashMap<String, String>;

/// Ordered named columns plus rows of cell text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Sheet {
    pub fn new() -> Self {
        Sheet::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Sheet {
            name: name.into(),
            ..Sheet::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Append columns; captions already present are ignored
    pub fn add_columns<I, S>(&mut self, captions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for caption in captions {
            let caption = caption.into();
            if !self.columns.contains(&caption) {
                self.columns.push(caption);
            }
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; keys that are not columns are dropped
    pub fn append_row(&mut self, mut row: Row) {
        row.retain(|caption, _| self.columns.contains(caption));
        self.rows.push(row);
    }

    /// Cell text at `row` for `caption`; missing cells read as empty
    pub fn cell(&self, row: usize, caption: &str) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(caption))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    /// Row values in column order
    pub fn row_values(&self, row: &Row) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| row.get(c).cloned().unwrap_or_default())
            .collect()
    }

    /// All rows as value lists in column order
    pub fn value_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(|r| self.row_values(r))
    }
}

/// Named collection of sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spreadsheet {
    sheets: Vec<Sheet>,
}

impl Spreadsheet {
    pub fn new() -> Self {
        Spreadsheet::default()
    }

    /// Create an empty sheet and return it for filling
    pub fn create_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::named(name));
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn push(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl From<Sheet> for Spreadsheet {
    fn from(sheet: Sheet) -> Self {
        Spreadsheet {
            sheets: vec![sheet],
        }
    }
}
