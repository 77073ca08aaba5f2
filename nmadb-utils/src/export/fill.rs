//! Fill missing columns of an uploaded spreadsheet from stored records
//!
//! Uploaded columns whose captions also appear in the mapping identify the
//! record. Every row is written back with its original values under
//! "(provided)" captions, followed by one column per mapping entry.

use super::{
    Lookup, LookupError, QuerySet, Row, Sheet, SheetMapping, Spreadsheet, error_placeholder,
    resolve_cell,
};

/// Suffix added to captions of uploaded values
pub const PROVIDED_SUFFIX: &str = " (provided)";

/// Caption an uploaded column is copied to
pub fn provided_caption(caption: &str) -> String {
    format!("{}{}", caption, PROVIDED_SUFFIX)
}

/// Augment every uploaded sheet with values resolved from `queryset`
pub fn fill_missing(
    upload: &Spreadsheet,
    queryset: &mut dyn QuerySet,
    mapping: &SheetMapping,
) -> Spreadsheet {
    queryset.select_related(&mapping.related());

    let mut output = Spreadsheet::new();
    for sheet in upload.sheets() {
        output.push(fill_sheet(sheet, &*queryset, mapping));
    }
    output
}

fn fill_sheet(input: &Sheet, queryset: &dyn QuerySet, mapping: &SheetMapping) -> Sheet {
    let keys: Vec<&str> = input
        .columns()
        .iter()
        .map(|c| c.as_str())
        .filter(|c| mapping.get(c).is_some())
        .collect();

    if keys.is_empty() {
        log::warn!(
            "Sheet '{}' has no column matching the mapping; nothing to look up by",
            input.name()
        );
    } else {
        log::debug!("Sheet '{}' looked up by {:?}", input.name(), keys);
    }

    let mut output = Sheet::named(input.name());
    output.add_columns(input.columns().iter().map(|c| provided_caption(c)));
    output.add_columns(mapping.captions());

    let mut misses = 0usize;
    for row in input.rows() {
        let mut out = Row::with_capacity(output.columns().len());
        for caption in input.columns() {
            let value = row.get(caption).cloned().unwrap_or_default();
            out.insert(provided_caption(caption), value);
        }

        match lookup_row(row, &keys, queryset, mapping) {
            Ok(record) => {
                for entry in mapping {
                    out.insert(entry.caption.clone(), resolve_cell(record.as_ref(), &entry.path));
                }
            }
            Err(e) => {
                misses += 1;
                let placeholder = error_placeholder(&e);
                for entry in mapping {
                    out.insert(entry.caption.clone(), placeholder.clone());
                }
            }
        }

        output.append_row(out);
    }

    log::info!(
        "Sheet '{}': {} rows, {} without a unique match",
        input.name(),
        input.len(),
        misses
    );

    output
}

fn lookup_row(
    row: &Row,
    keys: &[&str],
    queryset: &dyn QuerySet,
    mapping: &SheetMapping,
) -> Result<super::RecordRef, LookupError> {
    if keys.is_empty() {
        return Err(LookupError::Failed("no column to match records by".to_string()));
    }

    let lookups: Vec<Lookup> = keys
        .iter()
        .filter_map(|key| {
            mapping.get(key).map(|entry| {
                Lookup::new(entry.path.clone(), row.get(*key).cloned().unwrap_or_default())
            })
        })
        .collect();

    queryset.get(&lookups)
}
