//! Dump query results into a sheet

use anyhow::Result;

use super::{QuerySet, RecordRef, Row, Sheet, SheetMapping, cell_text, resolve_path};

/// Dump every record of `queryset` into a new sheet
pub fn dump_query_to_sheet(queryset: &mut dyn QuerySet, mapping: &SheetMapping) -> Result<Sheet> {
    let mut sheet = Sheet::new();
    dump_query_into(queryset, mapping, &mut sheet)?;
    Ok(sheet)
}

/// Dump every record of `queryset` into `sheet`, one column per mapping entry
///
/// Cells that fail to resolve hold an error placeholder; the export goes on.
pub fn dump_query_into(
    queryset: &mut dyn QuerySet,
    mapping: &SheetMapping,
    sheet: &mut Sheet,
) -> Result<()> {
    let related = mapping.related();
    if !related.is_empty() {
        log::debug!("Selecting related: {:?}", related);
        queryset.select_related(&related);
    }

    sheet.add_columns(mapping.captions());

    let records = queryset.records()?;
    let failed_cells = write_rows(&records, mapping, sheet);

    if failed_cells > 0 {
        log::warn!(
            "{} of {} cells could not be resolved",
            failed_cells,
            records.len() * mapping.len()
        );
    }
    log::info!("Dumped {} records into {} columns", records.len(), mapping.len());

    Ok(())
}

/// Append one row per record; returns how many cells failed to resolve
fn write_rows(records: &[RecordRef], mapping: &SheetMapping, sheet: &mut Sheet) -> usize {
    let mut failed_cells = 0usize;

    for record in records {
        let mut row = Row::with_capacity(mapping.len());
        for entry in mapping {
            let result = resolve_path(record.as_ref(), &entry.path);
            if result.is_err() {
                failed_cells += 1;
            }
            row.insert(entry.caption.clone(), cell_text(result));
        }
        sheet.append_row(row);
    }
    failed_cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemoryQuerySet;
    use serde_json::json;

    fn mapping() -> SheetMapping {
        SheetMapping::parse("Name: person__name\nAge: person__age")
    }

    #[test]
    fn test_dump_two_records() {
        let mut set = MemoryQuerySet::from_json(json!([
            {"person": {"name": "Ona", "age": 17}},
            {"person": {"name": "Jonas", "age": 16}},
        ]))
        .unwrap();

        let sheet = dump_query_to_sheet(&mut set, &mapping()).unwrap();
        assert_eq!(sheet.columns(), &["Name", "Age"]);
        let rows: Vec<_> = sheet.value_rows().collect();
        assert_eq!(rows, vec![vec!["Ona", "17"], vec!["Jonas", "16"]]);
        assert!(set.related().contains("person"));
    }

    #[test]
    fn test_missing_relation_degrades_cells_only() {
        let mut set = MemoryQuerySet::from_json(json!([
            {"_label": "Be asmens"},
            {"person": {"name": "Jonas", "age": 16}},
        ]))
        .unwrap();

        let sheet = dump_query_to_sheet(&mut set, &mapping()).unwrap();
        assert_eq!(sheet.len(), 2);
        assert!(sheet.cell(0, "Name").starts_with("Error: "));
        assert!(sheet.cell(0, "Age").starts_with("Error: "));
        assert_eq!(sheet.cell(1, "Name"), "Jonas");
    }

    #[test]
    fn test_failed_cells_counted_from_resolution() {
        let set = MemoryQuerySet::from_json(json!([
            {"note": "Error: tai tik tekstas"},
            {"_label": "be pastabos"},
        ]))
        .unwrap();
        let records = set.records().unwrap();
        let mut sheet = Sheet::new();
        let mapping = SheetMapping::parse("Note: note");
        sheet.add_columns(mapping.captions());

        let failed = write_rows(&records, &mapping, &mut sheet);
        assert_eq!(failed, 1);
        assert_eq!(sheet.cell(0, "Note"), "Error: tai tik tekstas");
        assert!(sheet.cell(1, "Note").starts_with("Error: "));
    }

    #[test]
    fn test_column_order_follows_mapping() {
        let mut set = MemoryQuerySet::from_json(json!([{"a": 1, "b": 2, "c": 3}])).unwrap();
        let mapping = SheetMapping::parse("C: c\nA: a\nB: b");
        let sheet = dump_query_to_sheet(&mut set, &mapping).unwrap();
        assert_eq!(sheet.columns(), &["C", "A", "B"]);
        assert_eq!(sheet.value_rows().next().unwrap(), vec!["3", "1", "2"]);
    }

    #[test]
    fn test_dump_into_existing_sheet() {
        let mut set = MemoryQuerySet::from_json(json!([{"a": 1}])).unwrap();
        let mut sheet = Sheet::named("Duomenys");
        dump_query_into(&mut set, &SheetMapping::parse("A: a"), &mut sheet).unwrap();
        assert_eq!(sheet.name(), "Duomenys");
        assert_eq!(sheet.cell(0, "A"), "1");
    }
}
