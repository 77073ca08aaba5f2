//! Excel workbook output

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use super::SpreadsheetWriter;
use crate::export::{Sheet, Spreadsheet};

/// Longest worksheet name Excel accepts
const MAX_SHEET_NAME: usize = 31;

/// Writes spreadsheets as `.xlsx` workbooks, every cell as a string
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWriter;

impl SpreadsheetWriter for XlsxWriter {
    fn write_spreadsheet(&self, book: &Spreadsheet) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let mut used: Vec<String> = Vec::with_capacity(book.len());
        for (idx, sheet) in book.sheets().iter().enumerate() {
            let worksheet = workbook.add_worksheet();
            let name = unique_name(worksheet_name(sheet.name(), idx), &used);
            used.push(name.to_lowercase());
            worksheet
                .set_name(&name)
                .with_context(|| format!("Invalid worksheet name: {}", name))?;
            write_sheet(worksheet, sheet)?;
        }

        workbook
            .save_to_buffer()
            .context("Failed to serialize Excel workbook")
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<()> {
    for (col, caption) in sheet.columns().iter().enumerate() {
        worksheet.write_string(0, col as u16, caption)?;
    }

    for (row_idx, values) in sheet.value_rows().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, value) in values.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(row, col as u16, value)?;
            }
        }
    }

    Ok(())
}

/// Excel rejects some characters, leading or trailing quotes and long names
fn worksheet_name(name: &str, idx: usize) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim_matches('\'');
    if cleaned.trim().is_empty() {
        return format!("Sheet{}", idx + 1);
    }
    let truncated: String = cleaned.chars().take(MAX_SHEET_NAME).collect();
    truncated.trim_end_matches('\'').to_string()
}

/// Append `_2`, `_3`, ... until the name is not taken (case-insensitively)
fn unique_name(name: String, used: &[String]) -> String {
    if !used.contains(&name.to_lowercase()) {
        return name;
    }
    let mut n = 2;
    loop {
        let suffix = format!("_{}", n);
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        let base: String = name.chars().take(keep).collect();
        let candidate = format!("{}{}", base.trim_end_matches('\''), suffix);
        if !used.contains(&candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worksheet_name() {
        assert_eq!(worksheet_name("", 0), "Sheet1");
        assert_eq!(worksheet_name("A/B: C", 2), "A_B_ C");
        assert_eq!(worksheet_name(&"x".repeat(40), 0).chars().count(), MAX_SHEET_NAME);
        assert_eq!(worksheet_name("'Mokiniai'", 0), "Mokiniai");
        assert_eq!(worksheet_name("''", 3), "Sheet4");
    }

    #[test]
    fn test_unique_name() {
        let used = vec!["2024_25".to_string()];
        assert_eq!(unique_name("2024_25".into(), &used), "2024_25_2");
        assert_eq!(unique_name("Kita".into(), &used), "Kita");

        let long = "x".repeat(MAX_SHEET_NAME);
        let used = vec![long.clone()];
        let renamed = unique_name(long, &used);
        assert_eq!(renamed.chars().count(), MAX_SHEET_NAME);
        assert!(renamed.ends_with("_2"));
    }

    #[test]
    fn test_colliding_sheet_names_are_made_unique() {
        let mut book = Spreadsheet::new();
        book.create_sheet("2024/25").add_columns(["A"]);
        book.create_sheet("2024:25").add_columns(["B"]);
        let bytes = XlsxWriter.write_spreadsheet(&book).unwrap();

        let parsed = super::super::read_upload("data.xlsx", bytes).unwrap();
        assert_eq!(parsed.sheets()[0].name(), "2024_25");
        assert_eq!(parsed.sheets()[1].name(), "2024_25_2");
    }

    #[test]
    fn test_writes_workbook() {
        let mut book = Spreadsheet::new();
        book.create_sheet("Duomenys").add_columns(["Name"]);
        let bytes = XlsxWriter.write_spreadsheet(&book).unwrap();
        // ZIP local file header
        assert_eq!(&bytes[..2], b"PK");
    }
}
