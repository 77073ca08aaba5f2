//! Parse uploaded spreadsheets into named sheets
//!
//! The first row of every sheet holds the captions; the remaining non-empty
//! rows are data. ODS and XLSX files may hold several sheets, CSV files hold one.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, Ods, Reader, Xlsx, open_workbook_from_rs};

use crate::export::{Row, Sheet, Spreadsheet};

/// Parse an uploaded file, choosing the parser by the file name's extension
pub fn read_upload(file_name: &str, bytes: Vec<u8>) -> Result<Spreadsheet> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let book = match extension.as_str() {
        "ods" => {
            let mut workbook: Ods<_> = open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|e| anyhow!("Failed to open ODS file {}: {}", file_name, e))?;
            read_workbook(&mut workbook)?
        }
        "xlsx" => {
            let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
                .map_err(|e| anyhow!("Failed to open Excel file {}: {}", file_name, e))?;
            read_workbook(&mut workbook)?
        }
        "csv" => {
            let stem = Path::new(file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Sheet1");
            Spreadsheet::from(read_csv(stem, &bytes)?)
        }
        other => bail!(
            "Unsupported upload format '{}' for {} (expected ods, xlsx or csv)",
            other,
            file_name
        ),
    };

    log::debug!("Upload {} parsed into {} sheets", file_name, book.len());
    Ok(book)
}

/// Read and parse an uploaded file from disk
pub fn read_upload_file(path: &Path) -> Result<Spreadsheet> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read upload: {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    read_upload(file_name, bytes)
}

fn read_workbook<RS, R>(workbook: &mut R) -> Result<Spreadsheet>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let mut book = Spreadsheet::new();

    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| anyhow!("Failed to read sheet {}: {}", name, e))?;

        let mut rows = range.rows();
        let header: Vec<Option<String>> = match rows.next() {
            Some(header) => header.iter().map(cell_string).collect(),
            None => {
                book.push(Sheet::named(name));
                continue;
            }
        };

        let sheet = book.create_sheet(name);
        sheet.add_columns(header.iter().flatten().cloned());

        for cells in rows {
            let row: Row = header
                .iter()
                .zip(cells.iter())
                .filter_map(|(caption, cell)| {
                    let caption = caption.as_ref()?;
                    cell_string(cell).map(|value| (caption.clone(), value))
                })
                .collect();
            if !row.is_empty() {
                sheet.append_row(row);
            }
        }
    }

    Ok(book)
}

fn read_csv(name: &str, bytes: &[u8]) -> Result<Sheet> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let header: Vec<String> = rdr
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut sheet = Sheet::named(name);
    sheet.add_columns(header.iter().filter(|h| !h.is_empty()).cloned());

    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 2))?;
        let row: Row = header
            .iter()
            .zip(record.iter())
            .filter(|(caption, value)| !caption.is_empty() && !value.is_empty())
            .map(|(caption, value)| (caption.clone(), value.to_string()))
            .collect();
        if !row.is_empty() {
            sheet.append_row(row);
        }
    }

    Ok(sheet)
}

/// Cell text, or None for empty cells
fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { Some(s.to_string()) }
        }
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => Some(float_text(*f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        _ => None,
    }
}

/// Whole floats read as integers; beyond 2^53 they keep the float's digits
fn float_text(f: f64) -> String {
    if f.fract() != 0.0 || !f.is_finite() {
        f.to_string()
    } else if f.abs() < MAX_EXACT_INT {
        (f as i64).to_string()
    } else {
        format!("{:.0}", f)
    }
}

/// Largest magnitude below which every whole f64 is an exact integer
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;
