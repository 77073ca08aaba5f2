//! Downloadable export results

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::formats::{Writer, WriterKind};
use super::{QuerySet, Sheet, SheetMapping, Spreadsheet, dump_query_into, dump_query_to_sheet};

/// Sheet name used when a single-sheet export goes into a spreadsheet format
pub const DEFAULT_SHEET_NAME: &str = "Duomenys";

/// A serialized export, ready to be sent as an attachment
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub mime_type: &'static str,
    pub filename: String,
    pub body: Vec<u8>,
}

impl Download {
    fn new(kind: WriterKind, body: Vec<u8>) -> Self {
        Download {
            mime_type: kind.mime_type(),
            filename: format!("data.{}", kind.extension()),
            body,
        }
    }

    /// Value of the `Content-Disposition` header
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.filename)
    }

    /// Write the body to `path`, or to `filename` in the working directory
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.filename));
        std::fs::write(&path, &self.body)
            .with_context(|| format!("Failed to write export: {}", path.display()))?;
        log::info!("Export written to: {}", path.display());
        Ok(path)
    }
}

/// Export `queryset` with `mapping` in the format named by `writer_code`
///
/// An unknown code fails before any record is read.
pub fn download_selected(
    queryset: &mut dyn QuerySet,
    writer_code: &str,
    mapping: &SheetMapping,
    sheet_name: &str,
) -> Result<Download> {
    let kind = WriterKind::from_code(writer_code)?;

    let body = match kind.writer() {
        Writer::Sheet(writer) => {
            let sheet = dump_query_to_sheet(queryset, mapping)?;
            writer.write_sheet(&sheet)?
        }
        Writer::Spreadsheet(writer) => {
            let mut sheet = Sheet::named(sheet_name);
            dump_query_into(queryset, mapping, &mut sheet)?;
            writer.write_spreadsheet(&Spreadsheet::from(sheet))?
        }
    };

    Ok(Download::new(kind, body))
}

/// Serialize a whole spreadsheet
///
/// Single-sheet formats take the first sheet; further sheets are dropped.
pub fn download_spreadsheet(book: &Spreadsheet, writer_code: &str) -> Result<Download> {
    let kind = WriterKind::from_code(writer_code)?;

    let body = match kind.writer() {
        Writer::Sheet(writer) => {
            if book.len() > 1 {
                log::warn!(
                    "{} holds a single sheet; dropping {} of {} sheets",
                    kind,
                    book.len() - 1,
                    book.len()
                );
            }
            let empty = Sheet::new();
            writer.write_sheet(book.sheets().first().unwrap_or(&empty))?
        }
        Writer::Spreadsheet(writer) => writer.write_spreadsheet(book)?,
    };

    Ok(Download::new(kind, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemoryQuerySet;
    use crate::export::formats::WriterError;
    use serde_json::json;

    fn people() -> MemoryQuerySet {
        MemoryQuerySet::from_json(json!([
            {"person": {"name": "Ona", "age": 17}},
            {"person": {"name": "Jonas", "age": 16}},
        ]))
        .unwrap()
    }

    fn mapping() -> SheetMapping {
        SheetMapping::parse("Name: person__name\nAge: person__age")
    }

    #[test]
    fn test_download_csv() {
        let download = download_selected(&mut people(), "CSV", &mapping(), DEFAULT_SHEET_NAME).unwrap();
        assert_eq!(download.mime_type, "text/csv");
        assert_eq!(download.content_disposition(), "attachment; filename=data.csv");
        assert_eq!(
            String::from_utf8(download.body).unwrap(),
            "Name,Age\nOna,17\nJonas,16\n"
        );
    }

    #[test]
    fn test_download_ods_uses_sheet_name() {
        let download = download_selected(&mut people(), "ODS", &mapping(), "Duomenys").unwrap();
        assert_eq!(download.filename, "data.ods");

        let parsed = crate::export::formats::read_upload("data.ods", download.body).unwrap();
        let sheet = parsed.sheet("Duomenys").unwrap();
        assert_eq!(sheet.cell(1, "Name"), "Jonas");
    }

    #[test]
    fn test_unknown_writer_fails_whole_export() {
        let err = download_selected(&mut people(), "PDF", &mapping(), DEFAULT_SHEET_NAME).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WriterError>(),
            Some(WriterError::UnknownWriter { .. })
        ));
    }

    #[test]
    fn test_save_download() {
        let dir = tempfile::tempdir().unwrap();
        let download = download_selected(&mut people(), "CSV", &mapping(), DEFAULT_SHEET_NAME).unwrap();
        let target = dir.path().join("out.csv");
        let written = download.save(Some(&target)).unwrap();
        assert_eq!(std::fs::read(written).unwrap(), download.body);
    }
}
