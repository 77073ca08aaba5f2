//! Output formats and uploaded spreadsheet parsing
//!
//! Writers are looked up by a short code. CSV writers serialize a single
//! sheet; ODS and XLSX writers serialize a whole spreadsheet.

mod delimited;
mod ods;
mod upload;
mod xlsx;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{Sheet, Spreadsheet};

pub use delimited::{CsvWriter, TextEncoding};
pub use ods::OdsWriter;
pub use upload::{read_upload, read_upload_file};
pub use xlsx::XlsxWriter;

/// Serializer for a single sheet
pub trait SheetWriter {
    fn write_sheet(&self, sheet: &Sheet) -> Result<Vec<u8>>;
}

/// Serializer for a spreadsheet of named sheets
pub trait SpreadsheetWriter {
    fn write_spreadsheet(&self, book: &Spreadsheet) -> Result<Vec<u8>>;
}

/// A writer of either shape
pub enum Writer {
    Sheet(Box<dyn SheetWriter>),
    Spreadsheet(Box<dyn SpreadsheetWriter>),
}

/// Available output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriterKind {
    /// Comma separated values, UTF-8
    #[serde(rename = "CSV")]
    Csv,
    /// Tab separated values, UTF-16 with byte order mark
    #[serde(rename = "UTF16CSV")]
    Utf16TabCsv,
    /// Open document spreadsheet
    #[serde(rename = "ODS")]
    Ods,
    /// Office Open XML workbook
    #[serde(rename = "XLSX")]
    Xlsx,
}

/// Error selecting a writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterError {
    /// No writer registered under this code
    UnknownWriter { code: String },
}

impl std::fmt::Display for WriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterError::UnknownWriter { code } => {
                let known: Vec<_> = WriterKind::all().iter().map(|k| k.code()).collect();
                write!(
                    f,
                    "unknown writer '{}' (available: {})",
                    code,
                    known.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for WriterError {}

impl WriterKind {
    /// All formats, in display order
    pub fn all() -> &'static [WriterKind] {
        &[
            WriterKind::Csv,
            WriterKind::Ods,
            WriterKind::Xlsx,
            WriterKind::Utf16TabCsv,
        ]
    }

    /// Look a writer up by its code (case-insensitive)
    pub fn from_code(code: &str) -> Result<Self, WriterError> {
        let wanted = code.trim();
        WriterKind::all()
            .iter()
            .copied()
            .find(|k| k.code().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WriterError::UnknownWriter {
                code: code.to_string(),
            })
    }

    pub fn code(&self) -> &'static str {
        match self {
            WriterKind::Csv => "CSV",
            WriterKind::Utf16TabCsv => "UTF16CSV",
            WriterKind::Ods => "ODS",
            WriterKind::Xlsx => "XLSX",
        }
    }

    /// Human-readable label for choice lists
    pub fn description(&self) -> &'static str {
        match self {
            WriterKind::Csv => "Comma separated values",
            WriterKind::Utf16TabCsv => "Tab separated values (UTF-16)",
            WriterKind::Ods => "Open document spreadsheet",
            WriterKind::Xlsx => "Excel workbook",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            WriterKind::Csv | WriterKind::Utf16TabCsv => "text/csv",
            WriterKind::Ods => "application/vnd.oasis.opendocument.spreadsheet",
            WriterKind::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn file_extensions(&self) -> &'static [&'static str] {
        match self {
            WriterKind::Csv | WriterKind::Utf16TabCsv => &["csv", "txt"],
            WriterKind::Ods => &["ods"],
            WriterKind::Xlsx => &["xlsx"],
        }
    }

    /// Preferred file extension
    pub fn extension(&self) -> &'static str {
        self.file_extensions()[0]
    }

    /// Whether this format holds a single sheet
    pub fn is_sheet_format(&self) -> bool {
        matches!(self, WriterKind::Csv | WriterKind::Utf16TabCsv)
    }

    /// Instantiate the writer for this format
    pub fn writer(&self) -> Writer {
        match self {
            WriterKind::Csv => Writer::Sheet(Box::new(CsvWriter::default())),
            WriterKind::Utf16TabCsv => Writer::Sheet(Box::new(CsvWriter::utf16_tab())),
            WriterKind::Ods => Writer::Spreadsheet(Box::new(OdsWriter::default())),
            WriterKind::Xlsx => Writer::Spreadsheet(Box::new(XlsxWriter)),
        }
    }
}

impl std::fmt::Display for WriterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for WriterKind {
    type Err = WriterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WriterKind::from_code(s)
    }
}
