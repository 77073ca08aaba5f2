//! Delimited text output (CSV and tab separated UTF-16)

use anyhow::{Context, Result, anyhow};

use super::SheetWriter;
use crate::export::Sheet;

/// Byte encoding of the written text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Little-endian UTF-16 preceded by a byte order mark
    Utf16,
}

/// Writes a sheet as delimited text, header row first
#[derive(Debug, Clone)]
pub struct CsvWriter {
    pub delimiter: u8,
    pub encoding: TextEncoding,
}

impl Default for CsvWriter {
    fn default() -> Self {
        CsvWriter {
            delimiter: b',',
            encoding: TextEncoding::Utf8,
        }
    }
}

impl CsvWriter {
    /// Tab separated UTF-16, the variant spreadsheet programs open without an import dialog
    pub fn utf16_tab() -> Self {
        CsvWriter {
            delimiter: b'\t',
            encoding: TextEncoding::Utf16,
        }
    }

    fn write_utf8(&self, sheet: &Sheet) -> Result<Vec<u8>> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        wtr.write_record(sheet.columns())
            .context("Failed to write CSV header")?;

        for (idx, values) in sheet.value_rows().enumerate() {
            wtr.write_record(&values)
                .with_context(|| format!("Failed to write CSV row {}", idx + 1))?;
        }

        wtr.into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e.error()))
    }
}

impl SheetWriter for CsvWriter {
    fn write_sheet(&self, sheet: &Sheet) -> Result<Vec<u8>> {
        let utf8 = self.write_utf8(sheet)?;
        match self.encoding {
            TextEncoding::Utf8 => Ok(utf8),
            TextEncoding::Utf16 => {
                let text = String::from_utf8(utf8).context("CSV output is not valid UTF-8")?;
                Ok(encode_utf16_le(&text))
            }
        }
    }
}

/// Encode text as UTF-16LE with a leading byte order mark
fn encode_utf16_le(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&[0xFF, 0xFE]);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}
