//! OpenDocument spreadsheet output
//!
//! Builds the ZIP package by hand: an uncompressed `mimetype` entry first,
//! then the manifest, styles, meta and content documents. All cells are
//! written as strings.

use std::io::{Cursor, Write};

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use super::SpreadsheetWriter;
use crate::export::{Sheet, Spreadsheet};

const MIMETYPE: &str = "application/vnd.oasis.opendocument.spreadsheet";

const NS_OFFICE: &str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
const NS_TABLE: &str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
const NS_TEXT: &str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";

/// Writes spreadsheets as `.ods` packages
#[derive(Debug, Clone)]
pub struct OdsWriter {
    /// Value of `meta:generator` in `meta.xml`
    pub generator: String,
}

impl Default for OdsWriter {
    fn default() -> Self {
        OdsWriter {
            generator: format!("nmadb-utils/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl SpreadsheetWriter for OdsWriter {
    fn write_spreadsheet(&self, book: &Spreadsheet) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        let files = [
            ("mimetype", MIMETYPE.to_string()),
            ("META-INF/manifest.xml", manifest_xml()),
            ("styles.xml", styles_xml()),
            ("meta.xml", self.meta_xml()),
            ("content.xml", content_xml(book)),
        ];

        for (path, body) in files {
            // mimetype must be the first entry and stay uncompressed
            let method = if path == "mimetype" {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);

            zip.start_file(path, options)
                .with_context(|| format!("Failed to start ODS entry: {}", path))?;
            zip.write_all(body.as_bytes())
                .with_context(|| format!("Failed to write ODS entry: {}", path))?;
        }

        let cursor = zip.finish().context("Failed to finish ODS package")?;
        Ok(cursor.into_inner())
    }
}

impl OdsWriter {
    fn meta_xml(&self) -> String {
        let now = chrono::Utc::now().to_rfc3339();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><office:document-meta xmlns:office="{}" xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0" xmlns:dc="http://purl.org/dc/elements/1.1/" office:version="1.3"><office:meta><meta:generator>{}</meta:generator><meta:creation-date>{}</meta:creation-date><dc:date>{}</dc:date></office:meta></office:document-meta>"#,
            NS_OFFICE,
            escape(self.generator.as_str()),
            now,
            now
        )
    }
}

fn manifest_xml() -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">"#,
    );
    out.push_str(&format!(
        r#"<manifest:file-entry manifest:full-path="/" manifest:version="1.3" manifest:media-type="{}"/>"#,
        MIMETYPE
    ));
    for path in ["content.xml", "styles.xml", "meta.xml"] {
        out.push_str(&format!(
            r#"<manifest:file-entry manifest:full-path="{}" manifest:media-type="text/xml"/>"#,
            path
        ));
    }
    out.push_str("</manifest:manifest>");
    out
}

fn styles_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-styles xmlns:office="{}" office:version="1.3"><office:styles/></office:document-styles>"#,
        NS_OFFICE
    )
}

fn content_xml(book: &Spreadsheet) -> String {
    let mut out = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="{}" xmlns:table="{}" xmlns:text="{}" office:version="1.3"><office:body><office:spreadsheet>"#,
        NS_OFFICE, NS_TABLE, NS_TEXT
    );

    for (idx, sheet) in book.sheets().iter().enumerate() {
        let name = if sheet.name().is_empty() {
            format!("Sheet{}", idx + 1)
        } else {
            sheet.name().to_string()
        };
        push_table(&mut out, &name, sheet);
    }

    out.push_str("</office:spreadsheet></office:body></office:document-content>");
    out
}

fn push_table(out: &mut String, name: &str, sheet: &Sheet) {
    out.push_str(&format!(r#"<table:table table:name="{}">"#, escape(name)));

    let cols = sheet.columns().len();
    if cols > 1 {
        out.push_str(&format!(
            r#"<table:table-column table:number-columns-repeated="{}"/>"#,
            cols
        ));
    } else {
        out.push_str("<table:table-column/>");
    }

    push_row(out, sheet.columns());
    for values in sheet.value_rows() {
        push_row(out, &values);
    }

    out.push_str("</table:table>");
}

fn push_row(out: &mut String, values: &[String]) {
    out.push_str("<table:table-row>");
    for value in values {
        push_cell(out, value);
    }
    out.push_str("</table:table-row>");
}

fn push_cell(out: &mut String, text: &str) {
    if text.is_empty() {
        out.push_str("<table:table-cell/>");
        return;
    }
    out.push_str(r#"<table:table-cell office:value-type="string">"#);
    for line in text.split('\n') {
        out.push_str("<text:p>");
        push_paragraph_text(out, line);
        out.push_str("</text:p>");
    }
    out.push_str("</table:table-cell>");
}

/// Escaped paragraph text with whitespace that ODF readers would collapse
/// written as `text:s` / `text:tab` elements
///
/// Inside a paragraph one space of a run stays literal; leading spaces,
/// trailing spaces and spaces after a tab are all elements.
fn push_paragraph_text(out: &mut String, line: &str) {
    let mut plain = String::new();
    let mut chars = line.chars().peekable();
    let mut after_break = true;

    while let Some(c) = chars.next() {
        match c {
            '\t' => {
                flush_plain(out, &mut plain);
                out.push_str("<text:tab/>");
                after_break = true;
            }
            ' ' => {
                let mut run = 1;
                while chars.peek() == Some(&' ') {
                    chars.next();
                    run += 1;
                }
                if !after_break && chars.peek().is_some() {
                    plain.push(' ');
                    run -= 1;
                }
                if run > 0 {
                    flush_plain(out, &mut plain);
                    if run == 1 {
                        out.push_str("<text:s/>");
                    } else {
                        out.push_str(&format!(r#"<text:s text:c="{}"/>"#, run));
                    }
                }
                after_break = false;
            }
            c => {
                plain.push(c);
                after_break = false;
            }
        }
    }
    flush_plain(out, &mut plain);
}

fn flush_plain(out: &mut String, plain: &mut String) {
    if !plain.is_empty() {
        out.push_str(&escape(plain.as_str()));
        plain.clear();
    }
}
