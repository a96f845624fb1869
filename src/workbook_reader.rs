use calamine::{open_workbook_auto_from_rs, Reader};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

use crate::cell_value::{CellValue, RawRow};
use crate::error::{DiariaError, Result};

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Csv,
    Spreadsheet,
}

pub fn format_from_extension(extension: &str) -> Result<DocumentFormat> {
    let ext = extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if ext == "csv" {
        Ok(DocumentFormat::Csv)
    } else if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        Ok(DocumentFormat::Spreadsheet)
    } else {
        Err(DiariaError::UnsupportedFormat(ext))
    }
}

fn looks_like_text(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|b| *b >= 0x20 || matches!(b, b'\t' | b'\n' | b'\r'))
}

/// Spreadsheet containers by magic bytes; UTF-8 or Latin-1 text as CSV.
pub fn sniff_format(bytes: &[u8]) -> Result<DocumentFormat> {
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Ok(DocumentFormat::Spreadsheet);
    }
    if std::str::from_utf8(bytes).is_ok() || looks_like_text(bytes) {
        return Ok(DocumentFormat::Csv);
    }
    Err(DiariaError::DocumentDecode(
        "content is neither a spreadsheet nor text".to_string(),
    ))
}

/// Decodes an uploaded document into raw rows of its first sheet.
/// `extension_hint` is the file extension when one is known.
pub fn decode_document(bytes: &[u8], extension_hint: Option<&str>) -> Result<Vec<RawRow>> {
    let format = match extension_hint.map(str::trim).filter(|s| !s.is_empty()) {
        Some(ext) => format_from_extension(ext)?,
        None => sniff_format(bytes)?,
    };
    debug!(?format, bytes = bytes.len(), "decoding document");
    match format {
        DocumentFormat::Csv => read_csv_rows(&decode_text(bytes)),
        DocumentFormat::Spreadsheet => read_spreadsheet_rows(bytes),
    }
}

pub fn read_document(path: &Path) -> Result<Vec<RawRow>> {
    if !path.is_file() {
        return Err(DiariaError::SourceNotFound(path.to_string_lossy().to_string()));
    }
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    format_from_extension(&ext)?;
    let bytes = fs::read(path)?;
    decode_document(&bytes, Some(&ext))
}

/// UTF-8, or Latin-1 for exports written by older office suites.
fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|b| char::from(*b)).collect(),
    }
}

fn sniff_csv_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or_default();
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

fn read_csv_rows(text: &str) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(sniff_csv_delimiter(text))
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for rec in reader.records() {
        let rec = rec.map_err(|e| DiariaError::DocumentDecode(format!("CSV row unreadable: {e}")))?;
        rows.push(rec.iter().map(CellValue::from_text).collect());
    }
    Ok(rows)
}

fn read_spreadsheet_rows(bytes: &[u8]) -> Result<Vec<RawRow>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| DiariaError::DocumentDecode(format!("open workbook failed: {e}")))?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DiariaError::DocumentDecode("workbook has no worksheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| DiariaError::DocumentDecode(format!("read worksheet {first_sheet} failed: {e}")))?;

    // Ranges start at the first used cell; pad so indices stay sheet-absolute.
    let leading_cols = range.start().map(|(_, col)| col as usize).unwrap_or(0);
    let rows = range
        .rows()
        .map(|row| {
            std::iter::repeat(CellValue::Empty)
                .take(leading_cols)
                .chain(row.iter().map(CellValue::from))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    Ok(rows)
}
