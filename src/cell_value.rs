use calamine::Data;
use chrono::NaiveDate;
use serde::Serialize;

use crate::date_parser::{date_from_serial, format_day};

/// One spreadsheet cell, as delivered by the document decoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// Spreadsheet error value such as `#REF!` or `#DIV/0!`.
    Invalid(String),
}

pub type RawRow = Vec<CellValue>;

pub(crate) fn trim_cell(text: &str) -> String {
    text.trim()
        .trim_start_matches('\u{feff}')
        .trim()
        .to_string()
}

fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl CellValue {
    pub fn from_text(raw: &str) -> Self {
        let text = trim_cell(raw);
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text)
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display text of the cell, `None` when there is nothing to show.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let text = trim_cell(s);
                if text.is_empty() {
                    None
                } else {
                    Some(text)
                }
            }
            CellValue::Number(v) => Some(format_number(*v)),
            CellValue::Date(d) => Some(format_day(*d)),
            CellValue::Invalid(e) => Some(e.clone()),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                CellValue::from_text(s)
            }
            Data::Int(v) => CellValue::Number(*v as f64),
            Data::Float(v) => CellValue::Number(*v),
            Data::Bool(v) => CellValue::Text(v.to_string()),
            Data::DateTime(dt) => {
                let serial = dt.as_f64();
                date_from_serial(serial)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Number(serial))
            }
            Data::Error(e) => CellValue::Invalid(e.to_string()),
        }
    }
}

/// Cell at `idx`, treating unresolved columns and short rows as empty.
pub fn cell_at(row: &[CellValue], idx: Option<usize>) -> &CellValue {
    const EMPTY: &CellValue = &CellValue::Empty;
    idx.and_then(|i| row.get(i)).unwrap_or(EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_cells_are_trimmed_and_blank_text_is_empty() {
        assert_eq!(CellValue::from_text("  CAMPINAS "), CellValue::Text("CAMPINAS".into()));
        assert_eq!(CellValue::from_text("\u{feff}ID"), CellValue::Text("ID".into()));
        assert_eq!(CellValue::from_text("   "), CellValue::Empty);
    }

    #[test]
    fn numbers_render_without_trailing_fraction() {
        assert_eq!(CellValue::Number(120875.0).as_text().as_deref(), Some("120875"));
        assert_eq!(CellValue::Number(69.16).as_text().as_deref(), Some("69.16"));
        assert_eq!(CellValue::Empty.as_text(), None);
        assert_eq!(CellValue::Text(" ".into()).as_text(), None);
    }

    #[test]
    fn calamine_cells_map_onto_tagged_values() {
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(CellValue::from(&Data::Empty), CellValue::Empty);
        assert_eq!(
            CellValue::from(&Data::String(" N/A ".into())),
            CellValue::Text("N/A".into())
        );
        assert!(matches!(
            CellValue::from(&Data::Error(calamine::CellErrorType::Ref)),
            CellValue::Invalid(_)
        ));
    }

    #[test]
    fn cell_at_tolerates_short_rows_and_unmapped_columns() {
        let row = vec![CellValue::Text("a".into())];
        assert_eq!(cell_at(&row, Some(0)), &CellValue::Text("a".into()));
        assert_eq!(cell_at(&row, Some(5)), &CellValue::Empty);
        assert_eq!(cell_at(&row, None), &CellValue::Empty);
    }
}
