use thiserror::Error;

use crate::column_resolver::ColumnField;

#[derive(Error, Debug)]
pub enum DiariaError {
    #[error("document could not be decoded as a spreadsheet: {0}")]
    DocumentDecode(String),

    #[error("document has no rows")]
    EmptyDocument,

    #[error("missing required columns: {}", join_fields(.fields))]
    MissingColumns { fields: Vec<ColumnField> },

    #[error("row {line}: {message}")]
    RowProcessing { line: usize, message: String },

    #[error("unsupported file format: .{0} (expected .csv/.xlsx/.xls/.xlsm/.xlsb/.ods)")]
    UnsupportedFormat(String),

    #[error("source file not found: {0}")]
    SourceNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiariaError {
    /// Stable machine-readable code carried by the JSON error envelopes.
    pub fn category(&self) -> &'static str {
        match self {
            DiariaError::DocumentDecode(_) => "DOCUMENT_DECODE_ERROR",
            DiariaError::EmptyDocument => "EMPTY_DOCUMENT_ERROR",
            DiariaError::MissingColumns { .. } => "MISSING_COLUMNS_ERROR",
            DiariaError::RowProcessing { .. } => "ROW_PROCESSING_ERROR",
            DiariaError::UnsupportedFormat(_) => "UNSUPPORTED_FORMAT_ERROR",
            DiariaError::SourceNotFound(_) => "SOURCE_NOT_FOUND_ERROR",
            DiariaError::InvalidRequest(_) => "VALIDATION_ERROR",
            DiariaError::Io(_) => "IO_ERROR",
        }
    }
}

fn join_fields(fields: &[ColumnField]) -> String {
    fields
        .iter()
        .map(|f| f.header_label())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, DiariaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_names_every_field() {
        let err = DiariaError::MissingColumns {
            fields: vec![ColumnField::DepartureDate, ColumnField::AmountDue],
        };
        assert_eq!(
            err.to_string(),
            "missing required columns: SAÍDA ORIGEM, VALOR À PAGAR"
        );
        assert_eq!(err.category(), "MISSING_COLUMNS_ERROR");
    }

    #[test]
    fn row_errors_carry_the_sheet_line() {
        let err = DiariaError::RowProcessing {
            line: 7,
            message: "amount cell holds #REF!".to_string(),
        };
        assert_eq!(err.to_string(), "row 7: amount cell holds #REF!");
    }
}
