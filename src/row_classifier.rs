use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::cell_value::{cell_at, CellValue};
use crate::column_resolver::{ColumnField, ColumnMap};
use crate::date_parser::{format_day, parse_date};
use crate::error::{DiariaError, Result};
use crate::money_parser::parse_money;
use crate::records::{NormalizedRecord, TimelineRecord, NOT_AVAILABLE};

pub const ANALYSIS_WINDOW_DAYS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    BlankRow,
    NoDepartureDate,
    OutsideWindow,
    AlreadyPaid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Included(TimelineRecord),
    Excluded(ExclusionReason),
}

/// First day still inside the analysis window.
pub fn window_start(reference_date: NaiveDate) -> NaiveDate {
    reference_date - Duration::days(i64::from(ANALYSIS_WINDOW_DAYS))
}

fn payment_date_missing(cell: &CellValue) -> bool {
    match cell {
        CellValue::Empty => true,
        CellValue::Text(s) => {
            let text = s.trim();
            text.is_empty() || text.eq_ignore_ascii_case(NOT_AVAILABLE)
        }
        _ => false,
    }
}

/// Unpaid when the payment date is blank/"N/A", or when a total-paid column
/// exists and its amount is zero. Either signal is enough.
pub fn is_unpaid(row: &[CellValue], columns: &ColumnMap) -> bool {
    if payment_date_missing(cell_at(row, columns.get(ColumnField::PaymentDate))) {
        return true;
    }
    columns
        .get(ColumnField::TotalPaid)
        .map(|idx| parse_money(cell_at(row, Some(idx))) == 0.0)
        .unwrap_or(false)
}

pub fn travel_date_range(departure: &CellValue, arrival: &CellValue) -> String {
    let departure_text = match parse_date(departure) {
        Some(date) => format_day(date),
        None => departure
            .as_text()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    };
    match parse_date(arrival).map(format_day) {
        Some(arrival_text) if arrival_text != departure_text => {
            format!("{departure_text} a {arrival_text}")
        }
        _ => departure_text,
    }
}

fn text_field(row: &[CellValue], columns: &ColumnMap, field: ColumnField) -> String {
    cell_at(row, columns.get(field))
        .as_text()
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn date_field(row: &[CellValue], columns: &ColumnMap, field: ColumnField) -> Option<NaiveDate> {
    parse_date(cell_at(row, columns.get(field)))
}

fn malformed(line: usize, message: String) -> DiariaError {
    DiariaError::RowProcessing { line, message }
}

/// Decides whether one data row is a pending diária inside the window.
/// `line` is the 1-based sheet line, used only for error reporting.
pub fn classify_row(
    row: &[CellValue],
    columns: &ColumnMap,
    window_start: NaiveDate,
    line: usize,
) -> Result<RowOutcome> {
    if row.iter().all(CellValue::is_blank) {
        return Ok(RowOutcome::Excluded(ExclusionReason::BlankRow));
    }

    let departure_cell = cell_at(row, columns.get(ColumnField::DepartureDate));
    if let CellValue::Invalid(err) = departure_cell {
        return Err(malformed(line, format!("departure date cell holds {err}")));
    }
    let Some(departure_date) = parse_date(departure_cell) else {
        debug!(line, "row excluded: departure date missing or unreadable");
        return Ok(RowOutcome::Excluded(ExclusionReason::NoDepartureDate));
    };
    if departure_date < window_start {
        return Ok(RowOutcome::Excluded(ExclusionReason::OutsideWindow));
    }
    if let CellValue::Invalid(err) = cell_at(row, columns.get(ColumnField::PaymentDate)) {
        return Err(malformed(line, format!("payment date cell holds {err}")));
    }
    if !is_unpaid(row, columns) {
        return Ok(RowOutcome::Excluded(ExclusionReason::AlreadyPaid));
    }

    let amount_cell = cell_at(row, columns.get(ColumnField::AmountDue));
    if let CellValue::Invalid(err) = amount_cell {
        return Err(malformed(line, format!("amount cell holds {err}")));
    }
    let amount = parse_money(amount_cell);
    if !amount.is_finite() {
        return Err(malformed(line, format!("amount is not a finite number: {amount}")));
    }

    let record = NormalizedRecord {
        id: text_field(row, columns, ColumnField::RecordId),
        creditor_name: text_field(row, columns, ColumnField::CreditorName),
        travel_date_range: travel_date_range(
            departure_cell,
            cell_at(row, columns.get(ColumnField::ArrivalDate)),
        ),
        amount,
        status: text_field(row, columns, ColumnField::Status),
        reason: text_field(row, columns, ColumnField::Reason),
        destination: text_field(row, columns, ColumnField::Destination),
        departure_date,
    };

    Ok(RowOutcome::Included(TimelineRecord {
        record,
        request_date: date_field(row, columns, ColumnField::RequestDate),
        supervisor_approval_date: date_field(row, columns, ColumnField::SupervisorApprovalDate),
        authorizing_officer_approval_date: date_field(
            row,
            columns,
            ColumnField::AuthorizingOfficerApprovalDate,
        ),
    }))
}
