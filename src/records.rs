use chrono::NaiveDate;
use serde::Serialize;

use crate::money_parser::format_amount;

pub const NOT_AVAILABLE: &str = "N/A";
pub const REASON_EXCERPT_CHARS: usize = 50;

/// One pending diária as shown in the report table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub id: String,
    pub creditor_name: String,
    pub travel_date_range: String,
    pub amount: f64,
    pub status: String,
    pub reason: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

impl NormalizedRecord {
    pub fn amount_text(&self) -> String {
        format_amount(self.amount)
    }

    pub fn reason_excerpt(&self) -> String {
        truncate_with_ellipsis(&self.reason, REASON_EXCERPT_CHARS)
    }
}

/// A pending diária plus its approval milestones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRecord {
    #[serde(flatten)]
    pub record: NormalizedRecord,
    pub request_date: Option<NaiveDate>,
    pub supervisor_approval_date: Option<NaiveDate>,
    pub authorizing_officer_approval_date: Option<NaiveDate>,
}

pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out = text.chars().take(max_chars).collect::<String>();
    out.push_str("...");
    out
}
