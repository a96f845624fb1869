use chrono::NaiveDate;
use serde::Serialize;

use crate::date_parser::{days_between, format_day};
use crate::records::TimelineRecord;

pub const STAGE_LABELS: [&str; 3] = ["Solicitação", "Chefia", "Ordenador"];
const UNSET_DATE_TEXT: &str = "--/--/--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Done,
    Current,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalStep {
    pub label: &'static str,
    pub date: Option<NaiveDate>,
    pub date_text: String,
    pub state: StepState,
    pub days_since_previous: Option<i64>,
}

fn milestones(record: &TimelineRecord) -> [Option<NaiveDate>; 3] {
    [
        record.request_date,
        record.supervisor_approval_date,
        record.authorizing_officer_approval_date,
    ]
}

/// Number of approval milestones reached (0..=3).
///
/// Each milestone is checked on its own, in order, and the last present one
/// sets the count: a record carrying only the authorizing-officer date reports
/// 3 even though the earlier dates are missing. Known quirk of the tracking
/// panel, kept as is.
pub fn completed_stages(record: &TimelineRecord) -> u8 {
    let mut stages = 0;
    if record.request_date.is_some() {
        stages = 1;
    }
    if record.supervisor_approval_date.is_some() {
        stages = 2;
    }
    if record.authorizing_officer_approval_date.is_some() {
        stages = 3;
    }
    stages
}

pub fn approval_steps(record: &TimelineRecord) -> Vec<ApprovalStep> {
    let dates = milestones(record);
    let current = usize::from(completed_stages(record));
    STAGE_LABELS
        .into_iter()
        .zip(dates)
        .enumerate()
        .map(|(i, (label, date))| {
            let state = if date.is_some() {
                StepState::Done
            } else if i == current {
                StepState::Current
            } else {
                StepState::Pending
            };
            ApprovalStep {
                label,
                date,
                date_text: date
                    .map(format_day)
                    .unwrap_or_else(|| UNSET_DATE_TEXT.to_string()),
                state,
                days_since_previous: i
                    .checked_sub(1)
                    .and_then(|prev| days_between(dates[prev], date)),
            }
        })
        .collect()
}

/// Orders by departure date, newest first. Ties keep input order.
pub fn sort_by_departure_desc(records: &mut [TimelineRecord]) {
    records.sort_by(|a, b| b.record.departure_date.cmp(&a.record.departure_date));
}

pub fn most_recent(records: &[TimelineRecord], limit: Option<usize>) -> Vec<TimelineRecord> {
    let mut out = records.to_vec();
    sort_by_departure_desc(&mut out);
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    out
}
