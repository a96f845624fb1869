use serde::Serialize;
use std::collections::BTreeSet;

use crate::records::NormalizedRecord;
use crate::row_classifier::ANALYSIS_WINDOW_DAYS;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_unpaid_count: usize,
    pub total_pending_amount: f64,
    pub analysis_window_days: u32,
    pub unique_creditor_count: usize,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            total_unpaid_count: 0,
            total_pending_amount: 0.0,
            analysis_window_days: ANALYSIS_WINDOW_DAYS,
            unique_creditor_count: 0,
        }
    }
}

/// Running totals over included records. Creditor names are compared as
/// exact strings, casing included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingTally {
    pub count: usize,
    pub total_amount: f64,
    pub creditors: BTreeSet<String>,
}

impl PendingTally {
    pub fn add(mut self, record: &NormalizedRecord) -> Self {
        self.count += 1;
        self.total_amount += record.amount;
        self.creditors.insert(record.creditor_name.clone());
        self
    }

    pub fn into_statistics(self) -> Statistics {
        Statistics {
            total_unpaid_count: self.count,
            total_pending_amount: self.total_amount,
            analysis_window_days: ANALYSIS_WINDOW_DAYS,
            unique_creditor_count: self.creditors.len(),
        }
    }
}

pub fn aggregate<'a, I>(records: I) -> Statistics
where
    I: IntoIterator<Item = &'a NormalizedRecord>,
{
    records
        .into_iter()
        .fold(PendingTally::default(), PendingTally::add)
        .into_statistics()
}
