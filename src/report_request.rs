use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{DiariaError, Result};

pub const DEFAULT_MAX_TIMELINE_ITEMS: usize = 8;
const MAX_TIMELINE_ITEMS_LIMIT: u32 = 500;

/// Pipeline knobs, resolved once per document load.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// "Today" for the analysis window.
    pub reference_date: NaiveDate,
    /// `None` keeps the whole timeline.
    pub max_timeline_items: Option<usize>,
    /// Missing required columns fail the load instead of yielding an empty report.
    pub strict_missing_columns: bool,
}

impl ReportOptions {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            max_timeline_items: Some(DEFAULT_MAX_TIMELINE_ITEMS),
            strict_missing_columns: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    pub source_path: Option<String>,
    /// `YYYY-MM-DD`; defaults to the caller's today.
    pub reference_date: Option<String>,
    /// `0` means unlimited.
    pub max_timeline_items: Option<u32>,
    pub strict_missing_columns: Option<bool>,
}

fn parse_optional_text(raw: Option<&str>) -> String {
    raw.unwrap_or_default().trim().to_string()
}

fn parse_timeline_limit(raw: Option<u32>) -> Option<usize> {
    match raw {
        None => Some(DEFAULT_MAX_TIMELINE_ITEMS),
        Some(0) => None,
        Some(n) => Some(n.clamp(1, MAX_TIMELINE_ITEMS_LIMIT) as usize),
    }
}

impl ReportRequest {
    pub fn source_path(&self) -> Result<PathBuf> {
        let path = parse_optional_text(self.source_path.as_deref());
        if path.is_empty() {
            return Err(DiariaError::InvalidRequest("source_path is required".to_string()));
        }
        Ok(PathBuf::from(path))
    }

    pub fn options(&self, today: NaiveDate) -> Result<ReportOptions> {
        let text = parse_optional_text(self.reference_date.as_deref());
        let reference_date = if text.is_empty() {
            today
        } else {
            NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|_| {
                DiariaError::InvalidRequest(format!(
                    "reference_date must be YYYY-MM-DD, got {text}"
                ))
            })?
        };

        Ok(ReportOptions {
            reference_date,
            max_timeline_items: parse_timeline_limit(self.max_timeline_items),
            strict_missing_columns: self.strict_missing_columns.unwrap_or(true),
        })
    }
}
