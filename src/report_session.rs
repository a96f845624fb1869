use serde::Serialize;
use tracing::{info, warn};

use crate::diaria_report::DiariaReport;
use crate::error::Result;

/// Issued when a load starts; only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishOutcome {
    Applied,
    /// A newer load was started; this result was dropped.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedReport {
    pub ticket: LoadTicket,
    pub source_name: String,
    pub report: DiariaReport,
}

/// Holds the report currently on display. Loads may finish out of order;
/// a result only replaces the displayed report if no newer load began.
#[derive(Debug, Default)]
pub struct ReportSession {
    issued: u64,
    published: Option<PublishedReport>,
}

impl ReportSession {
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// A failed load leaves the previous report in place and hands the error
    /// back to the caller.
    pub fn publish(
        &mut self,
        ticket: LoadTicket,
        source_name: impl Into<String>,
        result: Result<DiariaReport>,
    ) -> Result<PublishOutcome> {
        if ticket.0 != self.issued {
            warn!(ticket = ticket.0, latest = self.issued, "stale report load discarded");
            return Ok(PublishOutcome::Stale);
        }
        let report = result?;
        let source_name = source_name.into();
        info!(ticket = ticket.0, source = %source_name, "report published");
        self.published = Some(PublishedReport {
            ticket,
            source_name,
            report,
        });
        Ok(PublishOutcome::Applied)
    }

    pub fn current(&self) -> Option<&PublishedReport> {
        self.published.as_ref()
    }

    pub fn clear(&mut self) {
        self.published = None;
    }
}
