use std::fmt;

use chrono::{DateTime, Utc};
use tracing::info;

use mm_core::RunStats;

/// Stages of a report run. Transitions only move forward; any error makes
/// the run fail in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Collecting,
    Scraping,
    Summarizing,
    Rendering,
    Sending,
    Archiving,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collecting => "collecting",
            Self::Scraping => "scraping",
            Self::Summarizing => "summarizing",
            Self::Rendering => "rendering",
            Self::Sending => "sending",
            Self::Archiving => "archiving",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The two report flavours share the pipeline and differ in prompt,
/// rendering and persistence of the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Media,
    Hansard,
}

impl ReportKind {
    pub fn job_id(&self, at: DateTime<Utc>) -> String {
        let stamp = at.format("%Y%m%d_%H%M%S");
        match self {
            Self::Media => format!("media_report_{stamp}"),
            Self::Hansard => format!("hansard_report_{stamp}"),
        }
    }

    pub fn subject(&self, at: DateTime<Utc>) -> String {
        let day = at.format("%-d %B %Y");
        match self {
            Self::Media => format!("Daily Media Monitoring Report - {day}"),
            Self::Hansard => format!("Parliamentary Questions Briefing - {day}"),
        }
    }
}

/// What a pending article contributed to the run.
#[derive(Debug, Clone)]
pub enum SourceText {
    /// Operator-pasted content, used verbatim instead of scraping.
    Pasted(String),
    /// Text extracted from the live page.
    Scraped { title: Option<String>, text: String },
    /// The scrape failed; the article is still listed in the report.
    Failed(String),
}

/// Mutable state of one run, carried through the pipeline for logging and
/// the final outcome counters.
#[derive(Debug)]
pub struct ReportJob {
    pub kind: ReportKind,
    pub report_id: String,
    pub state: RunState,
    pub pending_ids: Vec<i64>,
    pub stats: RunStats,
}

impl ReportJob {
    pub fn new(kind: ReportKind, started_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            report_id: kind.job_id(started_at),
            state: RunState::Collecting,
            pending_ids: Vec::new(),
            stats: RunStats::default(),
        }
    }

    pub fn advance(&mut self, next: RunState) {
        info!(
            report_id = %self.report_id,
            from = %self.state,
            to = %next,
            "report run transition"
        );
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn job_ids_embed_kind_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 14, 30, 5).unwrap();
        assert_eq!(ReportKind::Media.job_id(at), "media_report_20260309_143005");
        assert_eq!(
            ReportKind::Hansard.job_id(at),
            "hansard_report_20260309_143005"
        );
    }

    #[test]
    fn subjects_carry_a_readable_date() {
        let at = Utc.with_ymd_and_hms(2026, 3, 9, 14, 30, 5).unwrap();
        assert_eq!(
            ReportKind::Media.subject(at),
            "Daily Media Monitoring Report - 9 March 2026"
        );
        assert!(ReportKind::Hansard.subject(at).contains("9 March 2026"));
    }

    #[test]
    fn advance_moves_the_state() {
        let mut job = ReportJob::new(ReportKind::Media, Utc::now());
        assert_eq!(job.state, RunState::Collecting);
        job.advance(RunState::Scraping);
        assert_eq!(job.state, RunState::Scraping);
    }
}
