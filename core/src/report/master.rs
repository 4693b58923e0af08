use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::individual::IndividualReport;
use crate::task::{StatusCounts, TaskStatus};

const HEAVY_RULE: &str =
    "================================================================================";
const SECTION_RULE: &str =
    "--------------------------------------------------------------------------------";

/// Per-task line in the master report's status table.
#[derive(Debug, Clone)]
pub struct StatusRow {
    pub name: String,
    pub status: TaskStatus,
    pub duration_secs: f64,
}

/// Ordered aggregation of all individual reports plus run metadata.
///
/// The section list is exactly the set of produced individual reports, in
/// task-registration order, never reordered or deduplicated. Rendering is
/// pure: the same inputs always produce the same text, timestamp fields
/// aside.
#[derive(Debug, Clone)]
pub struct MasterReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub total_duration: Duration,
    pub status_rows: Vec<StatusRow>,
    pub counts: StatusCounts,
    pub warnings: Vec<String>,
    pub flagged: Vec<String>,
    pub sections: Vec<IndividualReport>,
}

impl MasterReport {
    /// `MASTER_FORENSIC_REPORT_<timestamp>.txt`.
    pub fn file_name(&self) -> String {
        format!(
            "MASTER_FORENSIC_REPORT_{}.txt",
            self.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out, "{:^80}", "MASTER FORENSIC ANALYSIS REPORT");
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out);
        let _ = writeln!(out, "Run Id: {}", self.run_id);
        let _ = writeln!(
            out,
            "Report Generated: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "Analysis Duration: {:.2}s", self.total_duration.as_secs_f64());
        let _ = writeln!(out, "Total Individual Reports: {}", self.sections.len());

        if !self.warnings.is_empty() {
            let _ = writeln!(out);
            for warning in &self.warnings {
                let _ = writeln!(out, "WARNING: {warning}");
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out, "TASK STATUS");
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out);
        for row in &self.status_rows {
            let _ = writeln!(
                out,
                "{:<40} {:<10} {:>8.2}s",
                row.name,
                row.status.to_string(),
                row.duration_secs
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out, "EXECUTIVE SUMMARY");
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out);
        let _ = writeln!(out, "Task Results: {}", self.counts);
        if self.flagged.is_empty() {
            let _ = writeln!(out, "Flagged Items: none");
        } else {
            let _ = writeln!(out, "Flagged Items:");
            for finding in &self.flagged {
                let _ = writeln!(out, "  ! {finding}");
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out, "TABLE OF CONTENTS");
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out);
        for (idx, section) in self.sections.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", idx + 1, section.title);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out, "DETAILED FINDINGS");
        let _ = writeln!(out, "{HEAVY_RULE}");
        for (idx, section) in self.sections.iter().enumerate() {
            let _ = writeln!(out);
            let _ = writeln!(out, "{SECTION_RULE}");
            let _ = writeln!(out, "SECTION {}: {}", idx + 1, section.title);
            let _ = writeln!(out, "{SECTION_RULE}");
            let _ = writeln!(out);
            let _ = write!(out, "{}", section.render());
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{HEAVY_RULE}");
        let _ = writeln!(out, "END OF REPORT");
        let _ = writeln!(out, "{HEAVY_RULE}");
        out
    }
}
