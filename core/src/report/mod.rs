//! Report synthesis: one individual report per task outcome, merged into a
//! single ordered master report.

mod individual;
mod master;

pub use individual::{IndividualReport, Section, SectionBody};
pub use master::{MasterReport, StatusRow};

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::context::OutputLayout;
use crate::error::RunError;
use crate::task::{OutcomeSet, Task};

/// Everything the synthesizer needs; it is pure with respect to this input.
pub struct SynthesisInput<'a> {
    pub run_id: &'a str,
    pub generated_at: DateTime<Utc>,
    pub total_duration: Duration,
    pub install_tasks: &'a [Task],
    pub install_outcomes: Option<&'a OutcomeSet>,
    pub capture_tasks: &'a [Task],
    pub capture_outcomes: &'a OutcomeSet,
    pub warnings: Vec<String>,
}

pub struct ReportSynthesizer;

impl ReportSynthesizer {
    /// Build the master report: individual reports for every capture
    /// outcome (in the order the coordinator reported, which is
    /// registration order), a status table covering install and capture
    /// tasks, and an executive summary of counts plus rule-check flags
    /// collected from the artifacts.
    pub fn synthesize(input: SynthesisInput<'_>) -> MasterReport {
        let mut sections = Vec::with_capacity(input.capture_outcomes.len());
        let mut flagged = Vec::new();

        for outcome in input.capture_outcomes.iter() {
            let task = find_task(input.capture_tasks, &outcome.task_id);
            if let Some(artifact) = &outcome.artifact {
                for finding in artifact.flagged() {
                    flagged.push(format!("{}: {finding}", task.name));
                }
            }
            sections.push(IndividualReport::from_outcome(&task, outcome, input.generated_at));
        }

        let mut status_rows = Vec::new();
        if let Some(install_outcomes) = input.install_outcomes {
            for outcome in install_outcomes.iter() {
                let task = find_task(input.install_tasks, &outcome.task_id);
                status_rows.push(StatusRow {
                    name: task.name.clone(),
                    status: outcome.status,
                    duration_secs: outcome.duration().num_milliseconds() as f64 / 1000.0,
                });
            }
        }
        for outcome in input.capture_outcomes.iter() {
            let task = find_task(input.capture_tasks, &outcome.task_id);
            status_rows.push(StatusRow {
                name: task.name.clone(),
                status: outcome.status,
                duration_secs: outcome.duration().num_milliseconds() as f64 / 1000.0,
            });
        }

        MasterReport {
            run_id: input.run_id.to_string(),
            generated_at: input.generated_at,
            total_duration: input.total_duration,
            status_rows,
            counts: input.capture_outcomes.counts(),
            warnings: input.warnings,
            flagged,
            sections,
        }
    }

    /// Persist the individual reports and the master report.
    ///
    /// Individual-report write failures degrade to a warning; failing to
    /// write the master report is the only hard failure of the whole run.
    pub fn persist(master: &MasterReport, layout: &OutputLayout) -> Result<PathBuf, RunError> {
        for section in &master.sections {
            let path = layout.reports_individual.join(section.file_name());
            if let Err(e) = std::fs::write(&path, section.render()) {
                warn!(path = %path.display(), error = %e, "could not write individual report");
            }
        }

        let path = layout.reports_master.join(master.file_name());
        std::fs::write(&path, master.render()).map_err(|source| RunError::SynthesisIo {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), "master report written");
        Ok(path)
    }
}

/// Resolve an outcome's task descriptor. An id absent from the task list
/// indicates a registry mismatch; the report still renders, under a
/// placeholder named after the id, rather than losing the outcome.
fn find_task(tasks: &[Task], id: &str) -> Task {
    match tasks.iter().find(|t| t.id == id) {
        Some(task) => task.clone(),
        None => {
            error!(task_id = %id, "outcome without a registered task; using placeholder");
            Task::capture(id, id)
        }
    }
}
