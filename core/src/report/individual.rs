use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::task::{Artifact, Task, TaskOutcome, TaskStatus};

const RULE: &str = "================================================================================";
const THIN_RULE: &str = "--------------------------------------------------------------------------------";

/// One section of a rendered report body.
#[derive(Debug, Clone)]
pub struct Section {
    pub heading: Option<String>,
    pub body: SectionBody,
}

#[derive(Debug, Clone)]
pub enum SectionBody {
    Text(String),
    KeyValues(Vec<(String, String)>),
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Human-readable rendering of one task outcome.
///
/// Derived deterministically from the outcome and its artifact; a failed,
/// timed-out or skipped task still gets a report stating what was attempted
/// and why nothing is there.
#[derive(Debug, Clone)]
pub struct IndividualReport {
    pub task_id: String,
    pub title: String,
    pub status: TaskStatus,
    pub generated_at: DateTime<Utc>,
    pub started_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub error: Option<String>,
    pub sections: Vec<Section>,
}

impl IndividualReport {
    pub fn from_outcome(task: &Task, outcome: &TaskOutcome, generated_at: DateTime<Utc>) -> Self {
        let sections = match (&outcome.status, &outcome.artifact) {
            (TaskStatus::Success, Some(artifact)) => artifact_sections(artifact),
            _ => Vec::new(),
        };
        Self {
            task_id: task.id.clone(),
            title: format!("{} REPORT", task.name.to_uppercase()),
            status: outcome.status,
            generated_at,
            started_at: outcome.started_at,
            duration_secs: outcome.duration().num_milliseconds() as f64 / 1000.0,
            error: outcome.error.clone(),
            sections,
        }
    }

    /// `<task>_<timestamp>.txt`, timestamp taken from the generation time.
    pub fn file_name(&self) -> String {
        format!("{}_{}.txt", self.task_id, self.generated_at.format("%Y%m%d_%H%M%S"))
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "{}", self.title);
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out);
        let _ = writeln!(out, "Capture Time: {}", self.started_at.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "Status: {}", self.status);
        let _ = writeln!(out, "Duration: {:.2}s", self.duration_secs);
        if let Some(error) = &self.error {
            let _ = writeln!(out, "Reason: {error}");
        }

        for section in &self.sections {
            let _ = writeln!(out);
            if let Some(heading) = &section.heading {
                let _ = writeln!(out, "{THIN_RULE}");
                let _ = writeln!(out, "{heading}");
                let _ = writeln!(out, "{THIN_RULE}");
            }
            match &section.body {
                SectionBody::Text(text) => {
                    let _ = writeln!(out, "{text}");
                }
                SectionBody::KeyValues(pairs) => {
                    for (key, value) in pairs {
                        let _ = writeln!(out, "{key}: {value}");
                    }
                }
                SectionBody::Table { columns, rows } => {
                    render_table(&mut out, columns, rows);
                }
            }
        }
        out
    }
}

/// Turn an artifact into report sections. Tables render as fixed-width
/// columns; files as path plus size; text verbatim.
fn artifact_sections(artifact: &Artifact) -> Vec<Section> {
    match artifact {
        Artifact::Text(text) => vec![Section {
            heading: None,
            body: SectionBody::Text(text.clone()),
        }],
        Artifact::File { path, bytes } => vec![Section {
            heading: None,
            body: SectionBody::KeyValues(vec![
                ("Artifact File".into(), path.display().to_string()),
                ("Size".into(), format!("{:.2} MB", *bytes as f64 / (1024.0 * 1024.0))),
            ]),
        }],
        Artifact::Table(table) => {
            let mut sections = vec![Section {
                heading: None,
                body: SectionBody::Table {
                    columns: table.columns.clone(),
                    rows: table.rows.clone(),
                },
            }];
            if let Some(note) = &table.truncated {
                sections.push(Section {
                    heading: None,
                    body: SectionBody::Text(format!("Note: {note}")),
                });
            }
            if !table.flagged.is_empty() {
                sections.push(Section {
                    heading: Some("FLAGGED ITEMS".into()),
                    body: SectionBody::Text(
                        table
                            .flagged
                            .iter()
                            .map(|f| format!("! {f}"))
                            .collect::<Vec<_>>()
                            .join("\n"),
                    ),
                });
            }
            sections
        }
    }
}

fn render_table(out: &mut String, columns: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut header = String::new();
    for (i, column) in columns.iter().enumerate() {
        let _ = write!(header, "{:<width$}  ", column, width = widths[i]);
    }
    let _ = writeln!(out, "{}", header.trim_end());
    let _ = writeln!(out, "{THIN_RULE}");

    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(0);
            let _ = write!(line, "{:<width$}  ", cell, width = width);
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
    let _ = writeln!(out, "\nTotal Rows: {}", rows.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::ArtifactTable;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 26, 12, 0, 0).unwrap()
    }

    #[test]
    fn failed_outcome_still_renders_a_report() {
        let task = Task::capture("browser_history", "Browser History");
        let outcome = TaskOutcome {
            task_id: "browser_history".into(),
            status: TaskStatus::Failed,
            started_at: fixed_time(),
            finished_at: fixed_time(),
            error: Some("database locked".into()),
            artifact: None,
        };
        let report = IndividualReport::from_outcome(&task, &outcome, fixed_time());
        let text = report.render();
        assert!(text.contains("BROWSER HISTORY REPORT"));
        assert!(text.contains("Status: Failed"));
        assert!(text.contains("Reason: database locked"));
    }

    #[test]
    fn table_artifact_renders_rows_and_truncation_note() {
        let mut table = ArtifactTable::new(&["PID", "Name"]);
        for i in 0..12 {
            table.push_row(vec![i.to_string(), format!("proc{i}")]);
        }
        table.cap(10);
        table.flag("atypical process name: proc7");

        let task = Task::capture("processes", "Running Processes");
        let outcome = TaskOutcome {
            task_id: "processes".into(),
            status: TaskStatus::Success,
            started_at: fixed_time(),
            finished_at: fixed_time(),
            error: None,
            artifact: Some(Artifact::Table(table)),
        };
        let report = IndividualReport::from_outcome(&task, &outcome, fixed_time());
        let text = report.render();
        assert!(text.contains("Total Rows: 10"));
        assert!(text.contains("Note: output truncated to 10 rows (12 available)"));
        assert!(text.contains("! atypical process name: proc7"));
    }

    #[test]
    fn file_name_embeds_generation_timestamp() {
        let task = Task::capture("processes", "Running Processes");
        let outcome = TaskOutcome::skipped("processes", "run deadline exceeded");
        let report = IndividualReport::from_outcome(&task, &outcome, fixed_time());
        assert_eq!(report.file_name(), "processes_20260826_120000.txt");
    }
}
