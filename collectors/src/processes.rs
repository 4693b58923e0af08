use std::sync::OnceLock;

use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, ArtifactTable, Config, RunContext, TaskError};
use regex::Regex;
use serde_json::json;
use sysinfo::System;
use tracing::debug;

/// Running-process table, sorted by memory use descending and capped at
/// `config.max_processes`. Raw data is persisted as JSON under
/// `artifacts/processes/`; simple name-based rule checks flag processes
/// worth an analyst's attention.
pub struct ProcessCollector;

#[async_trait::async_trait]
impl Collector for ProcessCollector {
    async fn execute(&self, ctx: &RunContext, config: &Config) -> Result<Artifact, TaskError> {
        let mut sys = System::new_all();
        sys.refresh_processes();

        let mut procs: Vec<(u32, String, u64)> = sys
            .processes()
            .iter()
            .map(|(pid, p)| (pid.as_u32(), p.name().to_string(), p.memory()))
            .collect();
        procs.sort_by(|a, b| b.2.cmp(&a.2));
        debug!(count = procs.len(), "processes enumerated");

        let raw: Vec<_> = procs
            .iter()
            .map(|(pid, name, mem)| json!({ "pid": pid, "name": name, "memory_bytes": mem }))
            .collect();
        let raw_path = ctx
            .layout
            .artifact_dir("processes")
            .join(format!("processes_{}.json", crate::file_stamp()));
        let encoded =
            serde_json::to_vec_pretty(&raw).map_err(|e| TaskError::failure(e.to_string()))?;
        tokio::fs::write(&raw_path, encoded).await?;

        let mut table = ArtifactTable::new(&["PID", "Name", "Memory (MB)"]);
        for (pid, name, mem) in &procs {
            table.push_row(vec![
                pid.to_string(),
                name.clone(),
                format!("{:.2}", *mem as f64 / (1024.0 * 1024.0)),
            ]);
        }
        table.cap(config.max_processes);

        for (pid, name, _) in &procs {
            if let Some(finding) = suspicious_name(name) {
                table.flag(format!("{finding} (pid {pid}, name \"{name}\")"));
            }
        }

        Ok(Artifact::Table(table))
    }
}

/// Name-based rule checks. Deliberately crude: these flag items for a
/// human, they do not classify.
pub(crate) fn suspicious_name(name: &str) -> Option<&'static str> {
    static HEXISH: OnceLock<Regex> = OnceLock::new();
    static NONPRINT: OnceLock<Regex> = OnceLock::new();
    let hexish = HEXISH.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{10,}(\.exe)?$").unwrap());
    let nonprint = NONPRINT.get_or_init(|| Regex::new(r"[\x00-\x1f]").unwrap());

    if hexish.is_match(name) {
        return Some("atypical process name: looks like a random hash");
    }
    if nonprint.is_match(name) {
        return Some("atypical process name: contains control characters");
    }
    if name.len() > 64 {
        return Some("atypical process name: unusually long");
    }
    None
}
