use tracing::debug;

use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, ArtifactTable, Config, RunContext, TaskError};

/// Autorun/persistence registry keys, queried via the platform's `reg`
/// command. Hive parsing is out of scope; the query output is kept
/// verbatim and only the value lines are tabulated.
const AUTORUN_KEYS: &[&str] = &[
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Run",
    r"HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\Run",
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\RunOnce",
    r"HKCU\SOFTWARE\Microsoft\Windows\CurrentVersion\RunOnce",
];

pub struct RegistryCollector;

#[async_trait::async_trait]
impl Collector for RegistryCollector {
    async fn execute(&self, ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        let reg = which::which("reg").map_err(|_| TaskError::DependencyMissing("reg".into()))?;

        let mut raw = String::new();
        let mut table = ArtifactTable::new(&["Key", "Name", "Type", "Data"]);

        for &key in AUTORUN_KEYS {
            let output = tokio::process::Command::new(&reg)
                .args(["query", key])
                .kill_on_drop(true)
                .output()
                .await?;
            // A key that does not exist on this host is not an error; the
            // hive simply has no such entries.
            if !output.status.success() {
                debug!(key, "registry key absent or unreadable");
                continue;
            }
            let stdout = String::from_utf8_lossy(&output.stdout);
            raw.push_str(&stdout);
            raw.push('\n');

            for (name, kind, data) in parse_reg_query(&stdout) {
                if let Some(finding) = suspicious_autorun(&data) {
                    table.flag(format!("{finding}: {key}\\{name} -> {data}"));
                }
                table.push_row(vec![key.to_string(), name, kind, data]);
            }
        }

        let raw_path = ctx
            .layout
            .artifact_dir("registry")
            .join(format!("autorun_keys_{}.txt", crate::file_stamp()));
        tokio::fs::write(&raw_path, raw.as_bytes()).await?;

        Ok(Artifact::Table(table))
    }
}

/// Value lines of `reg query` output: indented `name REG_TYPE data`
/// triples. Key-path lines and blanks are ignored.
pub(crate) fn parse_reg_query(output: &str) -> Vec<(String, String, String)> {
    output
        .lines()
        .filter(|line| line.starts_with(' ') || line.starts_with('\t'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let kind = fields.next()?;
            if !kind.starts_with("REG_") {
                return None;
            }
            let data = fields.collect::<Vec<_>>().join(" ");
            Some((name.to_string(), kind.to_string(), data))
        })
        .collect()
}

/// Rule checks over an autorun entry's command line. Same register as the
/// process-name checks: flag for a human, never classify.
pub(crate) fn suspicious_autorun(data: &str) -> Option<&'static str> {
    let lower = data.to_lowercase();
    if lower.contains(r"\temp\") || lower.contains(r"\appdata\local\temp") {
        return Some("autorun entry launches from a temp directory");
    }
    for interpreter in ["powershell", "wscript", "cscript", "mshta", "rundll32"] {
        if lower.contains(interpreter) {
            return Some("autorun entry invokes a script interpreter");
        }
    }
    None
}
