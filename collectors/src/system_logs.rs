use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, Config, RunContext, TaskError};

/// Recent system log entries through the platform's log export command:
/// `wevtutil` on Windows, `journalctl` elsewhere. Log parsing is out of
/// scope; the export is kept verbatim.
pub struct SystemLogCollector {
    pub entries: usize,
}

impl Default for SystemLogCollector {
    fn default() -> Self {
        Self { entries: 50 }
    }
}

#[async_trait::async_trait]
impl Collector for SystemLogCollector {
    async fn execute(&self, ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        let (tool, args) = export_command(self.entries);
        let tool_path =
            which::which(tool).map_err(|_| TaskError::DependencyMissing(tool.into()))?;

        let output = tokio::process::Command::new(tool_path)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            return Err(TaskError::failure(format!(
                "{tool} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        let raw_path = ctx
            .layout
            .artifact_dir("logs")
            .join(format!("system_logs_{}.txt", crate::file_stamp()));
        tokio::fs::write(&raw_path, text.as_bytes()).await?;

        Ok(Artifact::text(text))
    }
}

#[cfg(windows)]
fn export_command(entries: usize) -> (&'static str, Vec<String>) {
    (
        "wevtutil",
        vec![
            "qe".into(),
            "System".into(),
            format!("/c:{entries}"),
            "/rd:true".into(),
            "/f:text".into(),
        ],
    )
}

#[cfg(not(windows))]
fn export_command(entries: usize) -> (&'static str, Vec<String>) {
    (
        "journalctl",
        vec!["-n".into(), entries.to_string(), "--no-pager".into()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_command_requests_the_entry_count() {
        let (_, args) = export_command(50);
        assert!(args.iter().any(|a| a.contains("50")));
    }
}
