use std::path::PathBuf;

use tracing::info;

use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, Config, RunContext, TaskError};

/// Binary names probed for the memory acquisition tool, in order.
const DUMP_TOOLS: &[&str] = &["winpmem", "winpmem_mini_x64_rc2.exe", "winpmem_mini_x64.exe"];

/// Full physical memory acquisition through an external dump tool.
///
/// This is the one exclusive task in the default catalog: a dump saturates
/// disk bandwidth and competes for physical pages, so the coordinator runs
/// it alone after the pooled captures finish.
pub struct MemoryDumpCollector {
    tool: Option<PathBuf>,
}

impl MemoryDumpCollector {
    pub fn new() -> Self {
        Self {
            tool: DUMP_TOOLS.iter().find_map(|t| which::which(t).ok()),
        }
    }

    #[cfg(test)]
    fn with_tool(tool: PathBuf) -> Self {
        Self { tool: Some(tool) }
    }
}

impl Default for MemoryDumpCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for MemoryDumpCollector {
    async fn execute(&self, ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        let tool = self
            .tool
            .as_ref()
            .ok_or_else(|| TaskError::DependencyMissing("winpmem".into()))?;

        let dump_path = ctx
            .layout
            .artifact_dir("memory")
            .join(format!("memory_dump_{}.raw", crate::file_stamp()));
        info!(tool = %tool.display(), dump = %dump_path.display(), "starting memory acquisition");

        let output = tokio::process::Command::new(tool)
            .arg(&dump_path)
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            return Err(TaskError::failure(format!(
                "memory dump tool exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let bytes = tokio::fs::metadata(&dump_path).await?.len();
        if bytes == 0 {
            return Err(TaskError::failure("memory dump file is empty"));
        }
        Ok(Artifact::file(dump_path, bytes))
    }
}
