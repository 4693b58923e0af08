use tracing::info;

use bitprobe_core::traits::Installer;
use bitprobe_core::{RunContext, TaskError};

/// Installer for one external tool, driven by a presence probe on `PATH`
/// and an optional install command.
///
/// Tools without an install command can only be verified; when absent they
/// fail the install task with a message naming what to provision manually.
pub struct ToolInstaller {
    binary: String,
    /// Alternate binary names that also satisfy the presence probe.
    aliases: Vec<String>,
    install_command: Option<Vec<String>>,
}

impl ToolInstaller {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            aliases: Vec::new(),
            install_command: None,
        }
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.aliases.push(name.into());
        self
    }

    pub fn install_with(mut self, command: &[&str]) -> Self {
        self.install_command = Some(command.iter().map(|a| a.to_string()).collect());
        self
    }
}

#[async_trait::async_trait]
impl Installer for ToolInstaller {
    async fn is_present(&self) -> Result<bool, TaskError> {
        let found = std::iter::once(&self.binary)
            .chain(self.aliases.iter())
            .any(|name| which::which(name).is_ok());
        Ok(found)
    }

    async fn install(&self, _ctx: &RunContext) -> Result<(), TaskError> {
        let Some(command) = &self.install_command else {
            return Err(TaskError::failure(format!(
                "{} has no automated install; provision it manually",
                self.binary
            )));
        };
        info!(tool = %self.binary, "running install command");
        let output = tokio::process::Command::new(&command[0])
            .args(&command[1..])
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            return Err(TaskError::failure(format!(
                "install command for {} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}
