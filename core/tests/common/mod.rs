//! Scripted collectors and installers for driving the engine in tests.

use std::sync::Arc;
use std::time::Duration;

use bitprobe_core::{Artifact, ArtifactTable, Config, RunContext, TaskError};
use bitprobe_core::traits::{Collector, Installer};

/// Collector producing a process-style table with `available` rows,
/// capped at `config.max_processes` like a real collector would.
pub struct TableCollector {
    pub available: usize,
}

#[async_trait::async_trait]
impl Collector for TableCollector {
    async fn execute(&self, _ctx: &RunContext, config: &Config) -> Result<Artifact, TaskError> {
        let mut table = ArtifactTable::new(&["PID", "Name", "Memory (MB)"]);
        for i in 0..self.available {
            table.push_row(vec![i.to_string(), format!("proc{i}"), "1.00".into()]);
        }
        table.cap(config.max_processes);
        Ok(Artifact::Table(table))
    }
}

/// Collector that never finishes; pairs with a short task timeout.
pub struct HangingCollector;

#[async_trait::async_trait]
impl Collector for HangingCollector {
    async fn execute(&self, _ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        tokio::time::sleep(Duration::from_secs(86_400)).await;
        Ok(Artifact::text("unreachable"))
    }
}

/// Collector failing with a fixed reason.
pub struct FailingCollector {
    pub reason: &'static str,
}

#[async_trait::async_trait]
impl Collector for FailingCollector {
    async fn execute(&self, _ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        Err(TaskError::failure(self.reason))
    }
}

/// Installer with fixed presence/install behavior.
pub struct ScriptedInstaller {
    pub present: bool,
    pub install_ok: bool,
}

#[async_trait::async_trait]
impl Installer for ScriptedInstaller {
    async fn is_present(&self) -> Result<bool, TaskError> {
        Ok(self.present)
    }

    async fn install(&self, _ctx: &RunContext) -> Result<(), TaskError> {
        if self.install_ok {
            Ok(())
        } else {
            Err(TaskError::failure("download failed"))
        }
    }
}

pub fn arc<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
