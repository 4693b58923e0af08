use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, ArtifactTable, Config, RunContext, TaskError};
use sysinfo::System;

/// Basic host summary: hostname, OS, kernel, CPU count, memory.
pub struct SystemInfoCollector;

#[async_trait::async_trait]
impl Collector for SystemInfoCollector {
    async fn execute(&self, _ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu();

        let mut table = ArtifactTable::new(&["Property", "Value"]);
        table.push_row(vec![
            "Hostname".into(),
            System::host_name().unwrap_or_else(|| "unknown".into()),
        ]);
        table.push_row(vec![
            "OS".into(),
            System::long_os_version().unwrap_or_else(|| "unknown".into()),
        ]);
        table.push_row(vec![
            "Kernel".into(),
            System::kernel_version().unwrap_or_else(|| "unknown".into()),
        ]);
        table.push_row(vec!["CPU Count".into(), sys.cpus().len().to_string()]);
        table.push_row(vec![
            "Memory Total (GB)".into(),
            format!("{:.2}", sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0)),
        ]);
        table.push_row(vec![
            "Memory Used (GB)".into(),
            format!("{:.2}", sys.used_memory() as f64 / (1024.0 * 1024.0 * 1024.0)),
        ]);

        Ok(Artifact::Table(table))
    }
}
