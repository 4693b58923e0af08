use std::sync::Arc;
use std::time::Duration;

use bitprobe_core::{ConfigToggle, RunError, Task, TaskRegistry};

use crate::browser::BrowserHistoryCollector;
use crate::installers::ToolInstaller;
use crate::memory::MemoryDumpCollector;
use crate::network::NetworkCollector;
use crate::processes::ProcessCollector;
use crate::registry::RegistryCollector;
use crate::system_info::SystemInfoCollector;
use crate::system_logs::SystemLogCollector;

/// The stock BitProbe task catalog.
///
/// Registration order here is the order captures start and the order
/// sections appear in the master report. Memory acquisition is last,
/// exclusive, and carries the long timeout a full physical dump needs.
pub fn default_registry() -> Result<TaskRegistry, RunError> {
    let mut registry = TaskRegistry::new();

    registry.register_installer(
        Task::install("winpmem", "WinPmem Memory Imager").required(),
        Arc::new(
            ToolInstaller::new("winpmem")
                .alias("winpmem_mini_x64_rc2.exe")
                .alias("winpmem_mini_x64.exe"),
        ),
    )?;
    registry.register_collector(
        Task::capture("system_info", "System Information").timeout(Duration::from_secs(30)),
        Arc::new(SystemInfoCollector),
    )?;
    registry.register_collector(
        Task::capture("processes", "Running Processes").timeout(Duration::from_secs(30)),
        Arc::new(ProcessCollector),
    )?;
    registry.register_collector(
        Task::capture("network", "Network Connections").timeout(Duration::from_secs(30)),
        Arc::new(NetworkCollector),
    )?;
    registry.register_collector(
        Task::capture("registry", "Registry Autoruns").timeout(Duration::from_secs(30)),
        Arc::new(RegistryCollector),
    )?;
    registry.register_collector(
        Task::capture("system_logs", "System Logs").timeout(Duration::from_secs(60)),
        Arc::new(SystemLogCollector::default()),
    )?;
    registry.register_collector(
        Task::capture("browser_history", "Browser History")
            .timeout(Duration::from_secs(60))
            .gated_by(ConfigToggle::CaptureBrowser),
        Arc::new(BrowserHistoryCollector::new()),
    )?;
    registry.register_collector(
        Task::capture("memory_dump", "Memory Dump")
            .timeout(Duration::from_secs(1800))
            .gated_by(ConfigToggle::CaptureMemory)
            .exclusive(),
        Arc::new(MemoryDumpCollector::new()),
    )?;

    Ok(registry)
}
