use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::RunError;
use crate::traits::{Collector, Installer};

/// Which phase a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    Install,
    Capture,
}

/// Config toggle gating a capture task. Tasks switched off by their toggle
/// are filtered out before execution and produce no outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigToggle {
    CaptureMemory,
    CaptureBrowser,
}

impl ConfigToggle {
    pub fn enabled(self, config: &Config) -> bool {
        match self {
            Self::CaptureMemory => config.capture_memory,
            Self::CaptureBrowser => config.capture_browser,
        }
    }
}

/// Immutable task descriptor. Created at startup, never mutated, lives for
/// the whole process.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub category: TaskCategory,
    pub name: String,
    pub timeout: Duration,
    /// Optional tasks may be cancelled by the overall run deadline while in
    /// flight; for installers, non-optional means critical.
    pub optional: bool,
    /// Exclusive tasks never share the worker pool (memory acquisition).
    pub exclusive: bool,
    pub toggle: Option<ConfigToggle>,
}

impl Task {
    pub fn capture(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: TaskCategory::Capture,
            name: name.into(),
            timeout: Duration::from_secs(60),
            optional: true,
            exclusive: false,
            toggle: None,
        }
    }

    pub fn install(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: TaskCategory::Install,
            name: name.into(),
            timeout: Duration::from_secs(300),
            optional: true,
            exclusive: false,
            toggle: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn required(mut self) -> Self {
        self.optional = false;
        self
    }

    pub fn exclusive(mut self) -> Self {
        self.exclusive = true;
        self
    }

    pub fn gated_by(mut self, toggle: ConfigToggle) -> Self {
        self.toggle = Some(toggle);
        self
    }

    pub fn enabled(&self, config: &Config) -> bool {
        self.toggle.map(|t| t.enabled(config)).unwrap_or(true)
    }
}

/// An installer task paired with its implementation.
#[derive(Clone)]
pub struct InstallEntry {
    pub task: Task,
    pub installer: Arc<dyn Installer>,
}

/// A collector task paired with its implementation.
#[derive(Clone)]
pub struct CaptureEntry {
    pub task: Task,
    pub collector: Arc<dyn Collector>,
}

/// Ordered, append-only catalog of installer and collector tasks.
/// Registration order is the canonical order for execution and reporting.
#[derive(Default)]
pub struct TaskRegistry {
    install: Vec<InstallEntry>,
    capture: Vec<CaptureEntry>,
    ids: HashSet<String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_installer(
        &mut self,
        task: Task,
        installer: Arc<dyn Installer>,
    ) -> Result<(), RunError> {
        self.claim_id(&task.id)?;
        self.install.push(InstallEntry { task, installer });
        Ok(())
    }

    pub fn register_collector(
        &mut self,
        task: Task,
        collector: Arc<dyn Collector>,
    ) -> Result<(), RunError> {
        self.claim_id(&task.id)?;
        self.capture.push(CaptureEntry { task, collector });
        Ok(())
    }

    pub fn install_entries(&self) -> &[InstallEntry] {
        &self.install
    }

    pub fn capture_entries(&self) -> &[CaptureEntry] {
        &self.capture
    }

    fn claim_id(&mut self, id: &str) -> Result<(), RunError> {
        if !self.ids.insert(id.to_string()) {
            return Err(RunError::Config(format!("duplicate task id: {id}")));
        }
        Ok(())
    }
}
