use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::config::Config;
use crate::error::RunError;

/// Artifact categories with pre-created subdirectories, so concurrent
/// collectors never write into the same directory tree unpartitioned.
pub const ARTIFACT_CATEGORIES: &[&str] = &[
    "memory",
    "network",
    "processes",
    "registry",
    "logs",
    "browser",
];

/// Run-scoped output directory tree:
/// `<root>/<run_id>/{artifacts/<category>,reports/individual,reports/master,logs}`.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub artifacts: PathBuf,
    pub reports_individual: PathBuf,
    pub reports_master: PathBuf,
    pub logs: PathBuf,
}

impl OutputLayout {
    /// Create the tree for one run. Each run gets a fresh timestamp-derived
    /// id, so re-running the tool never clobbers a prior run's directory.
    pub fn create(output_root: &Path, run_id: &str) -> std::io::Result<Self> {
        let root = output_root.join(run_id);
        let layout = Self {
            artifacts: root.join("artifacts"),
            reports_individual: root.join("reports").join("individual"),
            reports_master: root.join("reports").join("master"),
            logs: root.join("logs"),
            root,
        };
        for dir in [
            &layout.artifacts,
            &layout.reports_individual,
            &layout.reports_master,
            &layout.logs,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        for category in ARTIFACT_CATEGORIES {
            std::fs::create_dir_all(layout.artifacts.join(category))?;
        }
        Ok(layout)
    }

    pub fn artifact_dir(&self, category: &str) -> PathBuf {
        self.artifacts.join(category)
    }
}

/// Shared run record: id, start time, output tree, configuration.
///
/// Constructed once at phase 0 and read-only afterwards; every component
/// receives it as `Arc<RunContext>` and may read it without synchronization.
#[derive(Debug)]
pub struct RunContext {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    started_instant: Instant,
    pub layout: OutputLayout,
    pub config: Config,
}

impl RunContext {
    /// Phase 0: validate config, derive the run id, build the output tree.
    pub fn initialize(config: Config, output_root: &Path) -> Result<Self, RunError> {
        config.validate()?;
        let started_at = Utc::now();
        let run_id = started_at.format("%Y%m%d_%H%M%S").to_string();
        let layout = OutputLayout::create(output_root, &run_id)?;
        Ok(Self {
            run_id,
            started_at,
            started_instant: Instant::now(),
            layout,
            config,
        })
    }

    /// Overall-run deadline, measured from phase 0.
    pub fn deadline(&self) -> Instant {
        self.started_instant + self.config.execution_timeout()
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started_instant.elapsed()
    }
}
