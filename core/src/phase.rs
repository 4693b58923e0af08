use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::Config;
use crate::context::RunContext;
use crate::coordinator::CaptureCoordinator;
use crate::error::RunError;
use crate::report::{ReportSynthesizer, SynthesisInput};
use crate::supervisor::DependencySupervisor;
use crate::task::{StatusCounts, Task, TaskRegistry};

/// Run phases. Transitions are strictly forward; there is no
/// retry-the-whole-phase loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    DependenciesChecked,
    ToolsReady,
    CaptureComplete,
    ReportsCompiled,
    Done,
    Aborted,
}

impl Phase {
    fn successor(self) -> Option<Phase> {
        match self {
            Self::Init => Some(Self::DependenciesChecked),
            Self::DependenciesChecked => Some(Self::ToolsReady),
            Self::ToolsReady => Some(Self::CaptureComplete),
            Self::CaptureComplete => Some(Self::ReportsCompiled),
            Self::ReportsCompiled => Some(Self::Done),
            Self::Done | Self::Aborted => None,
        }
    }
}

/// What a finished (or aborted) run looked like.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub phase: Phase,
    pub master_report: Option<PathBuf>,
    pub counts: StatusCounts,
    pub warnings: Vec<String>,
    pub duration: Duration,
}

/// Sequences the run: dependency supervision, capture, report synthesis.
///
/// Everything upstream of the final report write degrades gracefully;
/// failing to persist the master report is the only path into `Aborted`.
pub struct PhaseController {
    phase: Phase,
    ctx: Arc<RunContext>,
    registry: TaskRegistry,
    warnings: Vec<String>,
    progress: bool,
}

impl PhaseController {
    /// Phase 0: create the run context and output tree.
    pub fn init(
        config: Config,
        output_root: &Path,
        registry: TaskRegistry,
    ) -> Result<Self, RunError> {
        let ctx = Arc::new(RunContext::initialize(config, output_root)?);
        info!(run_id = %ctx.run_id, root = %ctx.layout.root.display(), "run initialized");
        Ok(Self {
            phase: Phase::Init,
            ctx,
            registry,
            warnings: Vec::new(),
            progress: false,
        })
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.ctx
    }

    pub async fn run(mut self) -> Result<RunSummary, RunError> {
        let ctx = self.ctx.clone();

        // Phase 1/2: dependencies, skippable when install_tools is off.
        let install_outcomes = if ctx.config.install_tools {
            info!("dependency phase started");
            let report =
                DependencySupervisor::run(self.registry.install_entries(), &ctx).await;
            if !report.critical_satisfied {
                let warning = format!(
                    "critical dependencies missing: {}; capture tasks that need them will fail fast",
                    report.missing_critical.join(", ")
                );
                warn!("{warning}");
                self.warnings.push(warning);
            }
            self.advance(Phase::DependenciesChecked)?;
            self.advance(Phase::ToolsReady)?;
            Some(report.outcomes)
        } else {
            self.advance(Phase::DependenciesChecked)?;
            self.advance(Phase::ToolsReady)?;
            None
        };

        // Phase 3: capture.
        info!("capture phase started");
        let capture_outcomes = CaptureCoordinator::new(self.progress)
            .run(self.registry.capture_entries(), &ctx)
            .await;
        self.advance(Phase::CaptureComplete)?;

        // Phase 4: synthesis. The write is the only hard failure.
        let install_tasks: Vec<Task> = self
            .registry
            .install_entries()
            .iter()
            .map(|e| e.task.clone())
            .collect();
        let capture_tasks: Vec<Task> = self
            .registry
            .capture_entries()
            .iter()
            .map(|e| e.task.clone())
            .collect();
        let counts = capture_outcomes.counts();
        let master = ReportSynthesizer::synthesize(SynthesisInput {
            run_id: &ctx.run_id,
            generated_at: Utc::now(),
            total_duration: ctx.elapsed(),
            install_tasks: &install_tasks,
            install_outcomes: install_outcomes.as_ref(),
            capture_tasks: &capture_tasks,
            capture_outcomes: &capture_outcomes,
            warnings: self.warnings.clone(),
        });

        let master_path = match ReportSynthesizer::persist(&master, &ctx.layout) {
            Ok(path) => path,
            Err(e) => {
                self.phase = Phase::Aborted;
                return Err(e);
            }
        };
        self.advance(Phase::ReportsCompiled)?;
        self.advance(Phase::Done)?;

        info!(run_id = %ctx.run_id, "run complete");
        Ok(RunSummary {
            run_id: ctx.run_id.clone(),
            phase: self.phase,
            master_report: Some(master_path),
            counts,
            warnings: self.warnings,
            duration: ctx.elapsed(),
        })
    }

    fn advance(&mut self, next: Phase) -> Result<(), RunError> {
        if self.phase.successor() != Some(next) {
            return Err(RunError::Phase(format!(
                "cannot advance from {:?} to {next:?}",
                self.phase
            )));
        }
        self.phase = next;
        Ok(())
    }
}
