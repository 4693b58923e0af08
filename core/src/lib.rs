//! Orchestration and report synthesis engine for BitProbe.
//!
//! The engine phases a run through dependency supervision, capture
//! coordination and report synthesis. Concrete collectors and installers
//! plug in behind the narrow traits in [`traits`]; the engine only knows
//! how to run them under timeouts, isolate their failures, and merge what
//! they produced into one ordered master report.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod phase;
pub mod progress;
pub mod report;
pub mod supervisor;
pub mod task;
pub mod traits;

pub use config::Config;
pub use context::{OutputLayout, RunContext};
pub use coordinator::CaptureCoordinator;
pub use error::{RunError, TaskError};
pub use phase::{Phase, PhaseController, RunSummary};
pub use report::{IndividualReport, MasterReport, ReportSynthesizer};
pub use supervisor::{DependencySupervisor, SupervisorReport};
pub use task::{
    Artifact, ArtifactTable, CaptureEntry, ConfigToggle, InstallEntry, OutcomeSet, StatusCounts,
    Task, TaskCategory, TaskOutcome, TaskRegistry, TaskStatus,
};
