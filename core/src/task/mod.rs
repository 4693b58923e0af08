//! Task model: descriptors, registry, artifacts, outcomes.

mod artifact;
mod outcome;
mod registry;

pub use artifact::{Artifact, ArtifactTable};
pub use outcome::{OutcomeSet, StatusCounts, TaskOutcome, TaskStatus};
pub use registry::{CaptureEntry, ConfigToggle, InstallEntry, Task, TaskCategory, TaskRegistry};
