use crate::config::Config;
use crate::context::RunContext;
use crate::error::TaskError;
use crate::task::Artifact;

/// One category of forensic data extraction.
///
/// Implementations live outside the engine. They must be cancellable (the
/// coordinator drops the future on timeout) and must not leave partial
/// writes on shared output paths; anything persisted goes under the run's
/// own artifact directory.
#[async_trait::async_trait]
pub trait Collector: Send + Sync {
    async fn execute(&self, ctx: &RunContext, config: &Config) -> Result<Artifact, TaskError>;
}

/// Ensures one external dependency/tool is present.
///
/// `is_present` is the idempotency check and must be side-effect-free; the
/// supervisor calls it before and after `install`.
#[async_trait::async_trait]
pub trait Installer: Send + Sync {
    async fn is_present(&self) -> Result<bool, TaskError>;
    async fn install(&self, ctx: &RunContext) -> Result<(), TaskError>;
}
