use chrono::Utc;
use tracing::{info, warn};

use crate::context::RunContext;
use crate::error::TaskError;
use crate::task::{Artifact, InstallEntry, OutcomeSet, TaskOutcome, TaskStatus};

/// Aggregate result of the dependency phase.
pub struct SupervisorReport {
    pub outcomes: OutcomeSet,
    /// All non-optional installer tasks ended in `Success`.
    pub critical_satisfied: bool,
    /// Ids of non-optional tasks that did not end in `Success`.
    pub missing_critical: Vec<String>,
}

/// Runs installer tasks as idempotent ensure-present operations.
///
/// Tasks run sequentially in registration order, each under its own
/// timeout. Failure of one never prevents attempting the rest; every task
/// yields exactly one outcome.
pub struct DependencySupervisor;

impl DependencySupervisor {
    pub async fn run(entries: &[InstallEntry], ctx: &RunContext) -> SupervisorReport {
        let mut outcomes = OutcomeSet::new();

        for entry in entries {
            let outcome = Self::ensure_present(entry, ctx).await;
            match outcome.status {
                TaskStatus::Success => info!(task = %entry.task.id, "dependency satisfied"),
                _ => warn!(
                    task = %entry.task.id,
                    status = %outcome.status,
                    error = outcome.error.as_deref().unwrap_or(""),
                    "dependency not satisfied"
                ),
            }
            outcomes.push(outcome);
        }

        let missing_critical: Vec<String> = entries
            .iter()
            .filter(|e| !e.task.optional)
            .filter(|e| {
                outcomes
                    .get(&e.task.id)
                    .map(|o| o.status != TaskStatus::Success)
                    .unwrap_or(true)
            })
            .map(|e| e.task.id.clone())
            .collect();

        SupervisorReport {
            critical_satisfied: missing_critical.is_empty(),
            missing_critical,
            outcomes,
        }
    }

    /// Check presence, install if absent, re-check to verify.
    async fn ensure_present(entry: &InstallEntry, ctx: &RunContext) -> TaskOutcome {
        let task = &entry.task;
        let started = Utc::now();

        let action = async {
            if entry.installer.is_present().await? {
                return Ok::<_, TaskError>(Artifact::text("already present"));
            }
            entry.installer.install(ctx).await?;
            if entry.installer.is_present().await? {
                Ok(Artifact::text("installed and verified"))
            } else {
                Err(TaskError::failure("install completed but verification failed"))
            }
        };

        match tokio::time::timeout(task.timeout, action).await {
            Ok(Ok(artifact)) => TaskOutcome::success(&task.id, started, artifact),
            Ok(Err(e)) => TaskOutcome::failed(&task.id, started, e.to_string()),
            Err(_) => TaskOutcome::timed_out(
                &task.id,
                started,
                TaskError::Timeout(task.timeout).to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::task::Task;
    use crate::traits::Installer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedInstaller {
        present: bool,
        install_ok: bool,
        present_after_install: bool,
        presence_checks: AtomicUsize,
    }

    impl ScriptedInstaller {
        fn new(present: bool, install_ok: bool, present_after_install: bool) -> Self {
            Self {
                present,
                install_ok,
                present_after_install,
                presence_checks: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait::async_trait]
    impl Installer for ScriptedInstaller {
        async fn is_present(&self) -> Result<bool, TaskError> {
            let n = self.presence_checks.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(self.present)
            } else {
                Ok(self.present_after_install)
            }
        }

        async fn install(&self, _ctx: &RunContext) -> Result<(), TaskError> {
            if self.install_ok {
                Ok(())
            } else {
                Err(TaskError::failure("download failed"))
            }
        }
    }

    struct HangingInstaller;

    #[async_trait::async_trait]
    impl Installer for HangingInstaller {
        async fn is_present(&self) -> Result<bool, TaskError> {
            Ok(false)
        }

        async fn install(&self, _ctx: &RunContext) -> Result<(), TaskError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn test_ctx() -> (tempfile::TempDir, RunContext) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = RunContext::initialize(Config::default(), tmp.path()).unwrap();
        (tmp, ctx)
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let (_tmp, ctx) = test_ctx();
        let entries = vec![
            InstallEntry {
                task: Task::install("broken", "Broken Tool").required(),
                installer: Arc::new(ScriptedInstaller::new(false, false, false)),
            },
            InstallEntry {
                task: Task::install("fine", "Fine Tool"),
                installer: Arc::new(ScriptedInstaller::new(false, true, true)),
            },
        ];

        let report = DependencySupervisor::run(&entries, &ctx).await;
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes.get("broken").unwrap().status, TaskStatus::Failed);
        assert_eq!(report.outcomes.get("fine").unwrap().status, TaskStatus::Success);
        assert!(!report.critical_satisfied);
        assert_eq!(report.missing_critical, ["broken"]);
    }

    #[tokio::test]
    async fn already_present_skips_install() {
        let (_tmp, ctx) = test_ctx();
        let installer = Arc::new(ScriptedInstaller::new(true, false, false));
        let entries = vec![InstallEntry {
            task: Task::install("tool", "Tool").required(),
            installer: installer.clone(),
        }];

        let report = DependencySupervisor::run(&entries, &ctx).await;
        assert_eq!(report.outcomes.get("tool").unwrap().status, TaskStatus::Success);
        assert!(report.critical_satisfied);
        // Presence check alone, no install attempt.
        assert_eq!(installer.presence_checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn presence_check_is_idempotent() {
        let installer = ScriptedInstaller::new(true, false, true);
        let first = installer.is_present().await.unwrap();
        let second = installer.is_present().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_installer_times_out() {
        let (_tmp, ctx) = test_ctx();
        let entries = vec![InstallEntry {
            task: Task::install("slow", "Slow Tool").timeout(Duration::from_secs(5)),
            installer: Arc::new(HangingInstaller),
        }];

        let report = DependencySupervisor::run(&entries, &ctx).await;
        let outcome = report.outcomes.get("slow").unwrap();
        assert_eq!(outcome.status, TaskStatus::TimedOut);
        assert_eq!(outcome.error.as_deref(), Some("timed out after 5s"));
    }
}
