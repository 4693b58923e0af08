use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::error::TaskError;
use crate::progress::ProgressMonitor;
use crate::task::{CaptureEntry, OutcomeSet, TaskOutcome};

/// Executes collector tasks under per-task timeouts and the overall run
/// deadline, isolating failures per task.
///
/// Tasks start in registration order (the semaphore hands out permits in
/// poll order, which is push order). Completion order is unconstrained
/// under parallel execution; the result set is re-sorted to registration
/// order at the join point. Exclusive tasks run on a dedicated sequential
/// pass after the pooled pass so resource-heavy work never contends with
/// the rest.
pub struct CaptureCoordinator {
    progress: bool,
}

impl CaptureCoordinator {
    pub fn new(progress: bool) -> Self {
        Self { progress }
    }

    pub async fn run(&self, entries: &[CaptureEntry], ctx: &Arc<RunContext>) -> OutcomeSet {
        let enabled: Vec<&CaptureEntry> = entries
            .iter()
            .filter(|e| {
                let on = e.task.enabled(&ctx.config);
                if !on {
                    debug!(task = %e.task.id, "disabled by config toggle");
                }
                on
            })
            .collect();

        let order: Vec<String> = enabled.iter().map(|e| e.task.id.clone()).collect();
        let deadline = ctx.deadline();

        let (pooled, exclusive): (Vec<_>, Vec<_>) =
            enabled.iter().copied().partition(|e| !e.task.exclusive);

        let monitor = Arc::new(Mutex::new(ProgressMonitor::new(enabled.len(), self.progress)));

        let mut outcomes = OutcomeSet::new();
        let sem = Arc::new(Semaphore::new(ctx.config.max_workers));
        let mut futs: FuturesUnordered<_> = pooled
            .iter()
            .map(|entry| Self::run_entry(entry, ctx, deadline, Some(sem.clone()), monitor.clone()))
            .collect();
        while let Some(outcome) = futs.next().await {
            outcomes.push(outcome);
        }

        // Memory acquisition and friends get the host to themselves.
        for entry in &exclusive {
            let outcome = Self::run_entry(entry, ctx, deadline, None, monitor.clone()).await;
            outcomes.push(outcome);
        }

        if let Ok(monitor) = monitor.lock() {
            monitor.finish();
        }

        let outcomes = outcomes.into_registration_order(&order);
        debug_assert_eq!(outcomes.len(), order.len());
        info!(counts = %outcomes.counts(), "capture phase complete");
        outcomes
    }

    async fn run_entry(
        entry: &CaptureEntry,
        ctx: &Arc<RunContext>,
        deadline: Instant,
        sem: Option<Arc<Semaphore>>,
        monitor: Arc<Mutex<ProgressMonitor>>,
    ) -> TaskOutcome {
        let task = &entry.task;

        let _permit = match sem {
            Some(sem) => match sem.acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    return TaskOutcome::failed(&task.id, Utc::now(), "worker pool closed");
                }
            },
            None => None,
        };

        // Work not yet started when the deadline fires is cancelled outright.
        let now = Instant::now();
        if now >= deadline {
            warn!(task = %task.id, "skipped: run deadline exceeded");
            return TaskOutcome::skipped(&task.id, TaskError::Cancelled.to_string());
        }

        if let Ok(mut monitor) = monitor.lock() {
            monitor.start_task(&task.id, &task.name);
        }
        debug!(task = %task.id, timeout_secs = task.timeout.as_secs(), "collector started");
        let started = Utc::now();

        // Optional tasks in flight are additionally cancelled by the run
        // deadline; required ones keep only their own timeout, which still
        // bounds total wall-clock time.
        let remaining = deadline - now;
        let effective = if task.optional {
            task.timeout.min(remaining)
        } else {
            task.timeout
        };

        let result = tokio::time::timeout(effective, entry.collector.execute(ctx, &ctx.config)).await;

        let outcome = match result {
            Ok(Ok(artifact)) => TaskOutcome::success(&task.id, started, artifact),
            Ok(Err(e)) => {
                warn!(task = %task.id, error = %e, "collector failed");
                TaskOutcome::failed(&task.id, started, e.to_string())
            }
            Err(_) => {
                let err = if effective < task.timeout {
                    TaskError::Cancelled
                } else {
                    TaskError::Timeout(task.timeout)
                };
                warn!(task = %task.id, error = %err, "collector timed out");
                TaskOutcome::timed_out(&task.id, started, err.to_string())
            }
        };

        if let Ok(mut monitor) = monitor.lock() {
            monitor.complete_task(&task.id, &outcome.status.to_string());
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::TaskError;
    use crate::task::{Artifact, ConfigToggle, Task, TaskStatus};
    use crate::traits::Collector;
    use std::time::Duration;

    /// Collector that sleeps for a scripted duration, then succeeds or fails.
    struct ScriptedCollector {
        delay: Duration,
        result: Result<String, String>,
    }

    impl ScriptedCollector {
        fn ok(delay: Duration, text: &str) -> Arc<Self> {
            Arc::new(Self {
                delay,
                result: Ok(text.to_string()),
            })
        }

        fn err(delay: Duration, reason: &str) -> Arc<Self> {
            Arc::new(Self {
                delay,
                result: Err(reason.to_string()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Collector for ScriptedCollector {
        async fn execute(&self, _ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
            tokio::time::sleep(self.delay).await;
            match &self.result {
                Ok(text) => Ok(Artifact::text(text)),
                Err(reason) => Err(TaskError::failure(reason)),
            }
        }
    }

    fn ctx_with(config: Config) -> (tempfile::TempDir, Arc<RunContext>) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = Arc::new(RunContext::initialize(config, tmp.path()).unwrap());
        (tmp, ctx)
    }

    fn entry(task: Task, collector: Arc<dyn Collector>) -> CaptureEntry {
        CaptureEntry { task, collector }
    }

    #[tokio::test(start_paused = true)]
    async fn every_enabled_task_yields_exactly_one_outcome() {
        let (_tmp, ctx) = ctx_with(Config::default());
        let entries = vec![
            entry(Task::capture("a", "A"), ScriptedCollector::ok(Duration::from_millis(10), "a")),
            entry(Task::capture("b", "B"), ScriptedCollector::err(Duration::from_millis(10), "denied")),
            entry(Task::capture("c", "C"), ScriptedCollector::ok(Duration::from_millis(10), "c")),
        ];

        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        assert_eq!(outcomes.len(), 3);
        let ids: Vec<_> = outcomes.iter().map(|o| o.task_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    /// Collector that records when it starts, for observing start order.
    struct RecordingCollector {
        id: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait::async_trait]
    impl Collector for RecordingCollector {
        async fn execute(&self, _ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
            if let Ok(mut log) = self.log.lock() {
                log.push(self.id.to_string());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(Artifact::text(self.id))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_pool_starts_tasks_in_registration_order() {
        let (_tmp, ctx) = ctx_with(Config::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let entries: Vec<CaptureEntry> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|id| {
                entry(
                    Task::capture(id, id.to_uppercase()),
                    Arc::new(RecordingCollector {
                        id,
                        log: log.clone(),
                    }),
                )
            })
            .collect();

        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        assert_eq!(outcomes.len(), 4);
        let started: Vec<String> = log.lock().unwrap().clone();
        assert_eq!(started, ["a", "b", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_does_not_block_siblings() {
        let config = Config {
            max_workers: 3,
            ..Config::default()
        };
        let (_tmp, ctx) = ctx_with(config);
        let entries = vec![
            entry(
                Task::capture("slow", "Slow").timeout(Duration::from_secs(5)),
                ScriptedCollector::ok(Duration::from_secs(3600), "never"),
            ),
            entry(
                Task::capture("fast", "Fast").timeout(Duration::from_secs(5)),
                ScriptedCollector::ok(Duration::from_millis(50), "done"),
            ),
        ];

        let started = Instant::now();
        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        // Wall clock bounded by the max sibling timeout, not the sum.
        assert!(started.elapsed() <= Duration::from_secs(6));
        assert_eq!(outcomes.get("slow").unwrap().status, TaskStatus::TimedOut);
        assert_eq!(
            outcomes.get("slow").unwrap().error.as_deref(),
            Some("timed out after 5s")
        );
        assert_eq!(outcomes.get("fast").unwrap().status, TaskStatus::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn run_deadline_skips_unstarted_and_cancels_optional_in_flight() {
        let config = Config {
            execution_timeout_secs: 10,
            max_workers: 1,
            ..Config::default()
        };
        let (_tmp, ctx) = ctx_with(config);
        let entries = vec![
            entry(
                Task::capture("first", "First").timeout(Duration::from_secs(60)),
                ScriptedCollector::ok(Duration::from_secs(3600), "never"),
            ),
            entry(
                Task::capture("second", "Second").timeout(Duration::from_secs(5)),
                ScriptedCollector::ok(Duration::from_millis(10), "unreached"),
            ),
        ];

        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        // First was in flight and optional when the 10s deadline fired.
        let first = outcomes.get("first").unwrap();
        assert_eq!(first.status, TaskStatus::TimedOut);
        assert_eq!(first.error.as_deref(), Some("run deadline exceeded"));
        // Second never started.
        let second = outcomes.get("second").unwrap();
        assert_eq!(second.status, TaskStatus::Skipped);
        assert_eq!(second.error.as_deref(), Some("run deadline exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn completed_work_stands_when_deadline_fires() {
        let config = Config {
            execution_timeout_secs: 10,
            max_workers: 1,
            ..Config::default()
        };
        let (_tmp, ctx) = ctx_with(config);
        let entries = vec![
            entry(
                Task::capture("early", "Early").timeout(Duration::from_secs(5)),
                ScriptedCollector::ok(Duration::from_secs(1), "early done"),
            ),
            entry(
                Task::capture("late", "Late").timeout(Duration::from_secs(60)),
                ScriptedCollector::ok(Duration::from_secs(3600), "never"),
            ),
        ];

        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        assert_eq!(outcomes.get("early").unwrap().status, TaskStatus::Success);
        assert_eq!(outcomes.get("late").unwrap().status, TaskStatus::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_toggles_filter_tasks_entirely() {
        let config = Config {
            capture_memory: false,
            ..Config::default()
        };
        let (_tmp, ctx) = ctx_with(config);
        let entries = vec![
            entry(
                Task::capture("memory_dump", "Memory Dump")
                    .gated_by(ConfigToggle::CaptureMemory)
                    .exclusive(),
                ScriptedCollector::ok(Duration::from_millis(10), "image"),
            ),
            entry(
                Task::capture("processes", "Processes"),
                ScriptedCollector::ok(Duration::from_millis(10), "table"),
            ),
        ];

        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes.get("memory_dump").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn exclusive_tasks_run_after_pooled_pass() {
        let config = Config {
            max_workers: 2,
            ..Config::default()
        };
        let (_tmp, ctx) = ctx_with(config);
        let entries = vec![
            entry(
                Task::capture("memory_dump", "Memory Dump").exclusive(),
                ScriptedCollector::ok(Duration::from_millis(20), "image"),
            ),
            entry(
                Task::capture("processes", "Processes"),
                ScriptedCollector::ok(Duration::from_millis(20), "table"),
            ),
        ];

        let outcomes = CaptureCoordinator::new(false).run(&entries, &ctx).await;
        assert_eq!(outcomes.len(), 2);
        // Registration order preserved in the aggregate even though the
        // exclusive task executed last.
        let ids: Vec<_> = outcomes.iter().map(|o| o.task_id.as_str()).collect();
        assert_eq!(ids, ["memory_dump", "processes"]);
    }
}
