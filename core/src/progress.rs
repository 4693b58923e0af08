use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Visual progress for the capture phase: one overall bar plus a spinner
/// per in-flight task. Disabled entirely for non-interactive runs.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<String, ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    pub fn new(total_tasks: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(total_tasks as u64));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks {msg}")
                .unwrap(),
        );
        overall.set_message("capturing");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            enabled: true,
        }
    }

    pub fn start_task(&mut self, task_id: &str, name: &str) {
        if !self.enabled {
            return;
        }
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(ProgressStyle::default_spinner().template("  {spinner} {msg}").unwrap());
        bar.set_message(name.to_string());
        bar.enable_steady_tick(Duration::from_millis(120));
        self.task_bars.insert(task_id.to_string(), bar);
    }

    pub fn complete_task(&mut self, task_id: &str, status: &str) {
        if !self.enabled {
            return;
        }
        if let Some(bar) = self.task_bars.remove(task_id) {
            bar.finish_and_clear();
        }
        self.overall.inc(1);
        self.overall.set_message(format!("last: {task_id} ({status})"));
    }

    pub fn finish(&self) {
        if self.enabled {
            self.overall.finish_with_message("capture complete");
        }
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_monitor_is_inert() {
        let mut monitor = ProgressMonitor::new(2, false);
        monitor.start_task("a", "Task A");
        monitor.complete_task("a", "Success");
        monitor.finish();
    }
}
