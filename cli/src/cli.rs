use std::path::PathBuf;

use clap::Parser;

use bitprobe_core::Config;

/// Host forensic triage: capture volatile state and compile one master
/// report under a timestamped output directory.
#[derive(Parser, Debug)]
#[command(name = "bitprobe", version, about)]
pub struct Args {
    /// Skip the full memory dump (the longest capture by far).
    #[arg(long)]
    pub no_memory: bool,

    /// Skip browser history collection.
    #[arg(long)]
    pub no_browser: bool,

    /// Verify-and-install required external tools before capture.
    #[arg(long)]
    pub install_tools: bool,

    /// Overall run deadline in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Row cap for the process report.
    #[arg(long, value_name = "N")]
    pub max_processes: Option<usize>,

    /// Row cap for the network report.
    #[arg(long, value_name = "N")]
    pub max_connections: Option<usize>,

    /// Capture worker pool size. 1 (the default) runs captures one at a time.
    #[arg(long, value_name = "N")]
    pub max_workers: Option<usize>,

    /// Root directory for run output. Each run creates its own
    /// timestamped subdirectory underneath.
    #[arg(long, value_name = "DIR", default_value = "bitprobe_output")]
    pub output: PathBuf,

    /// Explicit config file (TOML). Without it, ./bitprobe.toml is used
    /// when present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable the live progress display.
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    /// Flags win over the config file, which wins over defaults.
    pub fn apply_to(&self, config: &mut Config) {
        if self.no_memory {
            config.capture_memory = false;
        }
        if self.no_browser {
            config.capture_browser = false;
        }
        if self.install_tools {
            config.install_tools = true;
        }
        if let Some(secs) = self.timeout {
            config.execution_timeout_secs = secs;
        }
        if let Some(n) = self.max_processes {
            config.max_processes = n;
        }
        if let Some(n) = self.max_connections {
            config.max_connections = n;
        }
        if let Some(n) = self.max_workers {
            config.max_workers = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = Args::parse_from([
            "bitprobe",
            "--no-memory",
            "--timeout",
            "120",
            "--max-workers",
            "4",
        ]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert!(!config.capture_memory);
        assert!(config.capture_browser);
        assert_eq!(config.execution_timeout_secs, 120);
        assert_eq!(config.max_workers, 4);
    }

    #[test]
    fn defaults_leave_config_untouched() {
        let args = Args::parse_from(["bitprobe"]);
        let mut config = Config::default();
        args.apply_to(&mut config);
        assert!(config.capture_memory);
        assert_eq!(config.execution_timeout_secs, 600);
        assert_eq!(args.output, PathBuf::from("bitprobe_output"));
    }
}
