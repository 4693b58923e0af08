use std::path::{Path, PathBuf};

use tracing::debug;

use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, ArtifactTable, Config, RunContext, TaskError};

/// Copies browser history databases into the artifact tree.
///
/// The databases are preserved as-is for offline analysis; no SQLite
/// decoding happens here. A browser that is mid-session may hold a lock on
/// its database, in which case that copy is reported and skipped.
pub struct BrowserHistoryCollector {
    roots: Vec<(String, PathBuf)>,
}

impl BrowserHistoryCollector {
    pub fn new() -> Self {
        Self {
            roots: known_history_paths(),
        }
    }

    #[cfg(test)]
    fn with_roots(roots: Vec<(String, PathBuf)>) -> Self {
        Self { roots }
    }
}

impl Default for BrowserHistoryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Collector for BrowserHistoryCollector {
    async fn execute(&self, ctx: &RunContext, _config: &Config) -> Result<Artifact, TaskError> {
        let dest_dir = ctx.layout.artifact_dir("browser");
        let mut table = ArtifactTable::new(&["Browser", "Source", "Copied Bytes"]);
        let mut found = 0usize;

        for (browser, source) in &self.roots {
            if !source.is_file() {
                debug!(browser, path = %source.display(), "history database not present");
                continue;
            }
            found += 1;
            let file_name = format!("{}_{}", browser.to_lowercase(), history_file_name(source));
            match tokio::fs::copy(source, dest_dir.join(&file_name)).await {
                Ok(bytes) => table.push_row(vec![
                    browser.clone(),
                    source.display().to_string(),
                    bytes.to_string(),
                ]),
                Err(e) => {
                    // Live browsers keep the database locked; note and move on.
                    table.flag(format!(
                        "{browser} history at {} could not be copied: {e}",
                        source.display()
                    ));
                }
            }
        }

        if found == 0 {
            return Err(TaskError::failure(
                "no browser history databases found for the current user",
            ));
        }
        if table.rows.is_empty() {
            return Err(TaskError::failure(
                "all located browser history databases were locked or unreadable",
            ));
        }
        Ok(Artifact::Table(table))
    }
}

fn history_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "History".into())
}

/// Per-user history database locations for the browsers we know about.
/// Firefox keeps one `places.sqlite` per profile, so its profile directory
/// is scanned.
fn known_history_paths() -> Vec<(String, PathBuf)> {
    let mut paths = Vec::new();

    if let Some(data) = dirs::data_local_dir() {
        paths.push((
            "Chrome".to_string(),
            data.join("Google/Chrome/User Data/Default/History"),
        ));
        paths.push((
            "Edge".to_string(),
            data.join("Microsoft/Edge/User Data/Default/History"),
        ));
    }
    if let Some(config) = dirs::config_dir() {
        paths.push((
            "Chrome".to_string(),
            config.join("google-chrome/Default/History"),
        ));
    }
    if let Some(home) = dirs::home_dir() {
        for profile_root in [
            home.join(".mozilla/firefox"),
            home.join("AppData/Roaming/Mozilla/Firefox/Profiles"),
        ] {
            if let Ok(entries) = std::fs::read_dir(&profile_root) {
                for entry in entries.flatten() {
                    let candidate = entry.path().join("places.sqlite");
                    paths.push(("Firefox".to_string(), candidate));
                }
            }
        }
    }

    paths
}
