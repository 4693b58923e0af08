use bitprobe_core::traits::Collector;
use bitprobe_core::{Artifact, ArtifactTable, Config, RunContext, TaskError};
use tracing::debug;

/// Connection snapshot via the platform's `netstat`, capped at
/// `config.max_connections`. Raw command output is kept as an artifact;
/// listening sockets on unusual ports are flagged for the summary.
pub struct NetworkCollector;

#[async_trait::async_trait]
impl Collector for NetworkCollector {
    async fn execute(&self, ctx: &RunContext, config: &Config) -> Result<Artifact, TaskError> {
        let netstat = which::which("netstat")
            .map_err(|_| TaskError::DependencyMissing("netstat".into()))?;

        let output = tokio::process::Command::new(netstat)
            .arg("-an")
            .kill_on_drop(true)
            .output()
            .await?;
        if !output.status.success() {
            return Err(TaskError::failure(format!(
                "netstat exited with {}",
                output.status
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);

        let raw_path = ctx
            .layout
            .artifact_dir("network")
            .join(format!("connections_{}.txt", crate::file_stamp()));
        tokio::fs::write(&raw_path, stdout.as_bytes()).await?;

        let rows = parse_netstat(&stdout);
        debug!(count = rows.len(), "connections parsed");

        let mut table = ArtifactTable::new(&["Proto", "Local Address", "Remote Address", "State"]);
        for row in &rows {
            table.push_row(row.clone());
        }
        table.cap(config.max_connections);

        for row in &rows {
            if let Some(finding) = unexpected_listener(row) {
                table.flag(finding);
            }
        }

        Ok(Artifact::Table(table))
    }
}

/// Minimal whitespace parse of `netstat -an` output. Lines that do not
/// look like connection rows are ignored.
pub(crate) fn parse_netstat(output: &str) -> Vec<Vec<String>> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let proto = *fields.first()?;
            if !proto.starts_with("tcp") && !proto.starts_with("udp") && proto != "TCP" && proto != "UDP" {
                return None;
            }
            // Linux netstat: proto recv send local remote [state];
            // Windows netstat: proto local remote state.
            let (local, remote, state) = if fields.len() >= 5 && fields[1].parse::<u64>().is_ok() {
                (fields[3], fields[4], fields.get(5).copied().unwrap_or(""))
            } else if fields.len() >= 3 {
                (fields[1], fields[2], fields.get(3).copied().unwrap_or(""))
            } else {
                return None;
            };
            Some(vec![
                proto.to_lowercase(),
                local.to_string(),
                remote.to_string(),
                state.to_string(),
            ])
        })
        .collect()
}

/// Flag listeners on unprivileged ports; those are the ones malware
/// typically opens.
pub(crate) fn unexpected_listener(row: &[String]) -> Option<String> {
    let state = row.get(3)?;
    if !state.eq_ignore_ascii_case("LISTEN") && !state.eq_ignore_ascii_case("LISTENING") {
        return None;
    }
    let local = row.get(1)?;
    let port: u16 = local.rsplit([':', '.']).next()?.parse().ok()?;
    if port >= 1024 {
        Some(format!("unexpected listening port {port} ({local})"))
    } else {
        None
    }
}
