use std::path::PathBuf;

/// Opaque handle to whatever a collector produced.
///
/// The coordinator and synthesizer never interpret artifact contents beyond
/// rendering; row caps, truncation notes and rule-check flags are filled in
/// by the collector that owns the data.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Raw output persisted to disk (memory images, copied databases).
    File { path: PathBuf, bytes: u64 },
    /// Free-form text (command output, short notes).
    Text(String),
    /// Structured rows ready for tabular rendering.
    Table(ArtifactTable),
}

impl Artifact {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn file(path: PathBuf, bytes: u64) -> Self {
        Self::File { path, bytes }
    }

    /// Rule-check hits attached to this artifact, if any.
    pub fn flagged(&self) -> &[String] {
        match self {
            Self::Table(t) => &t.flagged,
            _ => &[],
        }
    }
}

/// Tabular artifact with optional truncation note and rule-check flags.
#[derive(Debug, Clone, Default)]
pub struct ArtifactTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Present when the producing collector capped its own output.
    pub truncated: Option<String>,
    /// Notable findings surfaced by the capture layer's rule checks.
    pub flagged: Vec<String>,
}

impl ArtifactTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Cap the table at `max` rows, recording a truncation note when rows
    /// were dropped. The cap value comes from config; the note text names
    /// how many rows were available.
    pub fn cap(&mut self, max: usize) {
        if self.rows.len() > max {
            let available = self.rows.len();
            self.rows.truncate(max);
            self.truncated = Some(format!(
                "output truncated to {max} rows ({available} available)"
            ));
        }
    }

    pub fn flag(&mut self, finding: impl Into<String>) {
        self.flagged.push(finding.into());
    }
}
