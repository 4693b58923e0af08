//! Concrete collectors and installers for BitProbe.
//!
//! Everything here sits behind the engine's `Collector` / `Installer`
//! traits and stays deliberately thin: host data extraction is best-effort,
//! and anything that needs an absent external tool fails fast with
//! `DependencyMissing` instead of degrading the whole run.

pub mod browser;
pub mod catalog;
pub mod installers;
pub mod memory;
pub mod network;
pub mod processes;
pub mod registry;
pub mod system_info;
pub mod system_logs;

pub use catalog::default_registry;

use chrono::Utc;

/// Timestamp fragment used in artifact file names.
pub(crate) fn file_stamp() -> String {
    Utc::now().format("%Y%m%d_%H%M%S").to_string()
}
