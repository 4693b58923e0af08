use std::path::Path;

use super::types::Config;

/// Load configuration with the usual precedence: an explicit path wins,
/// then `./bitprobe.toml`, then built-in defaults. The `BITPROBE_LOG`
/// environment variable overrides the logging level.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<Config> {
    let mut cfg: Config = if let Some(path) = explicit {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", path.display()))?;
        toml::from_str(&s)?
    } else {
        let local = Path::new("bitprobe.toml");
        if local.exists() {
            let s = std::fs::read_to_string(local)?;
            toml::from_str(&s)?
        } else {
            Config::default()
        }
    };

    if let Ok(v) = std::env::var("BITPROBE_LOG") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }

    Ok(cfg)
}
