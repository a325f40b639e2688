//! Configuration: loads optional ~/.tracklang/config.yaml.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Interpreter and CLI settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// `tracing` level filter: error, warn, info, debug or trace.
    pub log_level: String,
    /// Pretty-print JSON output.
    pub pretty: bool,
    pub clip_defaults: ClipDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            pretty: false,
            clip_defaults: ClipDefaults::default(),
        }
    }
}

/// Lengths used by `new_clip` when none is given.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ClipDefaults {
    /// For `new_clip(bar=...)`.
    pub length_bars: i64,
    /// For `new_clip(position=...)`, in seconds.
    pub length_seconds: f64,
}

impl Default for ClipDefaults {
    fn default() -> Self {
        Self {
            length_bars: 4,
            length_seconds: 4.0,
        }
    }
}

/// ~/.tracklang/config.yaml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".tracklang").join("config.yaml"))
}

/// Load configuration from `path`. The file must exist.
pub fn load_config(path: &Path) -> Result<Config, io::Error> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        io::Error::new(e.kind(), format!("config {}: {e}", path.display()))
    })?;
    parse_config(&content)
}

/// Load from the default location. A missing file gives the defaults.
pub fn load_default_config() -> Result<Config, io::Error> {
    match default_config_path() {
        Some(path) if path.exists() => load_config(&path),
        _ => Ok(Config::default()),
    }
}

pub fn parse_config(yaml: &str) -> Result<Config, io::Error> {
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(yaml).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
