use serde::Deserialize;
use std::path::Path;

/// Parameters for the multi-observer concurrency report.
///
/// Every field has a default, so an empty or missing file runs a sane
/// local benchmark.
#[derive(Deserialize, Debug)]
pub struct ReportConfig {
    #[serde(default = "defaults::ring_path")]
    pub ring_path: String,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::capacity")]
    pub capacity: usize,
    #[serde(default = "defaults::observers")]
    pub observers: usize,
    #[serde(default = "defaults::ticks")]
    pub ticks: u64,
    #[serde(default = "defaults::underflow_fixup")]
    pub underflow_fixup: u32,
    /// When set, the report is also written to this path as JSON.
    #[serde(default)]
    pub json_output: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn ring_path() -> String {
        let pid = std::process::id();
        format!("/tmp/tickbus_report_{pid}")
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn capacity() -> usize {
        1 << 16
    }

    pub fn observers() -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(1)
    }

    pub fn ticks() -> u64 {
        1_000_000
    }

    pub fn underflow_fixup() -> u32 {
        128
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            ring_path: defaults::ring_path(),
            log_level: defaults::log_level(),
            capacity: defaults::capacity(),
            observers: defaults::observers(),
            ticks: defaults::ticks(),
            underflow_fixup: defaults::underflow_fixup(),
            json_output: None,
        }
    }
}

impl ReportConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: ReportConfig = toml::from_str(&raw)?;
        Ok(config)
    }
}
