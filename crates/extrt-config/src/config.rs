//! Application configuration (spec §6.3).

use std::collections::HashSet;
use std::time::Duration;

use extrt_foundation::{ExtError, ExtResult};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Format used by the structured logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Loader behavior (spec §4.6, §6.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    /// Enables the `Deepbind` loader flag so a module prefers its own symbols.
    pub prefer_own_symbols: bool,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            prefer_own_symbols: false,
        }
    }
}

/// Policy-based extension filtering (spec §4.4.2).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SecurityConfig {
    pub whitelisted_extensions: HashSet<String>,
    pub blacklisted_extensions: HashSet<String>,
}

/// Per-stage soft timeouts (spec §4.3, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub parsing: Duration,
    pub resolution: Duration,
    pub loading: Duration,
    pub exporting: Duration,
    pub starting: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            parsing: Duration::from_millis(500),
            resolution: Duration::from_secs(2),
            loading: Duration::from_secs(5),
            exporting: Duration::from_secs(2),
            starting: Duration::from_secs(2),
        }
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub loading: LoadingConfig,
    pub security: SecurityConfig,
    /// Worker pool size; `0` means "use available parallelism".
    pub threads: usize,
    pub timeouts: Timeouts,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `extrt.toml` (if present) in `dir`, then
    /// overlay `EXTRT_`-prefixed environment variables, following the same
    /// figment layering the teacher's `mill-config` crate uses.
    pub fn load(dir: &std::path::Path) -> ExtResult<Self> {
        let path = dir.join("extrt.toml");
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("EXTRT_").split("_"))
            .extract()
            .map_err(|e| ExtError::configuration_missing(e.to_string()))
    }

    /// Effective worker pool size, resolving `0` to available parallelism.
    pub fn worker_count(&self) -> usize {
        if self.threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            self.threads
        }
    }
}
