//! Store configuration
//!
//! Loaded from TOML or built in code. Only `path` is required.
//!
//! ```toml
//! path = "/var/lib/vulnstore/store.db"
//! busy_timeout_ms = 5000
//! batch_max_statements = 2000
//! batch_max_wait_ms = 60000
//! ingest_timeout_ms = 300000
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vulnstore_core::errors::ConfigError;

pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_BATCH_MAX_STATEMENTS: usize = 2_000;
pub const DEFAULT_BATCH_MAX_WAIT_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    pub path: PathBuf,
    /// How long a connection waits on a locked database before failing
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Queued statements that force a batch flush
    #[serde(default = "default_batch_max_statements")]
    pub batch_max_statements: usize,
    /// Age of the oldest queued statement that forces a batch flush
    #[serde(default = "default_batch_max_wait_ms")]
    pub batch_max_wait_ms: u64,
    /// Deadline for a whole ingestion call; exceeding it rolls the call back
    #[serde(default)]
    pub ingest_timeout_ms: Option<u64>,
}

const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

const fn default_batch_max_statements() -> usize {
    DEFAULT_BATCH_MAX_STATEMENTS
}

const fn default_batch_max_wait_ms() -> u64 {
    DEFAULT_BATCH_MAX_WAIT_MS
}

impl StoreConfig {
    /// Defaults for everything but the database path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            batch_max_statements: DEFAULT_BATCH_MAX_STATEMENTS,
            batch_max_wait_ms: DEFAULT_BATCH_MAX_WAIT_MS,
            ingest_timeout_ms: None,
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: StoreConfig = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.batch_max_statements == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_max_statements".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if self.ingest_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "ingest_timeout_ms".into(),
                reason: "must be greater than zero when set".into(),
            });
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn batch_max_wait(&self) -> Duration {
        Duration::from_millis(self.batch_max_wait_ms)
    }

    pub fn ingest_timeout(&self) -> Option<Duration> {
        self.ingest_timeout_ms.map(Duration::from_millis)
    }
}
