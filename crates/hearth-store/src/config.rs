use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use chrono::Weekday;
use serde::Deserialize;

use hearth_core::parse_weekday;

use crate::error::{Result, StoreError};
use crate::retry::{DEFAULT_MAX_RETRIES, RetryPolicy};
use crate::store::DeleteMode;

pub const DB_FILE: &str = "reminders.db";
pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_SCOPE: &str = "default";

/// Default base directory for all hearth storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".hearth")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Settings read from `<base>/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_dir: PathBuf,
    pub scope: String,
    pub week_start: Weekday,
    pub delete_mode: DeleteMode,
    pub retry: RetryPolicy,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    scope: Option<String>,
    week_start: Option<String>,
    delete_mode: Option<DeleteMode>,
    retry: RawRetry,
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct RawRetry {
    max_retries: Option<u32>,
    base_delay_ms: Option<u64>,
}

impl Config {
    pub fn defaults(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            scope: DEFAULT_SCOPE.to_string(),
            week_start: Weekday::Sun,
            delete_mode: DeleteMode::Hard,
            retry: RetryPolicy::default(),
        }
    }

    /// Load `<base>/config.toml`; a missing file yields the defaults.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::defaults(base_dir));
        }
        let content = fs::read_to_string(&path).map_err(|e| {
            StoreError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(base_dir, &content)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))
    }

    fn parse(base_dir: &Path, content: &str) -> std::result::Result<Self, String> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| e.to_string())?;
        let mut config = Self::defaults(base_dir);

        if let Some(scope) = raw.scope {
            let scope = scope.trim();
            if scope.is_empty() {
                return Err("scope must not be empty".to_string());
            }
            config.scope = scope.to_string();
        }
        if let Some(day) = raw.week_start {
            config.week_start =
                parse_weekday(&day).ok_or_else(|| format!("unknown week_start '{day}'"))?;
        }
        if let Some(mode) = raw.delete_mode {
            config.delete_mode = mode;
        }
        config.retry = RetryPolicy::new(
            raw.retry.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            raw.retry
                .base_delay_ms
                .map_or(config.retry.base_delay, Duration::from_millis),
        );
        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.base_dir.join(DB_FILE)
    }
}
