//! Settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use network_hierarchy::HierarchyConfig;
use network_shared::MAX_PAGE_SIZE;

use crate::errors::ServiceError;

/// Default location of the JSON snapshot.
pub const DEFAULT_SNAPSHOT_PATH: &str = "network.json";

/// Default number of retries after a storage conflict.
const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

/// Default pause between conflict retries, in milliseconds.
const DEFAULT_RETRY_BACKOFF_MS: u64 = 10;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Everything the service needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    /// JSON snapshot the store is loaded from and written back to.
    pub snapshot_path: PathBuf,
    /// Retry behaviour of the hierarchy mutator.
    pub hierarchy: HierarchyConfig,
    /// Largest page size a listing may return.
    pub max_page_size: usize,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            hierarchy: HierarchyConfig::with_retries(
                DEFAULT_MAX_CONFLICT_RETRIES,
                Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
            ),
            max_page_size: MAX_PAGE_SIZE,
            log_format: LogFormat::Text,
        }
    }
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `NETWORK_SNAPSHOT_PATH`: snapshot file (default: network.json)
    /// - `HIERARCHY_MAX_CONFLICT_RETRIES`: retries after a conflict (default: 3)
    /// - `HIERARCHY_RETRY_BACKOFF_MS`: pause between retries (default: 10)
    /// - `NETWORK_MAX_PAGE_SIZE`: page size cap (default: 100)
    /// - `LOG_FORMAT`: `text` or `json` (default: text)
    ///
    /// Runs before the tracing subscriber exists, so a rejected value is only
    /// reported through the returned error. Its message names the variable
    /// and the raw value.
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServiceError> {
        let defaults = Self::default();

        let snapshot_path = lookup("NETWORK_SNAPSHOT_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.snapshot_path);
        let max_conflict_retries = parse(&lookup, "HIERARCHY_MAX_CONFLICT_RETRIES")?
            .unwrap_or(defaults.hierarchy.max_conflict_retries);
        let retry_backoff = parse::<u64>(&lookup, "HIERARCHY_RETRY_BACKOFF_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.hierarchy.retry_backoff);
        let max_page_size: usize =
            parse(&lookup, "NETWORK_MAX_PAGE_SIZE")?.unwrap_or(defaults.max_page_size);
        if max_page_size == 0 {
            return Err(ServiceError::config("NETWORK_MAX_PAGE_SIZE must be at least 1"));
        }
        let log_format = parse(&lookup, "LOG_FORMAT")?.unwrap_or(defaults.log_format);

        Ok(Self {
            snapshot_path,
            hierarchy: HierarchyConfig::with_retries(max_conflict_retries, retry_backoff),
            max_page_size,
            log_format,
        })
    }

    /// Override the snapshot location.
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = path.into();
        self
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ServiceError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ServiceError::config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();

        assert_eq!(settings.snapshot_path, PathBuf::from("network.json"));
        assert_eq!(settings.hierarchy.max_conflict_retries, 3);
        assert_eq!(settings.hierarchy.retry_backoff, Duration::from_millis(10));
        assert_eq!(settings.max_page_size, 100);
        assert_eq!(settings.log_format, LogFormat::Text);
    }

    #[test]
    fn test_reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("NETWORK_SNAPSHOT_PATH", "/tmp/net.json"),
            ("HIERARCHY_MAX_CONFLICT_RETRIES", "0"),
            ("HIERARCHY_RETRY_BACKOFF_MS", "250"),
            ("NETWORK_MAX_PAGE_SIZE", "20"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(settings.snapshot_path, PathBuf::from("/tmp/net.json"));
        assert_eq!(settings.hierarchy.max_conflict_retries, 0);
        assert_eq!(settings.hierarchy.retry_backoff, Duration::from_millis(250));
        assert_eq!(settings.max_page_size, 20);
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_rejects_malformed_values() {
        let err = Settings::from_lookup(lookup(&[("HIERARCHY_MAX_CONFLICT_RETRIES", "many")])).unwrap_err();
        assert!(matches!(err, ServiceError::ConfigError(ref m) if m.contains("HIERARCHY_MAX_CONFLICT_RETRIES")));

        assert!(Settings::from_lookup(lookup(&[("NETWORK_MAX_PAGE_SIZE", "0")])).is_err());

        let err = Settings::from_lookup(lookup(&[("LOG_FORMAT", "xml")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("LOG_FORMAT"), "{message}");
        assert!(message.contains("xml"), "{message}");
    }
}
