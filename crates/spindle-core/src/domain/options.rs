//! Batch options (pool size, polling, idle timeout, extra arguments).
//!
//! Every field has a default so a partial JSON document or an empty
//! environment still yields a usable configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::preference::StreamPreferences;
use crate::error::SpindleError;

pub const DEFAULT_MAX_CONCURRENCY: usize = 20;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 120;

/// Largest accepted pool size. Each slot is a semaphore permit.
pub const MAX_CONCURRENCY_LIMIT: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Bind each element to this named parameter instead of the first
    /// positional argument.
    pub binding_name: Option<String>,

    /// Size of the execution context pool.
    pub max_concurrency: usize,

    /// Sleep between two watcher poll cycles.
    pub poll_interval_ms: u64,

    /// Cancel every running worker once no worker has completed for this long.
    pub idle_timeout_secs: u64,

    /// Named parameters added to every worker's command.
    pub extra_parameters: BTreeMap<String, serde_json::Value>,

    /// Standalone flags added to every worker's command.
    pub extra_flags: BTreeSet<String>,

    /// Stream visibility applied to each context by the warm-up invocation.
    pub stream_preferences: StreamPreferences,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            binding_name: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            extra_parameters: BTreeMap::new(),
            extra_flags: BTreeSet::new(),
            stream_preferences: StreamPreferences::all_continue(),
        }
    }
}

impl BatchOptions {
    /// Defaults overridden by `SPINDLE_*` environment variables.
    ///
    /// - `SPINDLE_MAX_CONCURRENCY`
    /// - `SPINDLE_POLL_INTERVAL_MS`
    /// - `SPINDLE_IDLE_TIMEOUT_SECS`
    /// - `SPINDLE_BINDING_NAME`
    pub fn from_env() -> Result<Self, SpindleError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SpindleError> {
        let mut options = Self::default();
        if let Some(v) = lookup("SPINDLE_MAX_CONCURRENCY") {
            options.max_concurrency = parse_var("SPINDLE_MAX_CONCURRENCY", &v)?;
        }
        if let Some(v) = lookup("SPINDLE_POLL_INTERVAL_MS") {
            options.poll_interval_ms = parse_var("SPINDLE_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("SPINDLE_IDLE_TIMEOUT_SECS") {
            options.idle_timeout_secs = parse_var("SPINDLE_IDLE_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("SPINDLE_BINDING_NAME") {
            let v = v.trim();
            if !v.is_empty() {
                options.binding_name = Some(v.to_string());
            }
        }
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), SpindleError> {
        if self.max_concurrency == 0 {
            return Err(SpindleError::invalid_config(
                "max_concurrency",
                "must be at least 1",
            ));
        }
        if self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(SpindleError::invalid_config(
                "max_concurrency",
                format!("must be at most {MAX_CONCURRENCY_LIMIT}"),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(SpindleError::invalid_config(
                "poll_interval_ms",
                "must be at least 1",
            ));
        }
        if let Some(name) = &self.binding_name
            && name.trim().is_empty()
        {
            return Err(SpindleError::invalid_config(
                "binding_name",
                "must not be blank",
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn with_binding_name(mut self, name: impl Into<String>) -> Self {
        self.binding_name = Some(name.into());
        self
    }

    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.idle_timeout_secs = secs;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_parameters.insert(name.into(), value);
        self
    }

    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.extra_flags.insert(name.into());
        self
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SpindleError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| SpindleError::invalid_config(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let o = BatchOptions::default();
        assert_eq!(o.max_concurrency, 20);
        assert_eq!(o.poll_interval(), Duration::from_millis(200));
        assert_eq!(o.idle_timeout(), Duration::from_secs(120));
        assert!(o.binding_name.is_none());
    }

    #[test]
    fn partial_json_gets_defaults() {
        let json = r#"{ "max_concurrency": 4, "extra_flags": ["Verbose"] }"#;
        let o: BatchOptions = serde_json::from_str(json).expect("deserialize");
        assert_eq!(o.max_concurrency, 4);
        assert_eq!(o.idle_timeout_secs, 120);
        assert!(o.extra_flags.contains("Verbose"));
    }

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("SPINDLE_MAX_CONCURRENCY", "3"),
            ("SPINDLE_POLL_INTERVAL_MS", " 50 "),
            ("SPINDLE_BINDING_NAME", "ComputerName"),
        ]);
        let o = BatchOptions::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(o.max_concurrency, 3);
        assert_eq!(o.poll_interval_ms, 50);
        assert_eq!(o.idle_timeout_secs, 120);
        assert_eq!(o.binding_name.as_deref(), Some("ComputerName"));
    }

    #[test]
    fn env_with_garbage_is_rejected() {
        let err = BatchOptions::from_lookup(|k| {
            (k == "SPINDLE_IDLE_TIMEOUT_SECS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, SpindleError::InvalidConfig { ref key, .. } if key == "SPINDLE_IDLE_TIMEOUT_SECS"));
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, true)]
    #[case(MAX_CONCURRENCY_LIMIT, true)]
    #[case(MAX_CONCURRENCY_LIMIT + 1, false)]
    #[case(usize::MAX, false)]
    fn concurrency_must_be_within_bounds(#[case] n: usize, #[case] valid: bool) {
        let o = BatchOptions::default().with_max_concurrency(n);
        assert_eq!(o.validate().is_ok(), valid);
    }

    #[test]
    fn oversized_concurrency_from_env_is_rejected() {
        let err = BatchOptions::from_lookup(|k| {
            (k == "SPINDLE_MAX_CONCURRENCY").then(|| usize::MAX.to_string())
        })
        .unwrap_err();
        assert!(matches!(err, SpindleError::InvalidConfig { ref key, .. } if key == "max_concurrency"));
    }
}
