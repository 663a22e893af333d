//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

use crate::constants::{
    DEFAULT_CONFLICT_REQUEUE_SECS, DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_METRICS_PORT, DEFAULT_REGISTRATION_RETRY_SECS,
    DEFAULT_REGISTRY_TIMEOUT_SECS, DEFAULT_SERVER_POLL_INTERVAL_MS,
    DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
};

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port of the metrics and probes server
    pub metrics_port: u16,
    /// How long to wait for the probes server to bind (seconds)
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the probes server (milliseconds)
    pub server_poll_interval_ms: u64,
    /// Interval between SchemaRegistry health probes (seconds)
    pub health_check_interval_secs: u64,
    /// Retry delay after a failed schema registration (seconds)
    pub registration_retry_secs: u64,
    /// Requeue delay after a write conflict (seconds)
    pub conflict_requeue_secs: u64,
    /// Registry request timeout used when a SchemaRegistry sets none (seconds)
    pub default_registry_timeout_secs: u64,
    /// Maximum concurrent reconciliations per controller
    pub max_concurrent_reconciliations: u16,
    /// Restrict watches to one namespace; `None` watches all namespaces
    pub watch_namespace: Option<String>,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            health_check_interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            registration_retry_secs: DEFAULT_REGISTRATION_RETRY_SECS,
            conflict_requeue_secs: DEFAULT_CONFLICT_REQUEUE_SECS,
            default_registry_timeout_secs: DEFAULT_REGISTRY_TIMEOUT_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            watch_namespace: None,
            log_format: LogFormat::Text,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unparseable values fall back to the default for that key.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        Self {
            metrics_port: lookup("METRICS_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.metrics_port),
            server_startup_timeout_secs: parsed(
                "SERVER_STARTUP_TIMEOUT_SECS",
                defaults.server_startup_timeout_secs,
            ),
            server_poll_interval_ms: parsed(
                "SERVER_POLL_INTERVAL_MS",
                defaults.server_poll_interval_ms,
            ),
            health_check_interval_secs: parsed(
                "HEALTH_CHECK_INTERVAL_SECS",
                defaults.health_check_interval_secs,
            ),
            registration_retry_secs: parsed(
                "REGISTRATION_RETRY_SECS",
                defaults.registration_retry_secs,
            ),
            conflict_requeue_secs: parsed("CONFLICT_REQUEUE_SECS", defaults.conflict_requeue_secs),
            default_registry_timeout_secs: parsed(
                "DEFAULT_REGISTRY_TIMEOUT_SECS",
                defaults.default_registry_timeout_secs,
            )
            .max(1),
            max_concurrent_reconciliations: lookup("MAX_CONCURRENT_RECONCILIATIONS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.max_concurrent_reconciliations),
            watch_namespace: lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty()),
            log_format: lookup("LOG_FORMAT")
                .map_or(defaults.log_format, |v| LogFormat::parse(&v)),
        }
    }

    /// Get health check interval duration
    #[must_use]
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    /// Get registration retry duration
    #[must_use]
    pub fn registration_retry(&self) -> Duration {
        Duration::from_secs(self.registration_retry_secs)
    }

    /// Get conflict requeue duration
    #[must_use]
    pub fn conflict_requeue(&self) -> Duration {
        Duration::from_secs(self.conflict_requeue_secs)
    }

    /// Resolve the effective registry request timeout
    ///
    /// Zero or unset means "use the default", never "no timeout".
    #[must_use]
    pub fn registry_timeout(&self, configured_secs: Option<u64>) -> Duration {
        match configured_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(self.default_registry_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = ControllerConfig::from_lookup(|_| None);
        assert_eq!(config.health_check_interval(), Duration::from_secs(300));
        assert_eq!(config.registration_retry(), Duration::from_secs(60));
        assert_eq!(config.metrics_port, 5000);
        assert!(config.watch_namespace.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = ControllerConfig::from_lookup(lookup_from(&[
            ("HEALTH_CHECK_INTERVAL_SECS", "30"),
            ("REGISTRATION_RETRY_SECS", "not-a-number"),
            ("WATCH_NAMESPACE", "kafka"),
            ("LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.health_check_interval_secs, 30);
        assert_eq!(config.registration_retry_secs, 60);
        assert_eq!(config.watch_namespace.as_deref(), Some("kafka"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_zero_timeout_means_default() {
        let config = ControllerConfig::default();
        assert_eq!(config.registry_timeout(Some(0)), Duration::from_secs(30));
        assert_eq!(config.registry_timeout(None), Duration::from_secs(30));
        assert_eq!(config.registry_timeout(Some(5)), Duration::from_secs(5));
    }
}
