use crate::error::{CrudError, CrudResult};
use std::time::Duration;

/// Configuration for [`TableCrud`](crate::TableCrud).
#[derive(Debug, Clone)]
pub struct CrudConfig {
    /// Whether to collect statistics.
    pub stats_enabled: bool,
    /// Whether to emit a `tracing` event per executed statement.
    pub logging_enabled: bool,
    /// Minimum duration to log (filters out fast statements).
    pub log_min_duration: Option<Duration>,
    /// Slow statement threshold for alerting.
    pub slow_query_threshold: Option<Duration>,
    /// Per-call timeout covering compile and execute.
    pub query_timeout: Option<Duration>,
    /// How UPDATE without a filter is handled.
    pub update_without_filter: DangerousDmlPolicy,
    /// How DELETE without a filter is handled.
    pub delete_without_filter: DangerousDmlPolicy,
}

impl Default for CrudConfig {
    fn default() -> Self {
        Self {
            stats_enabled: true,
            logging_enabled: false,
            log_min_duration: None,
            slow_query_threshold: None,
            query_timeout: None,
            update_without_filter: DangerousDmlPolicy::Allow,
            delete_without_filter: DangerousDmlPolicy::Allow,
        }
    }
}

impl CrudConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.query_timeout = Some(duration);
        self
    }

    /// Set slow statement threshold.
    pub fn slow_threshold(mut self, duration: Duration) -> Self {
        self.slow_query_threshold = Some(duration);
        self
    }

    /// Enable statistics collection.
    pub fn with_stats(mut self) -> Self {
        self.stats_enabled = true;
        self
    }

    /// Disable statistics collection.
    pub fn no_stats(mut self) -> Self {
        self.stats_enabled = false;
        self
    }

    /// Enable statement logging via `tracing`.
    pub fn with_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    /// Enable statement logging with minimum duration filter.
    pub fn log_slow_queries(mut self, min_duration: Duration) -> Self {
        self.logging_enabled = true;
        self.log_min_duration = Some(min_duration);
        self
    }

    /// Configure how UPDATE without a filter is handled.
    pub fn update_without_filter(mut self, policy: DangerousDmlPolicy) -> Self {
        self.update_without_filter = policy;
        self
    }

    /// Configure how DELETE without a filter is handled.
    pub fn delete_without_filter(mut self, policy: DangerousDmlPolicy) -> Self {
        self.delete_without_filter = policy;
        self
    }

    /// Reject UPDATE and DELETE without a filter.
    pub fn strict(self) -> Self {
        self.update_without_filter(DangerousDmlPolicy::Error)
            .delete_without_filter(DangerousDmlPolicy::Error)
    }
}

/// Policy for statements that touch every row of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DangerousDmlPolicy {
    /// Run as written.
    #[default]
    Allow,
    /// Run, and log a warning.
    Warn,
    /// Refuse with [`CrudError::Validation`].
    Error,
}

pub(crate) fn handle_dangerous_dml(
    policy: DangerousDmlPolicy,
    rule: &str,
    sql: &str,
) -> CrudResult<()> {
    match policy {
        DangerousDmlPolicy::Allow => Ok(()),
        DangerousDmlPolicy::Warn => {
            tracing::warn!(target: "tablecrud.sql", rule, sql, "SQL policy warning");
            Ok(())
        }
        DangerousDmlPolicy::Error => Err(CrudError::validation(format!(
            "SQL policy violation: {rule}: {sql}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CrudConfig::default();
        assert!(config.stats_enabled);
        assert!(!config.logging_enabled);
        assert_eq!(config.query_timeout, None);
        assert_eq!(config.update_without_filter, DangerousDmlPolicy::Allow);
        assert_eq!(config.delete_without_filter, DangerousDmlPolicy::Allow);
    }

    #[test]
    fn test_config_builder() {
        let config = CrudConfig::new()
            .strict()
            .timeout(Duration::from_secs(30))
            .log_slow_queries(Duration::from_millis(50))
            .no_stats();

        assert_eq!(config.update_without_filter, DangerousDmlPolicy::Error);
        assert_eq!(config.delete_without_filter, DangerousDmlPolicy::Error);
        assert_eq!(config.query_timeout, Some(Duration::from_secs(30)));
        assert!(config.logging_enabled);
        assert_eq!(config.log_min_duration, Some(Duration::from_millis(50)));
        assert!(!config.stats_enabled);
    }

    #[test]
    fn test_handle_dangerous_dml() {
        assert!(handle_dangerous_dml(DangerousDmlPolicy::Allow, "r", "DELETE FROM t").is_ok());
        assert!(handle_dangerous_dml(DangerousDmlPolicy::Warn, "r", "DELETE FROM t").is_ok());
        let err = handle_dangerous_dml(DangerousDmlPolicy::Error, "DELETE without filter", "DELETE FROM t")
            .unwrap_err();
        assert!(err.is_validation());
    }
}
