//! Environment configuration.

use recordset_query::Dialect;
use serde::{Deserialize, Serialize};

/// Configuration for Environment behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// SQL dialect statements are compiled for.
    pub dialect: Dialect,
    /// Whether every executed statement is logged at debug level.
    pub log_statements: bool,
    /// Per-record relation loads of one (model, field) pair before a warning.
    pub relation_load_threshold: usize,
    /// Whether per-record relation loads are counted at all.
    pub track_relation_loads: bool,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            log_statements: true,
            relation_load_threshold: 3,
            track_relation_loads: true,
        }
    }
}

impl EnvironmentConfig {
    /// Set the SQL dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Enable or disable statement logging.
    #[must_use]
    pub fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Set the relation load warning threshold.
    #[must_use]
    pub fn with_relation_load_threshold(mut self, threshold: usize) -> Self {
        self.relation_load_threshold = threshold;
        self
    }

    /// Enable or disable relation load tracking.
    #[must_use]
    pub fn with_track_relation_loads(mut self, enabled: bool) -> Self {
        self.track_relation_loads = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnvironmentConfig::default();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert!(config.log_statements);
        assert_eq!(config.relation_load_threshold, 3);
        assert!(config.track_relation_loads);
    }

    #[test]
    fn test_builder_setters() {
        let config = EnvironmentConfig::default()
            .with_dialect(Dialect::Sqlite)
            .with_log_statements(false)
            .with_relation_load_threshold(10);
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert!(!config.log_statements);
        assert_eq!(config.relation_load_threshold, 10);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EnvironmentConfig =
            serde_json::from_str(r#"{"dialect": "mysql", "log_statements": false}"#).unwrap();
        assert_eq!(config.dialect, Dialect::Mysql);
        assert!(!config.log_statements);
        assert_eq!(config.relation_load_threshold, 3);
    }
}
