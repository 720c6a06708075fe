//! Storage configuration.

use serde::Deserialize;

use relstore_core::{Dialect, Error, Result};
use relstore_schema::TableOptions;

/// Settings shared by every query and schema statement of a [`Storage`].
///
/// [`Storage`]: crate::Storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQL dialect of the connection.
    pub dialect: Dialect,
    /// Options appended to MySQL `CREATE TABLE`.
    pub table_options: TableOptions,
}

impl StorageConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Load from a JSON document; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::builder(format!("Invalid storage configuration: {e}")))
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.table_options.engine = engine.into();
        self
    }

    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.table_options.charset = charset.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.table_options.engine, "InnoDB");
        assert_eq!(config.table_options.charset, "utf8");
    }

    #[test]
    fn test_builder_setters() {
        let config = StorageConfig::new(Dialect::Postgres)
            .engine("MyISAM")
            .charset("utf8mb4")
            .dialect(Dialect::MySql);
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.table_options.engine, "MyISAM");
        assert_eq!(config.table_options.charset, "utf8mb4");
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config = StorageConfig::from_json(r#"{"dialect": "pgsql"}"#).unwrap();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.table_options, TableOptions::default());

        let config =
            StorageConfig::from_json(r#"{"table_options": {"charset": "latin1"}}"#).unwrap();
        assert_eq!(config.dialect, Dialect::MySql);
        assert_eq!(config.table_options.engine, "InnoDB");
        assert_eq!(config.table_options.charset, "latin1");
    }

    #[test]
    fn test_from_json_rejects_unknown_dialect() {
        let err = StorageConfig::from_json(r#"{"dialect": "oracle"}"#).unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }
}
