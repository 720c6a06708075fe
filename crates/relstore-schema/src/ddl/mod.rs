//! DDL generation for the supported dialects.

mod mysql;
mod postgres;

pub use mysql::MySqlDdlGenerator;
pub use postgres::PostgresDdlGenerator;

use relstore_core::{Dialect, FieldType, Result};

use crate::SchemaBuilder;

/// Turns a populated [`SchemaBuilder`] into SQL for one dialect.
pub trait DdlGenerator {
    /// Dialect this generator targets.
    fn dialect(&self) -> Dialect;

    /// Render the builder's operation as a single SQL string.
    fn generate(&self, schema: &SchemaBuilder) -> Result<String>;

    /// Native type names per semantic type, checked in order when parsing.
    fn native_types(&self) -> &'static [(FieldType, &'static [&'static str])];

    /// Reduce a raw native type label to the name looked up in
    /// [`DdlGenerator::native_types`].
    fn normalize_type(&self, raw: &str) -> String;
}

/// Generator for `dialect`.
pub fn generator_for(dialect: Dialect) -> &'static dyn DdlGenerator {
    match dialect {
        Dialect::MySql => &MySqlDdlGenerator,
        Dialect::Postgres => &PostgresDdlGenerator,
    }
}

/// `{table}_{name}`, the stored name of a non-primary index.
pub(crate) fn index_name(table: &str, name: &str) -> String {
    format!("{table}_{name}")
}

/// Render a default value: quoted unless the type is numeric.
pub(crate) fn default_literal(field_type: FieldType, value: &str) -> String {
    if field_type.is_numeric() {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// `DEFAULT v`, `DEFAULT NULL` or `NOT NULL`, in that order of precedence.
pub(crate) fn nullability_clause(
    field_type: FieldType,
    attributes: &relstore_core::FieldAttributes,
) -> String {
    if let Some(default) = &attributes.default {
        format!("DEFAULT {}", default_literal(field_type, default))
    } else if attributes.nullable {
        "DEFAULT NULL".to_string()
    } else {
        "NOT NULL".to_string()
    }
}
