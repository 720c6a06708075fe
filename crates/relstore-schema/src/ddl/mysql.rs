//! MySQL DDL generator.

use relstore_core::{Dialect, FieldType, IndexKind, Result};

use super::{DdlGenerator, index_name, nullability_clause};
use crate::{ColumnDef, IndexDef, SchemaBuilder, SchemaOperation};

/// DDL generator for MySQL / MariaDB.
pub struct MySqlDdlGenerator;

const INFO_QUERY: &str = "SELECT
\tc.ORDINAL_POSITION AS pos,
\tc.TABLE_SCHEMA AS table_schema,
\tc.TABLE_NAME AS table_name,
\tc.COLUMN_NAME AS column_name,
\tc.DATA_TYPE AS column_type,
\tCASE WHEN c.NUMERIC_PRECISION IS NOT NULL THEN c.NUMERIC_PRECISION ELSE c.CHARACTER_MAXIMUM_LENGTH END AS column_length,
\tc.NUMERIC_SCALE AS column_precision,
\tc.IS_NULLABLE AS column_nullable,
\tCASE WHEN INSTR(LOWER(c.EXTRA), 'auto_increment') > 0 THEN 'YES' ELSE 'NO' END AS column_auto_increment,
\tc.COLUMN_DEFAULT AS column_default,
\ts.INDEX_NAME AS index_name,
\tCASE WHEN (s.INDEX_NAME IS NOT NULL AND i.CONSTRAINT_TYPE IS NULL) THEN 'INDEX' ELSE i.CONSTRAINT_TYPE END AS index_type,
\ts.SEQ_IN_INDEX AS index_pos,
\tk.REFERENCED_TABLE_SCHEMA AS ref_schema,
\tk.REFERENCED_TABLE_NAME AS ref_table,
\tk.REFERENCED_COLUMN_NAME AS ref_column
FROM
\tinformation_schema.COLUMNS AS c
\tLEFT JOIN information_schema.STATISTICS AS s ON c.TABLE_SCHEMA = s.TABLE_SCHEMA AND c.TABLE_NAME = s.TABLE_NAME AND c.COLUMN_NAME = s.COLUMN_NAME
\tLEFT JOIN information_schema.KEY_COLUMN_USAGE AS k ON s.TABLE_SCHEMA = k.TABLE_SCHEMA AND s.TABLE_NAME = k.TABLE_NAME AND s.COLUMN_NAME = k.COLUMN_NAME AND s.INDEX_NAME = k.CONSTRAINT_NAME
\tLEFT JOIN information_schema.TABLE_CONSTRAINTS AS i ON k.CONSTRAINT_SCHEMA = i.CONSTRAINT_SCHEMA AND k.CONSTRAINT_NAME = i.CONSTRAINT_NAME AND k.TABLE_NAME = i.TABLE_NAME
WHERE c.TABLE_NAME = '{table}'
ORDER BY pos";

impl DdlGenerator for MySqlDdlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    fn generate(&self, schema: &SchemaBuilder) -> Result<String> {
        tracing::debug!(dialect = "mysql", operation = %schema.operation(), "Generating DDL");

        let table = schema.table();
        let parts: Vec<String> = match schema.operation() {
            SchemaOperation::Check => vec![format!(
                "SELECT TABLE_NAME FROM information_schema.TABLES WHERE TABLE_NAME = '{}'",
                escape_literal(table)
            )],
            SchemaOperation::Info => vec![INFO_QUERY.replace("{table}", &escape_literal(table))],
            SchemaOperation::Create => {
                let body: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(column_definition)
                    .chain(schema.indexes().iter().map(|i| index_definition(table, i)))
                    .collect();
                let options = schema.options();
                vec![
                    "CREATE TABLE".to_string(),
                    table.to_string(),
                    "(".to_string(),
                    body.join(", "),
                    ")".to_string(),
                    format!(
                        "ENGINE={} DEFAULT CHARSET={}",
                        options.engine, options.charset
                    ),
                ]
            }
            SchemaOperation::Add => {
                let clauses: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(|c| match &c.after {
                        Some(after) => format!("ADD {} AFTER {after}", column_definition(c)),
                        None => format!("ADD {}", column_definition(c)),
                    })
                    .chain(
                        schema
                            .indexes()
                            .iter()
                            .map(|i| format!("ADD {}", index_definition(table, i))),
                    )
                    .collect();
                alter(table, &clauses)
            }
            SchemaOperation::Change => {
                let clauses: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(|c| {
                        let previous = c.after.as_deref().unwrap_or(&c.name);
                        format!("CHANGE {previous} {}", column_definition(c))
                    })
                    .collect();
                alter(table, &clauses)
            }
            SchemaOperation::Remove => {
                let clauses: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(|c| format!("DROP {}", c.name))
                    .chain(schema.indexes().iter().map(|i| match i.kind {
                        IndexKind::Primary => "DROP PRIMARY KEY".to_string(),
                        IndexKind::Foreign => {
                            format!("DROP FOREIGN KEY {}", index_name(table, &i.name))
                        }
                        IndexKind::Unique | IndexKind::Index => {
                            format!("DROP KEY {}", index_name(table, &i.name))
                        }
                    }))
                    .collect();
                alter(table, &clauses)
            }
            SchemaOperation::Drop => vec![format!("DROP TABLE IF EXISTS {table}")],
        };

        Ok(parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }

    fn native_types(&self) -> &'static [(FieldType, &'static [&'static str])] {
        &[
            (FieldType::Boolean, &["tinyint"]),
            (FieldType::Serial, &["blob", "mediumblob", "longblob", "json"]),
            (
                FieldType::Integer,
                &["smallint", "mediumint", "int", "integer", "bigint"],
            ),
            (FieldType::Decimal, &["decimal", "numeric", "float", "double"]),
            (
                FieldType::String,
                &["char", "varchar", "tinytext", "mediumtext", "text", "longtext"],
            ),
            (
                FieldType::DateTime,
                &["time", "date", "datetime", "timestamp", "year"],
            ),
        ]
    }

    /// First word of the label, without any `(…)` suffix: `INT(11) unsigned` → `int`.
    fn normalize_type(&self, raw: &str) -> String {
        raw.trim()
            .split([' ', '('])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

fn alter(table: &str, clauses: &[String]) -> Vec<String> {
    vec![
        "ALTER TABLE".to_string(),
        table.to_string(),
        clauses.join(", "),
    ]
}

fn column_type(column: &ColumnDef) -> String {
    let attributes = &column.attributes;
    match column.field_type {
        FieldType::Boolean => "TINYINT(1)".to_string(),
        FieldType::Integer => format!("INT({})", attributes.length.unwrap_or(11)),
        FieldType::Decimal => format!(
            "DECIMAL({},{})",
            attributes.length.unwrap_or(11),
            attributes.precision.unwrap_or(4)
        ),
        FieldType::DateTime => "DATETIME".to_string(),
        FieldType::Serial => "BLOB".to_string(),
        FieldType::String => match attributes.length {
            None | Some(0) => "TEXT".to_string(),
            Some(len) if len > 1023 => "TEXT".to_string(),
            Some(len) if len > 255 => format!("VARCHAR({len})"),
            Some(len) => format!("CHAR({len})"),
        },
    }
}

fn column_definition(column: &ColumnDef) -> String {
    let mut definition = format!(
        "{} {} {}",
        column.name,
        column_type(column),
        nullability_clause(column.field_type, &column.attributes)
    );
    if column.field_type == FieldType::Integer && column.attributes.auto_increment {
        definition.push_str(" AUTO_INCREMENT");
    }
    definition
}

fn index_definition(table: &str, index: &IndexDef) -> String {
    let fields = index.fields.join(", ");
    match index.kind {
        IndexKind::Primary => format!("PRIMARY KEY ({fields})"),
        IndexKind::Foreign => format!(
            "CONSTRAINT {} FOREIGN KEY ({fields}) REFERENCES {} ({}) ON UPDATE CASCADE ON DELETE RESTRICT",
            index_name(table, &index.name),
            index.table.as_deref().unwrap_or_default(),
            index.foreign_fields.join(", ")
        ),
        IndexKind::Unique => format!("UNIQUE KEY {} ({fields})", index_name(table, &index.name)),
        IndexKind::Index => format!("KEY {} ({fields})", index_name(table, &index.name)),
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
