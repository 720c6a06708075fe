//! PostgreSQL DDL generator.
//!
//! Plain indexes are not table constraints in PostgreSQL, so they are emitted
//! as separate `CREATE INDEX` / `DROP INDEX` statements joined with `; `.

use relstore_core::{Dialect, FieldType, IndexKind, Result};

use super::{DdlGenerator, default_literal, index_name, nullability_clause};
use crate::{ColumnDef, IndexDef, SchemaBuilder, SchemaOperation};

/// DDL generator for PostgreSQL.
pub struct PostgresDdlGenerator;

const INFO_QUERY: &str = "SELECT
\tc.ordinal_position AS pos,
\tc.table_schema AS table_schema,
\tc.table_name AS table_name,
\tc.column_name AS column_name,
\tc.data_type AS column_type,
\tCASE WHEN c.character_maximum_length IS NOT NULL THEN c.character_maximum_length ELSE c.numeric_precision END AS column_length,
\tc.numeric_scale AS column_precision,
\tc.is_nullable AS column_nullable,
\tCASE WHEN POSITION('nextval' IN c.column_default) > 0 THEN 'YES' ELSE 'NO' END AS column_auto_increment,
\tCASE WHEN POSITION('nextval' IN c.column_default) > 0 THEN NULL ELSE c.column_default END AS column_default,
\tCASE WHEN u.constraint_name IS NULL AND ic.relname IS NOT NULL THEN ic.relname ELSE u.constraint_name END AS index_name,
\tCASE WHEN t.constraint_type IS NULL AND ic.relname IS NOT NULL THEN 'INDEX' ELSE t.constraint_type END AS index_type,
\tu.ordinal_position AS index_pos,
\ty.table_schema AS ref_schema,
\ty.table_name AS ref_table,
\ty.column_name AS ref_column
FROM information_schema.columns AS c
\tLEFT JOIN information_schema.key_column_usage AS u ON u.table_schema = c.table_schema AND u.table_name = c.table_name AND u.column_name = c.column_name
\tLEFT JOIN information_schema.table_constraints AS t ON u.constraint_schema = t.constraint_schema AND u.constraint_name = t.constraint_name AND constraint_type != 'CHECK'
\tLEFT JOIN pg_catalog.pg_class AS it ON it.relname = c.table_name
\tLEFT JOIN pg_catalog.pg_attribute AS ia ON ia.attrelid = it.oid AND ia.attname = c.column_name
\tLEFT JOIN pg_catalog.pg_index AS ii ON ii.indrelid = it.oid AND ia.attnum = ANY (ii.indkey::INT[])
\tLEFT JOIN pg_catalog.pg_class AS ic ON ic.oid = ii.indexrelid
\tLEFT JOIN information_schema.referential_constraints AS f ON f.constraint_schema = t.constraint_schema AND f.constraint_name = t.constraint_name
\tLEFT JOIN information_schema.key_column_usage AS x ON x.constraint_name = f.constraint_name
\tLEFT JOIN information_schema.key_column_usage AS y ON y.ordinal_position = x.position_in_unique_constraint AND y.constraint_name = f.unique_constraint_name
WHERE c.table_name = '{table}'
ORDER BY pos";

impl DdlGenerator for PostgresDdlGenerator {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn generate(&self, schema: &SchemaBuilder) -> Result<String> {
        tracing::debug!(dialect = "postgres", operation = %schema.operation(), "Generating DDL");

        let table = schema.table();
        let (constraints, plain): (Vec<&IndexDef>, Vec<&IndexDef>) = schema
            .indexes()
            .iter()
            .partition(|i| i.kind != IndexKind::Index);

        let sql = match schema.operation() {
            SchemaOperation::Check => format!(
                "SELECT table_name FROM information_schema.tables WHERE table_name = '{}'",
                escape_literal(table)
            ),
            SchemaOperation::Info => INFO_QUERY.replace("{table}", &escape_literal(table)),
            SchemaOperation::Create => {
                let body: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(column_definition)
                    .chain(constraints.iter().map(|i| constraint_definition(table, i)))
                    .collect();
                let mut sql = format!("CREATE TABLE {table} ( {} )", body.join(", "));
                if !plain.is_empty() {
                    sql.push_str("; ");
                    sql.push_str(&create_indexes(table, &plain).join("; "));
                }
                sql
            }
            SchemaOperation::Add => {
                let clauses: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(|c| format!("ADD {}", column_definition(c)))
                    .chain(
                        constraints
                            .iter()
                            .map(|i| format!("ADD {}", constraint_definition(table, i))),
                    )
                    .collect();
                let mut statements = Vec::new();
                if !clauses.is_empty() {
                    statements.push(format!("ALTER TABLE {table} {}", clauses.join(", ")));
                }
                statements.extend(create_indexes(table, &plain));
                statements.join("; ")
            }
            SchemaOperation::Change => schema
                .columns()
                .iter()
                .flat_map(|c| change_column(table, c))
                .collect::<Vec<_>>()
                .join("; "),
            SchemaOperation::Remove => {
                let mut clauses: Vec<String> = schema
                    .columns()
                    .iter()
                    .map(|c| format!("DROP COLUMN {}", c.name))
                    .collect();
                clauses.extend(constraints.iter().map(|i| match i.kind {
                    IndexKind::Primary => format!("DROP CONSTRAINT {}", index_name(table, "pk")),
                    _ => format!("DROP CONSTRAINT {}", index_name(table, &i.name)),
                }));
                let mut statements = Vec::new();
                if !clauses.is_empty() {
                    statements.push(format!("ALTER TABLE {table} {}", clauses.join(", ")));
                }
                statements.extend(
                    plain
                        .iter()
                        .map(|i| format!("DROP INDEX {}", index_name(table, &i.name))),
                );
                statements.join("; ")
            }
            SchemaOperation::Drop => format!("DROP TABLE IF EXISTS {table}"),
        };
        Ok(sql)
    }

    fn native_types(&self) -> &'static [(FieldType, &'static [&'static str])] {
        &[
            (FieldType::Boolean, &["boolean", "bool"]),
            (FieldType::Serial, &["bytea", "json", "jsonb"]),
            (
                FieldType::Integer,
                &["smallint", "integer", "int", "bigint", "serial", "bigserial"],
            ),
            (
                FieldType::Decimal,
                &["numeric", "decimal", "real", "double precision"],
            ),
            (
                FieldType::String,
                &["character", "char", "character varying", "varchar", "text"],
            ),
            (
                FieldType::DateTime,
                &[
                    "timestamp",
                    "timestamp without time zone",
                    "timestamp with time zone",
                    "date",
                    "time",
                    "time without time zone",
                    "time with time zone",
                    "interval",
                ],
            ),
        ]
    }

    /// Lower-cased label without any `(…)` suffix: `character varying(255)` → `character varying`.
    fn normalize_type(&self, raw: &str) -> String {
        raw.split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }
}

fn column_type(column: &ColumnDef) -> String {
    let attributes = &column.attributes;
    match column.field_type {
        FieldType::Boolean => "BOOLEAN".to_string(),
        FieldType::Integer if attributes.auto_increment => "SERIAL".to_string(),
        FieldType::Integer => "INTEGER".to_string(),
        FieldType::Decimal => format!(
            "NUMERIC({},{})",
            attributes.length.unwrap_or(11),
            attributes.precision.unwrap_or(4)
        ),
        FieldType::DateTime => "TIMESTAMP WITHOUT TIME ZONE".to_string(),
        FieldType::Serial => "BYTEA".to_string(),
        FieldType::String => match attributes.length {
            Some(len) if (1..=1023).contains(&len) => "CHARACTER VARYING".to_string(),
            _ => "TEXT".to_string(),
        },
    }
}

fn column_definition(column: &ColumnDef) -> String {
    format!(
        "{} {} {}",
        column.name,
        column_type(column),
        nullability_clause(column.field_type, &column.attributes)
    )
}

fn change_column(table: &str, column: &ColumnDef) -> Vec<String> {
    let mut statements = Vec::new();
    if let Some(previous) = column.after.as_deref().filter(|p| *p != column.name) {
        statements.push(format!(
            "ALTER TABLE {table} RENAME COLUMN {previous} TO {}",
            column.name
        ));
    }

    // SERIAL is only a creation shorthand, the stored type is INTEGER
    let type_name = match column.field_type {
        FieldType::Integer => "INTEGER".to_string(),
        _ => column_type(column),
    };
    statements.push(format!(
        "ALTER TABLE {table} ALTER {} TYPE {type_name}",
        column.name
    ));

    let attributes = &column.attributes;
    let nullability = if let Some(default) = &attributes.default {
        format!(
            "SET DEFAULT {}",
            default_literal(column.field_type, default)
        )
    } else if attributes.nullable {
        "DROP NOT NULL".to_string()
    } else {
        "SET NOT NULL".to_string()
    };
    statements.push(format!(
        "ALTER TABLE {table} ALTER {} {nullability}",
        column.name
    ));
    statements
}

fn constraint_definition(table: &str, index: &IndexDef) -> String {
    let fields = index.fields.join(", ");
    match index.kind {
        IndexKind::Primary => format!(
            "CONSTRAINT {} PRIMARY KEY ({fields})",
            index_name(table, "pk")
        ),
        IndexKind::Foreign => format!(
            "CONSTRAINT {} FOREIGN KEY ({fields}) REFERENCES {} ({}) MATCH SIMPLE ON UPDATE CASCADE ON DELETE RESTRICT",
            index_name(table, &index.name),
            index.table.as_deref().unwrap_or_default(),
            index.foreign_fields.join(", ")
        ),
        IndexKind::Unique | IndexKind::Index => format!(
            "CONSTRAINT {} UNIQUE ({fields})",
            index_name(table, &index.name)
        ),
    }
}

fn create_indexes(table: &str, indexes: &[&IndexDef]) -> Vec<String> {
    indexes
        .iter()
        .map(|i| {
            format!(
                "CREATE INDEX {} ON {table} ( {} )",
                index_name(table, &i.name),
                i.fields.join(", ")
            )
        })
        .collect()
}

fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use relstore_core::FieldAttributes;

    fn builder(operation: SchemaOperation) -> SchemaBuilder {
        SchemaBuilder::new(Dialect::Postgres, "table", operation)
    }

    fn with_foo_and_index(operation: SchemaOperation) -> String {
        builder(operation)
            .column("foo", FieldType::String, FieldAttributes::new())
            .index("idx", ["foo"], IndexKind::Index)
            .build()
            .unwrap()
    }

    #[test]
    fn test_operations() {
        assert_eq!(
            with_foo_and_index(SchemaOperation::Check),
            "SELECT table_name FROM information_schema.tables WHERE table_name = 'table'"
        );
        assert_eq!(
            with_foo_and_index(SchemaOperation::Create),
            "CREATE TABLE table ( foo TEXT NOT NULL ); CREATE INDEX table_idx ON table ( foo )"
        );
        assert_eq!(
            with_foo_and_index(SchemaOperation::Add),
            "ALTER TABLE table ADD foo TEXT NOT NULL; CREATE INDEX table_idx ON table ( foo )"
        );
        assert_eq!(
            with_foo_and_index(SchemaOperation::Change),
            "ALTER TABLE table ALTER foo TYPE TEXT; ALTER TABLE table ALTER foo SET NOT NULL"
        );
        assert_eq!(
            with_foo_and_index(SchemaOperation::Remove),
            "ALTER TABLE table DROP COLUMN foo; DROP INDEX table_idx"
        );
        assert_eq!(
            with_foo_and_index(SchemaOperation::Drop),
            "DROP TABLE IF EXISTS table"
        );
        let info = with_foo_and_index(SchemaOperation::Info);
        assert!(info.contains("WHERE c.table_name = 'table'"));
        assert!(info.contains("CASE WHEN POSITION('nextval' IN c.column_default) > 0"));
    }

    #[test]
    fn test_column_types() {
        let cases = [
            (FieldType::Boolean, "BOOLEAN"),
            (FieldType::Integer, "INTEGER"),
            (FieldType::Decimal, "NUMERIC(11,4)"),
            (FieldType::String, "TEXT"),
            (FieldType::DateTime, "TIMESTAMP WITHOUT TIME ZONE"),
            (FieldType::Serial, "BYTEA"),
        ];
        for (field_type, expected) in cases {
            let sql = builder(SchemaOperation::Create)
                .column("foo", field_type, FieldAttributes::new())
                .build()
                .unwrap();
            assert_eq!(sql, format!("CREATE TABLE table ( foo {expected} NOT NULL )"));
        }
    }

    #[test]
    fn test_column_attributes() {
        let cases = [
            (FieldType::Integer, FieldAttributes::new(), "INTEGER NOT NULL"),
            (FieldType::Integer, FieldAttributes::new().default_value("1"), "INTEGER DEFAULT 1"),
            (FieldType::Integer, FieldAttributes::new().auto_increment(), "SERIAL NOT NULL"),
            (FieldType::Integer, FieldAttributes::new().nullable(), "INTEGER DEFAULT NULL"),
            (FieldType::Integer, FieldAttributes::new().length(6), "INTEGER NOT NULL"),
            (FieldType::String, FieldAttributes::new().length(2048), "TEXT NOT NULL"),
            (FieldType::String, FieldAttributes::new().length(512), "CHARACTER VARYING NOT NULL"),
            (FieldType::String, FieldAttributes::new().length(10), "CHARACTER VARYING NOT NULL"),
            (FieldType::Decimal, FieldAttributes::new().precision(2), "NUMERIC(11,2) NOT NULL"),
            (
                FieldType::Decimal,
                FieldAttributes::new().length(6).precision(2),
                "NUMERIC(6,2) NOT NULL",
            ),
        ];
        for (field_type, attributes, expected) in cases {
            let sql = builder(SchemaOperation::Add)
                .column("foo", field_type, attributes)
                .build()
                .unwrap();
            assert_eq!(sql, format!("ALTER TABLE table ADD foo {expected}"));
        }
    }

    #[test]
    fn test_create_constraints() {
        let create = |b: SchemaBuilder| {
            b.column("foo", FieldType::Integer, FieldAttributes::new())
                .build()
                .unwrap()
        };
        assert_eq!(
            create(builder(SchemaOperation::Create).primary(["foo"])),
            "CREATE TABLE table ( foo INTEGER NOT NULL, CONSTRAINT table_pk PRIMARY KEY (foo) )"
        );
        assert_eq!(
            create(builder(SchemaOperation::Create).unique("foo", ["foo"])),
            "CREATE TABLE table ( foo INTEGER NOT NULL, CONSTRAINT table_foo UNIQUE (foo) )"
        );
        assert_eq!(
            create(builder(SchemaOperation::Create).foreign("foo", [("foo", "bar")], "yada")),
            "CREATE TABLE table ( foo INTEGER NOT NULL, CONSTRAINT table_foo FOREIGN KEY (foo) \
             REFERENCES yada (bar) MATCH SIMPLE ON UPDATE CASCADE ON DELETE RESTRICT )"
        );
    }

    #[test]
    fn test_add_indexes_alone() {
        assert_eq!(
            builder(SchemaOperation::Add).primary(["foo"]).build().unwrap(),
            "ALTER TABLE table ADD CONSTRAINT table_pk PRIMARY KEY (foo)"
        );
        assert_eq!(
            builder(SchemaOperation::Add)
                .index("foo", ["foo"], IndexKind::Index)
                .build()
                .unwrap(),
            "CREATE INDEX table_foo ON table ( foo )"
        );
    }

    #[test]
    fn test_remove_indexes() {
        assert_eq!(
            builder(SchemaOperation::Remove).unique("foo", ["foo"]).build().unwrap(),
            "ALTER TABLE table DROP CONSTRAINT table_foo"
        );
        assert_eq!(
            builder(SchemaOperation::Remove)
                .foreign("foo", [("bar", "baz")], "yada")
                .build()
                .unwrap(),
            "ALTER TABLE table DROP CONSTRAINT table_foo"
        );
        assert_eq!(
            builder(SchemaOperation::Remove).primary(["foo"]).build().unwrap(),
            "ALTER TABLE table DROP CONSTRAINT table_pk"
        );
        assert_eq!(
            builder(SchemaOperation::Remove)
                .index("foo", ["foo"], IndexKind::Index)
                .build()
                .unwrap(),
            "DROP INDEX table_foo"
        );
    }

    #[test]
    fn test_change_with_rename_and_default() {
        let sql = builder(SchemaOperation::Change)
            .column_after(
                "foo",
                FieldType::Integer,
                FieldAttributes::new().auto_increment().default_value("3"),
                "bar",
            )
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE table RENAME COLUMN bar TO foo; ALTER TABLE table ALTER foo TYPE INTEGER; \
             ALTER TABLE table ALTER foo SET DEFAULT 3"
        );
    }

    #[test]
    fn test_normalize_type() {
        let ddl = PostgresDdlGenerator;
        assert_eq!(ddl.normalize_type("character varying(255)"), "character varying");
        assert_eq!(ddl.normalize_type("NUMERIC"), "numeric");
    }
}
