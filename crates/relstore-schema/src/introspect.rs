//! Parsing of `info` statement results.
//!
//! The `info` statement yields one row per (column, index membership) pair.
//! [`parse`] folds those rows back into one [`ColumnDef`] per column and one
//! [`IndexDef`] per index.

use serde::{Deserialize, Deserializer};

use relstore_core::{Error, FieldAttributes, FieldType, IndexKind, Result, Row, Value};

use crate::ddl::DdlGenerator;
use crate::{ColumnDef, IndexDef};

/// One row of the `info` statement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IntrospectionRow {
    #[serde(deserialize_with = "opt_number")]
    pub pos: Option<u32>,
    #[serde(deserialize_with = "opt_text")]
    pub table_schema: Option<String>,
    pub table_name: String,
    pub column_name: String,
    pub column_type: String,
    #[serde(deserialize_with = "opt_number")]
    pub column_length: Option<u32>,
    #[serde(deserialize_with = "opt_number")]
    pub column_precision: Option<u32>,
    #[serde(deserialize_with = "opt_text")]
    pub column_nullable: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub column_auto_increment: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub column_default: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub index_name: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub index_type: Option<String>,
    #[serde(deserialize_with = "opt_number")]
    pub index_pos: Option<u32>,
    #[serde(deserialize_with = "opt_text")]
    pub ref_schema: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub ref_table: Option<String>,
    #[serde(deserialize_with = "opt_text")]
    pub ref_column: Option<String>,
}

impl IntrospectionRow {
    /// Read a driver row by column name.
    pub fn from_row(row: &Row) -> Result<Self> {
        let text = |name: &str| row.get_named(name).and_then(value_text);
        let number = |name: &str| {
            row.get_named(name)
                .and_then(Value::as_i64)
                .and_then(|n| u32::try_from(n).ok())
        };
        let required = |name: &str| {
            text(name).ok_or_else(|| {
                Error::builder(format!("Missing \"{name}\" in table description row"))
            })
        };

        Ok(Self {
            pos: number("pos"),
            table_schema: text("table_schema"),
            table_name: required("table_name")?,
            column_name: required("column_name")?,
            column_type: required("column_type")?,
            column_length: number("column_length"),
            column_precision: number("column_precision"),
            column_nullable: text("column_nullable"),
            column_auto_increment: text("column_auto_increment"),
            column_default: text("column_default"),
            index_name: text("index_name"),
            index_type: text("index_type"),
            index_pos: number("index_pos"),
            ref_schema: text("ref_schema"),
            ref_table: text("ref_table"),
            ref_column: text("ref_column"),
        })
    }
}

/// Parsed description of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnDef>,
    pub indexes: Vec<IndexDef>,
}

/// Fold `info` rows into a [`TableSchema`] using `ddl`'s native type names.
pub fn parse(ddl: &dyn DdlGenerator, rows: &[IntrospectionRow]) -> Result<TableSchema> {
    let mut schema = TableSchema::default();
    let mut index_positions: Vec<Vec<u32>> = Vec::new();

    for row in rows {
        if schema.table.is_empty() {
            schema.table.clone_from(&row.table_name);
        }

        if !schema.columns.iter().any(|c| c.name == row.column_name) {
            schema.columns.push(parse_column(ddl, row)?);
        }

        let Some(raw_name) = row.index_name.as_deref().filter(|n| !n.is_empty()) else {
            continue;
        };
        let kind = parse_index_kind(row.index_type.as_deref().unwrap_or_default(), &row.table_name)?;
        let name = if kind == IndexKind::Primary {
            relstore_core::PRIMARY_INDEX.to_string()
        } else {
            raw_name
                .strip_prefix(&format!("{}_", row.table_name))
                .unwrap_or(raw_name)
                .to_string()
        };

        let slot = match schema.indexes.iter().position(|i| i.name == name) {
            Some(slot) => slot,
            None => {
                schema.indexes.push(IndexDef::new(name, Vec::<String>::new(), kind));
                index_positions.push(Vec::new());
                schema.indexes.len() - 1
            }
        };

        let index = &mut schema.indexes[slot];
        if index.fields.contains(&row.column_name) {
            continue;
        }

        // keep fields ordered by their position inside the index
        let position = row.index_pos.unwrap_or(u32::MAX);
        let positions = &mut index_positions[slot];
        let at = positions.iter().take_while(|p| **p <= position).count();
        positions.insert(at, position);
        index.fields.insert(at, row.column_name.clone());

        if kind == IndexKind::Foreign {
            if index.table.is_none() {
                index.table.clone_from(&row.ref_table);
            }
            let referenced = row.ref_column.clone().unwrap_or_default();
            index.foreign_fields.insert(at.min(index.foreign_fields.len()), referenced);
        }
    }

    tracing::debug!(
        table = %schema.table,
        columns = schema.columns.len(),
        indexes = schema.indexes.len(),
        "Parsed table description"
    );

    Ok(schema)
}

fn parse_column(ddl: &dyn DdlGenerator, row: &IntrospectionRow) -> Result<ColumnDef> {
    let native = ddl.normalize_type(&row.column_type);
    let field_type = ddl
        .native_types()
        .iter()
        .find(|(_, names)| names.contains(&native.as_str()))
        .map(|(field_type, _)| *field_type)
        .ok_or_else(|| {
            Error::builder(format!(
                "Invalid or unsupported field type \"{native}\" in table \"{}\"",
                row.table_name
            ))
        })?;

    let attributes = FieldAttributes {
        length: row.column_length.filter(|l| *l > 0),
        precision: row.column_precision.filter(|p| *p > 0),
        nullable: is_yes(row.column_nullable.as_deref()),
        auto_increment: is_yes(row.column_auto_increment.as_deref()),
        default: row.column_default.clone().filter(|d| !d.is_empty()),
    };

    Ok(ColumnDef::new(row.column_name.clone(), field_type, attributes))
}

fn parse_index_kind(raw: &str, table: &str) -> Result<IndexKind> {
    let first = raw
        .trim()
        .split([' ', '('])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    match first.as_str() {
        "primary" => Ok(IndexKind::Primary),
        "unique" => Ok(IndexKind::Unique),
        "index" => Ok(IndexKind::Index),
        "foreign" => Ok(IndexKind::Foreign),
        other => Err(Error::builder(format!(
            "Invalid or unsupported index type \"{other}\" in table \"{table}\""
        ))),
    }
}

fn is_yes(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("yes"))
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(s) | Value::Decimal(s) => Some(s.clone()),
        Value::BigInt(i) | Value::Timestamp(i) => Some(i.to_string()),
        Value::Double(f) => Some(f.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Bytes(b) => Some(String::from_utf8_lossy(b).into_owned()),
        Value::Json(j) => Some(j.to_string()),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| match s {
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => if b { "1" } else { "0" }.to_string(),
        Scalar::Text(t) => t,
    }))
}

fn opt_number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.and_then(|s| match s {
        Scalar::Int(i) => u32::try_from(i).ok(),
        Scalar::Text(t) => t.trim().parse().ok(),
        Scalar::Float(_) | Scalar::Bool(_) => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaBuilder;
    use relstore_core::Dialect;

    fn column_row(name: &str, native: &str) -> IntrospectionRow {
        IntrospectionRow {
            pos: Some(1),
            table_schema: Some("test".into()),
            table_name: "table".into(),
            column_name: name.into(),
            column_type: native.into(),
            column_nullable: Some("NO".into()),
            column_auto_increment: Some("NO".into()),
            ..IntrospectionRow::default()
        }
    }

    fn indexed(mut row: IntrospectionRow, name: &str, kind: &str, pos: u32) -> IntrospectionRow {
        row.index_name = Some(name.into());
        row.index_type = Some(kind.into());
        row.index_pos = Some(pos);
        row
    }

    fn pg() -> SchemaBuilder {
        SchemaBuilder::new(Dialect::Postgres, "table", crate::SchemaOperation::Info)
    }

    fn mysql() -> SchemaBuilder {
        SchemaBuilder::new(Dialect::MySql, "table", crate::SchemaOperation::Info)
    }

    #[test]
    fn test_parse_postgres_types() {
        let cases = [
            ("boolean", FieldType::Boolean),
            ("integer", FieldType::Integer),
            ("numeric", FieldType::Decimal),
            ("text", FieldType::String),
            ("character varying", FieldType::String),
            ("timestamp without time zone", FieldType::DateTime),
            ("bytea", FieldType::Serial),
        ];
        for (native, expected) in cases {
            let schema = pg().parse(&[column_row("column", native)]).unwrap();
            assert_eq!(schema.table, "table");
            assert_eq!(schema.columns[0].field_type, expected, "{native}");
            assert!(schema.indexes.is_empty());
        }
    }

    #[test]
    fn test_parse_mysql_types() {
        let cases = [
            ("tinyint", FieldType::Boolean),
            ("int(11)", FieldType::Integer),
            ("bigint", FieldType::Integer),
            ("decimal", FieldType::Decimal),
            ("varchar", FieldType::String),
            ("datetime", FieldType::DateTime),
            ("blob", FieldType::Serial),
        ];
        for (native, expected) in cases {
            let schema = mysql().parse(&[column_row("column", native)]).unwrap();
            assert_eq!(schema.columns[0].field_type, expected, "{native}");
        }
    }

    #[test]
    fn test_unknown_native_type_fails() {
        let err = mysql().parse(&[column_row("column", "geometry")]).unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn test_parse_attributes() {
        let mut row = column_row("column", "numeric");
        row.column_length = Some(4);
        row.column_precision = Some(2);
        row.column_nullable = Some("YES".into());
        row.column_default = Some("10.2".into());
        let schema = pg().parse(&[row]).unwrap();
        let attributes = &schema.columns[0].attributes;
        assert_eq!(attributes.length, Some(4));
        assert_eq!(attributes.precision, Some(2));
        assert!(attributes.nullable);
        assert!(!attributes.auto_increment);
        assert_eq!(attributes.default.as_deref(), Some("10.2"));
    }

    #[test]
    fn test_empty_default_and_zero_length_are_unset() {
        let mut row = column_row("column", "integer");
        row.column_length = Some(0);
        row.column_default = Some(String::new());
        row.column_auto_increment = Some("YES".into());
        let schema = pg().parse(&[row]).unwrap();
        let attributes = &schema.columns[0].attributes;
        assert_eq!(attributes.length, None);
        assert_eq!(attributes.default, None);
        assert!(attributes.auto_increment);
    }

    #[test]
    fn test_parse_indexes() {
        let rows = [
            indexed(column_row("id", "integer"), "table_pkey", "PRIMARY KEY", 1),
            indexed(column_row("id", "integer"), "table_idx", "UNIQUE", 1),
            indexed(column_row("name", "text"), "table_idx", "UNIQUE", 2),
            indexed(column_row("name", "text"), "table_by_name", "INDEX", 1),
        ];
        let schema = pg().parse(&rows).unwrap();

        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.indexes.len(), 3);
        assert_eq!(schema.indexes[0].name, "primary");
        assert_eq!(schema.indexes[0].kind, IndexKind::Primary);
        assert_eq!(schema.indexes[1].name, "idx");
        assert_eq!(schema.indexes[1].kind, IndexKind::Unique);
        assert_eq!(schema.indexes[1].fields, vec!["id".to_string(), "name".to_string()]);
        assert_eq!(schema.indexes[2].name, "by_name");
        assert_eq!(schema.indexes[2].kind, IndexKind::Index);
    }

    #[test]
    fn test_parse_composite_foreign_key() {
        let mut a = indexed(column_row("columnA", "integer"), "table_idx", "FOREIGN KEY", 1);
        a.ref_table = Some("other".into());
        a.ref_column = Some("refA".into());
        let mut b = indexed(column_row("columnB", "integer"), "table_idx", "FOREIGN KEY", 2);
        b.ref_table = Some("other".into());
        b.ref_column = Some("refB".into());

        let schema = pg().parse(&[b, a]).unwrap();
        let fk = &schema.indexes[0];
        assert_eq!(fk.kind, IndexKind::Foreign);
        assert_eq!(fk.name, "idx");
        assert_eq!(fk.fields, vec!["columnA".to_string(), "columnB".to_string()]);
        assert_eq!(fk.foreign_fields, vec!["refA".to_string(), "refB".to_string()]);
        assert_eq!(fk.table.as_deref(), Some("other"));
        assert_eq!(
            schema.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["columnB", "columnA"]
        );
    }

    #[test]
    fn test_unknown_index_type_fails() {
        let row = indexed(column_row("id", "integer"), "table_chk", "CHECK", 1);
        assert!(matches!(pg().parse(&[row]), Err(Error::Builder(_))));
    }

    #[test]
    fn test_row_deserializes_from_json() {
        let json = serde_json::json!({
            "pos": "1",
            "table_schema": "test",
            "table_name": "table",
            "column_name": "price",
            "column_type": "numeric",
            "column_length": 10,
            "column_precision": "2",
            "column_nullable": "NO",
            "column_auto_increment": "NO",
            "column_default": 10.5,
            "index_name": null,
            "index_type": null,
            "index_pos": null,
            "ref_schema": null,
            "ref_table": null,
            "ref_column": null
        });
        let row: IntrospectionRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.pos, Some(1));
        assert_eq!(row.column_length, Some(10));
        assert_eq!(row.column_precision, Some(2));
        assert_eq!(row.column_default.as_deref(), Some("10.5"));
        assert_eq!(row.index_name, None);
    }

    #[test]
    fn test_row_from_driver_row() {
        let row = Row::from_pairs([
            ("pos", Value::BigInt(2)),
            ("table_name", Value::from("table")),
            ("column_name", Value::from("id")),
            ("column_type", Value::from("int")),
            ("column_length", Value::BigInt(11)),
            ("column_nullable", Value::from("NO")),
            ("index_name", Value::from("PRIMARY")),
            ("index_type", Value::from("PRIMARY KEY")),
        ]);
        let parsed = IntrospectionRow::from_row(&row).unwrap();
        assert_eq!(parsed.pos, Some(2));
        assert_eq!(parsed.column_length, Some(11));
        assert_eq!(parsed.index_type.as_deref(), Some("PRIMARY KEY"));
        assert_eq!(parsed.ref_table, None);

        let incomplete = Row::from_pairs([("pos", Value::BigInt(1))]);
        assert!(IntrospectionRow::from_row(&incomplete).is_err());
    }
}
