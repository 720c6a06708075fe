//! Schema building for relstore.
//!
//! `relstore-schema` renders table-level DDL (`check`, `info`, `create`,
//! `add`, `change`, `remove`, `drop`) for MySQL and PostgreSQL, and parses the
//! rows returned by the `info` statement back into column and index
//! descriptions.
//!
//! ```
//! use relstore_core::{Dialect, FieldAttributes, FieldType};
//! use relstore_schema::{SchemaBuilder, SchemaOperation};
//!
//! let sql = SchemaBuilder::new(Dialect::MySql, "table", SchemaOperation::Create)
//!     .column("foo", FieldType::String, FieldAttributes::new())
//!     .build()
//!     .unwrap();
//! assert_eq!(sql, "CREATE TABLE table ( foo TEXT NOT NULL ) ENGINE=InnoDB DEFAULT CHARSET=utf8");
//! ```

pub mod ddl;
pub mod introspect;

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use relstore_core::{
    Dialect, Error, FieldAttributes, FieldInfo, FieldType, IndexInfo, IndexKind, Model, Result,
};

pub use ddl::{DdlGenerator, MySqlDdlGenerator, PostgresDdlGenerator, generator_for};
pub use introspect::{IntrospectionRow, TableSchema};

/// Table-level operation a [`SchemaBuilder`] renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaOperation {
    /// Does the table exist
    Check,
    /// Column and index metadata
    Info,
    Create,
    Add,
    Change,
    Remove,
    Drop,
}

impl SchemaOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            SchemaOperation::Check => "check",
            SchemaOperation::Info => "info",
            SchemaOperation::Create => "create",
            SchemaOperation::Add => "add",
            SchemaOperation::Change => "change",
            SchemaOperation::Remove => "remove",
            SchemaOperation::Drop => "drop",
        }
    }
}

impl fmt::Display for SchemaOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "check" => Ok(SchemaOperation::Check),
            "info" => Ok(SchemaOperation::Info),
            "create" => Ok(SchemaOperation::Create),
            "add" => Ok(SchemaOperation::Add),
            "change" => Ok(SchemaOperation::Change),
            "remove" => Ok(SchemaOperation::Remove),
            "drop" => Ok(SchemaOperation::Drop),
            other => Err(Error::builder(format!("Unknown operation \"{other}\""))),
        }
    }
}

/// Storage options appended to MySQL `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub engine: String,
    pub charset: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            engine: "InnoDB".to_string(),
            charset: "utf8".to_string(),
        }
    }
}

/// A column as handed to, or parsed by, the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub field_type: FieldType,
    pub attributes: FieldAttributes,
    /// `add`: column to place this one after. `change`: previous name.
    pub after: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, field_type: FieldType, attributes: FieldAttributes) -> Self {
        Self {
            name: name.into(),
            field_type,
            attributes,
            after: None,
        }
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    /// Field definition for this column. Attributes the semantic type does
    /// not carry (a boolean's display width, say) are dropped.
    pub fn to_field(&self) -> Result<FieldInfo> {
        let t = self.field_type;
        let a = &self.attributes;
        let attributes = FieldAttributes {
            length: a.length.filter(|_| t.allows(relstore_core::Attribute::Length)),
            precision: a
                .precision
                .filter(|_| t.allows(relstore_core::Attribute::Precision)),
            nullable: a.nullable,
            auto_increment: a.auto_increment && t.allows(relstore_core::Attribute::AutoIncrement),
            default: a
                .default
                .clone()
                .filter(|_| t.allows(relstore_core::Attribute::Default)),
        };
        FieldInfo::new(self.name.clone(), t, attributes)
    }
}

/// An index as handed to, or parsed by, the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub kind: IndexKind,
    pub fields: Vec<String>,
    /// Referenced table of a foreign key
    pub table: Option<String>,
    /// Referenced fields of a foreign key, matching `fields` by position
    pub foreign_fields: Vec<String>,
}

impl IndexDef {
    pub fn new<I, S>(name: impl Into<String>, fields: I, kind: IndexKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind,
            fields: fields.into_iter().map(Into::into).collect(),
            table: None,
            foreign_fields: Vec::new(),
        }
    }

    /// Index definition for this index.
    pub fn to_index(&self) -> Result<IndexInfo> {
        match self.kind {
            IndexKind::Foreign => IndexInfo::foreign(
                self.name.clone(),
                self.fields.iter().cloned().zip(self.foreign_fields.iter().cloned()),
                self.table.clone().unwrap_or_default(),
            ),
            kind => IndexInfo::new(self.name.clone(), self.fields.iter().cloned(), kind),
        }
    }
}

impl From<&IndexInfo> for IndexDef {
    fn from(index: &IndexInfo) -> Self {
        let mut def = IndexDef::new(index.name(), index.fields().iter().cloned(), index.kind());
        if let Some(reference) = index.reference() {
            def.table = Some(reference.table.clone());
            def.foreign_fields.clone_from(&reference.fields);
        }
        def
    }
}

/// Collects columns and indexes for one table and renders one operation.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    dialect: Dialect,
    table: String,
    operation: SchemaOperation,
    options: TableOptions,
    columns: Vec<ColumnDef>,
    indexes: Vec<IndexDef>,
}

impl SchemaBuilder {
    pub fn new(dialect: Dialect, table: impl Into<String>, operation: SchemaOperation) -> Self {
        Self {
            dialect,
            table: table.into(),
            operation,
            options: TableOptions::default(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Builder pre-filled with every field and index of `model`.
    pub fn for_model(dialect: Dialect, model: &Model, operation: SchemaOperation) -> Self {
        let mut builder = Self::new(dialect, model.table(), operation);
        for field in model.fields() {
            builder.columns.push(ColumnDef::new(
                field.mapping(),
                field.field_type(),
                field.attributes().clone(),
            ));
        }
        for index in model.indexes() {
            let mut def = IndexDef::from(index);
            def.fields = def
                .fields
                .iter()
                .map(|f| {
                    model
                        .field(f)
                        .map_or_else(|_| f.clone(), |field| field.mapping().to_string())
                })
                .collect();
            builder.indexes.push(def);
        }
        builder
    }

    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_operation(mut self, operation: SchemaOperation) -> Self {
        self.operation = operation;
        self
    }

    pub fn column(self, name: impl Into<String>, field_type: FieldType, attributes: FieldAttributes) -> Self {
        self.add_column(ColumnDef::new(name, field_type, attributes))
    }

    /// Column positioned after `after` (`add`) or renamed from `after` (`change`).
    pub fn column_after(
        self,
        name: impl Into<String>,
        field_type: FieldType,
        attributes: FieldAttributes,
        after: impl Into<String>,
    ) -> Self {
        self.add_column(ColumnDef::new(name, field_type, attributes).after(after))
    }

    /// Column whose type is given by name; unknown names are a builder error.
    pub fn column_named(
        self,
        name: impl Into<String>,
        type_name: &str,
        attributes: FieldAttributes,
    ) -> Result<Self> {
        let name = name.into();
        let field_type = type_name.parse::<FieldType>().map_err(|_| {
            Error::builder(format!("Invalid type \"{type_name}\" for field \"{name}\""))
        })?;
        Ok(self.column(name, field_type, attributes))
    }

    pub fn add_column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn index<I, S>(mut self, name: impl Into<String>, fields: I, kind: IndexKind) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes.push(IndexDef::new(name, fields, kind));
        self
    }

    pub fn primary<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index(relstore_core::PRIMARY_INDEX, fields, IndexKind::Primary)
    }

    pub fn unique<I, S>(self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.index(name, fields, IndexKind::Unique)
    }

    /// Foreign key from `(local, referenced)` pairs into `table`.
    pub fn foreign<I, L, R>(mut self, name: impl Into<String>, pairs: I, table: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let (fields, foreign_fields): (Vec<String>, Vec<String>) =
            pairs.into_iter().map(|(l, r)| (l.into(), r.into())).unzip();
        self.indexes.push(IndexDef {
            name: name.into(),
            kind: IndexKind::Foreign,
            fields,
            table: Some(table.into()),
            foreign_fields,
        });
        self
    }

    pub fn add_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    /// Forget all columns and indexes.
    pub fn reset(mut self) -> Self {
        self.columns.clear();
        self.indexes.clear();
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn operation(&self) -> SchemaOperation {
        self.operation
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn indexes(&self) -> &[IndexDef] {
        &self.indexes
    }

    /// Render the SQL for the current operation.
    #[tracing::instrument(level = "debug", skip(self), fields(table = %self.table, operation = %self.operation))]
    pub fn build(&self) -> Result<String> {
        if self.table.trim().is_empty() {
            return Err(Error::builder("Missing table name"));
        }
        for index in &self.indexes {
            if index.fields.is_empty() {
                return Err(Error::builder(format!(
                    "No fields in index \"{}\"",
                    index.name
                )));
            }
            if index.kind == IndexKind::Foreign
                && (index.table.as_deref().is_none_or(str::is_empty)
                    || index.foreign_fields.len() != index.fields.len())
            {
                return Err(Error::builder(format!(
                    "Foreign key \"{}\" needs a referenced table and one referenced field per field",
                    index.name
                )));
            }
        }

        let sql = generator_for(self.dialect).generate(self)?;
        tracing::trace!(sql = %sql, "Built schema statement");
        Ok(sql)
    }

    /// Parse `info` result rows into a table description.
    pub fn parse(&self, rows: &[IntrospectionRow]) -> Result<TableSchema> {
        introspect::parse(generator_for(self.dialect), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_fails() {
        let err = SchemaBuilder::new(Dialect::MySql, "", SchemaOperation::Check)
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Builder error: Missing table name");

        let err = SchemaBuilder::new(Dialect::Postgres, "table", SchemaOperation::Check)
            .reset()
            .with_table("")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn test_unknown_operation() {
        let err = "foo".parse::<SchemaOperation>().unwrap_err();
        assert!(err.to_string().contains("Unknown operation"));
        assert_eq!("change".parse::<SchemaOperation>().unwrap(), SchemaOperation::Change);
    }

    #[test]
    fn test_unknown_column_type_is_builder_error() {
        let err = SchemaBuilder::new(Dialect::MySql, "table", SchemaOperation::Create)
            .column_named("foo", "yada", FieldAttributes::new())
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn test_empty_index_is_builder_error() {
        let err = SchemaBuilder::new(Dialect::MySql, "table", SchemaOperation::Create)
            .column("foo", FieldType::Integer, FieldAttributes::new())
            .index("idx", Vec::<String>::new(), IndexKind::Index)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Builder(_)));
    }

    #[test]
    fn test_reset_then_respecify_is_identical() {
        let build = |b: SchemaBuilder| {
            b.column("id", FieldType::Integer, FieldAttributes::new().auto_increment())
                .column("name", FieldType::String, FieldAttributes::new().length(64))
                .primary(["id"])
                .build()
                .unwrap()
        };
        let first = build(SchemaBuilder::new(Dialect::MySql, "user", SchemaOperation::Create));
        let reused = SchemaBuilder::new(Dialect::MySql, "user", SchemaOperation::Create)
            .column("junk", FieldType::Boolean, FieldAttributes::new())
            .reset();
        assert_eq!(build(reused), first);
    }

    #[test]
    fn test_for_model_uses_mappings() {
        let model = Model::new(
            "User",
            "user",
            vec![
                FieldInfo::new("id", FieldType::Integer, FieldAttributes::new().auto_increment())
                    .unwrap(),
                FieldInfo::of("name", FieldType::String)
                    .unwrap()
                    .with_mapping("user_name"),
            ],
            vec![IndexInfo::primary(["id"]).unwrap(), IndexInfo::index("name", ["name"]).unwrap()],
            vec![],
        )
        .unwrap();

        let sql = SchemaBuilder::for_model(Dialect::MySql, &model, SchemaOperation::Create)
            .build()
            .unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE user ( id INT(11) NOT NULL AUTO_INCREMENT, user_name TEXT NOT NULL, \
             PRIMARY KEY (id), KEY user_name (user_name) ) ENGINE=InnoDB DEFAULT CHARSET=utf8"
        );
    }

    #[test]
    fn test_column_def_to_field_drops_foreign_attributes() {
        let column = ColumnDef::new(
            "flag",
            FieldType::Boolean,
            FieldAttributes::new().length(3).nullable(),
        );
        let field = column.to_field().unwrap();
        assert_eq!(field.attributes().length, None);
        assert!(field.is_nullable());
    }
}
