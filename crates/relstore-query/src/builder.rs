//! SQL statement builders.
//!
//! Builders work on column names and storage values; mapping model fields to
//! columns and converting values is done by the query engine beforehand.
//! Every builder renders to `(sql, params)` for a given [`Dialect`], numbering
//! PostgreSQL placeholders in the order they appear in the statement.

use relstore_core::{Dialect, Value};

use crate::clause::{AggregateMethod, Comparison, Logical, Operand, Order};

/// A condition on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub comparison: Comparison,
    pub operand: Operand,
    pub logical: Logical,
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: Value) -> Self {
        Self {
            column: column.into(),
            comparison: Comparison::Equal,
            operand: Operand::Single(value),
            logical: Logical::And,
        }
    }
}

/// One entry of a SELECT list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectColumn {
    /// `column` or `column AS alias`
    Column { name: String, alias: Option<String> },
    /// `METHOD(column) AS alias`; a `*` column is emitted unquoted
    Aggregate {
        method: AggregateMethod,
        column: String,
        alias: String,
    },
}

/// Placeholder numbering and identifier quoting shared by all builders.
struct SqlWriter {
    dialect: Dialect,
    params: Vec<Value>,
}

impl SqlWriter {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            params: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote(ident)
    }

    fn predicates(&mut self, predicates: &[Predicate]) -> String {
        let mut sql = String::new();
        for (i, predicate) in predicates.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(predicate.logical.as_sql());
                sql.push(' ');
            }
            let rendered = self.predicate(predicate);
            sql.push_str(&rendered);
        }
        sql
    }

    /// `scope` ANDed with `extra` as one parenthesized group, so an `OR` in
    /// `extra` can not widen the scope.
    fn scoped(&mut self, scope: &[Predicate], extra: &[Predicate]) -> String {
        let scope_sql = self.predicates(scope);
        if extra.is_empty() {
            return scope_sql;
        }
        let extra_sql = self.predicates(extra);
        if scope.is_empty() {
            extra_sql
        } else {
            format!("{scope_sql} AND ({extra_sql})")
        }
    }

    fn predicate(&mut self, predicate: &Predicate) -> String {
        let column = self.quote(&predicate.column);
        let comparison = predicate.comparison;
        match &predicate.operand {
            Operand::Single(Value::Null) if comparison == Comparison::Equal => {
                format!("{column} IS NULL")
            }
            Operand::Single(Value::Null) if comparison == Comparison::NotEqual => {
                format!("{column} IS NOT NULL")
            }
            Operand::Single(value) => {
                let placeholder = self.bind(value.clone());
                format!("{column} {} {placeholder}", comparison.as_sql(self.dialect))
            }
            Operand::List(values) if values.is_empty() => match comparison {
                Comparison::NotEqual => "1 = 1".to_string(),
                _ => "1 = 0".to_string(),
            },
            Operand::List(values) => match comparison {
                Comparison::Equal | Comparison::NotEqual => {
                    let placeholders: Vec<String> =
                        values.iter().map(|v| self.bind(v.clone())).collect();
                    let keyword = if comparison == Comparison::Equal {
                        "IN"
                    } else {
                        "NOT IN"
                    };
                    format!("{column} {keyword} ({})", placeholders.join(", "))
                }
                _ => {
                    let operator = comparison.as_sql(self.dialect);
                    let parts: Vec<String> = values
                        .iter()
                        .map(|v| format!("{column} {operator} {}", self.bind(v.clone())))
                        .collect();
                    format!("({})", parts.join(" OR "))
                }
            },
        }
    }

    fn finish(self, sql: String) -> (String, Vec<Value>) {
        (sql, self.params)
    }
}

/// SELECT (or `SELECT COUNT(*)`) statement.
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<SelectColumn>,
    conditions: Vec<Predicate>,
    group: Vec<String>,
    having: Vec<Predicate>,
    order: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn column(mut self, name: impl Into<String>, alias: Option<String>) -> Self {
        self.columns.push(SelectColumn::Column {
            name: name.into(),
            alias,
        });
        self
    }

    pub fn aggregate(
        mut self,
        method: AggregateMethod,
        column: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.columns.push(SelectColumn::Aggregate {
            method,
            column: column.into(),
            alias: alias.into(),
        });
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.conditions.push(predicate);
        self
    }

    pub fn group(mut self, column: impl Into<String>) -> Self {
        self.group.push(column.into());
        self
    }

    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having.push(predicate);
        self
    }

    pub fn order(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64, offset: Option<u64>) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut w = SqlWriter::new(dialect);

        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| match c {
                SelectColumn::Column { name, alias } => match alias {
                    Some(alias) if alias != name => {
                        format!("{} AS {}", w.quote(name), w.quote(alias))
                    }
                    _ => w.quote(name),
                },
                SelectColumn::Aggregate {
                    method,
                    column,
                    alias,
                } => {
                    let column = if column == "*" {
                        column.clone()
                    } else {
                        w.quote(column)
                    };
                    format!("{}({column}) AS {}", method.as_sql(), w.quote(alias))
                }
            })
            .collect();
        let columns = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", w.quote(&self.table));
        self.push_where(&mut w, &mut sql);

        if !self.group.is_empty() {
            let group: Vec<String> = self.group.iter().map(|g| w.quote(g)).collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&group.join(", "));
        }

        if !self.having.is_empty() {
            sql.push_str(" HAVING ");
            let having = w.predicates(&self.having);
            sql.push_str(&having);
        }

        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(column, order)| format!("{} {}", w.quote(column), order.as_sql()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
            if let Some(offset) = self.offset {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }

        w.finish(sql)
    }

    /// `SELECT COUNT(*) AS count FROM … WHERE …`; ordering, grouping and
    /// limits do not apply.
    pub fn build_count(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut w = SqlWriter::new(dialect);
        let mut sql = format!(
            "SELECT COUNT(*) AS {} FROM {}",
            w.quote("count"),
            w.quote(&self.table)
        );
        self.push_where(&mut w, &mut sql);
        w.finish(sql)
    }

    fn push_where(&self, w: &mut SqlWriter, sql: &mut String) {
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            let conditions = w.predicates(&self.conditions);
            sql.push_str(&conditions);
        }
    }
}

/// INSERT statement.
#[derive(Debug, Clone, Default)]
pub struct InsertBuilder {
    table: String,
    values: Vec<(String, Value)>,
    returning: Option<String>,
}

impl InsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn value(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.push((column.into(), value));
        self
    }

    /// Column reported back by PostgreSQL through `RETURNING`.
    pub fn returning(mut self, column: impl Into<String>) -> Self {
        self.returning = Some(column.into());
        self
    }

    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut w = SqlWriter::new(dialect);
        let table = w.quote(&self.table);

        let mut sql = if self.values.is_empty() {
            match dialect {
                Dialect::MySql => format!("INSERT INTO {table} () VALUES ()"),
                Dialect::Postgres => format!("INSERT INTO {table} DEFAULT VALUES"),
            }
        } else {
            let columns: Vec<String> = self.values.iter().map(|(c, _)| w.quote(c)).collect();
            let placeholders: Vec<String> =
                self.values.iter().map(|(_, v)| w.bind(v.clone())).collect();
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        if let (Dialect::Postgres, Some(column)) = (dialect, &self.returning) {
            sql.push_str(&format!(" RETURNING {}", w.quote(column)));
        }

        w.finish(sql)
    }
}

/// UPDATE statement.
#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    table: String,
    values: Vec<(String, Value)>,
    conditions: Vec<Predicate>,
    group: Vec<Predicate>,
}

impl UpdateBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn set(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.push((column.into(), value));
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.conditions.push(predicate);
        self
    }

    /// Predicate of the group ANDed, parenthesized, onto the filters.
    pub fn filter_group(mut self, predicate: Predicate) -> Self {
        self.group.push(predicate);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut w = SqlWriter::new(dialect);
        let assignments: Vec<String> = self
            .values
            .iter()
            .map(|(column, value)| format!("{} = {}", w.quote(column), w.bind(value.clone())))
            .collect();
        let mut sql = format!(
            "UPDATE {} SET {}",
            w.quote(&self.table),
            assignments.join(", ")
        );
        if !self.conditions.is_empty() || !self.group.is_empty() {
            sql.push_str(" WHERE ");
            let conditions = w.scoped(&self.conditions, &self.group);
            sql.push_str(&conditions);
        }
        w.finish(sql)
    }
}

/// DELETE statement.
#[derive(Debug, Clone, Default)]
pub struct DeleteBuilder {
    table: String,
    conditions: Vec<Predicate>,
    group: Vec<Predicate>,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.conditions.push(predicate);
        self
    }

    /// Predicate of the group ANDed, parenthesized, onto the filters.
    pub fn filter_group(mut self, predicate: Predicate) -> Self {
        self.group.push(predicate);
        self
    }

    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut w = SqlWriter::new(dialect);
        let mut sql = format!("DELETE FROM {}", w.quote(&self.table));
        if !self.conditions.is_empty() || !self.group.is_empty() {
            sql.push_str(" WHERE ");
            let conditions = w.scoped(&self.conditions, &self.group);
            sql.push_str(&conditions);
        }
        w.finish(sql)
    }
}

/// `TRUNCATE TABLE t`.
pub fn truncate(dialect: Dialect, table: &str) -> (String, Vec<Value>) {
    (format!("TRUNCATE TABLE {}", dialect.quote(table)), Vec::new())
}
