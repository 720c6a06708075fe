//! Condition, ordering and aggregate clauses.

use std::fmt;
use std::str::FromStr;

use relstore_core::{Dialect, Error, Result, Value};

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Comparison {
    #[default]
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Like,
    Regex,
}

impl Comparison {
    /// SQL operator for `dialect`.
    pub const fn as_sql(self, dialect: Dialect) -> &'static str {
        match self {
            Comparison::Equal => "=",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Greater => ">",
            Comparison::GreaterEqual => ">=",
            Comparison::Like => "LIKE",
            Comparison::Regex => match dialect {
                Dialect::MySql => "REGEXP",
                Dialect::Postgres => "~",
            },
        }
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Comparison::Equal),
            "!=" | "<>" => Ok(Comparison::NotEqual),
            "<" => Ok(Comparison::Less),
            "<=" => Ok(Comparison::LessEqual),
            ">" => Ok(Comparison::Greater),
            ">=" => Ok(Comparison::GreaterEqual),
            "like" => Ok(Comparison::Like),
            "regex" | "regexp" => Ok(Comparison::Regex),
            other => Err(Error::builder(format!("Unknown comparison \"{other}\""))),
        }
    }
}

/// Connective placed before a condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Logical {
    #[default]
    And,
    Or,
}

impl Logical {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Logical::And => "AND",
            Logical::Or => "OR",
        }
    }
}

impl FromStr for Logical {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "and" => Ok(Logical::And),
            "or" => Ok(Logical::Or),
            other => Err(Error::builder(format!("Unknown logical operator \"{other}\""))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(Error::builder(format!("Unknown sort order \"{other}\""))),
        }
    }
}

/// Right-hand side of a condition: one value or a list of alternatives.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Single(Value),
    List(Vec<Value>),
}

impl Operand {
    /// Apply `f` to every contained value.
    pub fn try_map<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(Value) -> Result<Value>,
    {
        Ok(match self {
            Operand::Single(v) => Operand::Single(f(v)?),
            Operand::List(list) => Operand::List(list.into_iter().map(f).collect::<Result<_>>()?),
        })
    }
}

impl From<Value> for Operand {
    fn from(v: Value) -> Self {
        Operand::Single(v)
    }
}

impl From<Vec<Value>> for Operand {
    fn from(list: Vec<Value>) -> Self {
        Operand::List(list)
    }
}

impl From<&str> for Operand {
    fn from(v: &str) -> Self {
        Operand::Single(Value::from(v))
    }
}

impl From<String> for Operand {
    fn from(v: String) -> Self {
        Operand::Single(Value::from(v))
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Operand::Single(Value::from(v))
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Operand::Single(Value::from(v))
    }
}

impl From<bool> for Operand {
    fn from(v: bool) -> Self {
        Operand::Single(Value::from(v))
    }
}

/// A WHERE or HAVING condition on a model field (or aggregate alias).
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub comparison: Comparison,
    pub operand: Operand,
    pub logical: Logical,
}

impl Condition {
    pub fn new(field: impl Into<String>, operand: impl Into<Operand>) -> Self {
        Self {
            field: field.into(),
            comparison: Comparison::Equal,
            operand: operand.into(),
            logical: Logical::And,
        }
    }

    pub fn comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    pub fn logical(mut self, logical: Logical) -> Self {
        self.logical = logical;
        self
    }
}

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateMethod {
    Count,
    Average,
    Max,
    Min,
    Sum,
}

impl AggregateMethod {
    pub const fn as_sql(self) -> &'static str {
        match self {
            AggregateMethod::Count => "COUNT",
            AggregateMethod::Average => "AVG",
            AggregateMethod::Max => "MAX",
            AggregateMethod::Min => "MIN",
            AggregateMethod::Sum => "SUM",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            AggregateMethod::Count => "count",
            AggregateMethod::Average => "average",
            AggregateMethod::Max => "max",
            AggregateMethod::Min => "min",
            AggregateMethod::Sum => "sum",
        }
    }
}

impl fmt::Display for AggregateMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" => Ok(AggregateMethod::Count),
            "average" | "avg" => Ok(AggregateMethod::Average),
            "max" => Ok(AggregateMethod::Max),
            "min" => Ok(AggregateMethod::Min),
            "sum" => Ok(AggregateMethod::Sum),
            other => Err(Error::builder(format!("Unknown aggregate method \"{other}\""))),
        }
    }
}

/// An aggregate column: `METHOD(field) AS alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub method: AggregateMethod,
    pub field: String,
    pub alias: String,
}
