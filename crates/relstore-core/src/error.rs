//! Error types for relstore.
//!
//! Every fallible operation in the workspace returns [`Result`]. Errors are
//! grouped by the layer that raised them: definitions, model assembly, SQL
//! building, query execution, relation handling and the driver connection.

use std::error::Error as StdError;
use std::fmt;

/// The primary error type for all relstore operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid field, index or relation definition
    Definition(DefinitionError),
    /// Inconsistent model or unknown model lookup
    Model(ModelError),
    /// SQL could not be built (schema or statement)
    Builder(BuilderError),
    /// Query state was invalid or execution failed
    Query(QueryError),
    /// Relation container held something unexpected
    Relation(RelationError),
    /// Driver connection failure
    Connection(ConnectionError),
}

/// A field, index or relation was defined with invalid input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionError {
    pub message: String,
}

/// Model assembly or model registry failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelError {
    pub kind: ModelErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// A definition references a field the model does not have
    UnknownField,
    /// Index lookup by name failed
    UnknownIndex,
    /// Relation lookup by name or entity failed
    UnknownRelation,
    /// No model registered under the requested key
    UnknownModel,
}

/// Schema or statement building failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderError {
    pub message: String,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
    /// The SQL that was being executed, when known
    pub sql: Option<String>,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Query references a field missing from the model
    UnknownField,
    /// Query requests a relation the model does not declare
    UnknownRelation,
    /// Operation does not accept the requested input
    InvalidOperation,
    /// Driver returned a result of an unexpected shape
    UnexpectedResult,
    /// Driver reported a failure while running the statement
    Database,
}

/// A relation container holds a value of the wrong shape or entity type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationError {
    /// Container name of the relation
    pub relation: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub message: String,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    /// Shorthand for a definition error.
    pub fn definition(message: impl Into<String>) -> Self {
        Error::Definition(DefinitionError {
            message: message.into(),
        })
    }

    /// Shorthand for a model error.
    pub fn model(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Error::Model(ModelError {
            kind,
            message: message.into(),
        })
    }

    /// Shorthand for a builder error.
    pub fn builder(message: impl Into<String>) -> Self {
        Error::Builder(BuilderError {
            message: message.into(),
        })
    }

    /// Shorthand for a query error without SQL context.
    pub fn query(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            kind,
            message: message.into(),
            sql: None,
            source: None,
        })
    }

    /// Shorthand for a relation error.
    pub fn relation(relation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Relation(RelationError {
            relation: relation.into(),
            message: message.into(),
        })
    }

    /// Attach the SQL being executed to a query error; other errors pass through.
    #[must_use]
    pub fn with_sql(self, sql: impl Into<String>) -> Self {
        match self {
            Error::Query(mut err) => {
                if err.sql.is_none() {
                    err.sql = Some(sql.into());
                }
                Error::Query(err)
            }
            other => other,
        }
    }

    /// Whether this error came from the driver rather than from relstore itself.
    pub fn is_driver_error(&self) -> bool {
        match self {
            Error::Connection(_) => true,
            Error::Query(q) => q.kind == QueryErrorKind::Database,
            _ => false,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Definition(e) => write!(f, "Definition error: {}", e.message),
            Error::Model(e) => write!(f, "Model error: {}", e.message),
            Error::Builder(e) => write!(f, "Builder error: {}", e.message),
            Error::Query(e) => {
                write!(f, "Query error: {}", e.message)?;
                if let Some(sql) = &e.sql {
                    write!(f, " (sql: {sql})")?;
                }
                Ok(())
            }
            Error::Relation(e) => write!(f, "Relation error in '{}': {}", e.relation, e.message),
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Query(e) => e
                .source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn StdError + 'static)),
            Error::Connection(e) => e
                .source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn StdError + 'static)),
            _ => None,
        }
    }
}

impl From<DefinitionError> for Error {
    fn from(err: DefinitionError) -> Self {
        Error::Definition(err)
    }
}

impl From<ModelError> for Error {
    fn from(err: ModelError) -> Self {
        Error::Model(err)
    }
}

impl From<BuilderError> for Error {
    fn from(err: BuilderError) -> Self {
        Error::Builder(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<RelationError> for Error {
    fn from(err: RelationError) -> Self {
        Error::Relation(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

/// Result type alias for relstore operations.
pub type Result<T> = std::result::Result<T, Error>;
