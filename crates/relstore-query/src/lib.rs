//! Query engine for relstore.
//!
//! `relstore-query` turns a [`Query`] (operation, model, fields, conditions,
//! ordering, limits and relation requests) into SQL for the connection's
//! dialect, runs it through a [`Connection`] and hydrates entities from the
//! returned rows. Requested relations are resolved by one
//! [`relation::RelationResolver`] per relation kind, reading related
//! entities in batches.
//!
//! A query is a value consumed by [`Query::execute`]; build a new one for
//! every call.

pub mod builder;
pub mod clause;
pub mod query;
pub mod relation;

use relstore_core::{Connection, Dialect, ModelBag};

pub use builder::{DeleteBuilder, InsertBuilder, Predicate, SelectBuilder, SelectColumn, UpdateBuilder};
pub use clause::{Aggregate, AggregateMethod, Comparison, Condition, Logical, Operand, Order};
pub use query::{Operation, Query, QueryOutput};
pub use relation::{RelationRequest, RelationResolver};

/// What every query and resolver runs against: the driver, the registered
/// models and the SQL dialect.
pub struct Context<'s, C> {
    conn: &'s C,
    models: &'s ModelBag,
    dialect: Dialect,
}

impl<'s, C: Connection> Context<'s, C> {
    pub fn new(conn: &'s C, models: &'s ModelBag, dialect: Dialect) -> Self {
        Self {
            conn,
            models,
            dialect,
        }
    }

    pub fn conn(&self) -> &'s C {
        self.conn
    }

    pub fn models(&self) -> &'s ModelBag {
        self.models
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl<C> Clone for Context<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Context<'_, C> {}
