//! Core types and traits for relstore.
//!
//! `relstore-core` is the **foundation layer** of the workspace. It defines the
//! definitions every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Definitions**: `FieldInfo`, `IndexInfo` and `RelationInfo` describe how
//!   an entity type is stored and how it relates to others.
//! - **Models**: `Model` validates those definitions once and exposes them as
//!   an immutable snapshot; `ModelBag` resolves models by alias, entity type or
//!   table name.
//! - **Data**: `Value`, `Row` and `Entity` carry data between the driver, the
//!   query engine and application code.
//! - **Contract**: `Connection` is implemented by database drivers.
//!
//! # Who Uses This Crate
//!
//! - `relstore-schema` turns field and index definitions into DDL.
//! - `relstore-query` builds and runs DML and resolves relations.
//! - Drivers implement `Connection` and operate on `Row`/`Value`.
//!
//! Most applications should use the `relstore` facade.

pub mod connection;
pub mod dialect;
pub mod entity;
pub mod error;
pub mod field;
pub mod index;
pub mod model;
pub mod model_bag;
pub mod relationship;
pub mod row;
pub mod value;

pub use connection::{Connection, cast_value, store_value};
pub use dialect::{Dialect, quote_ident, quote_ident_mysql};
pub use entity::{Entity, Property};
pub use error::{
    BuilderError, ConnectionError, DefinitionError, Error, ModelError, ModelErrorKind, QueryError,
    QueryErrorKind, RelationError, Result,
};
pub use field::{Attribute, FieldAttributes, FieldInfo, FieldType};
pub use index::{ForeignReference, IndexInfo, IndexKind, PRIMARY_INDEX};
pub use model::Model;
pub use model_bag::{ModelBag, sanitize_key};
pub use relationship::{KeyPair, Mediator, RelationInfo, RelationKind};
pub use row::Row;
pub use value::Value;
