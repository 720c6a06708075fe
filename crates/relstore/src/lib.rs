//! relstore: database-agnostic entity storage.
//!
//! Describe each entity type once as a [`Model`] (fields, indexes and
//! relations), register the models in a [`ModelBag`], and hand both to a
//! [`Storage`] together with a driver implementing [`Connection`]. The
//! storage then renders schema statements for the configured dialect and
//! runs queries that hydrate [`Entity`] values, resolving requested relations
//! in batches.
//!
//! # Crates
//!
//! - `relstore-core`: definitions, models, values, errors, the driver trait.
//! - `relstore-schema`: per-dialect DDL and table description parsing.
//! - `relstore-query`: the query engine and relation resolvers.
//!
//! # Example
//!
//! ```
//! use relstore::prelude::*;
//!
//! let user = Model::new(
//!     "User",
//!     "user",
//!     vec![
//!         FieldInfo::new("id", FieldType::Integer, FieldAttributes::new().auto_increment())?,
//!         FieldInfo::of("name", FieldType::String)?,
//!     ],
//!     vec![IndexInfo::primary(["id"])?],
//!     vec![],
//! )?;
//! let models = ModelBag::new().with(user);
//!
//! let sql = SchemaBuilder::for_model(Dialect::MySql, models.get("User")?, SchemaOperation::Create)
//!     .build()?;
//! assert!(sql.starts_with("CREATE TABLE user"));
//! # Ok::<(), relstore::Error>(())
//! ```

pub mod config;
pub mod storage;

pub use config::StorageConfig;
pub use storage::Storage;

pub use relstore_core::{
    Attribute, Connection, Dialect, Entity, Error, FieldAttributes, FieldInfo, FieldType,
    IndexInfo, IndexKind, KeyPair, Mediator, Model, ModelBag, Property, RelationInfo,
    RelationKind, Result, Row, Value,
};
pub use relstore_query::{
    AggregateMethod, Comparison, Context, Logical, Operand, Operation, Order, Query, QueryOutput,
};
pub use relstore_schema::{
    ColumnDef, IndexDef, IntrospectionRow, SchemaBuilder, SchemaOperation, TableOptions,
    TableSchema,
};

// Sub-crates, for anything not re-exported here.
pub use relstore_core;
pub use relstore_query;
pub use relstore_schema;

/// Everything needed to define models and run queries.
pub mod prelude {
    pub use crate::{
        AggregateMethod, Comparison, Connection, Dialect, Entity, Error, FieldAttributes,
        FieldInfo, FieldType, IndexInfo, IndexKind, Logical, Model, ModelBag, Operand, Operation,
        Order, Property, Query, QueryOutput, RelationInfo, RelationKind, Result, Row,
        SchemaBuilder, SchemaOperation, Storage, StorageConfig, Value,
    };
}
