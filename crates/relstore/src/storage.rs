//! The storage entry point.

use relstore_core::{Connection, Entity, ModelBag, Result};
use relstore_query::{Context, Operation, Query};
use relstore_schema::{IntrospectionRow, SchemaBuilder, SchemaOperation, TableSchema};

use crate::config::StorageConfig;

/// A connection bound to a set of models.
///
/// Every method starts a fresh [`Query`] or [`SchemaBuilder`]; nothing is
/// carried over between calls.
#[derive(Debug)]
pub struct Storage<C> {
    conn: C,
    models: ModelBag,
    config: StorageConfig,
}

impl<C: Connection> Storage<C> {
    pub fn new(conn: C, models: ModelBag) -> Self {
        Self {
            conn,
            models,
            config: StorageConfig::default(),
        }
    }

    pub fn with_config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn models(&self) -> &ModelBag {
        &self.models
    }

    pub fn models_mut(&mut self) -> &mut ModelBag {
        &mut self.models
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn into_connection(self) -> C {
        self.conn
    }

    pub fn context(&self) -> Context<'_, C> {
        Context::new(&self.conn, &self.models, self.config.dialect)
    }

    /// Query of any entity-less operation on `entity`.
    pub fn query(&self, operation: Operation, entity: &str) -> Result<Query<'_, C>> {
        Query::new(self.context(), operation, entity)
    }

    pub fn count(&self, entity: &str) -> Result<Query<'_, C>> {
        self.query(Operation::Count, entity)
    }

    pub fn read_one(&self, entity: &str) -> Result<Query<'_, C>> {
        self.query(Operation::ReadOne, entity)
    }

    pub fn read(&self, entity: &str) -> Result<Query<'_, C>> {
        self.query(Operation::Read, entity)
    }

    /// Insert or update `entity`, depending on whether it is already stored.
    pub fn write(&self, entity: Entity) -> Result<Query<'_, C>> {
        Query::with_entity(self.context(), Operation::Write, entity)
    }

    pub fn insert(&self, entity: Entity) -> Result<Query<'_, C>> {
        Query::with_entity(self.context(), Operation::Insert, entity)
    }

    pub fn update(&self, entity: Entity) -> Result<Query<'_, C>> {
        Query::with_entity(self.context(), Operation::Update, entity)
    }

    pub fn delete(&self, entity: Entity) -> Result<Query<'_, C>> {
        Query::with_entity(self.context(), Operation::Delete, entity)
    }

    /// Delete every row of `entity` matching the query's conditions.
    pub fn delete_where(&self, entity: &str) -> Result<Query<'_, C>> {
        self.query(Operation::Delete, entity)
    }

    pub fn clear(&self, entity: &str) -> Result<Query<'_, C>> {
        self.query(Operation::Clear, entity)
    }

    /// Schema builder pre-filled with the model registered as `entity`.
    pub fn schema(&self, entity: &str, operation: SchemaOperation) -> Result<SchemaBuilder> {
        let model = self.models.get(entity)?;
        Ok(
            SchemaBuilder::for_model(self.config.dialect, model, operation)
                .with_options(self.config.table_options.clone()),
        )
    }

    /// Whether the table of `entity` exists.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn table_exists(&self, entity: &str) -> Result<bool> {
        let sql = self.schema(entity, SchemaOperation::Check)?.build()?;
        let rows = self.conn.query(&sql, &[]).map_err(|e| e.with_sql(&sql))?;
        Ok(!rows.is_empty())
    }

    /// Read the stored table description of `entity`.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn describe(&self, entity: &str) -> Result<TableSchema> {
        let builder = self.schema(entity, SchemaOperation::Info)?;
        let sql = builder.build()?;
        let rows = self.conn.query(&sql, &[]).map_err(|e| e.with_sql(&sql))?;
        let rows = rows
            .iter()
            .map(IntrospectionRow::from_row)
            .collect::<Result<Vec<_>>>()?;
        builder.parse(&rows)
    }

    /// Run every statement of a schema operation on the table of `entity`.
    /// PostgreSQL operations may render several `; `-separated statements.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn apply_schema(&self, entity: &str, operation: SchemaOperation) -> Result<()> {
        let sql = self.schema(entity, operation)?.build()?;
        for statement in sql.split("; ").map(str::trim).filter(|s| !s.is_empty()) {
            tracing::debug!(sql = %statement, "Applying schema statement");
            self.conn
                .execute(statement, &[])
                .map_err(|e| e.with_sql(statement))?;
        }
        Ok(())
    }
}
