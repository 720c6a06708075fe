//! The query engine.

use std::fmt;
use std::str::FromStr;

use relstore_core::{
    Connection, Entity, Error, FieldInfo, Model, QueryErrorKind, Result, Row, Value,
};

use crate::Context;
use crate::builder::{self, DeleteBuilder, InsertBuilder, Predicate, SelectBuilder, UpdateBuilder};
use crate::clause::{Aggregate, AggregateMethod, Comparison, Condition, Logical, Operand, Order};
use crate::relation::{self, RelationRequest, RelationResolver};

/// Operation a [`Query`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Count,
    ReadOne,
    Read,
    /// Update when the entity is already stored, insert otherwise
    Write,
    Insert,
    Update,
    Delete,
    /// Truncate the table
    Clear,
}

impl Operation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Count => "count",
            Operation::ReadOne => "readOne",
            Operation::Read => "read",
            Operation::Write => "write",
            Operation::Insert => "insert",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Clear => "clear",
        }
    }

    /// Operations that can not run without an entity instance.
    pub const fn requires_entity(self) -> bool {
        matches!(self, Operation::Write | Operation::Insert | Operation::Update)
    }

    /// Operations that can run on an entity instance.
    pub const fn accepts_entity(self) -> bool {
        matches!(
            self,
            Operation::Write | Operation::Insert | Operation::Update | Operation::Delete
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(Operation::Count),
            "readOne" => Ok(Operation::ReadOne),
            "read" => Ok(Operation::Read),
            "write" => Ok(Operation::Write),
            "insert" => Ok(Operation::Insert),
            "update" => Ok(Operation::Update),
            "delete" => Ok(Operation::Delete),
            "clear" => Ok(Operation::Clear),
            other => Err(Error::builder(format!("Unknown operation \"{other}\""))),
        }
    }
}

/// Result of [`Query::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// `count`
    Count(u64),
    /// `readOne`
    One(Option<Entity>),
    /// `read`
    Many(Vec<Entity>),
    /// `write`, `insert`, `update` and `delete` of an entity
    Entity(Entity),
    /// Rows removed by a `delete` without an entity
    Affected(u64),
    /// `clear`
    Cleared,
}

impl QueryOutput {
    pub fn into_count(self) -> Result<u64> {
        match self {
            QueryOutput::Count(n) => Ok(n),
            other => Err(unexpected("a count", &other)),
        }
    }

    pub fn into_one(self) -> Result<Option<Entity>> {
        match self {
            QueryOutput::One(e) => Ok(e),
            other => Err(unexpected("at most one entity", &other)),
        }
    }

    pub fn into_many(self) -> Result<Vec<Entity>> {
        match self {
            QueryOutput::Many(list) => Ok(list),
            other => Err(unexpected("a list of entities", &other)),
        }
    }

    pub fn into_entity(self) -> Result<Entity> {
        match self {
            QueryOutput::Entity(e) => Ok(e),
            other => Err(unexpected("an entity", &other)),
        }
    }

    pub fn into_affected(self) -> Result<u64> {
        match self {
            QueryOutput::Affected(n) => Ok(n),
            other => Err(unexpected("an affected row count", &other)),
        }
    }

    fn shape(&self) -> &'static str {
        match self {
            QueryOutput::Count(_) => "count",
            QueryOutput::One(_) => "one",
            QueryOutput::Many(_) => "many",
            QueryOutput::Entity(_) => "entity",
            QueryOutput::Affected(_) => "affected",
            QueryOutput::Cleared => "cleared",
        }
    }
}

fn unexpected(expected: &str, got: &QueryOutput) -> Error {
    Error::query(
        QueryErrorKind::UnexpectedResult,
        format!("Expected {expected}, query returned {}", got.shape()),
    )
}

/// One operation against one model.
///
/// Field names given to the builder methods are checked when the query is
/// rendered or executed, so a misspelled field surfaces as a query error
/// before any statement reaches the driver.
pub struct Query<'s, C> {
    ctx: Context<'s, C>,
    operation: Operation,
    model: &'s Model,
    entity: Option<Entity>,
    fields: Vec<String>,
    aggregates: Vec<Aggregate>,
    group: Vec<String>,
    values: Vec<String>,
    assignments: Vec<(String, Value)>,
    conditions: Vec<Condition>,
    having: Vec<Condition>,
    order: Vec<(String, Order)>,
    limit: Option<(u64, Option<u64>)>,
    relations: Vec<RelationRequest>,
}

impl<'s, C: Connection> Query<'s, C> {
    /// Query on the model registered as `entity` (alias, entity type or table).
    pub fn new(ctx: Context<'s, C>, operation: Operation, entity: &str) -> Result<Self> {
        if operation.requires_entity() {
            return Err(Error::query(
                QueryErrorKind::InvalidOperation,
                format!("Operation \"{operation}\" requires an entity instance"),
            ));
        }
        let model = ctx.models().get(entity)?;
        Ok(Self::for_model(ctx, operation, model, None))
    }

    /// Query writing or deleting `entity`.
    pub fn with_entity(ctx: Context<'s, C>, operation: Operation, entity: Entity) -> Result<Self> {
        if !operation.accepts_entity() {
            return Err(Error::query(
                QueryErrorKind::InvalidOperation,
                format!("Operation \"{operation}\" does not take an entity instance"),
            ));
        }
        let model = ctx.models().get(entity.entity_type())?;
        Ok(Self::for_model(ctx, operation, model, Some(entity)))
    }

    pub(crate) fn for_model(
        ctx: Context<'s, C>,
        operation: Operation,
        model: &'s Model,
        entity: Option<Entity>,
    ) -> Self {
        Self {
            ctx,
            operation,
            model,
            entity,
            fields: Vec::new(),
            aggregates: Vec::new(),
            group: Vec::new(),
            values: Vec::new(),
            assignments: Vec::new(),
            conditions: Vec::new(),
            having: Vec::new(),
            order: Vec::new(),
            limit: None,
            relations: Vec::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn model(&self) -> &'s Model {
        self.model
    }

    /// Fields to read; all model fields when none are given.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Add `METHOD(field) AS alias`. The alias defaults to `method_field`.
    pub fn aggregate(mut self, method: AggregateMethod, field: &str, alias: Option<&str>) -> Self {
        let alias = alias.map_or_else(
            || {
                if field == "*" {
                    method.to_string()
                } else {
                    format!("{method}_{field}")
                }
            },
            ToString::to_string,
        );
        self.aggregates.push(Aggregate {
            method,
            field: field.to_string(),
            alias,
        });
        self
    }

    pub fn group(mut self, field: impl Into<String>) -> Self {
        self.group.push(field.into());
        self
    }

    /// Fields to write; all model fields when none are given.
    pub fn values<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Write `value` to `field` instead of the entity's own value.
    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if !self.values.contains(&field) && !self.values.is_empty() {
            self.values.push(field.clone());
        }
        self.assignments.retain(|(f, _)| *f != field);
        self.assignments.push((field, value.into()));
        self
    }

    /// `field = operand` joined with AND.
    pub fn filter(self, field: impl Into<String>, operand: impl Into<Operand>) -> Self {
        self.condition(field, operand, Comparison::Equal, Logical::And)
    }

    pub fn condition(
        mut self,
        field: impl Into<String>,
        operand: impl Into<Operand>,
        comparison: Comparison,
        logical: Logical,
    ) -> Self {
        self.conditions.push(
            Condition::new(field, operand)
                .comparison(comparison)
                .logical(logical),
        );
        self
    }

    /// HAVING condition on a field or an aggregate alias.
    pub fn having(
        mut self,
        field: impl Into<String>,
        operand: impl Into<Operand>,
        comparison: Comparison,
        logical: Logical,
    ) -> Self {
        self.having.push(
            Condition::new(field, operand)
                .comparison(comparison)
                .logical(logical),
        );
        self
    }

    pub fn order(mut self, field: impl Into<String>, order: Order) -> Self {
        self.order.push((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64, offset: Option<u64>) -> Self {
        self.limit = Some((limit, offset));
        self
    }

    /// Resolve the named relation with the result. `a.b` also resolves
    /// relation `b` of the entities related through `a`; `transparent`
    /// applies to the last segment.
    pub fn relation(mut self, name: &str, transparent: bool) -> Self {
        RelationRequest::insert(&mut self.relations, name, transparent);
        self
    }

    pub(crate) fn with_request(mut self, request: RelationRequest) -> Self {
        self.relations.push(request);
        self
    }

    /// Same operation, model and entity with every other setting cleared.
    pub fn reset(self) -> Self {
        Self::for_model(self.ctx, self.operation, self.model, self.entity)
    }

    /// Render the main statement without running it. `write` is rendered
    /// as `update`.
    pub fn sql(&self) -> Result<(String, Vec<Value>)> {
        self.validate()?;
        let dialect = self.ctx.dialect();
        match self.operation {
            Operation::Count => Ok(self.select()?.build_count(dialect)),
            Operation::ReadOne | Operation::Read => Ok(self.select()?.build(dialect)),
            Operation::Write | Operation::Update => {
                Ok(self.update_statement(self.entity()?)?.build(dialect))
            }
            Operation::Insert => Ok(self.insert_statement(self.entity()?)?.0.build(dialect)),
            Operation::Delete => Ok(self.delete_statement()?.build(dialect)),
            Operation::Clear => Ok(builder::truncate(dialect, self.model.table())),
        }
    }

    /// Run the operation and resolve requested relations.
    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(operation = %self.operation, table = %self.model.table())
    )]
    pub fn execute(mut self) -> Result<QueryOutput> {
        self.validate()?;
        let resolvers = self.resolvers()?;

        match self.operation {
            Operation::Count => {
                let (sql, params) = self.select()?.build_count(self.ctx.dialect());
                let rows = self.run_query(&sql, &params)?;
                let count = rows
                    .first()
                    .and_then(|row| row.get_named("count").or_else(|| row.get(0)))
                    .and_then(Value::as_i64)
                    .and_then(|n| u64::try_from(n).ok())
                    .ok_or_else(|| {
                        Error::query(
                            QueryErrorKind::UnexpectedResult,
                            "Count query did not return a number",
                        )
                        .with_sql(&sql)
                    })?;
                Ok(QueryOutput::Count(count))
            }
            Operation::ReadOne | Operation::Read => {
                let mut select = self.select()?;
                if self.operation == Operation::ReadOne {
                    select = select.limit(1, self.limit.and_then(|(_, offset)| offset));
                }
                let (sql, params) = select.build(self.ctx.dialect());
                let rows = self.run_query(&sql, &params)?;
                let mut entities = rows
                    .iter()
                    .map(|row| self.hydrate(row))
                    .collect::<Result<Vec<_>>>()?;

                for resolver in &resolvers {
                    resolver.read(&mut entities)?;
                }

                if self.operation == Operation::ReadOne {
                    Ok(QueryOutput::One(entities.into_iter().next()))
                } else {
                    Ok(QueryOutput::Many(entities))
                }
            }
            Operation::Write | Operation::Insert | Operation::Update => {
                let mut entity = self.take_entity()?;
                for resolver in &resolvers {
                    resolver.check(&entity)?;
                }

                let insert = match self.operation {
                    Operation::Insert => true,
                    Operation::Update => false,
                    _ => !self.exists(&entity)?,
                };
                if insert {
                    self.run_insert(&mut entity)?;
                } else {
                    self.run_update(&entity)?;
                }

                for resolver in &resolvers {
                    resolver.write(&mut entity)?;
                }
                Ok(QueryOutput::Entity(entity))
            }
            Operation::Delete => {
                let (sql, params) = self.delete_statement()?.build(self.ctx.dialect());
                if let Some(entity) = &self.entity {
                    for resolver in &resolvers {
                        resolver.check(entity)?;
                    }
                    for resolver in &resolvers {
                        resolver.delete(entity)?;
                    }
                }

                let affected = self.run_execute(&sql, &params)?;

                match self.entity.take() {
                    Some(entity) => Ok(QueryOutput::Entity(entity)),
                    None => Ok(QueryOutput::Affected(affected)),
                }
            }
            Operation::Clear => {
                for resolver in &resolvers {
                    resolver.clear()?;
                }
                let (sql, params) = builder::truncate(self.ctx.dialect(), self.model.table());
                self.run_execute(&sql, &params)?;
                Ok(QueryOutput::Cleared)
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    fn validate(&self) -> Result<()> {
        for name in self.fields.iter().chain(&self.group).chain(&self.values) {
            self.field_info(name)?;
        }
        for (name, _) in &self.assignments {
            self.field_info(name)?;
        }
        for aggregate in &self.aggregates {
            if aggregate.field == "*" {
                if aggregate.method != AggregateMethod::Count {
                    return Err(Error::query(
                        QueryErrorKind::UnknownField,
                        format!("Aggregate \"{}\" needs a field", aggregate.method),
                    ));
                }
            } else {
                self.field_info(&aggregate.field)?;
            }
        }
        for condition in &self.conditions {
            self.field_info(&condition.field)?;
        }
        for condition in &self.having {
            if self.aggregate_alias(&condition.field).is_none() {
                self.field_info(&condition.field)?;
            }
        }
        for (field, _) in &self.order {
            if self.aggregate_alias(field).is_none() {
                self.field_info(field)?;
            }
        }
        for request in &self.relations {
            self.relation_info(&request.name)?;
        }
        if self.operation == Operation::Delete && self.entity.is_none() {
            if self.conditions.is_empty() {
                return Err(Error::query(
                    QueryErrorKind::InvalidOperation,
                    "Delete without an entity requires at least one condition",
                ));
            }
            if !self.relations.is_empty() {
                return Err(Error::query(
                    QueryErrorKind::InvalidOperation,
                    "Relations can only be deleted together with an entity",
                ));
            }
        }
        Ok(())
    }

    fn field_info(&self, name: &str) -> Result<&'s FieldInfo> {
        self.model.field(name).map_err(|_| {
            Error::query(
                QueryErrorKind::UnknownField,
                format!(
                    "Unknown field \"{name}\" in query for entity \"{}\"",
                    self.model.entity()
                ),
            )
        })
    }

    fn relation_info(&self, name: &str) -> Result<&'s relstore_core::RelationInfo> {
        self.model.relation(name).map_err(|_| {
            Error::query(
                QueryErrorKind::UnknownRelation,
                format!(
                    "Unknown relation \"{name}\" in query for entity \"{}\"",
                    self.model.entity()
                ),
            )
        })
    }

    fn aggregate_alias(&self, name: &str) -> Option<&Aggregate> {
        self.aggregates.iter().find(|a| a.alias == name)
    }

    fn resolvers(&self) -> Result<Vec<Box<dyn RelationResolver + 's>>> {
        self.relations
            .iter()
            .map(|request| {
                let info = self.relation_info(&request.name)?;
                relation::resolver_for(self.ctx, info, request)
            })
            .collect()
    }

    fn entity(&self) -> Result<&Entity> {
        self.entity.as_ref().ok_or_else(|| {
            Error::query(
                QueryErrorKind::InvalidOperation,
                format!("Operation \"{}\" requires an entity instance", self.operation),
            )
        })
    }

    fn take_entity(&mut self) -> Result<Entity> {
        self.entity()?;
        self.entity.take().ok_or_else(|| {
            Error::query(QueryErrorKind::InvalidOperation, "Entity already consumed")
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn selected_fields(&self) -> Result<Vec<&'s FieldInfo>> {
        if self.fields.is_empty() {
            if self.aggregates.is_empty() {
                return Ok(self.model.fields().iter().collect());
            }
            return Ok(Vec::new());
        }
        self.fields.iter().map(|f| self.field_info(f)).collect()
    }

    fn select(&self) -> Result<SelectBuilder> {
        let mut select = SelectBuilder::new(self.model.table());
        for field in self.selected_fields()? {
            select = select.column(field.mapping(), Some(field.name().to_string()));
        }
        for aggregate in &self.aggregates {
            let column = if aggregate.field == "*" {
                "*"
            } else {
                self.field_info(&aggregate.field)?.mapping()
            };
            select = select.aggregate(aggregate.method, column, aggregate.alias.clone());
        }
        for condition in &self.conditions {
            select = select.filter(self.predicate(condition)?);
        }
        for field in &self.group {
            select = select.group(self.field_info(field)?.mapping());
        }
        for condition in &self.having {
            select = select.having(self.predicate(condition)?);
        }
        for (field, order) in &self.order {
            let column = match self.aggregate_alias(field) {
                Some(aggregate) => aggregate.alias.as_str(),
                None => self.field_info(field)?.mapping(),
            };
            select = select.order(column, *order);
        }
        if let Some((limit, offset)) = self.limit {
            select = select.limit(limit, offset);
        }
        Ok(select)
    }

    fn predicate(&self, condition: &Condition) -> Result<Predicate> {
        let (column, operand) = match self.aggregate_alias(&condition.field) {
            Some(aggregate) => (aggregate.alias.clone(), condition.operand.clone()),
            None => {
                let field = self.field_info(&condition.field)?;
                let operand = condition
                    .operand
                    .clone()
                    .try_map(|v| self.ctx.conn().store(v, field.field_type()))?;
                (field.mapping().to_string(), operand)
            }
        };
        Ok(Predicate {
            column,
            comparison: condition.comparison,
            operand,
            logical: condition.logical,
        })
    }

    fn written_fields(&self) -> Result<Vec<&'s FieldInfo>> {
        if self.values.is_empty() {
            return Ok(self.model.fields().iter().collect());
        }
        self.values.iter().map(|f| self.field_info(f)).collect()
    }

    fn stored_value(&self, entity: &Entity, field: &FieldInfo) -> Result<Value> {
        let value = self
            .assignments
            .iter()
            .find(|(name, _)| name == field.name())
            .map_or_else(|| entity.value(field.name()), |(_, v)| v.clone());
        self.ctx.conn().store(value, field.field_type())
    }

    /// Equality predicates on the identity fields. A model with a primary
    /// index needs every primary value set.
    fn identity_predicates(&self, entity: &Entity) -> Result<Vec<Predicate>> {
        let has_primary = !self.model.primary_fields().is_empty();
        let mut predicates = Vec::new();
        for field in self.model.identity_fields() {
            let value = self.ctx.conn().store(entity.value(field.name()), field.field_type())?;
            if has_primary && value.is_null() {
                return Err(Error::query(
                    QueryErrorKind::InvalidOperation,
                    format!(
                        "Can not identify entity \"{}\": primary field \"{}\" is not set",
                        self.model.entity(),
                        field.name()
                    ),
                ));
            }
            predicates.push(Predicate::eq(field.mapping(), value));
        }
        Ok(predicates)
    }

    /// The insert statement and the auto-increment field left for the
    /// database to fill, if any.
    fn insert_statement(&self, entity: &Entity) -> Result<(InsertBuilder, Option<&'s FieldInfo>)> {
        let mut insert = InsertBuilder::new(self.model.table());
        let mut generated = None;
        for field in self.written_fields()? {
            let value = self.stored_value(entity, field)?;
            if field.is_auto_increment() && value.is_null() {
                generated = Some(field);
                continue;
            }
            insert = insert.value(field.mapping(), value);
        }
        if let Some(field) = generated {
            insert = insert.returning(field.mapping());
        }
        Ok((insert, generated))
    }

    fn update_statement(&self, entity: &Entity) -> Result<UpdateBuilder> {
        let primary: Vec<&str> = self
            .model
            .primary_fields()
            .iter()
            .map(|f| f.name())
            .collect();
        let mut update = UpdateBuilder::new(self.model.table());
        for field in self.written_fields()? {
            if primary.contains(&field.name()) {
                continue;
            }
            update = update.set(field.mapping(), self.stored_value(entity, field)?);
        }
        for predicate in self.identity_predicates(entity)? {
            update = update.filter(predicate);
        }
        for condition in &self.conditions {
            update = update.filter_group(self.predicate(condition)?);
        }
        Ok(update)
    }

    fn delete_statement(&self) -> Result<DeleteBuilder> {
        let mut delete = DeleteBuilder::new(self.model.table());
        if let Some(entity) = &self.entity {
            for predicate in self.identity_predicates(entity)? {
                delete = delete.filter(predicate);
            }
        }
        for condition in &self.conditions {
            delete = delete.filter_group(self.predicate(condition)?);
        }
        Ok(delete)
    }

    // ------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------

    fn exists(&self, entity: &Entity) -> Result<bool> {
        let identity = self.model.identity_fields();
        if identity.is_empty() || identity.iter().any(|f| entity.value(f.name()).is_null()) {
            return Ok(false);
        }

        let mut select = SelectBuilder::new(self.model.table());
        for predicate in self.identity_predicates(entity)? {
            select = select.filter(predicate);
        }
        let (sql, params) = select.build_count(self.ctx.dialect());
        let rows = self.run_query(&sql, &params)?;
        let count = rows
            .first()
            .and_then(|row| row.get_named("count").or_else(|| row.get(0)))
            .and_then(Value::as_i64)
            .unwrap_or(0);
        Ok(count > 0)
    }

    fn run_insert(&self, entity: &mut Entity) -> Result<()> {
        let (insert, generated) = self.insert_statement(entity)?;
        let (sql, params) = insert.build(self.ctx.dialect());
        tracing::debug!(sql = %sql, params = params.len(), "Executing insert");
        let id = self
            .ctx
            .conn()
            .insert(&sql, &params)
            .map_err(|e| e.with_sql(&sql))?;

        if let Some(field) = generated {
            if id != 0 {
                let value = self.ctx.conn().cast(Value::BigInt(id), field.field_type())?;
                entity.set(field.name(), value);
            }
        }
        Ok(())
    }

    fn run_update(&self, entity: &Entity) -> Result<()> {
        let update = self.update_statement(entity)?;
        if update.is_empty() {
            tracing::trace!(table = %self.model.table(), "Nothing to update");
            return Ok(());
        }
        let (sql, params) = update.build(self.ctx.dialect());
        self.run_execute(&sql, &params)?;
        Ok(())
    }

    fn run_query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        tracing::debug!(sql = %sql, params = params.len(), "Executing query");
        let rows = self
            .ctx
            .conn()
            .query(sql, params)
            .map_err(|e| e.with_sql(sql))?;
        tracing::trace!(rows = rows.len(), "Query returned");
        Ok(rows)
    }

    fn run_execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        tracing::debug!(sql = %sql, params = params.len(), "Executing statement");
        let affected = self
            .ctx
            .conn()
            .execute(sql, params)
            .map_err(|e| e.with_sql(sql))?;
        tracing::trace!(affected, "Statement executed");
        Ok(affected)
    }

    fn hydrate(&self, row: &Row) -> Result<Entity> {
        let mut entity = Entity::new(self.model.entity());
        for field in self.selected_fields()? {
            let raw = row
                .get_named(field.name())
                .or_else(|| row.get_named(field.mapping()));
            if let Some(raw) = raw {
                let value = self.ctx.conn().cast(raw.clone(), field.field_type())?;
                entity.set(field.name(), value);
            }
        }
        for aggregate in &self.aggregates {
            if let Some(value) = row.get_named(&aggregate.alias) {
                entity.set(aggregate.alias.clone(), value.clone());
            }
        }
        Ok(entity)
    }
}
