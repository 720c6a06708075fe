//! Relation resolvers.
//!
//! A resolver reads, writes, deletes and clears the entities held in one
//! relation container of its parent entities. Reads are batched: whatever
//! the number of parents, a direct relation costs one related read and a
//! through relation one mediator read plus one target read.

mod many;
mod many_through;
mod one;
mod one_through;

use std::collections::{HashMap, HashSet};

use relstore_core::{
    Connection, Entity, Error, KeyPair, Model, Property, RelationInfo, RelationKind, Result, Value,
};

use crate::Context;
use crate::clause::{Comparison, Logical, Operand};
use crate::query::{Operation, Query};

pub use many::Many;
pub use many_through::ManyThrough;
pub use one::One;
pub use one_through::OneThrough;

/// A relation to resolve, with the relations to resolve on its entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRequest {
    pub name: String,
    pub transparent: bool,
    pub nested: Vec<RelationRequest>,
}

impl RelationRequest {
    pub fn new(name: impl Into<String>, transparent: bool) -> Self {
        Self {
            name: name.into(),
            transparent,
            nested: Vec::new(),
        }
    }

    /// Merge the dotted `path` into `requests`.
    pub(crate) fn insert(requests: &mut Vec<RelationRequest>, path: &str, transparent: bool) {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };

        let pos = match requests.iter().position(|r| r.name == head) {
            Some(pos) => pos,
            None => {
                requests.push(RelationRequest::new(head, false));
                requests.len() - 1
            }
        };

        match rest {
            Some(rest) => Self::insert(&mut requests[pos].nested, rest, transparent),
            None => requests[pos].transparent = transparent,
        }
    }
}

/// Resolves one relation of a model.
pub trait RelationResolver {
    /// The relation being resolved.
    fn relation(&self) -> &RelationInfo;

    /// Fail when the parent's container holds anything but entities of the
    /// related type, in the shape the relation kind expects.
    fn check(&self, entity: &Entity) -> Result<()>;

    /// Attach related entities to `entities`.
    fn read(&self, entities: &mut [Entity]) -> Result<()>;

    /// Store the contained entities and drop stale associations.
    fn write(&self, entity: &mut Entity) -> Result<()>;

    /// Remove the contained entities (or associations, for through kinds).
    fn delete(&self, entity: &Entity) -> Result<()>;

    /// Remove every related row (the mediator table, for through kinds).
    fn clear(&self) -> Result<()>;
}

/// Resolver for `relation` with the nested requests of `request`.
pub fn resolver_for<'s, C: Connection>(
    ctx: Context<'s, C>,
    relation: &'s RelationInfo,
    request: &RelationRequest,
) -> Result<Box<dyn RelationResolver + 's>> {
    let binding = Binding::new(ctx, relation, request)?;
    Ok(match relation.kind() {
        RelationKind::One => Box::new(One::new(binding)),
        RelationKind::Many => Box::new(Many::new(binding)),
        RelationKind::OneThrough => Box::new(OneThrough::new(binding)?),
        RelationKind::ManyThrough => Box::new(ManyThrough::new(binding)?),
    })
}

/// State and helpers shared by all resolver kinds.
pub(crate) struct Binding<'s, C> {
    ctx: Context<'s, C>,
    relation: &'s RelationInfo,
    related: &'s Model,
    transparent: bool,
    nested: Vec<RelationRequest>,
}

impl<'s, C: Connection> Binding<'s, C> {
    fn new(ctx: Context<'s, C>, relation: &'s RelationInfo, request: &RelationRequest) -> Result<Self> {
        let related = ctx.models().get(relation.entity())?;
        Ok(Self {
            ctx,
            relation,
            related,
            transparent: request.transparent,
            nested: request.nested.clone(),
        })
    }

    pub(crate) fn ctx(&self) -> Context<'s, C> {
        self.ctx
    }

    pub(crate) fn relation(&self) -> &'s RelationInfo {
        self.relation
    }

    pub(crate) fn related(&self) -> &'s Model {
        self.related
    }

    pub(crate) fn container(&self) -> &'s str {
        self.relation.container()
    }

    /// Query on the related model that also resolves the nested requests.
    pub(crate) fn query(&self, operation: Operation, entity: Option<Entity>) -> Query<'s, C> {
        self.nested.iter().fold(
            Query::for_model(self.ctx, operation, self.related, entity),
            |query, request| query.with_request(request.clone()),
        )
    }

    /// Query on any model, without nested requests.
    pub(crate) fn plain(
        &self,
        model: &'s Model,
        operation: Operation,
        entity: Option<Entity>,
    ) -> Query<'s, C> {
        Query::for_model(self.ctx, operation, model, entity)
    }

    /// Whether `parent` matches the relation's local values.
    pub(crate) fn participates(&self, parent: &Entity) -> bool {
        self.relation
            .local_values()
            .iter()
            .all(|(field, value)| parent.value(field) == *value)
    }

    /// Relation error naming this relation.
    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        Error::relation(self.container(), message)
    }

    /// Check that `entity` is of the related type, including its own
    /// nested containers.
    pub(crate) fn check_entity(&self, entity: &Entity) -> Result<()> {
        if !entity.is_instance_of(self.related.entity()) {
            return Err(self.error(format!(
                "Relation container must hold \"{}\" entities, got \"{}\"",
                self.related.entity(),
                entity.entity_type()
            )));
        }
        for request in &self.nested {
            let info = self.related.relation(&request.name)?;
            resolver_for(self.ctx, info, request)?.check(entity)?;
        }
        Ok(())
    }

    /// Entities held in the parent's container, after checking their shape
    /// and type. `None` when the container is unset.
    pub(crate) fn contained(&self, parent: &Entity) -> Result<Option<Vec<Entity>>> {
        let collection = self.relation.kind().is_collection();
        let entities = match parent.property(self.container()) {
            None | Some(Property::Value(Value::Null)) => return Ok(None),
            Some(Property::One(entity)) if !collection => vec![entity.as_ref().clone()],
            Some(Property::Many(list)) if collection => list.clone(),
            Some(other) => {
                return Err(self.error(format!(
                    "Relation container holds a {}, expected {}",
                    other.shape(),
                    if collection { "list" } else { "entity" }
                )));
            }
        };
        for entity in &entities {
            self.check_entity(entity)?;
        }
        Ok(Some(entities))
    }

    /// Put `entities` back into the parent's container in the shape of the
    /// relation kind.
    pub(crate) fn store(&self, parent: &mut Entity, mut entities: Vec<Entity>) {
        let property = if self.relation.kind().is_collection() {
            Property::Many(entities)
        } else {
            match entities.pop() {
                Some(entity) => Property::One(Box::new(entity)),
                None => return,
            }
        };
        parent.set_property(self.container(), property);
    }

    /// Set the relation's fixed referenced values on a related entity.
    pub(crate) fn apply_referenced_values(&self, related: &mut Entity) {
        for (field, value) in self.relation.referenced_values() {
            related.set(field.clone(), value.clone());
        }
    }

    /// Add one IN condition per pair, collecting the local side from `sources`.
    pub(crate) fn key_conditions<'e, I>(
        query: Query<'s, C>,
        keys: &[KeyPair],
        sources: I,
    ) -> Query<'s, C>
    where
        I: IntoIterator<Item = &'e Entity> + Clone,
    {
        keys.iter().fold(query, |query, key| {
            let values = distinct(
                sources
                    .clone()
                    .into_iter()
                    .map(|entity| entity.value(&key.local)),
            );
            query.condition(
                key.referenced.clone(),
                Operand::List(values),
                Comparison::Equal,
                Logical::And,
            )
        })
    }

    /// Add the relation's fixed referenced values as conditions.
    pub(crate) fn referenced_conditions(&self, query: Query<'s, C>) -> Query<'s, C> {
        self.relation
            .referenced_values()
            .iter()
            .fold(query, |query, (field, value)| {
                query.filter(field.clone(), value.clone())
            })
    }

    /// Replace the parent's container by the property of the same name found
    /// on the attached entities.
    pub(crate) fn flatten(&self, parent: &mut Entity) {
        let container = self.container();
        match parent.remove(container) {
            Some(Property::One(mut related)) => match related.remove(container) {
                Some(Property::Value(Value::Null)) | None => {
                    parent.set_property(container, Property::One(related));
                }
                Some(nested) => parent.set_property(container, nested),
            },
            Some(Property::Many(list)) => {
                let mut flattened = Vec::with_capacity(list.len());
                for mut related in list {
                    match related.remove(container) {
                        Some(Property::One(nested)) => flattened.push(*nested),
                        Some(Property::Many(nested)) => flattened.extend(nested),
                        Some(value @ Property::Value(_)) => {
                            related.set_property(container, value);
                            flattened.push(related);
                        }
                        None => flattened.push(related),
                    }
                }
                parent.set_property(container, Property::Many(flattened));
            }
            Some(other) => parent.set_property(container, other),
            None => {}
        }
    }

    pub(crate) fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Delete every related entity matching the parent's keys whose identity
    /// is not in `keep`.
    pub(crate) fn remove_orphans(&self, parent: &Entity, keep: &[Vec<Value>]) -> Result<()> {
        let query = self
            .relation
            .keys()
            .iter()
            .fold(self.plain(self.related, Operation::Read, None), |query, key| {
                query.filter(key.referenced.clone(), parent.value(&key.local))
            });
        let existing = self.referenced_conditions(query).execute()?.into_many()?;

        let mut removed = 0_usize;
        for entity in existing {
            if keep.contains(&self.related.identity(&entity)) {
                continue;
            }
            self.plain(self.related, Operation::Delete, Some(entity))
                .execute()?;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(
                relation = %self.container(),
                removed,
                "Removed orphaned related entities"
            );
        }
        Ok(())
    }
}

/// Deduplicate in first-seen order, dropping nulls.
pub(crate) fn distinct<I: IntoIterator<Item = Value>>(values: I) -> Vec<Value> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_null() && seen.insert(v.clone()))
        .collect()
}

/// Group entities by the values of `fields`.
pub(crate) fn index_by<'e>(
    entities: &'e [Entity],
    fields: &[&str],
) -> HashMap<Vec<Value>, Vec<&'e Entity>> {
    let mut index: HashMap<Vec<Value>, Vec<&'e Entity>> = HashMap::new();
    for entity in entities {
        index
            .entry(entity.values_of(fields.iter().copied()))
            .or_default()
            .push(entity);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dotted_requests() {
        let mut requests = Vec::new();
        RelationRequest::insert(&mut requests, "tags", true);
        RelationRequest::insert(&mut requests, "tags.tags", false);
        RelationRequest::insert(&mut requests, "author.profile", true);

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name, "tags");
        assert!(requests[0].transparent);
        assert_eq!(requests[0].nested, vec![RelationRequest::new("tags", false)]);
        assert_eq!(requests[1].name, "author");
        assert!(!requests[1].transparent);
        assert_eq!(requests[1].nested, vec![RelationRequest::new("profile", true)]);
    }

    #[test]
    fn test_distinct_drops_duplicates_and_nulls() {
        let values = distinct([
            Value::from(1),
            Value::Null,
            Value::from(2),
            Value::from(1),
        ]);
        assert_eq!(values, vec![Value::from(1), Value::from(2)]);
    }

    #[test]
    fn test_index_by_groups_key_tuples() {
        let entities = vec![
            Entity::new("A").with("k", 1).with("n", "x"),
            Entity::new("A").with("k", 1).with("n", "y"),
            Entity::new("A").with("k", 2).with("n", "z"),
        ];
        let index = index_by(&entities, &["k"]);
        assert_eq!(index[&vec![Value::from(1)]].len(), 2);
        assert_eq!(index[&vec![Value::from(2)]].len(), 1);
    }
}
