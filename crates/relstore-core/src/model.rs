//! Entity models.
//!
//! A [`Model`] describes how one entity type is stored: its table, fields,
//! indexes and relations. Every name reference is checked once, when the
//! model is built, after which the model is an immutable snapshot.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::{Error, ModelErrorKind, Result};
use crate::field::FieldInfo;
use crate::index::IndexInfo;
use crate::relationship::RelationInfo;
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct Model {
    entity: String,
    table: String,
    alias: Option<String>,
    fields: Vec<FieldInfo>,
    field_positions: HashMap<String, usize>,
    indexes: Vec<IndexInfo>,
    relations: Vec<RelationInfo>,
    primary: Vec<usize>,
    indexed: Vec<usize>,
}

impl Model {
    /// Assemble a model, failing when an index or relation refers to a
    /// field the model does not define.
    pub fn new(
        entity: impl Into<String>,
        table: impl Into<String>,
        fields: Vec<FieldInfo>,
        indexes: Vec<IndexInfo>,
        relations: Vec<RelationInfo>,
    ) -> Result<Self> {
        let table = table.into();
        if table.trim().is_empty() {
            return Err(Error::definition("Model table name can not be empty"));
        }
        let entity = {
            let entity = entity.into();
            let trimmed = entity.trim_start_matches(['\\', ':']);
            if trimmed.is_empty() {
                table.clone()
            } else {
                trimmed.to_string()
            }
        };

        let mut field_positions = HashMap::with_capacity(fields.len());
        for (pos, field) in fields.iter().enumerate() {
            if field_positions.insert(field.name().to_string(), pos).is_some() {
                return Err(Error::definition(format!(
                    "Duplicate field \"{}\" in entity model \"{}\"",
                    field.name(),
                    entity
                )));
            }
        }

        let lookup = |name: &str, context: &str| -> Result<usize> {
            field_positions.get(name).copied().ok_or_else(|| {
                Error::model(
                    ModelErrorKind::UnknownField,
                    format!("{context} field \"{name}\" does not exist in entity model \"{entity}\""),
                )
            })
        };

        let mut primary = Vec::new();
        let mut indexed = Vec::new();
        for index in &indexes {
            if index.is_primary() && !primary.is_empty() {
                return Err(Error::definition(format!(
                    "Entity model \"{entity}\" already has a primary index"
                )));
            }
            for name in index.fields() {
                let pos = lookup(name, "Index")?;
                if index.is_primary() {
                    primary.push(pos);
                }
                if !indexed.contains(&pos) {
                    indexed.push(pos);
                }
            }
        }

        for relation in &relations {
            for key in relation.keys() {
                lookup(&key.local, "Relation")?;
            }
            for (name, _) in relation.local_values() {
                lookup(name, "Relation")?;
            }
        }

        Ok(Self {
            entity,
            table,
            alias: None,
            fields,
            field_positions,
            indexes,
            relations,
            primary,
            indexed,
        })
    }

    /// Model without an entity type of its own, such as a mediator table.
    pub fn table_only(
        table: impl Into<String>,
        fields: Vec<FieldInfo>,
        indexes: Vec<IndexInfo>,
    ) -> Result<Self> {
        Self::new("", table, fields, indexes, Vec::new())
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Whether the model answers to `name` as table, entity type or alias.
    pub fn is_named(&self, name: &str) -> bool {
        let name = name.trim_start_matches(['\\', ':']);
        self.table == name || self.entity == name || self.alias.as_deref() == Some(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_positions.contains_key(name)
    }

    pub fn field(&self, name: &str) -> Result<&FieldInfo> {
        self.field_positions
            .get(name)
            .map(|&pos| &self.fields[pos])
            .ok_or_else(|| self.unknown_field(name))
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn is_primary(&self, name: &str) -> Result<bool> {
        let pos = self.position(name)?;
        Ok(self.primary.contains(&pos))
    }

    /// Fields of the primary index, in index order.
    pub fn primary_fields(&self) -> Vec<&FieldInfo> {
        self.primary.iter().map(|&pos| &self.fields[pos]).collect()
    }

    /// Every field taking part in at least one index, without duplicates.
    pub fn index_fields(&self) -> Vec<&FieldInfo> {
        self.indexed.iter().map(|&pos| &self.fields[pos]).collect()
    }

    pub fn is_index(&self, name: &str) -> Result<bool> {
        let pos = self.position(name)?;
        Ok(self.indexed.contains(&pos))
    }

    /// Indexes containing the field.
    pub fn in_index(&self, name: &str) -> Result<Vec<&IndexInfo>> {
        self.position(name)?;
        Ok(self.indexes.iter().filter(|i| i.has_field(name)).collect())
    }

    pub fn indexes(&self) -> &[IndexInfo] {
        &self.indexes
    }

    pub fn index(&self, name: &str) -> Result<&IndexInfo> {
        self.indexes
            .iter()
            .find(|i| i.name() == name)
            .ok_or_else(|| {
                Error::model(
                    ModelErrorKind::UnknownIndex,
                    format!(
                        "Unknown index \"{name}\" in entity model \"{}\"",
                        self.entity
                    ),
                )
            })
    }

    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }

    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.iter().any(|r| r.is_named(name))
    }

    pub fn relations(&self) -> &[RelationInfo] {
        &self.relations
    }

    /// Relation by container name or related entity type.
    pub fn relation(&self, name: &str) -> Result<&RelationInfo> {
        self.relations
            .iter()
            .find(|r| r.container() == name)
            .or_else(|| self.relations.iter().find(|r| r.is_named(name)))
            .ok_or_else(|| {
                Error::model(
                    ModelErrorKind::UnknownRelation,
                    format!(
                        "Unknown relation \"{name}\" in entity model \"{}\"",
                        self.entity
                    ),
                )
            })
    }

    /// Fields that identify a stored entity: the primary fields, or every
    /// field when the model has no primary index.
    pub fn identity_fields(&self) -> Vec<&FieldInfo> {
        if self.primary.is_empty() {
            self.fields.iter().collect()
        } else {
            self.primary_fields()
        }
    }

    /// Identity tuple of an entity of this model.
    pub fn identity(&self, entity: &Entity) -> Vec<Value> {
        self.identity_fields()
            .into_iter()
            .map(|f| entity.value(f.name()))
            .collect()
    }

    /// The auto-increment field, if any.
    pub fn auto_increment_field(&self) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.is_auto_increment())
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.field_positions
            .get(name)
            .copied()
            .ok_or_else(|| self.unknown_field(name))
    }

    fn unknown_field(&self, name: &str) -> Error {
        Error::model(
            ModelErrorKind::UnknownField,
            format!(
                "Unknown field \"{name}\" in entity model \"{}\"",
                self.entity
            ),
        )
    }
}
