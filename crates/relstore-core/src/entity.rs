//! Runtime entity instances.
//!
//! An [`Entity`] is a bag of named properties tagged with its entity type.
//! Plain properties hold a [`Value`]; relation containers hold one related
//! entity or a list of them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A property of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Property {
    Value(Value),
    One(Box<Entity>),
    Many(Vec<Entity>),
}

impl Property {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Property::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Shape name, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match self {
            Property::Value(_) => "value",
            Property::One(_) => "entity",
            Property::Many(_) => "list",
        }
    }
}

impl From<Value> for Property {
    fn from(v: Value) -> Self {
        Property::Value(v)
    }
}

impl From<Entity> for Property {
    fn from(e: Entity) -> Self {
        Property::One(Box::new(e))
    }
}

impl From<Vec<Entity>> for Property {
    fn from(list: Vec<Entity>) -> Self {
        Property::Many(list)
    }
}

/// An instance of a modelled entity type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    entity: String,
    properties: HashMap<String, Property>,
}

impl Entity {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into().trim_start_matches(['\\', ':']).to_string(),
            properties: HashMap::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Builder-style relation container setter.
    pub fn with_related(mut self, name: impl Into<String>, related: impl Into<Property>) -> Self {
        self.set_property(name, related.into());
        self
    }

    /// Entity type identifier.
    pub fn entity_type(&self) -> &str {
        &self.entity
    }

    pub fn is_instance_of(&self, entity: &str) -> bool {
        self.entity == entity.trim_start_matches(['\\', ':'])
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties
            .insert(name.into(), Property::Value(value.into()));
    }

    pub fn set_property(&mut self, name: impl Into<String>, property: Property) {
        self.properties.insert(name.into(), property);
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Property> {
        self.properties.remove(name)
    }

    /// Plain value of a property, `None` when unset or a container.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.get(name).and_then(Property::as_value)
    }

    /// Plain value of a property, `Null` when unset or a container.
    pub fn value(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or(Value::Null)
    }

    /// Values of several properties as a key tuple.
    pub fn values_of<'a, I>(&self, names: I) -> Vec<Value>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().map(|n| self.value(n)).collect()
    }

    /// Single related entity held in a container.
    pub fn related_one(&self, name: &str) -> Option<&Entity> {
        match self.properties.get(name) {
            Some(Property::One(e)) => Some(e),
            _ => None,
        }
    }

    /// Related entities held in a list container.
    pub fn related_many(&self, name: &str) -> Option<&[Entity]> {
        match self.properties.get(name) {
            Some(Property::Many(list)) => Some(list),
            _ => None,
        }
    }

    /// Iterate over all properties in arbitrary order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}
