//! Relation metadata.
//!
//! A relation ties an entity type to another through key pairs. Direct
//! relations (`one`, `many`) match local fields against fields of the
//! related model. Through relations (`oneTrough`, `manyTrough`) go via a
//! mediator table: parent fields match the mediator's in-keys and the
//! mediator's out-keys match the related model.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Parent has at most one related entity
    One,
    /// Parent has a list of related entities
    Many,
    /// One related entity through a mediator table
    OneThrough,
    /// Many related entities through a mediator table
    ManyThrough,
}

impl RelationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            RelationKind::One => "one",
            RelationKind::Many => "many",
            RelationKind::OneThrough => "oneTrough",
            RelationKind::ManyThrough => "manyTrough",
        }
    }

    pub const fn is_through(self) -> bool {
        matches!(self, RelationKind::OneThrough | RelationKind::ManyThrough)
    }

    /// Whether the container holds a list.
    pub const fn is_collection(self) -> bool {
        matches!(self, RelationKind::Many | RelationKind::ManyThrough)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "one" => Ok(RelationKind::One),
            "many" => Ok(RelationKind::Many),
            "oneTrough" | "oneThrough" => Ok(RelationKind::OneThrough),
            "manyTrough" | "manyThrough" => Ok(RelationKind::ManyThrough),
            other => Err(Error::definition(format!("Invalid relation type \"{other}\""))),
        }
    }
}

/// A local field matched against a referenced field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub local: String,
    pub referenced: String,
}

impl KeyPair {
    pub fn new(local: impl Into<String>, referenced: impl Into<String>) -> Result<Self> {
        let local = local.into();
        let referenced = referenced.into();
        assert_key_name(&local)?;
        assert_key_name(&referenced)?;
        Ok(Self { local, referenced })
    }
}

/// Mediator table of a through relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mediator {
    table: String,
    in_keys: Vec<KeyPair>,
    out_keys: Vec<KeyPair>,
}

impl Mediator {
    /// Mediator lookup key (table name or alias in the model bag).
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Parent field → mediator field.
    pub fn in_keys(&self) -> &[KeyPair] {
        &self.in_keys
    }

    /// Mediator field → related field.
    pub fn out_keys(&self) -> &[KeyPair] {
        &self.out_keys
    }
}

/// A relation declared on a model.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationInfo {
    entity: String,
    container: String,
    kind: RelationKind,
    keys: Vec<KeyPair>,
    local_values: Vec<(String, Value)>,
    referenced_values: Vec<(String, Value)>,
    mediator: Option<Mediator>,
}

impl RelationInfo {
    /// One-to-one relation on `(local, referenced)` key pairs.
    pub fn one<I, L, R>(entity: impl Into<String>, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        Self::direct(RelationKind::One, entity.into(), keys)
    }

    /// One-to-many relation on `(local, referenced)` key pairs.
    pub fn many<I, L, R>(entity: impl Into<String>, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        Self::direct(RelationKind::Many, entity.into(), keys)
    }

    /// One related entity reached through `mediator`.
    pub fn one_through<I, O, A, B, C, D>(
        entity: impl Into<String>,
        in_keys: I,
        out_keys: O,
        mediator: impl Into<String>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        O: IntoIterator<Item = (C, D)>,
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        Self::through(
            RelationKind::OneThrough,
            entity.into(),
            in_keys,
            out_keys,
            mediator.into(),
        )
    }

    /// Many related entities reached through `mediator`.
    pub fn many_through<I, O, A, B, C, D>(
        entity: impl Into<String>,
        in_keys: I,
        out_keys: O,
        mediator: impl Into<String>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        O: IntoIterator<Item = (C, D)>,
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        Self::through(
            RelationKind::ManyThrough,
            entity.into(),
            in_keys,
            out_keys,
            mediator.into(),
        )
    }

    fn direct<I, L, R>(kind: RelationKind, entity: String, keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = (L, R)>,
        L: Into<String>,
        R: Into<String>,
    {
        let keys = key_pairs(keys)?;
        if keys.is_empty() {
            return Err(Error::definition(format!(
                "No keys in relation to \"{entity}\""
            )));
        }
        Self::assemble(kind, entity, keys, None)
    }

    fn through<I, O, A, B, C, D>(
        kind: RelationKind,
        entity: String,
        in_keys: I,
        out_keys: O,
        mediator: String,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        O: IntoIterator<Item = (C, D)>,
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        let in_keys = key_pairs(in_keys)?;
        let out_keys = key_pairs(out_keys)?;
        if in_keys.is_empty() || out_keys.is_empty() {
            return Err(Error::definition(format!(
                "Both in and out keys must be set in relation to \"{entity}\""
            )));
        }
        if in_keys.len() != out_keys.len() {
            return Err(Error::definition(format!(
                "In and out keys must have the same number of fields in relation to \"{entity}\""
            )));
        }
        if mediator.trim().is_empty() {
            return Err(Error::definition(format!(
                "Missing mediator table in relation to \"{entity}\""
            )));
        }

        let keys = in_keys
            .iter()
            .zip(&out_keys)
            .map(|(i, o)| KeyPair {
                local: i.local.clone(),
                referenced: o.referenced.clone(),
            })
            .collect();

        Self::assemble(
            kind,
            entity,
            keys,
            Some(Mediator {
                table: mediator,
                in_keys,
                out_keys,
            }),
        )
    }

    fn assemble(
        kind: RelationKind,
        entity: String,
        keys: Vec<KeyPair>,
        mediator: Option<Mediator>,
    ) -> Result<Self> {
        let entity = entity.trim_start_matches(['\\', ':']).to_string();
        if entity.is_empty() {
            return Err(Error::definition("Relation entity can not be empty"));
        }
        let container = default_container(&entity).to_string();
        Ok(Self {
            entity,
            container,
            kind,
            keys,
            local_values: Vec::new(),
            referenced_values: Vec::new(),
            mediator,
        })
    }

    /// Override the container (property) name.
    pub fn with_container(mut self, container: impl Into<String>) -> Result<Self> {
        let container = container.into();
        assert_key_name(&container)?;
        self.container = container;
        Ok(self)
    }

    /// Only parents whose `field` equals `value` take part in the relation.
    pub fn with_local_value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Result<Self> {
        let field = field.into();
        assert_key_name(&field)?;
        self.local_values.push((field, value.into()));
        Ok(self)
    }

    /// Related entities always have `field` set to `value`.
    pub fn with_referenced_value(
        mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self> {
        let field = field.into();
        assert_key_name(&field)?;
        self.referenced_values.push((field, value.into()));
        Ok(self)
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Parent field → related field. For through relations these pair the
    /// in-key locals with the out-key referenced fields.
    pub fn keys(&self) -> &[KeyPair] {
        &self.keys
    }

    pub fn local_values(&self) -> &[(String, Value)] {
        &self.local_values
    }

    pub fn referenced_values(&self) -> &[(String, Value)] {
        &self.referenced_values
    }

    pub fn mediator(&self) -> Option<&Mediator> {
        self.mediator.as_ref()
    }

    /// Whether the relation is addressed by `name` (container or entity type).
    pub fn is_named(&self, name: &str) -> bool {
        self.container == name || self.entity == name.trim_start_matches(['\\', ':'])
    }
}

fn key_pairs<I, L, R>(pairs: I) -> Result<Vec<KeyPair>>
where
    I: IntoIterator<Item = (L, R)>,
    L: Into<String>,
    R: Into<String>,
{
    pairs
        .into_iter()
        .map(|(l, r)| KeyPair::new(l, r))
        .collect()
}

fn assert_key_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::definition("Relation key name can not be empty"));
    }
    if is_numeric(name) {
        return Err(Error::definition(format!(
            "Relation key name must be a string, got \"{name}\""
        )));
    }
    Ok(())
}

fn is_numeric(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit()) && s.trim().parse::<f64>().is_ok()
}

fn default_container(entity: &str) -> &str {
    entity
        .rsplit(['\\', ':'])
        .find(|segment| !segment.is_empty())
        .unwrap_or(entity)
}
