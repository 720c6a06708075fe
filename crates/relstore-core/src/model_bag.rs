//! Registry of models.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, ModelErrorKind, Result};
use crate::model::Model;

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"_?[^\w\d]+").expect("static pattern compiles"))
}

/// Owns every registered model and resolves them by alias, entity type or
/// table name.
#[derive(Debug, Clone, Default)]
pub struct ModelBag {
    models: Vec<Model>,
    by_alias: HashMap<String, usize>,
    by_entity: HashMap<String, usize>,
    by_table: HashMap<String, usize>,
}

impl ModelBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model under its own alias, or a sanitized table name.
    ///
    /// Later registrations win for any key they share with earlier ones.
    pub fn insert(&mut self, model: Model) -> &mut Self {
        let alias = match model.alias() {
            Some(alias) => alias.to_string(),
            None => sanitize_key(model.table()),
        };
        self.insert_as(model, alias)
    }

    /// Register a model under an explicit alias.
    pub fn insert_as(&mut self, model: Model, alias: impl Into<String>) -> &mut Self {
        let alias = alias.into();
        let pos = self.models.len();

        tracing::debug!(
            alias = %alias,
            entity = model.entity(),
            table = model.table(),
            "Registering model"
        );

        self.by_alias.insert(alias, pos);
        self.by_entity.insert(entity_key(model.entity()), pos);
        self.by_table.insert(model.table().to_string(), pos);
        self.models.push(model);
        self
    }

    /// Builder-style registration.
    pub fn with(mut self, model: Model) -> Self {
        self.insert(model);
        self
    }

    /// Resolve a model by alias, then entity type, then table name.
    pub fn get(&self, name: &str) -> Result<&Model> {
        self.position(name).map(|pos| &self.models[pos]).ok_or_else(|| {
            Error::model(
                ModelErrorKind::UnknownModel,
                format!("Model for entity \"{name}\" does not exist"),
            )
        })
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Registered models in registration order. Models replaced under every
    /// key are still listed.
    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.by_alias
            .get(name)
            .or_else(|| self.by_entity.get(&entity_key(name)))
            .or_else(|| self.by_table.get(name))
            .copied()
    }
}

fn entity_key(name: &str) -> String {
    name.trim_start_matches(['\\', ':']).to_string()
}

/// Replace runs of non-word characters (and a preceding underscore) with `_`.
pub fn sanitize_key(name: &str) -> String {
    non_word().replace_all(name, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldInfo, FieldType};

    fn model(entity: &str, table: &str) -> Model {
        Model::new(
            entity,
            table,
            vec![FieldInfo::of("id", FieldType::Integer).unwrap()],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_resolves_by_every_key() {
        let mut bag = ModelBag::new();
        bag.insert(model("app::User", "user"));
        bag.insert_as(model("app::Tag", "tag"), "labels");

        assert_eq!(bag.get("user").unwrap().entity(), "app::User");
        assert_eq!(bag.get("app::User").unwrap().table(), "user");
        assert_eq!(bag.get("::app::User").unwrap().table(), "user");
        assert_eq!(bag.get("labels").unwrap().table(), "tag");
        assert_eq!(bag.get("tag").unwrap().table(), "tag");
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn test_missing_model() {
        let bag = ModelBag::new();
        let err = bag.get("ghost").unwrap_err();
        assert!(matches!(
            err,
            Error::Model(ref e) if e.kind == ModelErrorKind::UnknownModel
        ));
        assert!(!bag.has("ghost"));
    }

    #[test]
    fn test_default_alias_is_sanitized_table() {
        assert_eq!(sanitize_key("schema.user-table"), "schema_user_table");
        assert_eq!(sanitize_key("a_.b"), "a_b");
        assert_eq!(sanitize_key("plain"), "plain");

        let bag = ModelBag::new().with(model("Row", "db.rows"));
        assert!(bag.has("db_rows"));
        assert!(bag.has("db.rows"));
    }

    #[test]
    fn test_last_registration_wins() {
        let bag = ModelBag::new()
            .with(model("First", "shared"))
            .with(model("Second", "shared"));
        assert_eq!(bag.get("shared").unwrap().entity(), "Second");
        assert_eq!(bag.get("First").unwrap().entity(), "First");
    }
}
