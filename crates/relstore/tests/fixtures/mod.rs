//! Shared fixtures for relstore integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use relstore::prelude::*;

/// Everything the mock connection has seen and will answer.
#[derive(Debug, Default)]
pub struct MockState {
    /// Statements in execution order, with their parameters
    pub statements: Vec<(String, Vec<Value>)>,
    /// `(needle, rows)`: a query containing `needle` gets `rows`; first match wins
    pub responders: Vec<(String, Vec<Row>)>,
    pub next_insert_id: i64,
}

/// In-memory connection recording every statement.
#[derive(Debug, Clone, Default)]
pub struct MockConnection {
    state: Arc<Mutex<MockState>>,
}

impl MockConnection {
    pub fn new() -> Self {
        let conn = Self::default();
        conn.state.lock().unwrap().next_insert_id = 1;
        conn
    }

    /// Answer queries containing `needle` with `rows`.
    pub fn respond(&self, needle: &str, rows: Vec<Row>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responders
            .push((needle.to_string(), rows));
        self
    }

    pub fn set_next_insert_id(&self, id: i64) {
        self.state.lock().unwrap().next_insert_id = id;
    }

    pub fn statements(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .statements
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn params(&self, index: usize) -> Vec<Value> {
        self.state.lock().unwrap().statements[index].1.clone()
    }

    /// Number of statements containing `needle`.
    pub fn count_matching(&self, needle: &str) -> usize {
        self.statements()
            .iter()
            .filter(|sql| sql.contains(needle))
            .count()
    }

    /// Position of the first statement containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.statements().iter().position(|sql| sql.contains(needle))
    }

    pub fn clear_log(&self) {
        self.state.lock().unwrap().statements.clear();
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.state
            .lock()
            .unwrap()
            .statements
            .push((sql.to_string(), params.to_vec()));
    }
}

impl Connection for MockConnection {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.record(sql, params);
        let state = self.state.lock().unwrap();
        if let Some((_, rows)) = state
            .responders
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
        {
            return Ok(rows.clone());
        }
        if sql.starts_with("SELECT COUNT(*)") {
            return Ok(vec![count_row(0)]);
        }
        Ok(Vec::new())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.record(sql, params);
        Ok(1)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        self.record(sql, params);
        let mut state = self.state.lock().unwrap();
        let id = state.next_insert_id;
        state.next_insert_id += 1;
        Ok(id)
    }
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::from_pairs(pairs.iter().cloned())
}

pub fn count_row(count: i64) -> Row {
    row(&[("count", Value::BigInt(count))])
}

fn int(name: &str) -> FieldInfo {
    FieldInfo::of(name, FieldType::Integer).unwrap()
}

fn text(name: &str) -> FieldInfo {
    FieldInfo::of(name, FieldType::String).unwrap()
}

fn id() -> FieldInfo {
    FieldInfo::new("id", FieldType::Integer, FieldAttributes::new().auto_increment()).unwrap()
}

/// `User` with a `profile` (one), `comments` (many), `tags` (many through
/// `user_tag`), `favorite` (one through `user_favorite`) and `group` (one,
/// through the `Membership` entity).
pub fn user_model() -> Model {
    Model::new(
        "User",
        "user",
        vec![id(), text("name")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![
            RelationInfo::one("Profile", [("id", "user_id")])
                .unwrap()
                .with_container("profile")
                .unwrap(),
            RelationInfo::many("Comment", [("id", "user_id")])
                .unwrap()
                .with_container("comments")
                .unwrap(),
            RelationInfo::many_through("Tag", [("id", "user_id")], [("tag_id", "id")], "user_tag")
                .unwrap()
                .with_container("tags")
                .unwrap(),
            RelationInfo::one_through(
                "Tag",
                [("id", "user_id")],
                [("tag_id", "id")],
                "user_favorite",
            )
            .unwrap()
            .with_container("favorite")
            .unwrap(),
            RelationInfo::one("Membership", [("id", "user_id")])
                .unwrap()
                .with_container("group")
                .unwrap(),
        ],
    )
    .unwrap()
}

pub fn profile_model() -> Model {
    Model::new(
        "Profile",
        "profile",
        vec![id(), int("user_id"), text("bio")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![],
    )
    .unwrap()
}

pub fn comment_model() -> Model {
    Model::new(
        "Comment",
        "comment",
        vec![id(), int("user_id"), text("body")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![],
    )
    .unwrap()
}

pub fn tag_model() -> Model {
    Model::new(
        "Tag",
        "tag",
        vec![id(), text("name")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![],
    )
    .unwrap()
}

fn link_model(table: &str) -> Model {
    Model::table_only(
        table,
        vec![int("user_id"), int("tag_id")],
        vec![IndexInfo::primary(["user_id", "tag_id"]).unwrap()],
    )
    .unwrap()
}

pub fn membership_model() -> Model {
    Model::new(
        "Membership",
        "membership",
        vec![id(), int("user_id"), int("group_id")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![
            RelationInfo::one("Group", [("group_id", "id")])
                .unwrap()
                .with_container("group")
                .unwrap(),
        ],
    )
    .unwrap()
}

pub fn group_model() -> Model {
    Model::new(
        "Group",
        "group",
        vec![id(), text("name")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![],
    )
    .unwrap()
}

/// `Post` whose `author` is the `User` its `author_id` points at.
pub fn post_model() -> Model {
    Model::new(
        "Post",
        "post",
        vec![id(), int("author_id"), text("title")],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![
            RelationInfo::one("User", [("author_id", "id")])
                .unwrap()
                .with_container("author")
                .unwrap(),
        ],
    )
    .unwrap()
}

pub fn models() -> ModelBag {
    ModelBag::new()
        .with(user_model())
        .with(profile_model())
        .with(comment_model())
        .with(tag_model())
        .with(link_model("user_tag"))
        .with(link_model("user_favorite"))
        .with(membership_model())
        .with(group_model())
        .with(post_model())
}

pub fn storage() -> (MockConnection, Storage<MockConnection>) {
    let conn = MockConnection::new();
    let storage = Storage::new(conn.clone(), models());
    (conn, storage)
}
