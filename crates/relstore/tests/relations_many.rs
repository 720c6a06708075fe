//! One-to-many relations.

mod fixtures;

use fixtures::*;
use relstore::prelude::*;

fn comment_row(id: i64, user: i64, body: &str) -> Row {
    row(&[
        ("id", Value::BigInt(id)),
        ("user_id", Value::BigInt(user)),
        ("body", Value::from(body)),
    ])
}

fn user_row(id: i64) -> Row {
    row(&[("id", Value::BigInt(id)), ("name", Value::from(format!("u{id}")))])
}

#[test]
fn test_read_groups_children_per_parent() {
    let (conn, storage) = storage();
    conn.respond("FROM `user`", vec![user_row(1), user_row(2), user_row(3)]);
    conn.respond(
        "FROM `comment`",
        vec![
            comment_row(10, 1, "a"),
            comment_row(11, 2, "b"),
            comment_row(12, 1, "c"),
        ],
    );

    let users = storage
        .read("User")
        .unwrap()
        .relation("comments", false)
        .execute()
        .unwrap()
        .into_many()
        .unwrap();

    assert_eq!(conn.count_matching("FROM `comment`"), 1);
    assert_eq!(
        conn.statements()[1],
        "SELECT `id`, `user_id`, `body` FROM `comment` WHERE `user_id` IN (?, ?, ?)"
    );

    let first: Vec<Value> = users[0]
        .related_many("comments")
        .unwrap()
        .iter()
        .map(|c| c.value("id"))
        .collect();
    assert_eq!(first, vec![Value::BigInt(10), Value::BigInt(12)]);
    assert_eq!(users[1].related_many("comments").unwrap().len(), 1);
    assert!(users[2].related_many("comments").is_none());
}

#[test]
fn test_write_stores_children_and_removes_orphans() {
    let (conn, storage) = storage();
    conn.respond("SELECT COUNT(*) AS `count` FROM `user`", vec![count_row(1)]);
    conn.respond("SELECT COUNT(*) AS `count` FROM `comment`", vec![count_row(1)]);
    conn.respond(
        "FROM `comment` WHERE `user_id` = ?",
        vec![
            comment_row(4, 1, "kept"),
            comment_row(6, 1, "stale"),
            comment_row(10, 1, "new"),
        ],
    );
    conn.set_next_insert_id(10);

    let user = Entity::new("User").with("id", 1).with("name", "ann").with_related(
        "comments",
        vec![
            Entity::new("Comment").with("body", "new"),
            Entity::new("Comment").with("id", 4).with("body", "kept"),
        ],
    );

    let written = storage
        .write(user)
        .unwrap()
        .relation("comments", false)
        .execute()
        .unwrap()
        .into_entity()
        .unwrap();

    assert_eq!(
        conn.count_matching("INSERT INTO `comment` (`user_id`, `body`) VALUES (?, ?)"),
        1
    );
    assert_eq!(conn.count_matching("UPDATE `comment`"), 1);
    assert_eq!(conn.count_matching("DELETE FROM `comment`"), 1);
    let delete = conn.position("DELETE FROM `comment`").unwrap();
    assert_eq!(conn.params(delete), vec![Value::BigInt(6)]);

    let comments = written.related_many("comments").unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].value("id"), Value::BigInt(10));
    assert!(comments.iter().all(|c| c.value("user_id") == Value::BigInt(1)));
}

#[test]
fn test_empty_list_removes_every_child() {
    let (conn, storage) = storage();
    conn.respond("SELECT COUNT(*) AS `count` FROM `user`", vec![count_row(1)]);
    conn.respond(
        "FROM `comment` WHERE `user_id` = ?",
        vec![comment_row(4, 1, "a"), comment_row(5, 1, "b")],
    );

    let user = Entity::new("User")
        .with("id", 1)
        .with("name", "ann")
        .with_related("comments", Vec::<Entity>::new());
    storage
        .write(user)
        .unwrap()
        .relation("comments", false)
        .execute()
        .unwrap();

    assert_eq!(conn.count_matching("DELETE FROM `comment`"), 2);
}

#[test]
fn test_unset_container_is_left_alone() {
    let (conn, storage) = storage();
    storage
        .write(Entity::new("User").with("name", "ann"))
        .unwrap()
        .relation("comments", false)
        .execute()
        .unwrap();
    assert_eq!(conn.count_matching("`comment`"), 0);
}

#[test]
fn test_delete_removes_children_before_parent() {
    let (conn, storage) = storage();
    let user = Entity::new("User").with("id", 1).with_related(
        "comments",
        vec![
            Entity::new("Comment").with("id", 4),
            Entity::new("Comment").with("id", 5),
        ],
    );

    storage
        .delete(user)
        .unwrap()
        .relation("comments", false)
        .execute()
        .unwrap();

    let statements = conn.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[2], "DELETE FROM `user` WHERE `id` = ?");
    assert_eq!(conn.params(0), vec![Value::BigInt(4)]);
    assert_eq!(conn.params(1), vec![Value::BigInt(5)]);
}

#[test]
fn test_clear_truncates_related_table_first() {
    let (conn, storage) = storage();
    storage
        .clear("User")
        .unwrap()
        .relation("comments", false)
        .execute()
        .unwrap();
    assert_eq!(
        conn.statements(),
        vec!["TRUNCATE TABLE `comment`", "TRUNCATE TABLE `user`"]
    );
}

#[test]
fn test_delete_where_rejects_relations() {
    let (conn, storage) = storage();
    let result = storage
        .delete_where("User")
        .unwrap()
        .filter("name", "ann")
        .relation("comments", false)
        .execute();
    assert!(result.is_err());
    assert!(conn.statements().is_empty());
}

fn article_models() -> ModelBag {
    let id = || {
        FieldInfo::new("id", FieldType::Integer, FieldAttributes::new().auto_increment()).unwrap()
    };
    let article = Model::new(
        "Article",
        "article",
        vec![id(), FieldInfo::of("kind", FieldType::Integer).unwrap()],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![
            RelationInfo::many("Note", [("id", "article_id")])
                .unwrap()
                .with_container("notes")
                .unwrap()
                .with_local_value("kind", 1)
                .unwrap()
                .with_referenced_value("lang", "en")
                .unwrap(),
        ],
    )
    .unwrap();
    let note = Model::new(
        "Note",
        "note",
        vec![
            id(),
            FieldInfo::of("article_id", FieldType::Integer).unwrap(),
            FieldInfo::of("lang", FieldType::String).unwrap(),
        ],
        vec![IndexInfo::primary(["id"]).unwrap()],
        vec![],
    )
    .unwrap();
    ModelBag::new().with(article).with(note)
}

#[test]
fn test_fixed_values_filter_reads() {
    let conn = MockConnection::new();
    let storage = Storage::new(conn.clone(), article_models());
    conn.respond(
        "FROM `article`",
        vec![
            row(&[("id", Value::BigInt(1)), ("kind", Value::BigInt(1))]),
            row(&[("id", Value::BigInt(2)), ("kind", Value::BigInt(0))]),
        ],
    );
    conn.respond(
        "FROM `note`",
        vec![row(&[
            ("id", Value::BigInt(4)),
            ("article_id", Value::BigInt(1)),
            ("lang", Value::from("en")),
        ])],
    );

    let articles = storage
        .read("Article")
        .unwrap()
        .relation("notes", false)
        .execute()
        .unwrap()
        .into_many()
        .unwrap();

    let read = conn.position("FROM `note`").unwrap();
    assert_eq!(
        conn.statements()[read],
        "SELECT `id`, `article_id`, `lang` FROM `note` WHERE `article_id` IN (?) AND `lang` = ?"
    );
    assert_eq!(conn.params(read), vec![Value::BigInt(1), Value::from("en")]);
    assert_eq!(articles[0].related_many("notes").unwrap().len(), 1);
    assert!(articles[1].related_many("notes").is_none());
}

#[test]
fn test_fixed_values_on_write() {
    let conn = MockConnection::new();
    let storage = Storage::new(conn.clone(), article_models());

    let skipped = Entity::new("Article")
        .with("kind", 0)
        .with_related("notes", vec![Entity::new("Note")]);
    storage
        .write(skipped)
        .unwrap()
        .relation("notes", false)
        .execute()
        .unwrap();
    assert_eq!(conn.count_matching("`note`"), 0);

    conn.clear_log();
    conn.set_next_insert_id(7);
    let article = Entity::new("Article")
        .with("kind", 1)
        .with_related("notes", vec![Entity::new("Note")]);
    let written = storage
        .write(article)
        .unwrap()
        .relation("notes", false)
        .execute()
        .unwrap()
        .into_entity()
        .unwrap();

    let note = &written.related_many("notes").unwrap()[0];
    assert_eq!(note.value("article_id"), Value::BigInt(7));
    assert_eq!(note.value("lang"), Value::from("en"));
    let cleanup = conn.position("SELECT `id`, `article_id`, `lang` FROM `note`").unwrap();
    assert_eq!(
        conn.statements()[cleanup],
        "SELECT `id`, `article_id`, `lang` FROM `note` WHERE `article_id` = ? AND `lang` = ?"
    );
}
