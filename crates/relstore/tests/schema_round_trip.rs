//! Schema statements through `Storage`, and table descriptions parsed back.

mod fixtures;

use fixtures::*;
use relstore::prelude::*;

fn description_row(
    pos: i64,
    column: &str,
    column_type: &str,
    auto_increment: bool,
    index: Option<(&str, &str)>,
) -> Row {
    let (index_name, index_type) = match index {
        Some((name, kind)) => (Value::from(name), Value::from(kind)),
        None => (Value::Null, Value::Null),
    };
    row(&[
        ("pos", Value::BigInt(pos)),
        ("table_name", Value::from("user")),
        ("column_name", Value::from(column)),
        ("column_type", Value::from(column_type)),
        ("column_length", Value::Null),
        ("column_precision", Value::Null),
        ("column_nullable", Value::from("NO")),
        (
            "column_auto_increment",
            Value::from(if auto_increment { "YES" } else { "NO" }),
        ),
        ("column_default", Value::Null),
        ("index_name", index_name),
        ("index_type", index_type),
        ("index_pos", Value::BigInt(1)),
    ])
}

#[test]
fn test_describe_matches_model_definition() {
    let (conn, storage) = storage();
    conn.respond(
        "c.ORDINAL_POSITION AS pos",
        vec![
            description_row(1, "id", "int(11)", true, Some(("PRIMARY", "PRIMARY KEY"))),
            description_row(2, "name", "text", false, None),
        ],
    );

    let described = storage.describe("User").unwrap();
    let expected = storage.schema("User", SchemaOperation::Create).unwrap();

    assert_eq!(described.table, "user");
    assert_eq!(described.columns, expected.columns());
    assert_eq!(described.indexes, expected.indexes());
    assert_eq!(conn.statements().len(), 1);
}

#[test]
fn test_describe_rejects_incomplete_rows() {
    let (conn, storage) = storage();
    conn.respond(
        "c.ORDINAL_POSITION AS pos",
        vec![row(&[("table_name", Value::from("user"))])],
    );
    let err = storage.describe("User").unwrap_err();
    assert!(matches!(err, Error::Builder(_)));
}

#[test]
fn test_table_exists() {
    let (conn, storage) = storage();
    assert!(!storage.table_exists("User").unwrap());

    conn.respond(
        "information_schema.TABLES",
        vec![row(&[("TABLE_NAME", Value::from("user"))])],
    );
    assert!(storage.table_exists("User").unwrap());
    assert_eq!(
        conn.statements()[0],
        "SELECT TABLE_NAME FROM information_schema.TABLES WHERE TABLE_NAME = 'user'"
    );
}

#[test]
fn test_configured_table_options_reach_create() {
    let config =
        StorageConfig::from_json(r#"{"table_options": {"engine": "MyISAM"}}"#).unwrap();
    let storage = Storage::new(MockConnection::new(), models()).with_config(config);

    let sql = storage
        .schema("Comment", SchemaOperation::Create)
        .unwrap()
        .build()
        .unwrap();
    assert!(sql.starts_with("CREATE TABLE comment ( id INT(11) NOT NULL AUTO_INCREMENT,"));
    assert!(sql.ends_with(") ENGINE=MyISAM DEFAULT CHARSET=utf8"));
}

#[test]
fn test_apply_schema_runs_each_postgres_statement() {
    let entry = Model::new(
        "Entry",
        "entry",
        vec![
            FieldInfo::of("id", FieldType::Integer).unwrap(),
            FieldInfo::of("title", FieldType::String).unwrap(),
        ],
        vec![
            IndexInfo::primary(["id"]).unwrap(),
            IndexInfo::index("title_idx", ["title"]).unwrap(),
        ],
        vec![],
    )
    .unwrap();
    let conn = MockConnection::new();
    let storage = Storage::new(conn.clone(), ModelBag::new().with(entry))
        .with_config(StorageConfig::new(Dialect::Postgres));

    storage
        .apply_schema("Entry", SchemaOperation::Create)
        .unwrap();

    let statements = conn.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("CREATE TABLE entry ("));
    assert!(statements[0].ends_with(")"));
    assert_eq!(statements[1], "CREATE INDEX entry_title_idx ON entry ( title )");
}

#[test]
fn test_apply_drop() {
    let (conn, storage) = storage();
    storage.apply_schema("Tag", SchemaOperation::Drop).unwrap();
    assert_eq!(conn.statements(), vec!["DROP TABLE IF EXISTS tag"]);
}
