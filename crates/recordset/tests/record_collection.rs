//! Read-side behavior of record collections against a scripted store.

mod fixtures;

use fixtures::*;
use recordset::prelude::*;

#[derive(Debug, PartialEq, Record)]
struct UserSummary {
    name: String,
    age: Option<i64>,
}

#[derive(Debug, PartialEq, Record)]
#[record(crate = "::recordset::core")]
struct Nickname {
    nickname: String,
}

fn scalar(value: FieldValue) -> Value {
    value.into_value().expect("scalar field")
}

fn related_ids(value: FieldValue) -> Vec<i64> {
    value.into_records().expect("relation field").ids().unwrap()
}

#[test]
fn empty_chain_never_touches_the_store() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);

    let users = env.pool("User").unwrap().order_by(["name"]).limit(10);
    assert!(users.is_empty().unwrap());
    assert_eq!(users.fetch().unwrap().ids().unwrap(), Vec::<i64>::new());
    assert_eq!(conn.statement_count(), 0);
}

#[test]
fn load_on_empty_chain_reads_every_record() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_rows(vec![
        user_row(1, "Alice", Some(30), None),
        user_row(2, "Bob", None, Some(7)),
    ]);

    let all = env.pool("User").unwrap().load(&[]).unwrap();
    assert_eq!(all.ids().unwrap(), vec![1, 2]);
    assert_eq!(
        conn.sql_log(),
        vec![
            "SELECT \"users\".\"id\", \"users\".\"name\", \"users\".\"age\", \"users\".\"profile_id\", \"users\".\"name_length\" FROM \"users\""
        ]
    );
}

#[test]
fn fetch_runs_once() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_ids(&[3, 1]);

    let alices = env
        .pool("User")
        .unwrap()
        .filter("name", Operator::Equals, "Alice");
    let fetched = alices.fetch().unwrap();
    let again = fetched.fetch().unwrap();

    assert_eq!(again.ids().unwrap(), vec![3, 1]);
    assert_eq!(again.to_string(), "User(3,1)");
    let log = conn.log();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0].sql,
        "SELECT \"users\".\"id\" FROM \"users\" WHERE \"users\".\"name\" = $1"
    );
    assert_eq!(log[0].params, vec![Value::from("Alice")]);
}

#[test]
fn duplicate_rows_collapse_to_one_id() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_ids(&[4, 4, 2]);

    let users = env
        .pool("User")
        .unwrap()
        .filter("age", Operator::Greater, 18)
        .fetch()
        .unwrap();
    assert_eq!(users.ids().unwrap(), vec![4, 2]);
}

#[test]
fn loaded_values_are_served_from_cache() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_rows(vec![Row::from_pairs([
        ("id", Value::BigInt(1)),
        ("name", Value::from("Alice")),
    ])]);

    let users = env
        .pool("User")
        .unwrap()
        .filter("name", Operator::Like, "A%")
        .load(&["Name"])
        .unwrap();
    assert_eq!(scalar(users.get("name").unwrap()), Value::from("Alice"));
    assert_eq!(scalar(users.get("Name").unwrap()), Value::from("Alice"));

    assert_eq!(conn.statement_count(), 1);
    assert_eq!(env.cache_stats().hits, 2);
}

#[test]
fn cache_miss_loads_every_stored_field() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_rows(vec![user_row(1, "Alice", Some(30), Some(7))]);

    let alice = env.pool("User").unwrap().with_ids(&[1]);
    assert_eq!(scalar(alice.get("age").unwrap()), Value::BigInt(30));
    assert_eq!(related_ids(alice.get("Profile").unwrap()), vec![7]);
    assert_eq!(scalar(alice.get("label").unwrap()), Value::from("<Alice>"));

    let log = conn.sql_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].ends_with("WHERE \"users\".\"id\" IN ($1)"));
}

#[test]
fn get_on_empty_collection_returns_zero_values() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    let nobody = env.pool("User").unwrap();

    assert_eq!(scalar(nobody.get("name").unwrap()), Value::Text(String::new()));
    assert_eq!(scalar(nobody.get("age").unwrap()), Value::BigInt(0));

    let profile = nobody.get("profile_id").unwrap().into_records().unwrap();
    assert_eq!(profile.model_name(), "Profile");
    assert!(profile.is_empty().unwrap());

    assert!(matches!(
        nobody.get("nickname"),
        Err(Error::UnknownField { .. })
    ));
    assert_eq!(conn.statement_count(), 0);
}

#[test]
fn dotted_paths_load_through_joins() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_rows(vec![
        Row::from_pairs([
            ("id", Value::BigInt(1)),
            ("profile_id", Value::BigInt(7)),
            ("profile_id__bio", Value::from("Hiker")),
        ]),
        Row::from_pairs([
            ("id", Value::BigInt(2)),
            ("profile_id", Value::Null),
            ("profile_id__bio", Value::Null),
        ]),
    ]);

    let users = env
        .pool("User")
        .unwrap()
        .with_ids(&[1, 2])
        .load(&["profile_id.bio"])
        .unwrap();
    let records = [users.with_ids(&[1]), users.with_ids(&[2])];

    assert_eq!(scalar(records[0].get("profile_id.bio").unwrap()), Value::from("Hiker"));
    assert_eq!(scalar(records[0].get("bio").unwrap()), Value::from("Hiker"));
    assert_eq!(scalar(records[1].get("Profile.Bio").unwrap()), Value::Null);

    let profile = env.pool("Profile").unwrap().with_ids(&[7]);
    assert_eq!(scalar(profile.get("bio").unwrap()), Value::from("Hiker"));

    let log = conn.sql_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].contains("\"users__profile_id\".\"bio\" AS \"profile_id__bio\""));
}

#[test]
fn ensure_one_checks_cardinality() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    let users = env.pool("User").unwrap();

    assert!(users.with_ids(&[1]).ensure_one().is_ok());
    assert!(matches!(
        users.with_ids(&[1, 2]).ensure_one(),
        Err(Error::NotSingleton { len: 2, .. })
    ));
    assert!(matches!(
        users.ensure_one(),
        Err(Error::NotSingleton { len: 0, .. })
    ));
}

#[test]
fn union_keeps_first_occurrence_order() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    let users = env.pool("User").unwrap();

    let both = users
        .with_ids(&[1, 2])
        .union(&users.with_ids(&[3, 2, 1]))
        .unwrap();
    assert_eq!(both.ids().unwrap(), vec![1, 2, 3]);

    let posts = env.pool("Post").unwrap().with_ids(&[1]);
    assert!(matches!(
        users.with_ids(&[1]).union(&posts),
        Err(Error::ModelMismatch { .. })
    ));
    assert_eq!(conn.statement_count(), 0);
}

#[test]
fn records_split_into_singletons() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_rows(vec![
        user_row(2, "Bob", None, None),
        user_row(1, "Alice", Some(30), None),
    ]);

    let records = env
        .pool("User")
        .unwrap()
        .filter("age", Operator::Greater, 0)
        .order_by(["name DESC"])
        .records()
        .unwrap();
    let names: Vec<Value> = records
        .iter()
        .map(|r| scalar(r.get("name").unwrap()))
        .collect();

    assert_eq!(names, vec![Value::from("Bob"), Value::from("Alice")]);
    assert_eq!(conn.statement_count(), 1);
}

#[test]
fn count_runs_without_fetching() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_rows(vec![Row::from_pairs([("count", 4_i64)])]);

    let adults = env
        .pool("User")
        .unwrap()
        .filter("age", Operator::GreaterOrEqual, 18);
    assert_eq!(adults.count().unwrap(), 4);
    assert!(!adults.is_fetched());
    assert_eq!(
        conn.sql_log(),
        vec!["SELECT COUNT(*) FROM \"users\" WHERE \"users\".\"age\" >= $1"]
    );

    assert_eq!(env.pool("User").unwrap().with_ids(&[]).count().unwrap(), 0);
    assert_eq!(conn.statement_count(), 1);
}

#[test]
fn one_to_many_loads_are_tracked_per_record() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_ids(&[1, 2, 3]);
    conn.reply_ids(&[10, 11]);
    conn.reply_ids(&[]);
    conn.reply_ids(&[12]);

    let users = env
        .pool("User")
        .unwrap()
        .with_ids(&[1, 2, 3])
        .load(&["posts"])
        .unwrap();

    assert_eq!(related_ids(users.get("posts").unwrap()), vec![10, 11]);
    assert_eq!(related_ids(users.with_ids(&[2]).get("Posts").unwrap()), Vec::<i64>::new());
    assert_eq!(related_ids(users.with_ids(&[3]).get("posts").unwrap()), vec![12]);

    let log = conn.sql_log();
    assert_eq!(log.len(), 4);
    assert_eq!(
        log[1],
        "SELECT \"posts\".\"id\" FROM \"posts\" WHERE \"posts\".\"user_id\" = $1"
    );

    let stats = env.relation_load_stats();
    assert_eq!(stats.total_loads, 3);
    assert_eq!(stats.potential_n1, 1);
    assert_eq!(
        serde_json::to_value(stats).unwrap(),
        serde_json::json!({"total_loads": 3, "relations_loaded": 1, "potential_n1": 1})
    );
    assert_eq!(env.relation_load_count("User", "Posts"), 3);
    assert_eq!(env.relation_load_count("User", "tags"), 0);

    env.reset_relation_loads();
    assert_eq!(env.relation_load_count("User", "posts"), 0);
    assert_eq!(env.relation_load_stats().total_loads, 0);
}

#[test]
fn reverse_one_to_one_keeps_the_first_match() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_ids(&[7, 8]);
    conn.reply_ids(&[1, 4]);
    conn.reply_ids(&[]);

    let profiles = env
        .pool("Profile")
        .unwrap()
        .with_ids(&[7, 8])
        .load(&["Owner"])
        .unwrap();

    let owner = profiles.get("owner").unwrap().into_records().unwrap();
    assert_eq!(owner.model_name(), "User");
    assert_eq!(owner.ids().unwrap(), vec![1]);
    assert_eq!(profiles.with_ids(&[8]).read_value("owner").unwrap(), Value::Null);
    assert_eq!(
        conn.sql_log()[1],
        "SELECT \"users\".\"id\" FROM \"users\" WHERE \"users\".\"profile_id\" = $1"
    );
}

#[test]
fn many_to_many_reads_the_junction_table() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    conn.reply_ids(&[1]);
    conn.reply_rows(vec![
        Row::from_pairs([("tag_id", 2_i64)]),
        Row::from_pairs([("tag_id", 3_i64)]),
    ]);

    let alice = env.pool("User").unwrap().with_ids(&[1]);
    let tags = alice.get("tags").unwrap().into_records().unwrap();
    assert_eq!(tags.model_name(), "Tag");
    assert_eq!(tags.ids().unwrap(), vec![2, 3]);
    assert_eq!(alice.read_value("tags").unwrap(), Value::ids(&[2, 3]));

    let log = conn.sql_log();
    assert_eq!(log.len(), 2);
    assert_eq!(
        log[1],
        "SELECT \"tag_id\" FROM \"user_tags\" WHERE \"user_id\" = $1"
    );
}

#[test]
fn typed_first_and_all() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    let adults = env
        .pool("User")
        .unwrap()
        .filter("age", Operator::GreaterOrEqual, 18);

    conn.reply_ids(&[1, 2]);
    conn.reply_rows(vec![user_row(1, "Alice", Some(30), None)]);
    let first: Option<UserSummary> = adults.first().unwrap();
    assert_eq!(
        first,
        Some(UserSummary {
            name: "Alice".to_string(),
            age: Some(30),
        })
    );

    conn.reply_ids(&[1, 2]);
    conn.reply_rows(vec![
        user_row(1, "Alice", Some(30), None),
        user_row(2, "Bob", Some(41), None),
    ]);
    let all: Vec<UserSummary> = adults.all().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].name, "Bob");

    let none: Option<UserSummary> = env.pool("User").unwrap().first().unwrap();
    assert!(none.is_none());
}

#[test]
fn typed_access_rejects_unknown_fields() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    let alice = env.pool("User").unwrap().with_ids(&[1]);

    assert!(matches!(
        alice.first::<Nickname>(),
        Err(Error::InvalidTarget { .. })
    ));
    assert_eq!(conn.statement_count(), 0);
}

#[test]
fn clones_share_the_cache() {
    let conn = ScriptedConnection::new();
    let env = environment(&conn);
    let other = env.clone();
    let _ = other.pool("User").unwrap().with_ids(&[5]);

    assert!(env.same_cache(&other));
    assert!(env.cache().get_record("User", 5).is_some());
    assert!(!env.same_cache(&environment(&conn)));
}
