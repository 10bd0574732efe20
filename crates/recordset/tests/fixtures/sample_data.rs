//! Sample models: users with a profile, posts and tags.

use std::sync::Arc;

use recordset::core::ComputeRule;
use recordset::prelude::*;

use super::ScriptedConnection;

fn name_length(record: &dyn recordset::core::FieldReader) -> Result<Value> {
    let name = record.read("name")?;
    Ok(Value::BigInt(name.as_str().map_or(0, |s| s.chars().count() as i64)))
}

fn label(record: &dyn recordset::core::FieldReader) -> Result<Value> {
    let name = record.read("name")?;
    Ok(Value::Text(format!("<{}>", name.as_str().unwrap_or_default())))
}

pub fn registry() -> Arc<Registry> {
    let registry = Registry::builder()
        .model(
            ModelInfo::new("User", "users")
                .field(FieldInfo::new("Name", "name", SqlType::Text))
                .field(FieldInfo::new("Age", "age", SqlType::BigInt).nullable(true))
                .field(FieldInfo::many_to_one("Profile", "profile_id", "Profile").nullable(true))
                .field(FieldInfo::one_to_many("Posts", "posts", "Post", "user_id"))
                .field(FieldInfo::many_to_many(
                    "Tags",
                    "tags",
                    "Tag",
                    LinkTableInfo::new("user_tags", "user_id", "tag_id"),
                ))
                .field(FieldInfo::new("Bio", "bio", SqlType::Text).related("profile_id.bio"))
                .field(
                    FieldInfo::new("Label", "label", SqlType::Text)
                        .computed(ComputeRule::new(label).depends_on(["name"])),
                )
                .field(
                    FieldInfo::new("NameLength", "name_length", SqlType::BigInt)
                        .computed(ComputeRule::new(name_length).depends_on(["name"]))
                        .persisted(true),
                ),
        )
        .model(
            ModelInfo::new("Profile", "profiles")
                .field(FieldInfo::new("Bio", "bio", SqlType::Text))
                .field(FieldInfo::reverse_one_to_one("Owner", "owner", "User", "profile_id")),
        )
        .model(
            ModelInfo::new("Post", "posts")
                .field(FieldInfo::new("Title", "title", SqlType::Text))
                .field(FieldInfo::many_to_one("Author", "user_id", "User")),
        )
        .model(
            ModelInfo::new("Tag", "tags").field(FieldInfo::new("Label", "label", SqlType::Text)),
        )
        .build()
        .expect("sample registry is valid");
    Arc::new(registry)
}

/// An Environment over `conn` with the sample registry.
pub fn environment(conn: &ScriptedConnection) -> Environment {
    Environment::new(conn.clone(), registry())
}

/// A full `users` row in stored column order.
pub fn user_row(id: i64, name: &str, age: Option<i64>, profile_id: Option<i64>) -> Row {
    Row::from_pairs([
        ("id", Value::BigInt(id)),
        ("name", Value::from(name)),
        ("age", Value::from(age)),
        ("profile_id", Value::from(profile_id)),
        ("name_length", Value::BigInt(name.chars().count() as i64)),
    ])
}
