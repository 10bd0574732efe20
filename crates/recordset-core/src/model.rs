//! Model metadata.

use crate::error::{Error, Result};
use crate::field::FieldInfo;

/// Static metadata of one model: its table and fields.
///
/// Built once at startup and shared read-only through the
/// [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone)]
pub struct ModelInfo {
    name: String,
    table_name: String,
    fields: Vec<FieldInfo>,
}

impl ModelInfo {
    /// Create a model with only its `id` column.
    pub fn new(name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            fields: vec![FieldInfo::id()],
        }
    }

    /// Add a field definition.
    ///
    /// A field reusing the name or column of an existing one replaces it.
    #[must_use]
    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields
            .retain(|f| f.name != field.name && f.column_name != field.column_name);
        self.fields.push(field);
        self
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// All field definitions in declaration order.
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Look up a field by name or column.
    pub fn get_field(&self, key: &str) -> Option<&FieldInfo> {
        self.fields
            .iter()
            .find(|f| f.column_name == key)
            .or_else(|| self.fields.iter().find(|f| f.name == key))
    }

    /// Look up a field, failing with [`Error::UnknownField`].
    pub fn field_or_err(&self, key: &str) -> Result<&FieldInfo> {
        self.get_field(key)
            .ok_or_else(|| Error::unknown_field(&self.name, key))
    }

    /// Columns of every field stored in the model's table.
    pub fn stored_columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.is_stored())
            .map(|f| f.column_name.as_str())
            .collect()
    }

    /// Stored computed fields whose rule depends on any of `changed`.
    ///
    /// `changed` holds column names.
    pub fn dependent_stored_computed<'a>(&'a self, changed: &[&str]) -> Vec<&'a FieldInfo> {
        self.fields
            .iter()
            .filter(|f| f.is_stored())
            .filter(|f| {
                f.compute.as_ref().is_some_and(|rule| {
                    rule.dependencies().iter().any(|dep| {
                        let dep_column = self
                            .get_field(dep)
                            .map_or(dep.as_str(), |d| d.column_name.as_str());
                        changed.contains(&dep_column)
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ComputeRule;
    use crate::types::SqlType;
    use crate::value::Value;

    fn user() -> ModelInfo {
        ModelInfo::new("User", "users")
            .field(FieldInfo::new("Name", "name", SqlType::Text))
            .field(FieldInfo::new("Age", "age", SqlType::Integer))
            .field(
                FieldInfo::new("Label", "label", SqlType::Text)
                    .computed(ComputeRule::new(|_| Ok(Value::Null)).depends_on(["Name"]))
                    .persisted(true),
            )
            .field(FieldInfo::one_to_many("Posts", "post_ids", "Post", "user_id"))
    }

    #[test]
    fn test_lookup_by_name_or_column() {
        let model = user();
        assert_eq!(model.field_or_err("Name").unwrap().column_name, "name");
        assert_eq!(model.field_or_err("age").unwrap().name, "Age");
        assert_eq!(model.field_or_err("ID").unwrap().column_name, "id");
        assert!(matches!(
            model.field_or_err("email"),
            Err(Error::UnknownField { .. })
        ));
    }

    #[test]
    fn test_stored_columns_skip_reverse_relations() {
        let model = user();
        assert_eq!(model.stored_columns(), vec!["id", "name", "age", "label"]);
    }

    #[test]
    fn test_dependent_stored_computed() {
        let model = user();
        let deps = model.dependent_stored_computed(&["name"]);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].column_name, "label");
        assert!(model.dependent_stored_computed(&["age"]).is_empty());
    }

    #[test]
    fn test_redeclared_field_replaces() {
        let model = ModelInfo::new("Tag", "tags")
            .field(FieldInfo::new("Name", "name", SqlType::Text))
            .field(FieldInfo::new("Name", "name", SqlType::Text).nullable(true));
        assert_eq!(model.fields().len(), 2);
        assert!(model.field_or_err("name").unwrap().nullable);
    }
}
