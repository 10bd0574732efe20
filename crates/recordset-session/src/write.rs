//! Create, update and delete through a record collection.
//!
//! Payloads are normalized to column-keyed [`FieldMap`]s before any store
//! access: keys may be field names or columns, and values are coerced to the
//! declared column type. Many-to-many values are written to the junction
//! table as a full replace; one-to-many and reverse one-to-one values are
//! owned by the other side's foreign key and are ignored here.

use std::sync::Arc;

use recordset_core::{Error, FieldInfo, FieldMap, ModelInfo, Payload, RelationshipKind, Result, Value};
use recordset_query::ID_COLUMN;

use crate::collection::RecordCollection;

/// Resolve keys to columns and coerce values to the field types.
pub(crate) fn normalize(model: &ModelInfo, map: FieldMap) -> Result<FieldMap> {
    let mut out = FieldMap::new();
    for (key, value) in map {
        let field = model.field_or_err(&key)?;
        let invalid = |expected: &str, found: &Value| Error::InvalidValue {
            model: model.name().to_string(),
            field: field.name.clone(),
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        };

        let value = match field.relation_kind() {
            Some(kind) if kind.is_multi() => {
                let ids = value.as_ids().ok_or_else(|| invalid("record ids", &value))?;
                Value::ids(&ids)
            }
            Some(_) => match value.as_i64() {
                Some(0) => Value::Null,
                Some(id) => Value::BigInt(id),
                None if value.is_null() => Value::Null,
                None => return Err(invalid("record id", &value)),
            },
            None => {
                let found = value.clone();
                field
                    .sql_type
                    .coerce(value)
                    .ok_or_else(|| invalid(field.sql_type.sql_name(), &found))?
            }
        };
        out.insert(field.column_name.clone(), value);
    }
    Ok(out)
}

/// Entries of `values` that live in the model's table.
fn stored_subset(model: &ModelInfo, values: &FieldMap) -> FieldMap {
    values
        .iter()
        .filter(|(column, _)| model.get_field(column).is_some_and(FieldInfo::is_stored))
        .map(|(column, value)| (column.clone(), value.clone()))
        .collect()
}

impl RecordCollection {
    /// Insert one record and return the singleton collection over it.
    ///
    /// The written stored values are cached, so reading them back needs no
    /// store access. `id` is only inserted when explicitly non-zero.
    #[tracing::instrument(level = "debug", skip(self, payload), fields(model = %self.model.name()))]
    pub fn create(&self, payload: impl Into<Payload>) -> Result<Self> {
        let model = Arc::clone(&self.model);
        let mut values = normalize(&model, payload.into().into_field_map())?;
        if values
            .get(ID_COLUMN)
            .is_some_and(|v| v.as_i64().unwrap_or(0) == 0)
        {
            values.remove(ID_COLUMN);
        }

        let stored = stored_subset(&model, &values);
        let stmt = self.env.compiler().insert(&model, &stored)?;
        let id = self.env.insert(&stmt)?;
        tracing::info!(model = model.name(), id, columns = stored.len(), "Created record");

        let created = self.with_ids(&[id]);
        self.env.cache_mut().add_record(model.name(), id, stored);
        created.write_relation_fields(&values)?;
        let changed: Vec<&str> = values.keys().map(String::as_str).collect();
        created.recompute_stored(&changed)?;
        Ok(created)
    }

    /// Write `payload` to every record of the collection.
    ///
    /// For a [`Payload::Record`], fields named in `unset_fields` and absent
    /// from the payload are set to NULL. A [`Payload::Map`] carries NULL
    /// values itself, so `unset_fields` is ignored for it. Cache entries of
    /// every record are dropped before the UPDATE is sent, whether or not it
    /// succeeds. Returns `false` when the collection is empty and nothing was
    /// written.
    #[tracing::instrument(level = "debug", skip(self, payload), fields(model = %self.model.name()))]
    pub fn write(&self, payload: impl Into<Payload>, unset_fields: &[&str]) -> Result<bool> {
        let rs = self.fetch()?;
        let model = Arc::clone(&rs.model);
        let payload = payload.into();
        let from_map = payload.is_map();
        let mut values = normalize(&model, payload.into_field_map())?;
        if !from_map {
            for name in unset_fields {
                let field = model.field_or_err(name)?;
                values
                    .entry(field.column_name.clone())
                    .or_insert(Value::Null);
            }
        }
        values.remove(ID_COLUMN);

        if rs.ids.is_empty() {
            return Ok(false);
        }

        rs.env.invalidate(model.name(), &rs.ids);

        let stored = stored_subset(&model, &values);
        if !stored.is_empty() {
            let stmt = rs.env.compiler().update(&rs.query, &stored)?;
            let affected = rs.env.execute(&stmt)?;
            tracing::info!(
                model = model.name(),
                ids = ?rs.ids,
                columns = stored.len(),
                affected,
                "Updated records"
            );
        }

        rs.write_relation_fields(&values)?;
        let changed: Vec<&str> = values.keys().map(String::as_str).collect();
        rs.recompute_stored(&changed)?;
        Ok(true)
    }

    /// Delete the records of the collection and return the affected count.
    ///
    /// Related records are not touched and cached entries of the deleted ids
    /// stay in place. A fetched empty collection deletes nothing without a
    /// round-trip; a pending one always sends its DELETE, so an unfiltered
    /// collection deletes every record of the model.
    #[tracing::instrument(level = "debug", skip(self), fields(model = %self.model.name()))]
    pub fn delete(&self) -> Result<u64> {
        if self.fetched && self.ids.is_empty() {
            return Ok(0);
        }
        let stmt = self.env.compiler().delete(&self.query)?;
        let affected = self.env.execute(&stmt)?;
        tracing::info!(model = self.model.name(), affected, "Deleted records");
        Ok(affected)
    }

    /// Alias of [`delete`](Self::delete).
    pub fn unlink(&self) -> Result<u64> {
        self.delete()
    }

    /// Replace junction rows of every many-to-many field in `values`.
    fn write_relation_fields(&self, values: &FieldMap) -> Result<()> {
        if self.ids.is_empty() {
            return Ok(());
        }
        let compiler = self.env.compiler();

        for (column, value) in values {
            let Some(field) = self.model.get_field(column) else {
                continue;
            };
            let Some(relation) = field
                .relation
                .as_ref()
                .filter(|r| r.kind == RelationshipKind::ManyToMany)
            else {
                continue;
            };
            let link = relation.link_table.as_ref().ok_or_else(|| Error::InvalidRegistry {
                model: self.model.name().to_string(),
                reason: format!("`{}` has no junction table", field.name),
            })?;
            let related = value.as_ids().unwrap_or_default();

            self.env.execute(&compiler.link_delete(link, &self.ids))?;
            for &id in &self.ids {
                for &their in &related {
                    self.env.execute(&compiler.link_insert(link, id, their))?;
                }
            }
            tracing::info!(
                model = self.model.name(),
                field = %field.name,
                ids = ?self.ids,
                related = related.len(),
                "Replaced junction rows"
            );

            let mut cache = self.env.cache_mut();
            for &id in &self.ids {
                cache.add_entry(self.model.name(), id, column, Value::ids(&related));
            }
        }
        Ok(())
    }

    /// Recompute and persist stored computed fields depending on `changed`.
    fn recompute_stored(&self, changed: &[&str]) -> Result<()> {
        let dependents = self.model.dependent_stored_computed(changed);
        if dependents.is_empty() {
            return Ok(());
        }
        let compiler = self.env.compiler();

        for &id in &self.ids {
            let record = self.with_ids(&[id]);
            let mut values = FieldMap::new();
            for field in &dependents {
                if let Some(rule) = &field.compute {
                    values.insert(field.column_name.clone(), rule.compute(&record)?);
                }
            }
            if values.is_empty() {
                continue;
            }
            let stmt = compiler.update(&record.query, &values)?;
            self.env.execute(&stmt)?;
            tracing::debug!(model = self.model.name(), id, fields = values.len(), "Recomputed stored fields");
            self.env.cache_mut().add_record(self.model.name(), id, values);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordset_core::{LinkTableInfo, SqlType};

    fn model() -> ModelInfo {
        ModelInfo::new("User", "users")
            .field(FieldInfo::new("Name", "name", SqlType::Text))
            .field(FieldInfo::new("Age", "age", SqlType::BigInt))
            .field(FieldInfo::many_to_one("Profile", "profile_id", "Profile"))
            .field(FieldInfo::one_to_many("Posts", "posts", "Post", "user_id"))
            .field(FieldInfo::many_to_many(
                "Tags",
                "tags",
                "Tag",
                LinkTableInfo::new("user_tags", "user_id", "tag_id"),
            ))
    }

    #[test]
    fn test_normalize_keys_and_types() {
        let mut map = FieldMap::new();
        map.insert("Name".into(), Value::from("Alice"));
        map.insert("age".into(), Value::Int(30));
        map.insert("Profile".into(), Value::Int(0));
        map.insert("tags".into(), Value::BigInt(4));

        let out = normalize(&model(), map).unwrap();
        assert_eq!(out.get("name"), Some(&Value::from("Alice")));
        assert_eq!(out.get("age"), Some(&Value::BigInt(30)));
        assert_eq!(out.get("profile_id"), Some(&Value::Null));
        assert_eq!(out.get("tags"), Some(&Value::ids(&[4])));
    }

    #[test]
    fn test_normalize_rejects_unknown_and_mistyped() {
        let mut unknown = FieldMap::new();
        unknown.insert("nickname".into(), Value::from("x"));
        assert!(matches!(
            normalize(&model(), unknown),
            Err(Error::UnknownField { .. })
        ));

        let mut mistyped = FieldMap::new();
        mistyped.insert("age".into(), Value::from("thirty"));
        assert!(matches!(
            normalize(&model(), mistyped),
            Err(Error::InvalidValue { field, .. }) if field == "Age"
        ));
    }

    #[test]
    fn test_stored_subset_skips_reverse_relations() {
        let mut values = FieldMap::new();
        values.insert("name".into(), Value::from("Alice"));
        values.insert("profile_id".into(), Value::BigInt(2));
        values.insert("posts".into(), Value::ids(&[1]));
        values.insert("tags".into(), Value::ids(&[3]));

        let stored = stored_subset(&model(), &values);
        let keys: Vec<&str> = stored.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "profile_id"]);
    }
}
