//! Per-environment record cache.
//!
//! Values are keyed by `(model, id)` and then by column name. The cache holds
//! the last known store state of every record loaded or written through one
//! Environment; there is no automatic eviction. Writes drop a record's entry
//! before the store statement runs, so a failed write never leaves a stale
//! value behind.

use std::collections::HashMap;

use recordset_core::{FieldMap, Registry, Result, Value};
use serde::Serialize;

/// Hit/miss counters of path lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Records dropped by invalidation.
    pub invalidations: u64,
}

/// Mapping `(model, id) -> FieldMap`.
#[derive(Debug, Default)]
pub struct Cache {
    records: HashMap<(String, i64), FieldMap>,
    stats: CacheStats,
}

impl Cache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lookup counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Store one field value of a record.
    pub fn add_entry(&mut self, model: &str, id: i64, column: &str, value: Value) {
        self.records
            .entry((model.to_string(), id))
            .or_default()
            .insert(column.to_string(), value);
    }

    /// Merge a field map into a record's entry.
    pub fn add_record(&mut self, model: &str, id: i64, fields: FieldMap) {
        self.records
            .entry((model.to_string(), id))
            .or_default()
            .extend(fields);
    }

    /// Store a row keyed by field paths.
    ///
    /// Plain keys go to `(model, id)`. A dotted key `a.b` goes to the record
    /// `a` points at, which must be present in the row as well; rows where
    /// the hop is NULL leave the related record untouched.
    pub fn add_loaded_row(
        &mut self,
        registry: &Registry,
        model: &str,
        id: i64,
        row: &FieldMap,
    ) -> Result<()> {
        for (path, value) in row {
            let Some((prefix, _)) = path.rsplit_once('.') else {
                self.add_entry(model, id, path, value.clone());
                continue;
            };
            let steps = registry.resolve_path(model, path)?;
            let Some((owner, field)) = steps.last() else {
                continue;
            };
            let owner_id = row.get(prefix).and_then(Value::as_i64).filter(|i| *i != 0);
            if let Some(owner_id) = owner_id {
                self.add_entry(owner.name(), owner_id, &field.column_name, value.clone());
            }
        }
        Ok(())
    }

    /// Full field map of a record.
    #[must_use]
    pub fn get_record(&self, model: &str, id: i64) -> Option<&FieldMap> {
        self.records.get(&(model.to_string(), id))
    }

    /// Walk `path` from `(model, id)` through many-to-one ids.
    ///
    /// A NULL or zero hop resolves the whole path to NULL.
    fn lookup(&self, registry: &Registry, model: &str, id: i64, path: &str) -> Option<Value> {
        let mut model = registry.get(model)?;
        let mut id = id;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let value = self.get_record(model.name(), id)?.get(segment)?;
            if segments.peek().is_none() {
                return Some(value.clone());
            }
            match value.as_i64() {
                Some(next) if next != 0 => id = next,
                _ => return Some(Value::Null),
            }
            let relation = model.get_field(segment)?.relation.as_ref()?;
            model = registry.get(&relation.target)?;
        }
        None
    }

    /// Whether `path` can be answered from the cache.
    #[must_use]
    pub fn contains(&self, registry: &Registry, model: &str, id: i64, path: &str) -> bool {
        self.lookup(registry, model, id, path).is_some()
    }

    /// Value at `path`, counting the hit or miss.
    pub fn get(&mut self, registry: &Registry, model: &str, id: i64, path: &str) -> Option<Value> {
        let value = self.lookup(registry, model, id, path);
        if value.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        value
    }

    /// Drop every cached field of a record.
    pub fn invalidate_record(&mut self, model: &str, id: i64) {
        if self.records.remove(&(model.to_string(), id)).is_some() {
            self.stats.invalidations += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordset_core::{FieldInfo, ModelInfo, SqlType};

    fn registry() -> Registry {
        Registry::builder()
            .model(
                ModelInfo::new("User", "users")
                    .field(FieldInfo::new("Name", "name", SqlType::Text))
                    .field(FieldInfo::many_to_one("Profile", "profile_id", "Profile")),
            )
            .model(
                ModelInfo::new("Profile", "profiles")
                    .field(FieldInfo::new("Age", "age", SqlType::Integer)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_entries_and_records() {
        let reg = registry();
        let mut cache = Cache::new();
        cache.add_entry("User", 1, "name", Value::from("Alice"));
        let mut more = FieldMap::new();
        more.insert("profile_id".into(), Value::BigInt(7));
        cache.add_record("User", 1, more);

        let record = cache.get_record("User", 1).unwrap();
        assert_eq!(record.len(), 2);
        assert!(cache.contains(&reg, "User", 1, "name"));
        assert!(!cache.contains(&reg, "User", 2, "name"));
        assert!(!cache.contains(&reg, "User", 1, "email"));
    }

    #[test]
    fn test_path_lookup_walks_many_to_one() {
        let reg = registry();
        let mut cache = Cache::new();
        let mut row = FieldMap::new();
        row.insert("id".into(), Value::BigInt(1));
        row.insert("profile_id".into(), Value::BigInt(7));
        row.insert("profile_id.age".into(), Value::Int(30));
        cache.add_loaded_row(&reg, "User", 1, &row).unwrap();

        assert_eq!(
            cache.get_record("Profile", 7).and_then(|r| r.get("age")),
            Some(&Value::Int(30))
        );
        assert_eq!(
            cache.get(&reg, "User", 1, "profile_id.age"),
            Some(Value::Int(30))
        );
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_null_hop_resolves_to_null() {
        let reg = registry();
        let mut cache = Cache::new();
        let mut row = FieldMap::new();
        row.insert("profile_id".into(), Value::Null);
        row.insert("profile_id.age".into(), Value::Null);
        cache.add_loaded_row(&reg, "User", 2, &row).unwrap();

        assert_eq!(cache.get(&reg, "User", 2, "profile_id.age"), Some(Value::Null));
        assert!(cache.get_record("Profile", 0).is_none());
    }

    #[test]
    fn test_invalidate_and_stats() {
        let reg = registry();
        let mut cache = Cache::new();
        cache.add_entry("User", 1, "name", Value::from("Alice"));
        cache.invalidate_record("User", 1);
        cache.invalidate_record("User", 1);

        assert_eq!(cache.get(&reg, "User", 1, "name"), None);
        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.invalidations, 1);
        assert_eq!(
            serde_json::to_value(stats).unwrap(),
            serde_json::json!({"hits": 0, "misses": 1, "invalidations": 1})
        );
    }
}
