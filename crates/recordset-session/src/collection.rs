//! Lazy record collections.
//!
//! A [`RecordCollection`] is a cheap handle over zero or more records of one
//! model. Chaining calls (`filter`, `order_by`, ...) return new collections
//! with their own query; nothing runs until a terminal operation (`fetch`,
//! `load`, `get`, `len`, `records`, ...) needs data.
//!
//! # Fetch contract
//!
//! - A collection that was never fetched and has no condition stays empty.
//!   Building an empty chain never operates on the whole table.
//! - `fetch` on an already fetched collection returns it unchanged, without
//!   touching the store.
//! - `load` always runs, and with an empty condition loads every record.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use recordset_core::{
    Error, FieldInfo, FieldMap, FieldReader, ModelInfo, Record, RelationInfo, RelationshipKind,
    Result, Value,
};
use recordset_query::{Condition, ID_COLUMN, Operator, Query};

use crate::environment::Environment;

/// Value of a field read through [`RecordCollection::get`].
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// A scalar value.
    Value(Value),
    /// The records a relation field points at.
    Records(RecordCollection),
}

impl FieldValue {
    /// The scalar, if this is not a relation.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Records(_) => None,
        }
    }

    /// Take the scalar.
    pub fn into_value(self) -> Option<Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            FieldValue::Records(_) => None,
        }
    }

    /// The related records, if this is a relation.
    pub fn as_records(&self) -> Option<&RecordCollection> {
        match self {
            FieldValue::Records(r) => Some(r),
            FieldValue::Value(_) => None,
        }
    }

    /// Take the related records.
    pub fn into_records(self) -> Option<RecordCollection> {
        match self {
            FieldValue::Records(r) => Some(r),
            FieldValue::Value(_) => None,
        }
    }
}

/// A lazily evaluated set of records of one model.
#[derive(Clone)]
pub struct RecordCollection {
    pub(crate) model: Arc<ModelInfo>,
    pub(crate) env: Environment,
    pub(crate) query: Query,
    pub(crate) ids: Vec<i64>,
    pub(crate) fetched: bool,
}

impl fmt::Debug for RecordCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordCollection")
            .field("model", &self.model.name())
            .field("ids", &self.ids)
            .field("fetched", &self.fetched)
            .field("condition", self.query.condition())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RecordCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.ids.iter().map(ToString::to_string).collect();
        write!(f, "{}({})", self.model.name(), ids.join(","))
    }
}

impl RecordCollection {
    pub(crate) fn new(env: Environment, model: Arc<ModelInfo>) -> Self {
        Self {
            query: Query::new(Arc::clone(&model)),
            model,
            env,
            ids: Vec::new(),
            fetched: false,
        }
    }

    /// Name of the model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Model metadata.
    pub fn model(&self) -> &Arc<ModelInfo> {
        &self.model
    }

    /// The environment the collection lives in.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// The pending query.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Whether the collection is bound to ids.
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    fn derive(&self, query: Query) -> Self {
        Self {
            model: Arc::clone(&self.model),
            env: self.env.clone(),
            query,
            ids: Vec::new(),
            fetched: false,
        }
    }

    /// Records matching `field operator value` as well.
    pub fn filter(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        self.search(&Condition::new().and(field, operator, value))
    }

    /// Records not matching `field operator value`.
    pub fn exclude(&self, field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        let cond = Condition::new().and(field, operator, value);
        self.derive(self.query.clone().exclude(&cond))
    }

    /// Records matching `cond` as well.
    pub fn search(&self, cond: &Condition) -> Self {
        self.derive(self.query.clone().filter(cond))
    }

    /// At most `n` records.
    pub fn limit(&self, n: u64) -> Self {
        self.derive(self.query.clone().limit(n))
    }

    /// Skip `n` records.
    pub fn offset(&self, n: u64) -> Self {
        self.derive(self.query.clone().offset(n))
    }

    /// Order by expressions such as `"name"` or `"profile_id.age DESC"`.
    pub fn order_by<I, S>(&self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(self.query.clone().order_by(exprs))
    }

    /// Group by field paths.
    pub fn group_by<I, S>(&self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derive(self.query.clone().group_by(exprs))
    }

    /// De-duplicate rows.
    pub fn distinct(&self) -> Self {
        self.derive(self.query.clone().distinct())
    }

    /// A fetched collection over exactly `ids`.
    ///
    /// The query becomes `id IN ids`, keeping the orderings. Each id is
    /// recorded in the cache.
    pub fn with_ids(&self, ids: &[i64]) -> Self {
        {
            let mut cache = self.env.cache_mut();
            for id in ids {
                cache.add_entry(self.model.name(), *id, ID_COLUMN, Value::BigInt(*id));
            }
        }
        Self {
            model: Arc::clone(&self.model),
            env: self.env.clone(),
            query: self.query.for_ids(ids),
            ids: ids.to_vec(),
            fetched: true,
        }
    }

    /// Resolve the pending query to ids.
    ///
    /// Runs at most once per collection; see the module docs for the empty
    /// query rule.
    pub fn fetch(&self) -> Result<Self> {
        if !self.fetched && !self.query.is_empty() {
            return self.load(&[ID_COLUMN]);
        }
        Ok(self.clone())
    }

    /// Load `fields` (names, columns or dotted paths) into the cache.
    ///
    /// No fields means every stored field. One-to-many, many-to-many and
    /// reverse one-to-one fields are resolved per record after the main
    /// SELECT.
    #[tracing::instrument(level = "debug", skip(self), fields(model = %self.model.name()))]
    pub fn load(&self, fields: &[&str]) -> Result<Self> {
        let registry = Arc::clone(self.env.registry());
        let model_name = self.model.name();

        let requested: Vec<String> = if fields.is_empty() {
            self.model
                .stored_columns()
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            fields
                .iter()
                .map(|f| registry.column_path(model_name, f))
                .collect::<Result<_>>()?
        };

        let mut columns: Vec<String> = Vec::with_capacity(requested.len());
        let mut relations: Vec<&FieldInfo> = Vec::new();
        for path in &requested {
            if path.contains('.') {
                columns.push(path.clone());
                continue;
            }
            let field = self.model.field_or_err(path)?;
            if field.is_related() && !field.is_stored() {
                if let Some(related) = &field.related_path {
                    columns.push(registry.column_path(model_name, related)?);
                }
            } else if field.is_reverse_relation() {
                relations.push(field);
            } else if field.is_stored() {
                columns.push(path.clone());
            }
        }

        let stmt = self.env.compiler().select(&self.query, &columns)?;
        let rows = self.env.query(&stmt)?;

        let mut seen = HashSet::with_capacity(rows.len());
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = FieldMap::new();
            for (idx, path) in stmt.columns.iter().enumerate() {
                let value = row
                    .get_named(&path.replace('.', "__"))
                    .or_else(|| row.get(idx))
                    .cloned()
                    .unwrap_or(Value::Null);
                values.insert(path.clone(), value);
            }
            let id = values
                .get(ID_COLUMN)
                .and_then(Value::as_i64)
                .ok_or_else(|| Error::store_with_sql("row without id", stmt.sql.clone()))?;
            self.env
                .cache_mut()
                .add_loaded_row(&registry, model_name, id, &values)?;
            if seen.insert(id) {
                ids.push(id);
            }
        }
        tracing::debug!(records = ids.len(), "Loaded records");

        let loaded = self.with_ids(&ids);
        loaded.load_relation_fields(&relations)?;
        Ok(loaded)
    }

    /// Resolve reverse relation fields record by record.
    fn load_relation_fields(&self, fields: &[&FieldInfo]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let compiler = self.env.compiler();

        for &id in &self.ids {
            for field in fields {
                let Some(relation) = &field.relation else {
                    continue;
                };
                self.env
                    .track_relation_load(self.model.name(), &field.column_name);

                let value = match relation.kind {
                    RelationshipKind::OneToMany => Value::ids(&self.reverse_ids(relation, id)?),
                    RelationshipKind::ReverseOneToOne => {
                        let first = self.reverse_ids(relation, id)?.first().copied();
                        Value::BigInt(first.unwrap_or(0))
                    }
                    RelationshipKind::ManyToMany => {
                        let link = relation.link_table.as_ref().ok_or_else(|| {
                            self.registry_error(format!("`{}` has no junction table", field.name))
                        })?;
                        let rows = self.env.query(&compiler.link_select(link, id))?;
                        let related: Vec<i64> = rows
                            .iter()
                            .filter_map(|r| r.get(0).and_then(Value::as_i64))
                            .collect();
                        Value::ids(&related)
                    }
                    RelationshipKind::ManyToOne => continue,
                };
                self.env
                    .cache_mut()
                    .add_entry(self.model.name(), id, &field.column_name, value);
            }
        }
        Ok(())
    }

    /// Ids of `relation.target` whose reverse key points at `id`.
    fn reverse_ids(&self, relation: &RelationInfo, id: i64) -> Result<Vec<i64>> {
        let key = relation
            .reverse_key
            .as_deref()
            .ok_or_else(|| self.registry_error(format!("relation to `{}` has no reverse key", relation.target)))?;
        Ok(self
            .env
            .pool(&relation.target)?
            .filter(key, Operator::Equals, id)
            .fetch()?
            .ids)
    }

    fn registry_error(&self, reason: String) -> Error {
        Error::InvalidRegistry {
            model: self.model.name().to_string(),
            reason,
        }
    }

    /// Read a field of the first record.
    ///
    /// Relation fields come back as [`FieldValue::Records`] of the target
    /// model. On an empty collection the field's zero value is returned
    /// without store access.
    #[tracing::instrument(level = "debug", skip(self), fields(model = %self.model.name()))]
    pub fn get(&self, field: &str) -> Result<FieldValue> {
        let rs = self.fetch()?;
        let registry = Arc::clone(rs.env.registry());
        let model_name = rs.model.name();
        let steps = registry.resolve_path(model_name, field)?;
        let (_, info) = *steps
            .last()
            .ok_or_else(|| Error::unknown_field(model_name, field))?;

        let Some(&id) = rs.ids.first() else {
            return rs.zero_value(info);
        };

        if steps.len() > 1 {
            let path = registry.column_path(model_name, field)?;
            return rs.read_path(id, &path, info);
        }

        if info.is_computed() && !info.is_stored() {
            if let Some(rule) = &info.compute {
                let record = rs.with_ids(&[id]);
                let value = rule.compute(&record)?;
                return rs.wrap(info, value);
            }
        }

        if info.is_related() && !info.is_stored() {
            if let Some(related) = &info.related_path {
                let related_steps = registry.resolve_path(model_name, related)?;
                let (_, target) = *related_steps
                    .last()
                    .ok_or_else(|| Error::unknown_field(model_name, related.as_str()))?;
                let path = registry.column_path(model_name, related)?;
                return rs.read_path(id, &path, target);
            }
        }

        let column = info.column_name.as_str();
        if !rs.env.is_cached(model_name, id, column) {
            if info.is_reverse_relation() {
                rs.load(&[column])?;
            } else {
                rs.load(&[])?;
            }
        }
        let value = rs.env.cached(model_name, id, column).unwrap_or(Value::Null);
        rs.wrap(info, value)
    }

    /// Read a dotted column path, loading it on a cache miss.
    fn read_path(&self, id: i64, path: &str, info: &FieldInfo) -> Result<FieldValue> {
        if !self.env.is_cached(self.model.name(), id, path) {
            self.load(&[path])?;
        }
        let value = self
            .env
            .cached(self.model.name(), id, path)
            .unwrap_or(Value::Null);
        self.wrap(info, value)
    }

    fn zero_value(&self, info: &FieldInfo) -> Result<FieldValue> {
        match &info.relation {
            Some(relation) => Ok(FieldValue::Records(
                self.env.pool(&relation.target)?.with_ids(&[]),
            )),
            None => Ok(FieldValue::Value(info.sql_type.zero_value())),
        }
    }

    fn wrap(&self, info: &FieldInfo, value: Value) -> Result<FieldValue> {
        let Some(relation) = &info.relation else {
            return Ok(FieldValue::Value(value));
        };
        let ids = value.as_ids().ok_or_else(|| Error::InvalidValue {
            model: self.model.name().to_string(),
            field: info.name.clone(),
            expected: "record ids".to_string(),
            found: value.type_name().to_string(),
        })?;
        Ok(FieldValue::Records(
            self.env.pool(&relation.target)?.with_ids(&ids),
        ))
    }

    /// Read a field as a raw value: relation fields yield their id (or id
    /// list for one-to-many and many-to-many).
    pub fn read_value(&self, field: &str) -> Result<Value> {
        match self.get(field)? {
            FieldValue::Value(value) => Ok(value),
            FieldValue::Records(records) => {
                let registry = self.env.registry();
                let steps = registry.resolve_path(self.model.name(), field)?;
                let multi = steps
                    .last()
                    .and_then(|(_, f)| f.relation_kind())
                    .is_some_and(|k| k.is_multi());
                Ok(if multi {
                    Value::ids(&records.ids)
                } else {
                    records.ids.first().map_or(Value::Null, |id| Value::BigInt(*id))
                })
            }
        }
    }

    /// Set `field` to `value` on every record of the collection.
    pub fn set(&self, field: &str, value: impl Into<Value>) -> Result<()> {
        let rs = self.fetch()?;
        if rs.ids.is_empty() {
            return Err(Error::EmptyRecordSet {
                model: self.model.name().to_string(),
                operation: "set",
            });
        }
        let mut values = FieldMap::new();
        values.insert(field.to_string(), value.into());
        rs.write(values, &[])?;
        Ok(())
    }

    /// Ids of the collection, fetching first.
    pub fn ids(&self) -> Result<Vec<i64>> {
        Ok(self.fetch()?.ids)
    }

    /// Number of records, fetching first.
    pub fn len(&self) -> Result<usize> {
        Ok(self.fetch()?.ids.len())
    }

    /// Whether the collection holds no record.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// `SELECT COUNT(*)` of the pending query, without fetching ids.
    pub fn count(&self) -> Result<u64> {
        if self.fetched && self.ids.is_empty() {
            return Ok(0);
        }
        let stmt = self.env.compiler().count(&self.query)?;
        let value = self.env.query_scalar(&stmt)?;
        let count = value.as_i64().ok_or_else(|| {
            Error::store_with_sql(
                format!("COUNT returned {}", value.type_name()),
                stmt.sql.clone(),
            )
        })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Records in either collection.
    pub fn union(&self, other: &RecordCollection) -> Result<Self> {
        if self.model.name() != other.model.name() {
            return Err(Error::ModelMismatch {
                left: self.model.name().to_string(),
                right: other.model.name().to_string(),
            });
        }
        let left = self.fetch()?;
        let right = other.fetch()?;
        let mut seen = HashSet::with_capacity(left.ids.len() + right.ids.len());
        let ids: Vec<i64> = left
            .ids
            .iter()
            .chain(&right.ids)
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        Ok(self.with_ids(&ids))
    }

    /// Load every stored field, then split into singleton collections in
    /// loaded order.
    pub fn records(&self) -> Result<Vec<Self>> {
        let rs = self.load(&[])?;
        Ok(rs.ids.iter().map(|id| rs.with_ids(&[*id])).collect())
    }

    /// Fail unless the collection holds exactly one record.
    pub fn ensure_one(&self) -> Result<()> {
        let rs = self.fetch()?;
        if rs.ids.len() == 1 {
            Ok(())
        } else {
            Err(Error::NotSingleton {
                model: self.model.name().to_string(),
                len: rs.ids.len(),
            })
        }
    }

    fn check_target<T: Record>(&self) -> Result<()> {
        let registry = self.env.registry();
        for name in T::FIELDS {
            if registry.resolve_path(self.model.name(), name).is_err() {
                return Err(Error::InvalidTarget {
                    model: self.model.name().to_string(),
                    target: std::any::type_name::<T>(),
                    reason: format!("`{name}` is not a field of the model"),
                });
            }
        }
        Ok(())
    }

    fn to_record<T: Record>(&self, id: i64) -> Result<T> {
        let record = self.with_ids(&[id]);
        let mut values = FieldMap::new();
        for name in T::FIELDS {
            values.insert((*name).to_string(), record.read_value(name)?);
        }
        T::from_field_map(&values)
    }

    /// The first record as `T`, `None` on an empty collection.
    pub fn first<T: Record>(&self) -> Result<Option<T>> {
        self.check_target::<T>()?;
        let rs = self.fetch()?;
        let Some(&id) = rs.ids.first() else {
            return Ok(None);
        };
        let rs = rs.with_ids(&[id]).load(&[])?;
        rs.to_record(id).map(Some)
    }

    /// Every record as `T`, in collection order.
    pub fn all<T: Record>(&self) -> Result<Vec<T>> {
        self.check_target::<T>()?;
        let rs = self.fetch()?;
        if rs.ids.is_empty() {
            return Ok(Vec::new());
        }
        let rs = rs.load(&[])?;
        rs.ids.iter().map(|id| rs.to_record(*id)).collect()
    }
}

impl FieldReader for RecordCollection {
    fn model_name(&self) -> &str {
        self.model.name()
    }

    fn record_id(&self) -> Option<i64> {
        self.ids.first().copied()
    }

    fn read(&self, field: &str) -> Result<Value> {
        self.read_value(field)
    }
}
