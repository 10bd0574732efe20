//! Field definitions.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::record::FieldReader;
use crate::relationship::{LinkTableInfo, RelationInfo, RelationshipKind};
use crate::types::SqlType;
use crate::value::Value;

/// Signature of a field computation.
///
/// The closure receives a reader over the single record being computed.
pub type ComputeFn = Arc<dyn Fn(&dyn FieldReader) -> Result<Value> + Send + Sync>;

/// How a computed field obtains its value.
#[derive(Clone)]
pub struct ComputeRule {
    func: ComputeFn,
    depends_on: Vec<String>,
}

impl ComputeRule {
    /// Create a rule from a closure.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&dyn FieldReader) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
            depends_on: Vec::new(),
        }
    }

    /// Declare the fields whose change triggers recomputation of a stored
    /// computed field.
    #[must_use]
    pub fn depends_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Fields this rule depends on.
    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    /// Evaluate the rule for one record.
    pub fn compute(&self, record: &dyn FieldReader) -> Result<Value> {
        (self.func)(record)
    }
}

impl fmt::Debug for ComputeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeRule")
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Metadata about a model field.
#[derive(Debug, Clone)]
pub struct FieldInfo {
    /// Field name as used by application code (e.g. `"Profile"`).
    pub name: String,
    /// Column name, also the cache key (e.g. `"profile_id"`).
    pub column_name: String,
    /// Storage type. Relation fields are `BigInt` ids.
    pub sql_type: SqlType,
    /// Whether NULL is a legal stored value.
    pub nullable: bool,
    /// Relation metadata for relation fields.
    pub relation: Option<RelationInfo>,
    /// Computation rule for computed fields.
    pub compute: Option<ComputeRule>,
    /// Dotted path this field mirrors (related fields), e.g. `"profile_id.age"`.
    pub related_path: Option<String>,
    /// Whether a computed or related field is also persisted in a column.
    pub persisted: bool,
}

impl FieldInfo {
    /// Create a stored scalar field.
    pub fn new(name: impl Into<String>, column_name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            column_name: column_name.into(),
            sql_type,
            nullable: false,
            relation: None,
            compute: None,
            related_path: None,
            persisted: false,
        }
    }

    /// The identity column every model carries.
    pub fn id() -> Self {
        Self::new("ID", "id", SqlType::BigInt)
    }

    /// Many-to-one field stored in `column_name`.
    pub fn many_to_one(
        name: impl Into<String>,
        column_name: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::new(name, column_name, SqlType::BigInt)
            .nullable(true)
            .relation(RelationInfo::many_to_one(target))
    }

    /// One-to-many field resolved through `reverse_key` on `target`.
    pub fn one_to_many(
        name: impl Into<String>,
        column_name: impl Into<String>,
        target: impl Into<String>,
        reverse_key: impl Into<String>,
    ) -> Self {
        Self::new(name, column_name, SqlType::BigInt)
            .relation(RelationInfo::one_to_many(target, reverse_key))
    }

    /// Reverse one-to-one field resolved through `reverse_key` on `target`.
    pub fn reverse_one_to_one(
        name: impl Into<String>,
        column_name: impl Into<String>,
        target: impl Into<String>,
        reverse_key: impl Into<String>,
    ) -> Self {
        Self::new(name, column_name, SqlType::BigInt)
            .relation(RelationInfo::reverse_one_to_one(target, reverse_key))
    }

    /// Many-to-many field resolved through a junction table.
    pub fn many_to_many(
        name: impl Into<String>,
        column_name: impl Into<String>,
        target: impl Into<String>,
        link: LinkTableInfo,
    ) -> Self {
        Self::new(name, column_name, SqlType::BigInt)
            .relation(RelationInfo::many_to_many(target, link))
    }

    /// Set nullable flag.
    #[must_use]
    pub fn nullable(mut self, value: bool) -> Self {
        self.nullable = value;
        self
    }

    /// Attach relation metadata.
    #[must_use]
    pub fn relation(mut self, info: RelationInfo) -> Self {
        self.relation = Some(info);
        self
    }

    /// Make this a computed field.
    #[must_use]
    pub fn computed(mut self, rule: ComputeRule) -> Self {
        self.compute = Some(rule);
        self
    }

    /// Make this a related field mirroring `path`.
    #[must_use]
    pub fn related(mut self, path: impl Into<String>) -> Self {
        self.related_path = Some(path.into());
        self
    }

    /// Persist a computed or related field in its column.
    #[must_use]
    pub fn persisted(mut self, value: bool) -> Self {
        self.persisted = value;
        self
    }

    /// Whether the field is backed by a column of the model's table.
    #[must_use]
    pub fn is_stored(&self) -> bool {
        if let Some(rel) = &self.relation {
            return rel.kind.is_stored();
        }
        if self.compute.is_some() || self.related_path.is_some() {
            return self.persisted;
        }
        true
    }

    /// Whether the field has a computation rule.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        self.compute.is_some()
    }

    /// Whether the field mirrors a related path.
    #[must_use]
    pub fn is_related(&self) -> bool {
        self.related_path.is_some()
    }

    /// Whether the field is a relation of any kind.
    #[must_use]
    pub fn is_relation(&self) -> bool {
        self.relation.is_some()
    }

    /// Relation kind, if any.
    #[must_use]
    pub fn relation_kind(&self) -> Option<RelationshipKind> {
        self.relation.as_ref().map(|r| r.kind)
    }

    /// Whether the field is a relation owned by another table.
    #[must_use]
    pub fn is_reverse_relation(&self) -> bool {
        self.relation_kind().is_some_and(|k| k.is_reverse())
    }
}
