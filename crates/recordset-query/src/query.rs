//! The pending query of a record collection.

use std::sync::Arc;

use recordset_core::{ModelInfo, Value};

use crate::condition::Condition;
use crate::operator::Operator;

/// Column holding record identities.
pub const ID_COLUMN: &str = "id";

/// Condition, ordering, grouping and paging over one model.
///
/// Every builder consumes the query and returns the modified value; record
/// collections clone their query before chaining so two collections never
/// share one.
#[derive(Debug, Clone)]
pub struct Query {
    model: Arc<ModelInfo>,
    cond: Condition,
    limit: Option<u64>,
    offset: Option<u64>,
    orders: Vec<String>,
    groups: Vec<String>,
    distinct: bool,
}

impl Query {
    /// A query matching every record of `model`.
    #[must_use]
    pub fn new(model: Arc<ModelInfo>) -> Self {
        Self {
            model,
            cond: Condition::new(),
            limit: None,
            offset: None,
            orders: Vec::new(),
            groups: Vec::new(),
            distinct: false,
        }
    }

    /// A query selecting exactly `ids`, carrying over the orderings of `self`.
    ///
    /// Paging and grouping are dropped: they described the set the ids came
    /// from, not the ids themselves.
    #[must_use]
    pub fn for_ids(&self, ids: &[i64]) -> Self {
        let mut next = Self::new(Arc::clone(&self.model));
        next.cond = Condition::new().and(ID_COLUMN, Operator::In, Value::ids(ids));
        next.orders.clone_from(&self.orders);
        next
    }

    /// Model the query runs against.
    #[must_use]
    pub fn model(&self) -> &Arc<ModelInfo> {
        &self.model
    }

    /// Current filter condition.
    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.cond
    }

    /// Whether the condition has no predicates.
    ///
    /// A query with an empty condition is treated as "no selection" when a
    /// collection is fetched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cond.is_empty()
    }

    /// Row limit.
    #[must_use]
    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    /// Row offset.
    #[must_use]
    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    /// Order expressions in application order.
    #[must_use]
    pub fn orders(&self) -> &[String] {
        &self.orders
    }

    /// Group expressions.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Whether rows are de-duplicated.
    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Whether the statement needs paging or grouping beyond a bare WHERE.
    #[must_use]
    pub fn is_windowed(&self) -> bool {
        self.limit.is_some() || self.offset.is_some() || self.distinct || !self.groups.is_empty()
    }

    /// AND `cond` into the current condition.
    #[must_use]
    pub fn filter(mut self, cond: &Condition) -> Self {
        self.cond = self.cond.and_cond(cond);
        self
    }

    /// AND NOT `cond` into the current condition.
    #[must_use]
    pub fn exclude(mut self, cond: &Condition) -> Self {
        self.cond = self.cond.and_not_cond(cond);
        self
    }

    /// Limit the number of rows.
    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip rows.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Append order expressions (`"field"`, `"field DESC"`).
    #[must_use]
    pub fn order_by<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.orders.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// Append group expressions.
    #[must_use]
    pub fn group_by<I, S>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(exprs.into_iter().map(Into::into));
        self
    }

    /// De-duplicate rows.
    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}
