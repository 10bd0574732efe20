//! SQL compilation of queries against a model registry.
//!
//! Dotted field paths become `LEFT JOIN`s along many-to-one fields; each
//! joined table is aliased after the chain of columns that reached it
//! (`users__profile_id`). Conditions on one-to-many and many-to-many fields
//! become `id IN (sub-select)` membership tests. Parameters are collected in
//! placeholder order.

use recordset_core::{
    Error, FieldInfo, FieldMap, LinkTableInfo, ModelInfo, Registry, RelationshipKind, Result,
    Value,
};

use crate::condition::{Condition, Connector, Term};
use crate::dialect::Dialect;
use crate::expr;
use crate::operator::Operator;
use crate::query::{ID_COLUMN, Query};

/// A compiled statement: SQL text and positional parameters.
///
/// For SELECTs, `columns` holds the field path each selected column stands
/// for, in select-list order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<Value>,
    /// Field paths of the selected columns.
    pub columns: Vec<String>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self {
            sql,
            params,
            columns: Vec::new(),
        }
    }
}

/// Compiles queries and writes of one registry into SQL.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler<'r> {
    registry: &'r Registry,
    dialect: Dialect,
}

/// A resolved column reference.
struct ColumnRef<'r> {
    /// Qualified SQL expression (`"alias"."column"`).
    sql: String,
    /// Alias of the table owning the field.
    owner_alias: String,
    field: &'r FieldInfo,
}

struct Join {
    alias: String,
    sql: String,
}

/// Per-statement compilation state.
struct Scope<'r> {
    registry: &'r Registry,
    model: &'r ModelInfo,
    dialect: Dialect,
    joins: Vec<Join>,
    params: Vec<Value>,
}

impl<'r> Scope<'r> {
    fn new(registry: &'r Registry, model: &'r ModelInfo, dialect: Dialect) -> Self {
        Self {
            registry,
            model,
            dialect,
            joins: Vec::new(),
            params: Vec::new(),
        }
    }

    fn quote(&self, ident: &str) -> String {
        self.dialect.quote_ident(ident)
    }

    fn qualified(&self, alias: &str, column: &str) -> String {
        format!("{}.{}", self.quote(alias), self.quote(column))
    }

    fn root_id(&self) -> String {
        self.qualified(self.model.table_name(), ID_COLUMN)
    }

    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        self.dialect.placeholder(self.params.len())
    }

    fn join_sql(&self) -> String {
        self.joins.iter().map(|j| format!(" {}", j.sql)).collect()
    }

    /// Resolve a dotted path, registering the joins it traverses.
    ///
    /// A trailing related field that is not stored is replaced by the path it
    /// mirrors.
    fn resolve(&mut self, path: &str) -> Result<ColumnRef<'r>> {
        expr::validate_path(path)?;
        let registry = self.registry;
        let steps = registry.resolve_path(self.model.name(), path)?;
        let (last, hops) = steps
            .split_last()
            .ok_or_else(|| Error::invalid_expression(path, "empty field path"))?;

        let mut alias = self.model.table_name().to_string();
        for (owner, field) in hops {
            let relation = field
                .relation
                .as_ref()
                .ok_or_else(|| Error::invalid_expression(path, "path hop is not a relation"))?;
            let target = registry.model(&relation.target)?;
            let next = format!("{alias}__{}", field.column_name);
            if !self.joins.iter().any(|j| j.alias == next) {
                let sql = format!(
                    "LEFT JOIN {} AS {} ON {} = {}",
                    self.quote(target.table_name()),
                    self.quote(&next),
                    self.qualified(&next, ID_COLUMN),
                    self.qualified(&alias, &field.column_name),
                );
                tracing::trace!(model = owner.name(), alias = %next, "join");
                self.joins.push(Join {
                    alias: next.clone(),
                    sql,
                });
            }
            alias = next;
        }

        let (_, field) = *last;
        if field.is_related() && !field.is_stored() {
            if let Some(related) = &field.related_path {
                let mut prefix: Vec<&str> = hops.iter().map(|(_, f)| f.column_name.as_str()).collect();
                prefix.push(related.as_str());
                return self.resolve(&prefix.join("."));
            }
        }

        Ok(ColumnRef {
            sql: self.qualified(&alias, &field.column_name),
            owner_alias: alias,
            field,
        })
    }

    fn condition(&mut self, cond: &Condition) -> Result<String> {
        let mut sql = String::new();
        let mut previous: Option<Connector> = None;

        for (idx, predicate) in cond.predicates().iter().enumerate() {
            let mut term = match &predicate.term {
                Term::Compare {
                    field,
                    operator,
                    value,
                } => self.compare(field, *operator, value)?,
                Term::Group(inner) => format!("({})", self.condition(inner)?),
            };
            if predicate.negate {
                term = match predicate.term {
                    Term::Group(_) => format!("NOT {term}"),
                    Term::Compare { .. } => format!("NOT ({term})"),
                };
            }

            if idx == 0 {
                sql = term;
                continue;
            }
            // Mixed connectors group left to right.
            if previous.is_some_and(|c| c != predicate.connector) {
                sql = format!("({sql})");
            }
            sql = format!("{sql} {} {term}", predicate.connector.as_sql());
            previous = Some(predicate.connector);
        }

        Ok(sql)
    }

    fn compare(&mut self, path: &str, operator: Operator, value: &Value) -> Result<String> {
        let column = self.resolve(path)?;
        if column.field.is_computed() && !column.field.is_stored() {
            return Err(Error::invalid_expression(
                path,
                "computed field is not stored and cannot be filtered",
            ));
        }
        match column.field.relation.as_ref().map(|r| r.kind) {
            Some(kind) if !kind.is_stored() => self.relation_compare(&column, operator, value),
            _ => Ok(self.predicate(&column.sql, operator, value)),
        }
    }

    fn predicate(&mut self, lhs: &str, operator: Operator, value: &Value) -> String {
        let operator = match (operator, value) {
            (Operator::Equals, Value::Array(_)) => Operator::In,
            (Operator::NotEquals, Value::Array(_)) => Operator::NotIn,
            _ => operator,
        };

        match operator {
            Operator::Equals if value.is_null() => format!("{lhs} IS NULL"),
            Operator::NotEquals if value.is_null() => format!("{lhs} IS NOT NULL"),
            Operator::In | Operator::NotIn => {
                let items = match value {
                    Value::Array(items) => items.clone(),
                    Value::Null => Vec::new(),
                    other => vec![other.clone()],
                };
                let positive = operator == Operator::In;
                if items.is_empty() {
                    return (if positive { "1 = 0" } else { "1 = 1" }).to_string();
                }
                let placeholders: Vec<String> = items.into_iter().map(|v| self.bind(v)).collect();
                let keyword = if positive { "IN" } else { "NOT IN" };
                format!("{lhs} {keyword} ({})", placeholders.join(", "))
            }
            Operator::Contains | Operator::NotContains => {
                let needle = value
                    .as_str()
                    .map_or_else(|| value.to_string(), str::to_string);
                let ph = self.bind(Value::Text(format!("%{needle}%")));
                let keyword = if operator == Operator::Contains {
                    "LIKE"
                } else {
                    "NOT LIKE"
                };
                format!("{lhs} {keyword} {ph}")
            }
            _ => {
                let keyword = match operator {
                    Operator::Like => "LIKE",
                    Operator::ILike => self.dialect.ilike(),
                    Operator::NotLike => "NOT LIKE",
                    Operator::NotEquals => "!=",
                    other => other.as_str(),
                };
                let ph = self.bind(value.clone());
                format!("{lhs} {keyword} {ph}")
            }
        }
    }

    /// Membership test for a condition on a one-to-many, reverse one-to-one
    /// or many-to-many field.
    fn relation_compare(
        &mut self,
        column: &ColumnRef<'r>,
        operator: Operator,
        value: &Value,
    ) -> Result<String> {
        let registry = self.registry;
        let relation = column.field.relation.as_ref().ok_or_else(|| {
            Error::invalid_expression(&column.field.name, "not a relation field")
        })?;

        // `field = NULL` means "has no related record".
        let null_test = value.is_null() && matches!(operator, Operator::Equals | Operator::NotEquals);
        let (positive, mut negated) = match operator.positive() {
            Some(p) => (p, true),
            None => (operator, false),
        };
        if null_test {
            negated = !negated;
        }

        let sub = match relation.kind {
            RelationshipKind::OneToMany | RelationshipKind::ReverseOneToOne => {
                let target = registry.model(&relation.target)?;
                let reverse = relation.reverse_key.as_deref().ok_or_else(|| {
                    Error::invalid_expression(&column.field.name, "missing reverse key")
                })?;
                let reverse_column = &target.field_or_err(reverse)?.column_name;
                let table = self.quote(target.table_name());
                let selected = format!("{table}.{}", self.quote(reverse_column));
                let filter = if null_test {
                    format!("{selected} IS NOT NULL")
                } else {
                    let lhs = format!("{table}.{}", self.quote(ID_COLUMN));
                    self.predicate(&lhs, positive, value)
                };
                format!("SELECT {selected} FROM {table} WHERE {filter}")
            }
            RelationshipKind::ManyToMany => {
                let link = relation.link_table.as_ref().ok_or_else(|| {
                    Error::invalid_expression(&column.field.name, "missing junction table")
                })?;
                let table = self.quote(&link.table_name);
                let selected = format!("{table}.{}", self.quote(&link.our_column));
                if null_test {
                    format!("SELECT {selected} FROM {table}")
                } else {
                    let lhs = format!("{table}.{}", self.quote(&link.their_column));
                    let filter = self.predicate(&lhs, positive, value);
                    format!("SELECT {selected} FROM {table} WHERE {filter}")
                }
            }
            RelationshipKind::ManyToOne => return Ok(self.predicate(&column.sql, operator, value)),
        };

        let owner_id = self.qualified(&column.owner_alias, ID_COLUMN);
        let keyword = if negated { "NOT IN" } else { "IN" };
        Ok(format!("{owner_id} {keyword} ({sub})"))
    }

    fn where_clause(&mut self, cond: &Condition) -> Result<Option<String>> {
        if cond.is_empty() {
            return Ok(None);
        }
        self.condition(cond).map(Some)
    }

    fn group_list(&mut self, groups: &[String]) -> Result<Vec<String>> {
        groups
            .iter()
            .map(|g| {
                let path = expr::parse_group(g)?;
                Ok(self.resolve(&path)?.sql)
            })
            .collect()
    }

    fn order_list(&mut self, orders: &[String]) -> Result<Vec<String>> {
        orders
            .iter()
            .map(|o| {
                let order = expr::parse_order(o)?;
                let column = self.resolve(&order.path)?;
                Ok(format!("{} {}", column.sql, order.direction))
            })
            .collect()
    }

    fn paging(&self, query: &Query) -> String {
        let mut sql = String::new();
        if let Some(limit) = query.limit_value() {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = query.offset_value() {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    /// `WHERE ...` for UPDATE/DELETE: direct when the condition needs no
    /// joins or paging, otherwise an id sub-select.
    fn write_filter(&mut self, query: &Query) -> Result<String> {
        let Some(where_sql) = self.where_clause(query.condition())? else {
            if query.limit_value().is_none() && query.offset_value().is_none() {
                return Ok(String::new());
            }
            let sub = format!(
                "SELECT {} FROM {}{}",
                self.root_id(),
                self.quote(self.model.table_name()),
                self.paging(query)
            );
            return Ok(format!(" WHERE {} IN ({sub})", self.root_id()));
        };

        if self.joins.is_empty() && query.limit_value().is_none() && query.offset_value().is_none() {
            return Ok(format!(" WHERE {where_sql}"));
        }
        let sub = format!(
            "SELECT {} FROM {}{} WHERE {where_sql}{}",
            self.root_id(),
            self.quote(self.model.table_name()),
            self.join_sql(),
            self.paging(query)
        );
        Ok(format!(" WHERE {} IN ({sub})", self.root_id()))
    }
}

impl<'r> SqlCompiler<'r> {
    /// Compiler for `registry` in `dialect`.
    #[must_use]
    pub fn new(registry: &'r Registry, dialect: Dialect) -> Self {
        Self { registry, dialect }
    }

    /// Target dialect.
    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn scope(&self, model: &str) -> Result<Scope<'r>> {
        let model = self.registry.model(model)?;
        Ok(Scope::new(self.registry, model, self.dialect))
    }

    /// `SELECT` of `fields` (columns or dotted paths) for `query`.
    ///
    /// `id` is always selected first. Each prefix of a dotted path is
    /// selected too, so `profile_id.age` also yields `profile_id`.
    pub fn select(&self, query: &Query, fields: &[String]) -> Result<Statement> {
        let mut scope = self.scope(query.model().name())?;

        let mut columns: Vec<String> = vec![ID_COLUMN.to_string()];
        for path in fields {
            let segments: Vec<&str> = path.split('.').collect();
            for end in 1..=segments.len() {
                let prefix = segments[..end].join(".");
                if !columns.contains(&prefix) {
                    columns.push(prefix);
                }
            }
        }

        let mut select_list = Vec::with_capacity(columns.len());
        for path in &columns {
            let column = scope.resolve(path)?;
            if !column.field.is_stored() {
                return Err(Error::invalid_expression(path, "not a stored column"));
            }
            if path.contains('.') {
                let alias = scope.quote(&path.replace('.', "__"));
                select_list.push(format!("{} AS {alias}", column.sql));
            } else {
                select_list.push(column.sql);
            }
        }

        let where_sql = scope.where_clause(query.condition())?;
        let groups = scope.group_list(query.groups())?;
        let orders = scope.order_list(query.orders())?;

        let mut sql = format!(
            "SELECT {}{} FROM {}{}",
            if query.is_distinct() { "DISTINCT " } else { "" },
            select_list.join(", "),
            scope.quote(scope.model.table_name()),
            scope.join_sql()
        );
        if let Some(w) = where_sql {
            sql.push_str(" WHERE ");
            sql.push_str(&w);
        }
        if !groups.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&groups.join(", "));
        }
        if !orders.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&orders.join(", "));
        }
        sql.push_str(&scope.paging(query));

        Ok(Statement {
            sql,
            params: scope.params,
            columns,
        })
    }

    /// `SELECT COUNT(*)` of the records `query` matches.
    pub fn count(&self, query: &Query) -> Result<Statement> {
        let mut scope = self.scope(query.model().name())?;
        let where_sql = scope.where_clause(query.condition())?;
        let groups = scope.group_list(query.groups())?;
        let table = scope.quote(scope.model.table_name());

        let mut body = format!("{table}{}", scope.join_sql());
        if let Some(w) = where_sql {
            body.push_str(" WHERE ");
            body.push_str(&w);
        }

        let sql = if query.is_windowed() {
            let selected = if groups.is_empty() {
                scope.root_id()
            } else {
                groups.join(", ")
            };
            let mut inner = format!(
                "SELECT {}{selected} FROM {body}",
                if query.is_distinct() { "DISTINCT " } else { "" }
            );
            if !groups.is_empty() {
                inner.push_str(" GROUP BY ");
                inner.push_str(&groups.join(", "));
            }
            inner.push_str(&scope.paging(query));
            format!("SELECT COUNT(*) FROM ({inner}) AS {}", scope.quote("counted"))
        } else {
            format!("SELECT COUNT(*) FROM {body}")
        };

        Ok(Statement::new(sql, scope.params))
    }

    /// `INSERT` of `values` (column → value) into the table of `model`.
    ///
    /// Returns the new id through `RETURNING` where the dialect supports it.
    pub fn insert(&self, model: &ModelInfo, values: &FieldMap) -> Result<Statement> {
        let mut scope = self.scope(model.name())?;
        let table = scope.quote(model.table_name());

        let mut sql = if values.is_empty() {
            match self.dialect {
                Dialect::Mysql => format!("INSERT INTO {table} () VALUES ()"),
                Dialect::Postgres | Dialect::Sqlite => format!("INSERT INTO {table} DEFAULT VALUES"),
            }
        } else {
            let mut columns = Vec::with_capacity(values.len());
            let mut placeholders = Vec::with_capacity(values.len());
            for (column, value) in values {
                columns.push(scope.quote(column));
                placeholders.push(scope.bind(value.clone()));
            }
            format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                columns.join(", "),
                placeholders.join(", ")
            )
        };

        if self.dialect.supports_returning() {
            sql.push_str(&format!(" RETURNING {}", scope.quote(ID_COLUMN)));
        }

        Ok(Statement::new(sql, scope.params))
    }

    /// `UPDATE` setting `values` on every record `query` matches.
    ///
    /// SET parameters precede the WHERE parameters.
    pub fn update(&self, query: &Query, values: &FieldMap) -> Result<Statement> {
        if values.is_empty() {
            return Err(Error::invalid_expression(
                query.model().name(),
                "UPDATE without columns",
            ));
        }
        let mut scope = self.scope(query.model().name())?;
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, value)| {
                let column = scope.quote(column);
                let ph = scope.bind(value.clone());
                format!("{column} = {ph}")
            })
            .collect();
        let filter = scope.write_filter(query)?;
        let sql = format!(
            "UPDATE {} SET {}{filter}",
            scope.quote(scope.model.table_name()),
            assignments.join(", ")
        );
        Ok(Statement::new(sql, scope.params))
    }

    /// `DELETE` of every record `query` matches.
    pub fn delete(&self, query: &Query) -> Result<Statement> {
        let mut scope = self.scope(query.model().name())?;
        let filter = scope.write_filter(query)?;
        let sql = format!("DELETE FROM {}{filter}", scope.quote(scope.model.table_name()));
        Ok(Statement::new(sql, scope.params))
    }

    /// Ids linked to `our_id` through a junction table.
    #[must_use]
    pub fn link_select(&self, link: &LinkTableInfo, our_id: i64) -> Statement {
        let q = |s: &str| self.dialect.quote_ident(s);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            q(&link.their_column),
            q(&link.table_name),
            q(&link.our_column),
            self.dialect.placeholder(1)
        );
        Statement {
            sql,
            params: vec![Value::BigInt(our_id)],
            columns: vec![link.their_column.clone()],
        }
    }

    /// Remove every junction row of `our_ids`.
    #[must_use]
    pub fn link_delete(&self, link: &LinkTableInfo, our_ids: &[i64]) -> Statement {
        let q = |s: &str| self.dialect.quote_ident(s);
        let placeholders: Vec<String> = (1..=our_ids.len())
            .map(|i| self.dialect.placeholder(i))
            .collect();
        let sql = format!(
            "DELETE FROM {} WHERE {} IN ({})",
            q(&link.table_name),
            q(&link.our_column),
            placeholders.join(", ")
        );
        Statement::new(sql, our_ids.iter().copied().map(Value::BigInt).collect())
    }

    /// Insert one junction row.
    #[must_use]
    pub fn link_insert(&self, link: &LinkTableInfo, our_id: i64, their_id: i64) -> Statement {
        let q = |s: &str| self.dialect.quote_ident(s);
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ({}, {})",
            q(&link.table_name),
            q(&link.our_column),
            q(&link.their_column),
            self.dialect.placeholder(1),
            self.dialect.placeholder(2)
        );
        Statement::new(sql, vec![Value::BigInt(our_id), Value::BigInt(their_id)])
    }
}
