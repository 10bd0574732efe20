//! The unit-of-work context shared by record collections.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use recordset_core::{Connection, Registry, Result, Row, Value};
use recordset_query::{SqlCompiler, Statement};

use crate::cache::{Cache, CacheStats};
use crate::collection::RecordCollection;
use crate::config::EnvironmentConfig;
use crate::tracker::{RelationLoadStats, RelationLoadTracker};

/// Connection, cache and registry of one unit of work.
///
/// Cloning an Environment aliases the same connection and cache. The type is
/// `!Send`: one Environment belongs to one thread of control.
#[derive(Clone)]
pub struct Environment {
    conn: Rc<dyn Connection>,
    cache: Rc<RefCell<Cache>>,
    registry: Arc<Registry>,
    config: Rc<EnvironmentConfig>,
    tracker: Rc<RefCell<RelationLoadTracker>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("cached_records", &self.cache.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Create an environment with the default configuration.
    pub fn new<C: Connection + 'static>(conn: C, registry: Arc<Registry>) -> Self {
        Self::with_config(conn, registry, EnvironmentConfig::default())
    }

    /// Create an environment with a custom configuration.
    pub fn with_config<C: Connection + 'static>(
        conn: C,
        registry: Arc<Registry>,
        config: EnvironmentConfig,
    ) -> Self {
        Self::from_shared(Rc::new(conn), registry, config)
    }

    /// Create an environment over an already shared connection.
    pub fn from_shared(
        conn: Rc<dyn Connection>,
        registry: Arc<Registry>,
        config: EnvironmentConfig,
    ) -> Self {
        let mut tracker =
            RelationLoadTracker::new().with_threshold(config.relation_load_threshold);
        if !config.track_relation_loads {
            tracker.disable();
        }
        Self {
            conn,
            cache: Rc::new(RefCell::new(Cache::new())),
            registry,
            config: Rc::new(config),
            tracker: Rc::new(RefCell::new(tracker)),
        }
    }

    /// An empty collection of `model`.
    pub fn pool(&self, model: &str) -> Result<RecordCollection> {
        let model = Arc::clone(self.registry.model(model)?);
        Ok(RecordCollection::new(self.clone(), model))
    }

    /// The model registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The configuration.
    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Statement compiler for this environment's registry and dialect.
    pub fn compiler(&self) -> SqlCompiler<'_> {
        SqlCompiler::new(&self.registry, self.config.dialect)
    }

    /// Read access to the cache.
    ///
    /// The borrow must be released before any collection operation runs.
    pub fn cache(&self) -> Ref<'_, Cache> {
        self.cache.borrow()
    }

    pub(crate) fn cache_mut(&self) -> RefMut<'_, Cache> {
        self.cache.borrow_mut()
    }

    /// Cache hit/miss counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    /// Relation load counters.
    pub fn relation_load_stats(&self) -> RelationLoadStats {
        self.tracker.borrow().stats()
    }

    /// Per-record loads of one relation field so far. `field` is a field
    /// name or column.
    pub fn relation_load_count(&self, model: &str, field: &str) -> usize {
        let column = self
            .registry
            .get(model)
            .and_then(|m| m.get_field(field))
            .map_or(field, |f| f.column_name.as_str());
        self.tracker.borrow().count_for(model, column)
    }

    /// Forget every relation load counted so far.
    pub fn reset_relation_loads(&self) {
        self.tracker.borrow_mut().reset();
    }

    /// Whether two handles alias the same cache.
    pub fn same_cache(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.cache, &other.cache)
    }

    pub(crate) fn cached(&self, model: &str, id: i64, path: &str) -> Option<Value> {
        self.cache.borrow_mut().get(&self.registry, model, id, path)
    }

    pub(crate) fn is_cached(&self, model: &str, id: i64, path: &str) -> bool {
        self.cache.borrow().contains(&self.registry, model, id, path)
    }

    pub(crate) fn invalidate(&self, model: &str, ids: &[i64]) {
        let mut cache = self.cache.borrow_mut();
        for id in ids {
            cache.invalidate_record(model, *id);
        }
    }

    pub(crate) fn track_relation_load(&self, model: &str, field: &str) {
        self.tracker.borrow_mut().record_load(model, field);
    }

    fn log(&self, kind: &'static str, stmt: &Statement) {
        if self.config.log_statements {
            tracing::debug!(kind, sql = %stmt.sql, params = stmt.params.len(), "Executing statement");
        }
    }

    pub(crate) fn query(&self, stmt: &Statement) -> Result<Vec<Row>> {
        self.log("query", stmt);
        self.conn.query(&stmt.sql, &stmt.params)
    }

    pub(crate) fn execute(&self, stmt: &Statement) -> Result<u64> {
        self.log("execute", stmt);
        self.conn.execute(&stmt.sql, &stmt.params)
    }

    pub(crate) fn query_scalar(&self, stmt: &Statement) -> Result<Value> {
        self.log("scalar", stmt);
        self.conn.query_scalar(&stmt.sql, &stmt.params)
    }

    pub(crate) fn insert(&self, stmt: &Statement) -> Result<i64> {
        self.log("insert", stmt);
        self.conn.insert(&stmt.sql, &stmt.params)
    }
}
