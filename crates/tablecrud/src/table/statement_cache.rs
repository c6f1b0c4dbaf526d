use crate::error::{CrudError, CrudResult, ExecutionStage};
use crate::value::Value;
use std::collections::HashMap;

/// A compiled statement owned by one table handle.
#[derive(Debug)]
pub(super) struct CompiledStatement<S> {
    sql: String,
    handle: S,
    param_count: usize,
    bound: Vec<Value>,
}

impl<S> CompiledStatement<S> {
    pub(super) fn new(sql: String, handle: S, param_count: usize) -> Self {
        Self {
            sql,
            handle,
            param_count,
            bound: Vec::new(),
        }
    }

    pub(super) fn handle(&self) -> &S {
        &self.handle
    }

    pub(super) fn bound(&self) -> &[Value] {
        &self.bound
    }

    /// Replace every bound parameter.
    ///
    /// On any failure, including a value that could not be coerced to its tag,
    /// the previous bindings are cleared, so nothing from an earlier call can be
    /// executed.
    pub(super) fn rebind(&mut self, params: CrudResult<Vec<Value>>) -> CrudResult<()> {
        let params = match params {
            Ok(params) => params,
            Err(err) => {
                self.bound.clear();
                return Err(err);
            }
        };
        if params.len() != self.param_count {
            self.bound.clear();
            return Err(CrudError::execution(
                ExecutionStage::Bind,
                format!(
                    "statement expects {} parameter(s), got {}: {}",
                    self.param_count,
                    params.len(),
                    self.sql
                ),
            ));
        }
        self.bound = params;
        Ok(())
    }

    pub(super) fn into_handle(self) -> S {
        self.handle
    }
}

/// Compiled statements keyed by the exact SQL text they were compiled from.
///
/// Entries are never evicted; they leave the cache only through [`StatementCache::drain`].
#[derive(Debug)]
pub(super) struct StatementCache<S> {
    map: HashMap<String, CompiledStatement<S>>,
}

impl<S> Default for StatementCache<S> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<S> StatementCache<S> {
    pub(super) fn contains(&self, sql: &str) -> bool {
        self.map.contains_key(sql)
    }

    pub(super) fn get_mut(&mut self, sql: &str) -> Option<&mut CompiledStatement<S>> {
        self.map.get_mut(sql)
    }

    /// Insert a freshly compiled statement and return it for binding.
    pub(super) fn insert(&mut self, stmt: CompiledStatement<S>) -> &mut CompiledStatement<S> {
        self.map.entry(stmt.sql.clone()).or_insert(stmt)
    }

    pub(super) fn len(&self) -> usize {
        self.map.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Remove every statement, leaving the cache empty.
    pub(super) fn drain(&mut self) -> impl Iterator<Item = (String, S)> + '_ {
        self.map.drain().map(|(sql, stmt)| (sql, stmt.into_handle()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebind_overwrites_previous_values() {
        let mut stmt = CompiledStatement::new("DELETE FROM t WHERE id = ?".to_string(), (), 1);
        stmt.rebind(Ok(vec![Value::Integer(1)])).unwrap();
        stmt.rebind(Ok(vec![Value::Integer(2)])).unwrap();
        assert_eq!(stmt.bound(), &[Value::Integer(2)]);
    }

    #[test]
    fn test_rebind_count_mismatch_clears_bindings() {
        let mut stmt = CompiledStatement::new("DELETE FROM t WHERE id = ?".to_string(), (), 1);
        stmt.rebind(Ok(vec![Value::Integer(1)])).unwrap();

        let err = stmt.rebind(Ok(vec![])).unwrap_err();
        assert_eq!(err.stage(), Some(ExecutionStage::Bind));
        assert!(stmt.bound().is_empty());
    }

    #[test]
    fn test_rebind_coercion_failure_clears_bindings() {
        let mut stmt = CompiledStatement::new("DELETE FROM t WHERE id = ?".to_string(), (), 1);
        stmt.rebind(Ok(vec![Value::Integer(1)])).unwrap();

        let err = stmt
            .rebind(Err(CrudError::execution(ExecutionStage::Bind, "'abc' is not a valid integer")))
            .unwrap_err();
        assert_eq!(err.stage(), Some(ExecutionStage::Bind));
        assert!(stmt.bound().is_empty());
    }

    #[test]
    fn test_cache_insert_and_drain() {
        let mut cache = StatementCache::default();
        assert_eq!(*cache.insert(CompiledStatement::new("SELECT 1".into(), 1u8, 0)).handle(), 1);
        assert!(cache.contains("SELECT 1"));
        assert_eq!(cache.len(), 1);
        assert_eq!(*cache.get_mut("SELECT 1").unwrap().handle(), 1);

        let drained: Vec<_> = cache.drain().collect();
        assert_eq!(drained, vec![("SELECT 1".to_string(), 1u8)]);
        assert!(cache.is_empty());
    }
}
