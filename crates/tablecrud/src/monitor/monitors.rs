use super::types::{QueryContext, QueryMonitor, QueryResult, QueryType};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A no-op monitor that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

/// A monitor that counts compilations, cache hits and executions.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    total_duration_nanos: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    max_duration_nanos: AtomicU64,
    slowest_query: Mutex<Option<String>>,
    stmt_compile_count: AtomicU64,
    stmt_compile_duration_nanos: AtomicU64,
    stmt_cache_hits: AtomicU64,
}

/// Collected statistics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    /// Total number of statements executed.
    pub total_queries: u64,
    /// Executions that failed.
    pub failed_queries: u64,
    /// Total execution time.
    pub total_duration: Duration,
    /// Number of SELECT executions.
    pub select_count: u64,
    /// Number of INSERT executions.
    pub insert_count: u64,
    /// Number of UPDATE executions.
    pub update_count: u64,
    /// Number of DELETE executions.
    pub delete_count: u64,
    /// Slowest execution duration.
    pub max_duration: Duration,
    /// Slowest execution SQL.
    pub slowest_query: Option<String>,
    /// Statements compiled (cache misses).
    pub stmt_compile_count: u64,
    /// Total time spent compiling statements.
    pub stmt_compile_duration: Duration,
    /// Compiled statements reused from the cache.
    pub stmt_cache_hits: u64,
}

impl StatsMonitor {
    /// Create a new stats monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            max_duration: Duration::from_nanos(self.max_duration_nanos.load(Ordering::Relaxed)),
            slowest_query: self
                .slowest_query
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
            stmt_compile_count: self.stmt_compile_count.load(Ordering::Relaxed),
            stmt_compile_duration: Duration::from_nanos(
                self.stmt_compile_duration_nanos.load(Ordering::Relaxed),
            ),
            stmt_cache_hits: self.stmt_cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        self.total_queries.store(0, Ordering::Relaxed);
        self.failed_queries.store(0, Ordering::Relaxed);
        self.total_duration_nanos.store(0, Ordering::Relaxed);
        self.select_count.store(0, Ordering::Relaxed);
        self.insert_count.store(0, Ordering::Relaxed);
        self.update_count.store(0, Ordering::Relaxed);
        self.delete_count.store(0, Ordering::Relaxed);
        self.max_duration_nanos.store(0, Ordering::Relaxed);
        *self.slowest_query.lock().unwrap_or_else(|e| e.into_inner()) = None;
        self.stmt_compile_count.store(0, Ordering::Relaxed);
        self.stmt_compile_duration_nanos.store(0, Ordering::Relaxed);
        self.stmt_cache_hits.store(0, Ordering::Relaxed);
    }
}

/// Add to a nanosecond counter, saturating instead of wrapping.
fn add_saturating(counter: &AtomicU64, nanos: u64) {
    let prev = counter.fetch_add(nanos, Ordering::Relaxed);
    if prev.checked_add(nanos).is_none() {
        counter.store(u64::MAX, Ordering::Relaxed);
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl QueryMonitor for StatsMonitor {
    fn on_statement_compiled(&self, _ctx: &QueryContext, duration: Duration) {
        self.stmt_compile_count.fetch_add(1, Ordering::Relaxed);
        add_saturating(&self.stmt_compile_duration_nanos, duration_nanos(duration));
    }

    fn on_cache_hit(&self, _ctx: &QueryContext) {
        self.stmt_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        let nanos = duration_nanos(duration);

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        add_saturating(&self.total_duration_nanos, nanos);

        let counter = match ctx.query_type {
            QueryType::Select => Some(&self.select_count),
            QueryType::Insert => Some(&self.insert_count),
            QueryType::Update => Some(&self.update_count),
            QueryType::Delete => Some(&self.delete_count),
            QueryType::Other => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if result.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        // Update max duration + slowest query only when we actually become the new max.
        let mut current_max = self.max_duration_nanos.load(Ordering::Relaxed);
        while nanos > current_max {
            match self.max_duration_nanos.compare_exchange_weak(
                current_max,
                nanos,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => {
                    *self.slowest_query.lock().unwrap_or_else(|e| e.into_inner()) =
                        Some(ctx.sql.clone());
                    break;
                }
                Err(updated) => current_max = updated,
            }
        }
    }
}

/// A composite monitor that delegates to multiple monitors.
#[derive(Default)]
pub struct CompositeMonitor {
    monitors: Vec<Arc<dyn QueryMonitor>>,
}

impl CompositeMonitor {
    /// Create an empty composite monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a monitor.
    #[allow(clippy::should_implement_trait)]
    pub fn add<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitors.push(Arc::new(monitor));
        self
    }

    /// Add an Arc-wrapped monitor.
    pub fn add_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitors.push(monitor);
        self
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl QueryMonitor for CompositeMonitor {
    fn on_statement_compiled(&self, ctx: &QueryContext, duration: Duration) {
        for monitor in &self.monitors {
            monitor.on_statement_compiled(ctx, duration);
        }
    }

    fn on_cache_hit(&self, ctx: &QueryContext) {
        for monitor in &self.monitors {
            monitor.on_cache_hit(ctx);
        }
    }

    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        for monitor in &self.monitors {
            monitor.on_query_complete(ctx, duration, result);
        }
    }

    fn on_slow_query(&self, ctx: &QueryContext, duration: Duration) {
        for monitor in &self.monitors {
            monitor.on_slow_query(ctx, duration);
        }
    }
}
