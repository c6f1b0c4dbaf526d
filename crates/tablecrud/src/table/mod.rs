//! CRUD operations against a single table.
//!
//! `TableCrud` builds the SQL for create/read/update/delete, compiles each
//! distinct statement once, and rebinds it on every call.
//!
//! # Example
//!
//! ```ignore
//! use tablecrud::{Binding, BindingSet, TableCrud};
//!
//! let mut users = TableCrud::new("users", &client);
//!
//! let id = users
//!     .create(&[Binding::string("name", "Ali")?, Binding::parse("age", "i", "23")?])
//!     .await?;
//!
//! let filter = BindingSet::new("WHERE id = ?", vec![Binding::integer("id", 5)?]);
//! let rows = users.read(&["id", "name"], Some(&filter)).await?;
//! let changed = users.update(&[Binding::integer("age", 24)?], Some(&filter)).await?;
//!
//! // Release every compiled statement.
//! users.close().await?;
//! ```

pub mod build;
mod execute;
mod statement_cache;


use crate::config::CrudConfig;
use crate::connection::Connection;
use crate::error::{CrudError, CrudResult, ExecutionStage};
use crate::monitor::{QueryMonitor, QueryStats, StatsMonitor, TracingMonitor};
use crate::sql::render_placeholders;
use statement_cache::StatementCache;
use std::sync::Arc;

/// CRUD access to one table over one borrowed connection.
///
/// Operations take `&mut self`: the statement cache and the bound parameters
/// are updated in place, so one instance serves one caller at a time. Use one
/// instance per task, or put the instance behind a mutex.
///
/// Compiled statements are released by [`TableCrud::close`]. Dropping an
/// instance without closing it drops the statement handles instead.
pub struct TableCrud<'c, C: Connection> {
    table: String,
    conn: &'c C,
    statements: StatementCache<C::Statement>,
    config: CrudConfig,
    stats: Arc<StatsMonitor>,
    logging_monitor: Option<TracingMonitor>,
    custom_monitor: Option<Arc<dyn QueryMonitor>>,
}

impl<'c, C: Connection> TableCrud<'c, C> {
    /// Create a table handle with default configuration.
    ///
    /// The table name is used as given and is not checked against the schema.
    pub fn new(table: impl Into<String>, conn: &'c C) -> Self {
        Self::with_config(table, conn, CrudConfig::default())
    }

    /// Create a table handle with custom configuration.
    pub fn with_config(table: impl Into<String>, conn: &'c C, config: CrudConfig) -> Self {
        let logging_monitor = if config.logging_enabled {
            let mut monitor = TracingMonitor::new();
            if let Some(min) = config.log_min_duration {
                monitor = monitor.min_duration(min);
            }
            Some(monitor)
        } else {
            None
        };

        Self {
            table: table.into(),
            conn,
            statements: StatementCache::default(),
            config,
            stats: Arc::new(StatsMonitor::new()),
            logging_monitor,
            custom_monitor: None,
        }
    }

    /// Add a custom monitor.
    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.custom_monitor = Some(Arc::new(monitor));
        self
    }

    /// Add a custom monitor from an `Arc`.
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.custom_monitor = Some(monitor);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &'c C {
        self.conn
    }

    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// Number of compiled statements held by this instance.
    pub fn cached_statements(&self) -> usize {
        self.statements.len()
    }

    /// Whether a compiled statement exists for this `?`-style SQL text.
    pub fn is_cached(&self, sql: &str) -> bool {
        self.statements
            .contains(&render_placeholders(sql, self.conn.placeholder_style()))
    }

    /// Get current statistics.
    pub fn stats(&self) -> QueryStats {
        self.stats.stats()
    }

    /// Reset statistics.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Release every compiled statement and consume the handle.
    ///
    /// Each statement is released exactly once. Release continues past failures;
    /// the first failure is returned after all statements were attempted.
    /// Returns the number of statements released.
    pub async fn close(mut self) -> CrudResult<usize> {
        let statements: Vec<_> = self.statements.drain().collect();
        let mut released = 0;
        let mut first_error: Option<CrudError> = None;

        for (sql, stmt) in statements {
            tracing::debug!(target: "tablecrud.sql", table = %self.table, sql = %sql, "releasing statement");
            match self.conn.release(stmt).await {
                Ok(()) => released += 1,
                Err(err) => {
                    tracing::warn!(target: "tablecrud.sql", table = %self.table, sql = %sql, error = %err, "statement release failed");
                    if first_error.is_none() {
                        first_error = Some(match err {
                            CrudError::Execution { message, .. } => {
                                CrudError::execution(ExecutionStage::Release, message)
                            }
                            other => other,
                        });
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(released),
        }
    }
}

impl<C: Connection> Drop for TableCrud<'_, C> {
    fn drop(&mut self) {
        if !self.statements.is_empty() {
            tracing::debug!(
                target: "tablecrud.sql",
                table = %self.table,
                statements = self.statements.len(),
                "table handle dropped without close; dropping statement handles"
            );
        }
    }
}
