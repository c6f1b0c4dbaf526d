use super::build::{delete_sql, has_filter, insert_sql, select_sql, update_sql};
use super::statement_cache::CompiledStatement;
use crate::binding::{Binding, BindingSet};
use crate::config::handle_dangerous_dml;
use crate::connection::Connection;
use crate::error::{CrudError, CrudResult, ExecutionStage};
use crate::monitor::{QueryContext, QueryMonitor, QueryResult};
use crate::record::Record;
use crate::sql::{count_placeholders, render_placeholders};
use crate::value::Value;
use std::future::Future;
use std::time::{Duration, Instant};

/// What to do with a bound statement.
#[derive(Debug, Clone, Copy)]
enum Action {
    Insert,
    Query,
    Execute,
}

enum Outcome {
    Inserted(Option<i64>),
    Rows(Vec<Record>),
    Affected(u64),
}

impl Outcome {
    fn to_query_result(&self) -> QueryResult {
        match self {
            Outcome::Inserted(id) => QueryResult::Inserted(*id),
            Outcome::Rows(rows) => QueryResult::Rows(rows.len()),
            Outcome::Affected(n) => QueryResult::Affected(*n),
        }
    }
}

// ============================================================================
// CRUD operations
// ============================================================================

impl<C: Connection> super::TableCrud<'_, C> {
    /// Insert one row: `INSERT INTO <table> (<cols>) VALUES (?, ...)`.
    ///
    /// Returns the generated row identifier, or `Ok(None)` if the store has
    /// none for this row. An empty binding list is rejected before the
    /// connection is touched.
    pub async fn create(&mut self, bindings: &[Binding]) -> CrudResult<Option<i64>> {
        if bindings.is_empty() {
            return Err(CrudError::malformed("create requires at least one binding"));
        }

        let sql = insert_sql(&self.table, bindings.iter().map(Binding::column));
        match self.run(sql, bindings.iter(), Action::Insert).await? {
            Outcome::Inserted(id) => Ok(id),
            _ => Err(unexpected_outcome("create")),
        }
    }

    /// Read rows: `SELECT <cols | *> FROM <table> [<filter fragment>]`.
    ///
    /// An empty `columns` selects every column. Rows come back in engine order,
    /// each as a column → value [`Record`]. No matching rows is `Ok(vec![])`.
    ///
    /// The filter's fragment is appended as raw SQL; see [`BindingSet`].
    pub async fn read(
        &mut self,
        columns: &[&str],
        filter: Option<&BindingSet>,
    ) -> CrudResult<Vec<Record>> {
        let sql = select_sql(&self.table, columns, filter);
        let params = filter.map(BindingSet::bindings).unwrap_or_default();
        match self.run(sql, params.iter(), Action::Query).await? {
            Outcome::Rows(rows) => Ok(rows),
            _ => Err(unexpected_outcome("read")),
        }
    }

    /// Update rows: `UPDATE <table> SET c1 = ?, ... [<filter fragment>]`.
    ///
    /// SET values are bound first, then the filter's values. Without a filter
    /// every row is updated unless [`CrudConfig::update_without_filter`](crate::CrudConfig)
    /// says otherwise.
    ///
    /// Returns the number of affected rows: `Ok(0)` means the statement ran and
    /// matched nothing.
    pub async fn update(
        &mut self,
        bindings: &[Binding],
        filter: Option<&BindingSet>,
    ) -> CrudResult<u64> {
        if bindings.is_empty() {
            return Err(CrudError::malformed("update requires at least one binding"));
        }

        let sql = update_sql(&self.table, bindings.iter().map(Binding::column), filter);
        if !has_filter(filter) {
            handle_dangerous_dml(
                self.config.update_without_filter,
                "UPDATE without filter",
                &sql,
            )?;
        }

        let filter_params = filter.map(BindingSet::bindings).unwrap_or_default();
        let params = bindings.iter().chain(filter_params.iter());
        match self.run(sql, params, Action::Execute).await? {
            Outcome::Affected(n) => Ok(n),
            _ => Err(unexpected_outcome("update")),
        }
    }

    /// Delete rows: `DELETE FROM <table> [<filter fragment>]`.
    ///
    /// Without a filter every row is deleted unless
    /// [`CrudConfig::delete_without_filter`](crate::CrudConfig) says otherwise.
    /// Returns the number of affected rows.
    pub async fn delete(&mut self, filter: Option<&BindingSet>) -> CrudResult<u64> {
        let sql = delete_sql(&self.table, filter);
        if !has_filter(filter) {
            handle_dangerous_dml(
                self.config.delete_without_filter,
                "DELETE without filter",
                &sql,
            )?;
        }

        let params = filter.map(BindingSet::bindings).unwrap_or_default();
        match self.run(sql, params.iter(), Action::Execute).await? {
            Outcome::Affected(n) => Ok(n),
            _ => Err(unexpected_outcome("delete")),
        }
    }
}

fn unexpected_outcome(op: &str) -> CrudError {
    CrudError::execution(ExecutionStage::Execute, format!("unexpected outcome for {op}"))
}

// ============================================================================
// Compile, bind, execute
// ============================================================================

impl<C: Connection> super::TableCrud<'_, C> {
    /// Compile (or reuse), rebind and execute one statement.
    async fn run<'b>(
        &mut self,
        sql: String,
        bindings: impl Iterator<Item = &'b Binding>,
        action: Action,
    ) -> CrudResult<Outcome> {
        let conn = self.conn;
        let timeout = self.config.query_timeout;

        let param_count = count_placeholders(&sql);
        let exec_sql = render_placeholders(&sql, conn.placeholder_style());
        let params: CrudResult<Vec<Value>> = bindings.map(Binding::bind_value).collect();

        let mut ctx = QueryContext::new(
            &self.table,
            &exec_sql,
            params.as_ref().map_or(0, Vec::len),
        );

        if self.statements.contains(&exec_sql) {
            ctx.cache_hit = true;
            tracing::debug!(target: "tablecrud.sql", table = %self.table, sql = %exec_sql, "reusing compiled statement");
            self.report_cache_hit(&ctx);
        } else {
            tracing::debug!(target: "tablecrud.sql", table = %self.table, sql = %exec_sql, "compiling statement");
            let start = Instant::now();
            let compiled = match action {
                Action::Insert => {
                    with_timeout(timeout, conn.prepare_insert(&self.table, &exec_sql)).await
                }
                Action::Query | Action::Execute => {
                    with_timeout(timeout, conn.prepare(&exec_sql)).await
                }
            };
            match compiled {
                Ok(handle) => {
                    self.statements
                        .insert(CompiledStatement::new(exec_sql.clone(), handle, param_count));
                    self.report_compiled(&ctx, start.elapsed());
                }
                Err(err) => {
                    let err = as_stage(err, ExecutionStage::Compile);
                    self.report_result(&ctx, start.elapsed(), &QueryResult::error(err.to_string()));
                    return Err(err);
                }
            }
        }

        let start = Instant::now();
        let result = match self.statements.get_mut(&exec_sql) {
            Some(stmt) => match stmt.rebind(params) {
                Ok(()) => {
                    let stmt: &CompiledStatement<C::Statement> = stmt;
                    with_timeout(timeout, dispatch(conn, action, stmt.handle(), stmt.bound())).await
                }
                Err(err) => Err(err),
            },
            None => Err(CrudError::execution(
                ExecutionStage::Compile,
                format!("statement missing from cache: {exec_sql}"),
            )),
        };
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(outcome) => outcome.to_query_result(),
            Err(err) => QueryResult::error(err.to_string()),
        };
        self.report_result(&ctx, duration, &query_result);

        result
    }

    fn report_compiled(&self, ctx: &QueryContext, duration: Duration) {
        if self.config.stats_enabled {
            self.stats.on_statement_compiled(ctx, duration);
        }
        if let Some(ref logging) = self.logging_monitor {
            logging.on_statement_compiled(ctx, duration);
        }
        if let Some(ref monitor) = self.custom_monitor {
            monitor.on_statement_compiled(ctx, duration);
        }
    }

    fn report_cache_hit(&self, ctx: &QueryContext) {
        if self.config.stats_enabled {
            self.stats.on_cache_hit(ctx);
        }
        if let Some(ref logging) = self.logging_monitor {
            logging.on_cache_hit(ctx);
        }
        if let Some(ref monitor) = self.custom_monitor {
            monitor.on_cache_hit(ctx);
        }
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if self.config.stats_enabled {
            self.stats.on_query_complete(ctx, duration, result);
        }
        if let Some(ref logging) = self.logging_monitor {
            logging.on_query_complete(ctx, duration, result);
        }
        if let Some(ref monitor) = self.custom_monitor {
            monitor.on_query_complete(ctx, duration, result);
        }

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                if let Some(ref logging) = self.logging_monitor {
                    logging.on_slow_query(ctx, duration);
                }
                if let Some(ref monitor) = self.custom_monitor {
                    monitor.on_slow_query(ctx, duration);
                }
            }
        }
    }
}

async fn dispatch<C: Connection>(
    conn: &C,
    action: Action,
    stmt: &C::Statement,
    params: &[Value],
) -> CrudResult<Outcome> {
    match action {
        Action::Insert => conn.insert(stmt, params).await.map(Outcome::Inserted),
        Action::Query => conn.query(stmt, params).await.map(Outcome::Rows),
        Action::Execute => conn.execute(stmt, params).await.map(Outcome::Affected),
    }
}

/// Execute with timeout if configured.
async fn with_timeout<T, F>(timeout: Option<Duration>, future: F) -> CrudResult<T>
where
    F: Future<Output = CrudResult<T>>,
{
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, future)
            .await
            .map_err(|_| CrudError::timeout(timeout))?,
        None => future.await,
    }
}

/// Re-label an execution error raised by the connection with the stage it happened in.
fn as_stage(err: CrudError, stage: ExecutionStage) -> CrudError {
    match err {
        CrudError::Execution { message, .. } => CrudError::Execution { stage, message },
        other => other,
    }
}
