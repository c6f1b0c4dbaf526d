//! Statement monitoring.
//!
//! Every [`TableCrud`](crate::TableCrud) keeps a [`StatsMonitor`] (unless
//! disabled in [`CrudConfig`](crate::CrudConfig)) and can forward events to a
//! custom [`QueryMonitor`]:
//!
//! ```rust,ignore
//! use tablecrud::monitor::{QueryMonitor, QueryContext, QueryResult};
//! use std::time::Duration;
//!
//! struct PrintMonitor;
//!
//! impl QueryMonitor for PrintMonitor {
//!     fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
//!         println!("[{:?}] {} - {}", duration, ctx.sql, result);
//!     }
//! }
//!
//! let users = TableCrud::new("users", &client).with_monitor(PrintMonitor);
//! ```

mod monitors;
mod tracing_monitor;
mod types;


pub use monitors::{CompositeMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use tracing_monitor::TracingMonitor;
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
