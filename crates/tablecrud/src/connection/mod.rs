//! The database client that [`TableCrud`](crate::TableCrud) drives.
//!
//! A connection compiles SQL text into a reusable statement handle, runs a
//! handle with positional parameters, and releases handles it handed out.
//! `tablecrud` never opens, pools or closes connections itself.

mod postgres;

use crate::error::CrudResult;
use crate::record::Record;
use crate::sql::PlaceholderStyle;
use crate::value::Value;
use std::future::Future;

/// A database client able to prepare and run positional-parameter statements.
///
/// Parameters arrive already coerced to their tag's representation
/// ([`Value::Integer`], [`Value::String`], [`Value::Double`] or [`Value::Null`]),
/// one per placeholder, in placeholder order.
pub trait Connection: Send + Sync {
    /// Handle of a compiled statement.
    type Statement: Send + Sync;

    /// How this connection spells positional parameters.
    ///
    /// SQL passed to [`Connection::prepare`] already uses this style.
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    /// Compile SQL text into a reusable statement.
    fn prepare(&self, sql: &str) -> impl Future<Output = CrudResult<Self::Statement>> + Send;

    /// Compile an INSERT into `table`.
    ///
    /// Connections that report generated keys through the statement itself
    /// (e.g. `RETURNING`) extend the SQL here. The default compiles it as is.
    fn prepare_insert(
        &self,
        _table: &str,
        sql: &str,
    ) -> impl Future<Output = CrudResult<Self::Statement>> + Send {
        self.prepare(sql)
    }

    /// Run a compiled INSERT and return the generated row identifier.
    ///
    /// Returns `Ok(None)` when the table has no generated identifier.
    fn insert(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = CrudResult<Option<i64>>> + Send;

    /// Run a compiled SELECT and return all rows.
    fn query(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = CrudResult<Vec<Record>>> + Send;

    /// Run a compiled statement and return the number of affected rows.
    fn execute(
        &self,
        stmt: &Self::Statement,
        params: &[Value],
    ) -> impl Future<Output = CrudResult<u64>> + Send;

    /// Release a compiled statement.
    ///
    /// The default implementation drops the handle.
    fn release(&self, stmt: Self::Statement) -> impl Future<Output = CrudResult<()>> + Send {
        drop(stmt);
        async { Ok(()) }
    }
}
