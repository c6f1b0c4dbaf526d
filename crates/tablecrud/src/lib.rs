//! # tablecrud
//!
//! Single-table CRUD over prepared, cached statements.
//!
//! ## Features
//!
//! - **Typed bindings**: every value travels as a `(column, tag, value)` triple and is
//!   sent as a positional parameter, never spliced into SQL
//! - **Statement cache**: each distinct SQL text is compiled once per table handle and
//!   rebound on every call
//! - **Explicit release**: `close()` releases every compiled statement exactly once
//! - **Backend-neutral**: any [`Connection`] works; `tokio_postgres::Client` is supported
//!   out of the box
//! - **Query monitoring**: statistics, `tracing` events and custom monitors
//!
//! ## Example
//!
//! ```ignore
//! use tablecrud::prelude::*;
//!
//! let mut users = TableCrud::new("users", &client);
//!
//! // INSERT INTO users (name,age) VALUES ($1,$2)
//! let id = users
//!     .create(&[Binding::string("name", "Ali")?, Binding::integer("age", 23)?])
//!     .await?;
//!
//! // SELECT id, name FROM users WHERE id = $1
//! let filter = BindingSet::from_triples("WHERE id = ?", [("id", "i", 5)])?;
//! let rows = users.read(&["id", "name"], Some(&filter)).await?;
//!
//! // UPDATE users SET age = $1 WHERE id = $2
//! users.update(&[Binding::integer("age", 24)?], Some(&filter)).await?;
//!
//! // DELETE FROM users WHERE id = $1
//! users.delete(Some(&filter)).await?;
//!
//! users.close().await?;
//! ```

pub mod binding;
pub mod config;
pub mod connection;
pub mod error;
pub mod monitor;
pub mod prelude;
pub mod record;
pub mod sql;
pub mod table;
pub mod value;

pub use binding::{Binding, BindingSet};
pub use config::{CrudConfig, DangerousDmlPolicy};
pub use connection::Connection;
pub use error::{CrudError, CrudResult, ExecutionStage};
pub use monitor::{
    CompositeMonitor, NoopMonitor, QueryContext, QueryMonitor, QueryResult, QueryStats, QueryType,
    StatsMonitor, TracingMonitor,
};
pub use record::Record;
pub use sql::PlaceholderStyle;
pub use table::TableCrud;
pub use value::{TypeTag, Value};
