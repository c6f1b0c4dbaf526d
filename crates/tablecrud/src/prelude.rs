//! Convenient imports for typical `tablecrud` usage.
//!
//! ```ignore
//! use tablecrud::prelude::*;
//! ```

pub use crate::{
    Binding, BindingSet, Connection, CrudConfig, CrudError, CrudResult, Record, TableCrud,
    TypeTag, Value,
};
