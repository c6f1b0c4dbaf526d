//! Validated column/type/value bindings.
//!
//! A [`Binding`] is one `(column, tag, value)` triple. A [`BindingSet`] is an
//! ordered list of bindings plus a SQL fragment, used as the filter of a
//! read, update or delete:
//!
//! ```ignore
//! use tablecrud::{BindingSet, Binding};
//!
//! let filter = BindingSet::new("WHERE id = ?", vec![Binding::integer("id", 5)?]);
//! let rows = users.read(&["id", "name"], Some(&filter)).await?;
//! ```
//!
//! # Trust boundary
//!
//! **The fragment is raw SQL.** It is appended to the generated statement
//! verbatim, without quoting or escaping. Only the *values* of a binding set
//! are sent as parameters. Never build a fragment from user input: put user
//! input in bindings and reference it with `?`.

use crate::error::{CrudError, CrudResult, ExecutionStage};
use crate::sql::count_placeholders;
use crate::value::{TypeTag, Value};

#[cfg(test)]
mod tests;

/// One `(column, tag, value)` triple.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    column: String,
    tag: TypeTag,
    value: Value,
}

impl Binding {
    /// Create a binding with an explicit tag.
    ///
    /// Fails with [`CrudError::MalformedBinding`] if the column name is empty.
    /// Whether `value` fits `tag` is checked later, when the statement is bound.
    pub fn new(column: impl Into<String>, tag: TypeTag, value: impl Into<Value>) -> CrudResult<Self> {
        Ok(Self {
            column: non_empty_column(column)?,
            tag,
            value: value.into(),
        })
    }

    /// Create a binding from tag text (`"i"`, `"s"` or `"d"`).
    ///
    /// An empty column name is reported before a bad tag.
    pub fn parse(column: impl Into<String>, tag: &str, value: impl Into<Value>) -> CrudResult<Self> {
        let column = non_empty_column(column)?;
        Ok(Self {
            column,
            tag: tag.parse::<TypeTag>()?,
            value: value.into(),
        })
    }

    /// Create a binding whose tag follows the value's own kind.
    pub fn typed(column: impl Into<String>, value: impl Into<Value>) -> CrudResult<Self> {
        let value = value.into();
        Self::new(column, TypeTag::of(&value), value)
    }

    pub fn integer(column: impl Into<String>, value: i64) -> CrudResult<Self> {
        Self::new(column, TypeTag::Integer, value)
    }

    pub fn string(column: impl Into<String>, value: impl Into<String>) -> CrudResult<Self> {
        Self::new(column, TypeTag::String, value.into())
    }

    pub fn double(column: impl Into<String>, value: f64) -> CrudResult<Self> {
        Self::new(column, TypeTag::Double, value)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Coerce the value into the tag's bind representation.
    pub(crate) fn bind_value(&self) -> CrudResult<Value> {
        self.tag.coerce(&self.value).map_err(|reason| {
            CrudError::execution(
                ExecutionStage::Bind,
                format!(
                    "column '{}' tagged '{}': {reason}",
                    self.column, self.tag
                ),
            )
        })
    }
}

/// An immutable, ordered set of bindings plus a trusted SQL fragment.
///
/// Binding order is placeholder order: the n-th binding fills the n-th `?`
/// of the fragment.
///
/// **The fragment is appended to generated SQL verbatim and is never
/// escaped.** See the module docs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingSet {
    fragment: String,
    bindings: Vec<Binding>,
}

impl BindingSet {
    /// Create a binding set from already-validated bindings.
    pub fn new(fragment: impl Into<String>, bindings: Vec<Binding>) -> Self {
        Self {
            fragment: fragment.into(),
            bindings,
        }
    }

    /// An empty set: no fragment, no parameters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A fragment without parameters (e.g. `ORDER BY id DESC`).
    pub fn fragment_only(fragment: impl Into<String>) -> Self {
        Self::new(fragment, Vec::new())
    }

    /// Build from `(column, tag text, value)` triples.
    ///
    /// ```ignore
    /// let set = BindingSet::from_triples("", [("name", "s", "Ali"), ("age", "i", "23")])?;
    /// ```
    pub fn from_triples<I, C, T, V>(fragment: impl Into<String>, triples: I) -> CrudResult<Self>
    where
        I: IntoIterator<Item = (C, T, V)>,
        C: Into<String>,
        T: AsRef<str>,
        V: Into<Value>,
    {
        let bindings = triples
            .into_iter()
            .map(|(column, tag, value)| Binding::parse(column, tag.as_ref(), value))
            .collect::<CrudResult<Vec<_>>>()?;
        Ok(Self::new(fragment, bindings))
    }

    /// Build from a loosely-typed JSON list of triples.
    ///
    /// The expected shape is `[["name", "s", "Ali"], ["age", "i", "23"]]`. Each
    /// triple must be an array of exactly three elements: a non-empty column
    /// string, a one-character tag string, and a scalar value. Any other shape
    /// fails with [`CrudError::MalformedBinding`]; a one-character tag outside
    /// `i`/`s`/`d` fails with [`CrudError::UnsupportedType`] (for `b`) or
    /// [`CrudError::UnknownType`].
    pub fn from_json(fragment: impl Into<String>, triples: &serde_json::Value) -> CrudResult<Self> {
        let items = triples
            .as_array()
            .ok_or_else(|| CrudError::malformed("bindings must be an array of triples"))?;

        let mut bindings = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            bindings.push(binding_from_json(index, item)?);
        }
        Ok(Self::new(fragment, bindings))
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(Binding::column)
    }

    /// Number of `?` placeholders in the fragment.
    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.fragment)
    }
}

fn non_empty_column(column: impl Into<String>) -> CrudResult<String> {
    let column = column.into();
    if column.is_empty() {
        return Err(CrudError::malformed("column name must not be empty"));
    }
    Ok(column)
}

fn binding_from_json(index: usize, item: &serde_json::Value) -> CrudResult<Binding> {
    let malformed = |what: &str| CrudError::malformed(format!("triple {index}: {what}"));

    let parts = item
        .as_array()
        .ok_or_else(|| malformed("expected an array [column, tag, value]"))?;
    if parts.len() != 3 {
        return Err(malformed(&format!(
            "expected 3 elements, got {}",
            parts.len()
        )));
    }

    let column = parts[0]
        .as_str()
        .ok_or_else(|| malformed("column must be a string"))?;
    if column.is_empty() {
        return Err(malformed("column name must not be empty"));
    }

    let tag = parts[1]
        .as_str()
        .ok_or_else(|| malformed("type tag must be a string"))?;
    if tag.chars().count() != 1 {
        return Err(malformed(&format!(
            "type tag must be a single character, got '{tag}'"
        )));
    }

    let value = Value::from_json(&parts[2]).ok_or_else(|| malformed("value must be a scalar"))?;

    Binding::parse(column, tag, value)
}
