//! [`Connection`] for `tokio_postgres::Client`.

use super::Connection;
use crate::error::{CrudError, CrudResult, ExecutionStage};
use crate::record::Record;
use crate::sql::PlaceholderStyle;
use crate::value::{TypeTag, Value};
use bytes::BytesMut;
use std::error::Error;
use std::fmt::Write as _;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};
use tokio_postgres::{Row, Statement};

/// The table's identity or serial column, quoted for use in SQL.
const GENERATED_KEY_SQL: &str = "SELECT quote_ident(a.attname) \
     FROM pg_attribute a \
     WHERE a.attrelid = $1::text::regclass \
       AND a.attnum > 0 \
       AND NOT a.attisdropped \
       AND (a.attidentity IN ('a', 'd') OR pg_get_serial_sequence($1, a.attname) IS NOT NULL) \
     ORDER BY a.attnum \
     LIMIT 1";

impl Connection for tokio_postgres::Client {
    type Statement = Statement;

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    async fn prepare(&self, sql: &str) -> CrudResult<Statement> {
        tokio_postgres::Client::prepare(self, sql)
            .await
            .map_err(|e| CrudError::from_db_error(ExecutionStage::Compile, e))
    }

    /// Appends `RETURNING <key>` when `table` has an identity or serial column.
    ///
    /// The lookup runs once per compiled INSERT. Tables without such a column
    /// compile the INSERT unchanged and report no generated id.
    async fn prepare_insert(&self, table: &str, sql: &str) -> CrudResult<Statement> {
        let key = tokio_postgres::Client::query_opt(self, GENERATED_KEY_SQL, &[&table])
            .await
            .map_err(|e| CrudError::from_db_error(ExecutionStage::Compile, e))?
            .map(|row| row.try_get::<_, String>(0))
            .transpose()
            .map_err(|e| CrudError::from_db_error(ExecutionStage::Compile, e))?;

        match key {
            Some(key) => Connection::prepare(self, &format!("{sql} RETURNING {key}")).await,
            None => Connection::prepare(self, sql).await,
        }
    }

    /// Reads the id from the statement's `RETURNING` column, if it has one.
    async fn insert(&self, stmt: &Statement, params: &[Value]) -> CrudResult<Option<i64>> {
        let refs = param_refs(params);
        if stmt.columns().is_empty() {
            tokio_postgres::Client::execute(self, stmt, &refs)
                .await
                .map_err(|e| CrudError::from_db_error(ExecutionStage::Execute, e))?;
            return Ok(None);
        }

        let row = tokio_postgres::Client::query_one(self, stmt, &refs)
            .await
            .map_err(|e| CrudError::from_db_error(ExecutionStage::Execute, e))?;
        let key = cell_value(&row, 0).map_err(|e| {
            CrudError::execution(ExecutionStage::Execute, format!("generated key: {e}"))
        })?;
        Ok(key.as_i64())
    }

    async fn query(&self, stmt: &Statement, params: &[Value]) -> CrudResult<Vec<Record>> {
        let refs = param_refs(params);
        let rows = tokio_postgres::Client::query(self, stmt, &refs)
            .await
            .map_err(|e| CrudError::from_db_error(ExecutionStage::Execute, e))?;
        rows.iter().map(record_from_row).collect()
    }

    async fn execute(&self, stmt: &Statement, params: &[Value]) -> CrudResult<u64> {
        let refs = param_refs(params);
        tokio_postgres::Client::execute(self, stmt, &refs)
            .await
            .map_err(|e| CrudError::from_db_error(ExecutionStage::Execute, e))
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

fn record_from_row(row: &Row) -> CrudResult<Record> {
    let mut record = Record::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let value = cell_value(row, idx).map_err(|e| {
            CrudError::execution(
                ExecutionStage::Execute,
                format!("column '{}': {e}", column.name()),
            )
        })?;
        record.push(column.name(), value);
    }
    Ok(record)
}

/// Convert one cell. Types without a numeric representation come back as text.
fn cell_value(row: &Row, idx: usize) -> Result<Value, Box<dyn Error + Sync + Send>> {
    let ty = row.columns()[idx].type_();
    let value = match *ty {
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Integer(v.into())),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Integer(v.into())),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.map(Value::Integer),
        Type::OID => row.try_get::<_, Option<u32>>(idx)?.map(|v| Value::Integer(v.into())),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(|v| Value::Double(v.into())),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.map(Value::Double),
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)?
            .map(|v| Value::Integer(i64::from(v))),
        Type::NUMERIC => text_cell::<rust_decimal::Decimal>(row, idx)?,
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(|v| Value::String(v.to_rfc3339())),
        Type::TIMESTAMP => text_cell::<chrono::NaiveDateTime>(row, idx)?,
        Type::DATE => text_cell::<chrono::NaiveDate>(row, idx)?,
        Type::TIME => text_cell::<chrono::NaiveTime>(row, idx)?,
        Type::UUID => text_cell::<uuid::Uuid>(row, idx)?,
        Type::JSON | Type::JSONB => text_cell::<serde_json::Value>(row, idx)?,
        Type::BYTEA => row
            .try_get::<_, Option<Vec<u8>>>(idx)?
            .map(|bytes| Value::String(hex_bytea(&bytes))),
        _ if <String as FromSql>::accepts(ty) => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::String)
        }
        _ => return Err(format!("unsupported column type {ty}").into()),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn text_cell<'a, T>(row: &'a Row, idx: usize) -> Result<Option<Value>, Box<dyn Error + Sync + Send>>
where
    T: FromSql<'a> + ToString,
{
    Ok(row
        .try_get::<_, Option<T>>(idx)?
        .map(|v| Value::String(v.to_string())))
}

/// Postgres' own `\x` hex output format.
fn hex_bytea(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// Binds a [`Value`] to whatever parameter type Postgres inferred for the placeholder.
///
/// Integers fit into any integer width that holds them, numbers are rendered
/// as text for text parameters, and text is parsed for numeric parameters.
/// A value the parameter type cannot hold is an error, never a saturated or
/// infinite stand-in.
impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => integer_to_sql(*i, ty, out),
            Value::Double(f) => double_to_sql(*f, ty, out),
            Value::String(s) => match *ty {
                Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
                    integer_to_sql(s.trim().parse::<i64>()?, ty, out)
                }
                Type::FLOAT4 | Type::FLOAT8 => double_to_sql(s.trim().parse::<f64>()?, ty, out),
                Type::BOOL => s.trim().parse::<bool>()?.to_sql(ty, out),
                _ => s.to_sql(ty, out),
            },
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::INT2 | Type::INT4 | Type::INT8 | Type::OID | Type::FLOAT4 | Type::FLOAT8 | Type::BOOL
        ) || is_text(ty)
    }

    tokio_postgres::types::to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    <&str as ToSql>::accepts(ty)
}

fn integer_to_sql(
    i: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::INT8 => i.to_sql(ty, out),
        Type::OID => u32::try_from(i)?.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::BOOL => (i != 0).to_sql(ty, out),
        _ if is_text(ty) => i.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind integer {i} as {ty}").into()),
    }
}

fn double_to_sql(
    f: f64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    match *ty {
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::FLOAT4 => {
            let narrowed = f as f32;
            if f.is_finite() && !narrowed.is_finite() {
                return Err(format!("{f} is out of range for {ty}").into());
            }
            narrowed.to_sql(ty, out)
        }
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            match TypeTag::Integer.coerce(&Value::Double(f))? {
                Value::Integer(i) => integer_to_sql(i, ty, out),
                other => Err(format!("cannot bind {other} as {ty}").into()),
            }
        }
        _ if is_text(ty) => f.to_string().to_sql(ty, out),
        _ => Err(format!("cannot bind double {f} as {ty}").into()),
    }
}
