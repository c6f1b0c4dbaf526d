//! Scalar values and the type tags that select their bind representation.
//!
//! A [`Value`] is what the caller supplies and what rows come back as. A
//! [`TypeTag`] says how a value is represented when it is bound to a
//! statement parameter. Tags are checked when a binding is built, while the
//! value is coerced to the tag only when the statement is bound.

use crate::error::{CrudError, CrudResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A scalar value: a bind parameter or a row cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    #[default]
    Null,
    /// 64-bit signed integer
    Integer(i64),
    /// Double precision float
    Double(f64),
    /// Text
    String(String),
}

impl Value {
    /// Human-readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Double(_) => "double",
            Value::String(_) => "string",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON scalar. Arrays and objects return `None`.
    ///
    /// Booleans become `0`/`1`, integers that do not fit `i64` become doubles.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Integer(i64::from(*b))),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Value::Integer(i)),
                None => n.as_f64().map(Value::Double),
            },
            serde_json::Value::String(s) => Some(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Double(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Double(f64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// How a bound value is represented: integer, string or double.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `i`
    Integer,
    /// `s`
    String,
    /// `d`
    Double,
}

impl TypeTag {
    /// Parse a single-character tag.
    ///
    /// `b` (binary/blob) is a known tag without an implementation and fails with
    /// [`CrudError::UnsupportedType`]; every other unrecognized character fails with
    /// [`CrudError::UnknownType`].
    pub fn from_char(c: char) -> CrudResult<Self> {
        match c {
            'i' => Ok(TypeTag::Integer),
            's' => Ok(TypeTag::String),
            'd' => Ok(TypeTag::Double),
            'b' => Err(CrudError::UnsupportedType(c.to_string())),
            other => Err(CrudError::UnknownType(other.to_string())),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            TypeTag::Integer => 'i',
            TypeTag::String => 's',
            TypeTag::Double => 'd',
        }
    }

    /// The tag whose representation matches the value's own kind.
    ///
    /// `Null` maps to `String`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Integer(_) => TypeTag::Integer,
            Value::Double(_) => TypeTag::Double,
            Value::String(_) | Value::Null => TypeTag::String,
        }
    }

    /// Coerce a value into this tag's bind representation.
    ///
    /// `Null` stays `Null` under every tag. Returns a description of the mismatch
    /// when the value cannot be represented.
    pub fn coerce(self, value: &Value) -> Result<Value, String> {
        match (self, value) {
            (_, Value::Null) => Ok(Value::Null),

            (TypeTag::Integer, Value::Integer(i)) => Ok(Value::Integer(*i)),
            (TypeTag::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("'{s}' is not a valid integer")),
            (TypeTag::Integer, Value::Double(f)) => {
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                {
                    Ok(Value::Integer(*f as i64))
                } else {
                    Err(format!("{f} is not an integral value"))
                }
            }

            (TypeTag::Double, Value::Double(f)) => Ok(Value::Double(*f)),
            (TypeTag::Double, Value::Integer(i)) => Ok(Value::Double(*i as f64)),
            (TypeTag::Double, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| format!("'{s}' is not a valid double")),

            (TypeTag::String, Value::String(s)) => Ok(Value::String(s.clone())),
            (TypeTag::String, other) => Ok(Value::String(other.to_string())),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for TypeTag {
    type Err = CrudError;

    /// Parse tag text. Anything other than exactly one character is a shape error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => TypeTag::from_char(c),
            _ => Err(CrudError::malformed(format!(
                "type tag must be a single character, got '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_from_char() {
        assert_eq!(TypeTag::from_char('i').unwrap(), TypeTag::Integer);
        assert_eq!(TypeTag::from_char('s').unwrap(), TypeTag::String);
        assert_eq!(TypeTag::from_char('d').unwrap(), TypeTag::Double);
        assert!(TypeTag::from_char('b').unwrap_err().is_unsupported_type());
        for c in ['x', 'I', 'S', '1', ' ', 'é'] {
            assert!(TypeTag::from_char(c).unwrap_err().is_unknown_type(), "{c}");
        }
    }

    #[test]
    fn test_tag_from_str_requires_one_char() {
        assert_eq!("i".parse::<TypeTag>().unwrap(), TypeTag::Integer);
        assert!("".parse::<TypeTag>().unwrap_err().is_malformed());
        assert!("is".parse::<TypeTag>().unwrap_err().is_malformed());
        assert!("b".parse::<TypeTag>().unwrap_err().is_unsupported_type());
        assert!("q".parse::<TypeTag>().unwrap_err().is_unknown_type());
    }

    #[test]
    fn test_coerce_integer() {
        let tag = TypeTag::Integer;
        assert_eq!(tag.coerce(&"23".into()).unwrap(), Value::Integer(23));
        assert_eq!(tag.coerce(&" -7 ".into()).unwrap(), Value::Integer(-7));
        assert_eq!(tag.coerce(&Value::Double(4.0)).unwrap(), Value::Integer(4));
        assert!(tag.coerce(&Value::Double(4.5)).is_err());
        assert!(tag.coerce(&"abc".into()).is_err());
        assert_eq!(tag.coerce(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_coerce_double_and_string() {
        assert_eq!(
            TypeTag::Double.coerce(&"1.5".into()).unwrap(),
            Value::Double(1.5)
        );
        assert_eq!(TypeTag::Double.coerce(&3i64.into()).unwrap(), Value::Double(3.0));
        assert!(TypeTag::Double.coerce(&"x".into()).is_err());
        assert_eq!(
            TypeTag::String.coerce(&Value::Integer(23)).unwrap(),
            Value::String("23".to_string())
        );
        assert_eq!(
            TypeTag::String.coerce(&"Ali".into()).unwrap(),
            Value::String("Ali".to_string())
        );
    }

    #[test]
    fn test_value_from_json() {
        use serde_json::json;
        assert_eq!(Value::from_json(&json!(null)), Some(Value::Null));
        assert_eq!(Value::from_json(&json!(true)), Some(Value::Integer(1)));
        assert_eq!(Value::from_json(&json!(5)), Some(Value::Integer(5)));
        assert_eq!(Value::from_json(&json!(2.5)), Some(Value::Double(2.5)));
        assert_eq!(Value::from_json(&json!("a")), Some(Value::from("a")));
        assert_eq!(Value::from_json(&json!([1])), None);
        assert_eq!(Value::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_value_serde_untagged() {
        let values = vec![
            Value::Null,
            Value::Integer(1),
            Value::Double(1.5),
            Value::from("x"),
        ];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"[null,1,1.5,"x"]"#);
        let back: Vec<Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
