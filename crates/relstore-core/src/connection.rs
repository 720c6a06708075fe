//! Driver contract.
//!
//! relstore does not talk to databases itself. A driver implements
//! [`Connection`] and receives fully built SQL with positional parameters.

use crate::error::{Error, QueryErrorKind, Result};
use crate::field::FieldType;
use crate::row::Row;
use crate::value::Value;

/// A blocking database connection.
pub trait Connection {
    /// Run a statement that returns rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Run an INSERT and return the last inserted id, or 0 when there is none.
    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64>;

    /// Convert a value read from storage into its semantic form.
    fn cast(&self, value: Value, field_type: FieldType) -> Result<Value> {
        cast_value(value, field_type)
    }

    /// Convert a semantic value into the form written to storage.
    fn store(&self, value: Value, field_type: FieldType) -> Result<Value> {
        store_value(value, field_type)
    }
}

impl<C: Connection + ?Sized> Connection for &C {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        (**self).execute(sql, params)
    }

    fn insert(&self, sql: &str, params: &[Value]) -> Result<i64> {
        (**self).insert(sql, params)
    }

    fn cast(&self, value: Value, field_type: FieldType) -> Result<Value> {
        (**self).cast(value, field_type)
    }

    fn store(&self, value: Value, field_type: FieldType) -> Result<Value> {
        (**self).store(value, field_type)
    }
}

/// Default storage-to-semantic conversion.
pub fn cast_value(value: Value, field_type: FieldType) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let cast = match (field_type, value) {
        (FieldType::Boolean, Value::Bool(b)) => Value::Bool(b),
        (FieldType::Boolean, Value::BigInt(i)) => Value::Bool(i != 0),
        (FieldType::Boolean, Value::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" | "yes" => Value::Bool(true),
            "0" | "f" | "false" | "no" | "" => Value::Bool(false),
            _ => return Err(cast_error(field_type, &Value::Text(s))),
        },

        (FieldType::Integer, Value::BigInt(i)) => Value::BigInt(i),
        (FieldType::Integer, Value::Bool(b)) => Value::BigInt(i64::from(b)),
        #[allow(clippy::cast_possible_truncation)]
        (FieldType::Integer, Value::Double(f)) if f.fract() == 0.0 => Value::BigInt(f as i64),
        (FieldType::Integer, v @ (Value::Text(_) | Value::Decimal(_))) => match v.as_i64() {
            Some(i) => Value::BigInt(i),
            None => return Err(cast_error(field_type, &v)),
        },

        (FieldType::Decimal, Value::Decimal(s) | Value::Text(s)) => Value::Decimal(s),
        (FieldType::Decimal, Value::BigInt(i)) => Value::Decimal(i.to_string()),
        (FieldType::Decimal, Value::Double(f)) => Value::Decimal(f.to_string()),

        (FieldType::String, Value::Text(s) | Value::Decimal(s)) => Value::Text(s),
        (FieldType::String, Value::BigInt(i)) => Value::Text(i.to_string()),
        (FieldType::String, Value::Double(f)) => Value::Text(f.to_string()),
        (FieldType::String, Value::Bool(b)) => Value::Text(if b { "1" } else { "0" }.into()),
        (FieldType::String, Value::Bytes(b)) => {
            Value::Text(String::from_utf8_lossy(&b).into_owned())
        }

        (FieldType::DateTime, Value::Timestamp(t) | Value::BigInt(t)) => Value::Timestamp(t),
        (FieldType::DateTime, Value::Text(s)) => Value::Text(s),

        (FieldType::Serial, Value::Json(j)) => Value::Json(j),
        (FieldType::Serial, Value::Text(s)) => Value::Json(parse_json(&s)?),
        (FieldType::Serial, Value::Bytes(b)) => Value::Json(
            serde_json::from_slice(&b).map_err(|e| json_error(&e.to_string()))?,
        ),

        (_, other) => return Err(cast_error(field_type, &other)),
    };
    Ok(cast)
}

/// Default semantic-to-storage conversion: structured data is written as JSON text.
pub fn store_value(value: Value, field_type: FieldType) -> Result<Value> {
    match (field_type, value) {
        (FieldType::Serial, Value::Json(j)) => Ok(Value::Text(j.to_string())),
        (_, v) => Ok(v),
    }
}

fn parse_json(text: &str) -> Result<serde_json::Value> {
    serde_json::from_str(text).map_err(|e| json_error(&e.to_string()))
}

fn json_error(detail: &str) -> Error {
    Error::query(
        QueryErrorKind::UnexpectedResult,
        format!("Can not decode serial field: {detail}"),
    )
}

fn cast_error(field_type: FieldType, value: &Value) -> Error {
    Error::query(
        QueryErrorKind::UnexpectedResult,
        format!("Can not cast {} value to {field_type}", value.type_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_integer_from_text() {
        assert_eq!(
            cast_value(Value::Text("42".into()), FieldType::Integer).unwrap(),
            Value::BigInt(42)
        );
        assert!(cast_value(Value::Text("x".into()), FieldType::Integer).is_err());
    }

    #[test]
    fn test_cast_boolean() {
        assert_eq!(
            cast_value(Value::BigInt(1), FieldType::Boolean).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            cast_value(Value::Text("f".into()), FieldType::Boolean).unwrap(),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_null_passes_through() {
        for t in FieldType::ALL {
            assert_eq!(cast_value(Value::Null, t).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_serial_round_trip() {
        let json = serde_json::json!({"tags": ["a", "b"]});
        let stored = store_value(Value::Json(json.clone()), FieldType::Serial).unwrap();
        assert!(matches!(stored, Value::Text(_)));
        assert_eq!(cast_value(stored, FieldType::Serial).unwrap(), Value::Json(json));
    }

    #[test]
    fn test_store_leaves_other_types() {
        assert_eq!(
            store_value(Value::Bool(true), FieldType::Boolean).unwrap(),
            Value::Bool(true)
        );
    }
}
