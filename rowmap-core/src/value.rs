//! Value types for SQL parameters and result columns

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A SQL value that can be bound as a parameter or read from a result row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
    /// String value
    String(String),
    /// Bytes value
    Bytes(Vec<u8>),
    /// JSON value
    Json(serde_json::Value),
    /// Array of values, only valid as the right-hand side of IN
    Array(Vec<Value>),
    /// Date and time without zone
    #[cfg(feature = "datetime-support")]
    Timestamp(chrono::NaiveDateTime),
    /// Fixed point decimal
    #[cfg(feature = "decimal-support")]
    Decimal(rust_decimal::Decimal),
    /// UUID value
    #[cfg(feature = "uuid-support")]
    Uuid(uuid::Uuid),
}

/// Explicit data type hint attached to a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int32,
    Int64,
    Float,
    Double,
    Decimal,
    String,
    Binary,
    DateTime,
    Json,
    Guid,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the SQL type name for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::I32(_) => "INTEGER",
            Value::I64(_) => "BIGINT",
            Value::F32(_) => "REAL",
            Value::F64(_) => "DOUBLE PRECISION",
            Value::String(_) => "TEXT",
            Value::Bytes(_) => "BLOB",
            Value::Json(_) => "JSON",
            Value::Array(_) => "ARRAY",
            #[cfg(feature = "datetime-support")]
            Value::Timestamp(_) => "TIMESTAMP",
            #[cfg(feature = "decimal-support")]
            Value::Decimal(_) => "DECIMAL",
            #[cfg(feature = "uuid-support")]
            Value::Uuid(_) => "UUID",
        }
    }

    /// Data type hint matching this value, if it has one
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null | Value::Array(_) => None,
            Value::Bool(_) => Some(DataType::Boolean),
            Value::I32(_) => Some(DataType::Int32),
            Value::I64(_) => Some(DataType::Int64),
            Value::F32(_) => Some(DataType::Float),
            Value::F64(_) => Some(DataType::Double),
            Value::String(_) => Some(DataType::String),
            Value::Bytes(_) => Some(DataType::Binary),
            Value::Json(_) => Some(DataType::Json),
            #[cfg(feature = "datetime-support")]
            Value::Timestamp(_) => Some(DataType::DateTime),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(_) => Some(DataType::Decimal),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(_) => Some(DataType::Guid),
        }
    }

    /// Extract array values if this is an Array variant
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Booleans become 0/1 integers, everything else is returned unchanged
    pub fn encode_bool(self) -> Value {
        match self {
            Value::Bool(b) => Value::I32(b as i32),
            other => other,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(*b as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::F32(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Value::F64(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            Value::String(s) => s.trim().parse().ok(),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) if d.fract().is_zero() => {
                rust_decimal::prelude::ToPrimitive::to_i64(d)
            }
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I32(v) => Some(*v as f64),
            Value::I64(v) => Some(*v as f64),
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            Value::String(s) => s.trim().parse().ok(),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => rust_decimal::prelude::ToPrimitive::to_f64(d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            other => other.as_i64().map(|v| v != 0),
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            other => format!("{} value '{}'", other.type_name(), other),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Json(j) => write!(f, "{}", j),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            #[cfg(feature = "datetime-support")]
            Value::Timestamp(t) => write!(f, "{}", t),
            #[cfg(feature = "decimal-support")]
            Value::Decimal(d) => write!(f, "{}", d),
            #[cfg(feature = "uuid-support")]
            Value::Uuid(u) => write!(f, "{}", u),
        }
    }
}

// Implement From for common types
impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(val: bool) -> Self {
        Value::Bool(val)
    }
}

impl From<i16> for Value {
    fn from(val: i16) -> Self {
        Value::I32(val as i32)
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Value::I32(val)
    }
}

impl From<i64> for Value {
    fn from(val: i64) -> Self {
        Value::I64(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Value::F32(val)
    }
}

impl From<f64> for Value {
    fn from(val: f64) -> Self {
        Value::F64(val)
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Value::String(val)
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Value::String(val.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(val: Vec<u8>) -> Self {
        Value::Bytes(val)
    }
}

impl From<serde_json::Value> for Value {
    fn from(val: serde_json::Value) -> Self {
        Value::Json(val)
    }
}

#[cfg(feature = "datetime-support")]
impl From<chrono::NaiveDateTime> for Value {
    fn from(val: chrono::NaiveDateTime) -> Self {
        Value::Timestamp(val)
    }
}

#[cfg(feature = "decimal-support")]
impl From<rust_decimal::Decimal> for Value {
    fn from(val: rust_decimal::Decimal) -> Self {
        Value::Decimal(val)
    }
}

#[cfg(feature = "uuid-support")]
impl From<uuid::Uuid> for Value {
    fn from(val: uuid::Uuid) -> Self {
        Value::Uuid(val)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Build an `IN` list from any collection of values
pub fn list<I, T>(values: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Value>,
{
    Value::Array(values.into_iter().map(Into::into).collect())
}

/// Conversion from a database value into a Rust type, coercing when the
/// stored representation differs (integers from strings, booleans from 0/1)
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self> {
                value
                    .as_i64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| Error::conversion(stringify!($ty), value.describe()))
            }
        }
    )*};
}

impl_from_value_integer!(i16, i32, i64, u32);

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| Error::conversion("f64", value.describe()))
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| Error::conversion("f32", value.describe()))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| Error::conversion("bool", value.describe()))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null | Value::Array(_) | Value::Bytes(_) => {
                Err(Error::conversion("String", value.describe()))
            }
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            Value::String(s) => Ok(s.into_bytes()),
            other => Err(Error::conversion("Vec<u8>", other.describe())),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(j) => Ok(j),
            Value::String(s) => Ok(serde_json::from_str(&s)?),
            other => Err(Error::conversion("JSON", other.describe())),
        }
    }
}

#[cfg(feature = "datetime-support")]
impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: Value) -> Result<Self> {
        const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];
        match value {
            Value::Timestamp(t) => Ok(t),
            Value::String(ref s) => FORMATS
                .iter()
                .find_map(|format| chrono::NaiveDateTime::parse_from_str(s.trim(), format).ok())
                .ok_or_else(|| Error::conversion("NaiveDateTime", value.describe())),
            other => Err(Error::conversion("NaiveDateTime", other.describe())),
        }
    }
}

#[cfg(feature = "decimal-support")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: Value) -> Result<Self> {
        use std::str::FromStr;
        let converted = match &value {
            Value::Decimal(d) => Some(*d),
            Value::I32(v) => Some(rust_decimal::Decimal::from(*v)),
            Value::I64(v) => Some(rust_decimal::Decimal::from(*v)),
            Value::F32(v) => rust_decimal::Decimal::try_from(*v as f64).ok(),
            Value::F64(v) => rust_decimal::Decimal::try_from(*v).ok(),
            Value::String(s) => rust_decimal::Decimal::from_str(s.trim()).ok(),
            _ => None,
        };
        converted.ok_or_else(|| Error::conversion("Decimal", value.describe()))
    }
}

#[cfg(feature = "uuid-support")]
impl FromValue for uuid::Uuid {
    fn from_value(value: Value) -> Result<Self> {
        let converted = match &value {
            Value::Uuid(u) => Some(*u),
            Value::String(s) => uuid::Uuid::parse_str(s.trim()).ok(),
            Value::Bytes(b) => uuid::Uuid::from_slice(b).ok(),
            _ => None,
        };
        converted.ok_or_else(|| Error::conversion("Uuid", value.describe()))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}
