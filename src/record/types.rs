//! Column types and the values they carry.
//!
//! Each [`ColumnType`] owns the two marshalling operations used by the read
//! and write paths alike: binding a value into a statement position and
//! rendering a primary key value as a cache key fragment.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ResourceError, Result};
use crate::record::PreparedStatement;

// == Column Type ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Fixed-point number carried in its decimal text form
    Decimal,
    Text,
    Blob,
    Timestamp,
    /// Column whose type could not be mapped; never binds
    Unknown,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Byte => "byte",
            ColumnType::Short => "short",
            ColumnType::Int => "int",
            ColumnType::Long => "long",
            ColumnType::Float => "float",
            ColumnType::Double => "double",
            ColumnType::Decimal => "decimal",
            ColumnType::Text => "text",
            ColumnType::Blob => "blob",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Unknown => "unknown",
        }
    }

    /// Whether `value` may be stored in a column of this type. NULL fits
    /// every known type.
    pub fn accepts(self, value: &Value) -> bool {
        match value {
            Value::Null => self != ColumnType::Unknown,
            other => other.column_type() == Some(self),
        }
    }

    fn check(self, value: &Value) -> Result<()> {
        if self == ColumnType::Unknown {
            return Err(ResourceError::UnsupportedType(self.name().to_string()));
        }
        if !self.accepts(value) {
            return Err(ResourceError::TypeMismatch(format!(
                "{} value for {} column",
                value.type_name(),
                self.name()
            )));
        }
        Ok(())
    }

    // == Bind ==
    /// Binds `value` at the 1-based `position` of `statement`.
    ///
    /// Values are never coerced: a value of another type is a `TypeMismatch`
    /// and the `Unknown` type is always `UnsupportedType`.
    pub fn bind(self, statement: &mut PreparedStatement, position: usize, value: &Value) -> Result<()> {
        self.check(value)?;
        statement.set(position, value.clone())
    }

    // == Encode Cache Key ==
    /// Renders a primary key value for use inside a cache key.
    ///
    /// Distinct values of one type always render differently.
    pub fn encode_cache_key(self, value: &Value) -> Result<String> {
        self.check(value)?;
        let encoded = match value {
            Value::Null => {
                return Err(ResourceError::TypeMismatch(
                    "NULL cannot identify a record".to_string(),
                ))
            }
            Value::Bool(v) => v.to_string(),
            Value::Byte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::Decimal(v) | Value::Text(v) => v.clone(),
            Value::Blob(bytes) => bytes.iter().map(|b| format!("{:02x}", b)).collect(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        };
        Ok(encoded)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// == Value ==
/// One column value of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(String),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Type of a non-NULL value.
    pub fn column_type(&self) -> Option<ColumnType> {
        let ty = match self {
            Value::Null => return None,
            Value::Bool(_) => ColumnType::Boolean,
            Value::Byte(_) => ColumnType::Byte,
            Value::Short(_) => ColumnType::Short,
            Value::Int(_) => ColumnType::Int,
            Value::Long(_) => ColumnType::Long,
            Value::Float(_) => ColumnType::Float,
            Value::Double(_) => ColumnType::Double,
            Value::Decimal(_) => ColumnType::Decimal,
            Value::Text(_) => ColumnType::Text,
            Value::Blob(_) => ColumnType::Blob,
            Value::Timestamp(_) => ColumnType::Timestamp,
        };
        Some(ty)
    }

    pub fn type_name(&self) -> &'static str {
        self.column_type().map(ColumnType::name).unwrap_or("null")
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Blob(bytes) => write!(f, "[{} bytes]", bytes.len()),
            Value::Timestamp(ts) => f.write_str(&ts.to_rfc3339()),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Decimal(v) | Value::Text(v) => f.write_str(v),
        }
    }
}

macro_rules! impl_from_for_value {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

impl_from_for_value!(
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => Text,
    Vec<u8> => Blob,
    DateTime<Utc> => Timestamp,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
