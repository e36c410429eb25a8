//! # Value Type System
//!
//! Literal values carried by predicate expressions and statistics bounds,
//! plus the column data types reported by plan nodes.
//!
//! Equality and hashing are structural (a `Float64` compares by bit
//! pattern, an `Int32(1)` is not equal to an `Int64(1)`), which is what plan
//! hashing needs. Ordering across numeric widths is exposed separately via
//! [`Value::compare`] because it is a semantic comparison, not a structural one.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int32,
    Int64,
    Float64,
    String,
    Null,
}

impl DataType {
    /// Numeric types have a meaningful value range for statistics
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float64)
    }

    /// Types whose values can be range-compared
    pub fn is_ordered(&self) -> bool {
        !matches!(self, DataType::Null)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Int32 => "int",
            DataType::Int64 => "long",
            DataType::Float64 => "double",
            DataType::String => "string",
            DataType::Null => "null",
        };
        f.write_str(name)
    }
}

/// A single literal value
#[derive(Debug, Clone)]
pub enum Value {
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// UTF-8 string (reference counted for cheap plan copies)
    String(Arc<str>),
    /// Null/missing value
    Null,
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::Float64(_) => DataType::Float64,
            Value::String(_) => DataType::String,
            Value::Null => DataType::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(v) => Some(f64::from(*v)),
            Value::Int64(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::String(_) | Value::Null => None,
        }
    }

    /// Semantic ordering. Integers compare exactly across widths, floats
    /// against anything numeric by value. `None` for NULL, NaN or mismatched
    /// kinds (string vs number).
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => Some(a.cmp(b)),
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::Int32(a), Value::Int64(b)) => Some(i64::from(*a).cmp(b)),
            (Value::Int64(a), Value::Int32(b)) => Some(a.cmp(&i64::from(*b))),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Null, _) | (_, Value::Null) => None,
            _ => {
                let (a, b) = (self.as_f64()?, other.as_f64()?);
                a.partial_cmp(&b)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::String(s) => write!(f, "'{s}'"),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a.to_bits() == b.to_bits(),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

// Manual impl so floats hash by bit pattern, consistent with PartialEq
impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int32(v) => v.hash(state),
            Value::Int64(v) => v.hash(state),
            Value::Float64(v) => v.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::Null => {}
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Value::Int32(1), Value::Int32(1));
        assert_ne!(Value::Int32(1), Value::Int64(1));
        assert_eq!(Value::Float64(f64::NAN), Value::Float64(f64::NAN));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_compare_across_widths() {
        assert_eq!(
            Value::Int32(5).compare(&Value::Int64(7)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Float64(2.5).compare(&Value::Int32(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::from("a").compare(&Value::from("b")),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Null.compare(&Value::Int32(1)), None);
        assert_eq!(Value::from("a").compare(&Value::Int32(1)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("orders").to_string(), "'orders'");
        assert_eq!(Value::Int64(42).to_string(), "42");
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(DataType::Float64.to_string(), "double");
    }
}
