//! Value layer - typed SQL scalars carried by the plan IR
//!
//! `TypeId` names every value type a plan can mention. `Value` is the
//! typed scalar held by constant expressions, resolved insert tuples and
//! catalog rows. Equality is strict by type: `Integer(1)` and `BigInt(1)`
//! are different values. Cross-type ordering is only defined between
//! numeric types and is reported through `ValueError::TypeMismatch`
//! otherwise.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// SQL value type identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeId {
    /// No type (e.g. the `*` in `COUNT(*)`)
    Invalid,
    /// Offset into a prepared statement's parameter list
    ParameterOffset,
    /// Boolean (true/false)
    Boolean,
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 64-bit floating point
    Decimal,
    /// Timestamp as unix microseconds
    Timestamp,
    /// Variable-length string
    Varchar,
    /// Variable-length binary data
    Varbinary,
}

impl TypeId {
    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeId::TinyInt | TypeId::SmallInt | TypeId::Integer | TypeId::BigInt | TypeId::Decimal
        )
    }

    /// Check if this type is an integer
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeId::TinyInt | TypeId::SmallInt | TypeId::Integer | TypeId::BigInt
        )
    }

    /// Check if this type is variable length
    pub fn is_variable_length(&self) -> bool {
        matches!(self, TypeId::Varchar | TypeId::Varbinary)
    }

    /// Stable numeric code, stored in the `atttypid` column of `pg_attribute`
    pub fn code(&self) -> i32 {
        match self {
            TypeId::Invalid => 0,
            TypeId::ParameterOffset => 1,
            TypeId::Boolean => 2,
            TypeId::TinyInt => 3,
            TypeId::SmallInt => 4,
            TypeId::Integer => 5,
            TypeId::BigInt => 6,
            TypeId::Decimal => 7,
            TypeId::Timestamp => 8,
            TypeId::Varchar => 9,
            TypeId::Varbinary => 10,
        }
    }

    /// Inverse of [`TypeId::code`]
    pub fn from_code(code: i32) -> Option<TypeId> {
        let type_id = match code {
            0 => TypeId::Invalid,
            1 => TypeId::ParameterOffset,
            2 => TypeId::Boolean,
            3 => TypeId::TinyInt,
            4 => TypeId::SmallInt,
            5 => TypeId::Integer,
            6 => TypeId::BigInt,
            7 => TypeId::Decimal,
            8 => TypeId::Timestamp,
            9 => TypeId::Varchar,
            10 => TypeId::Varbinary,
            _ => return None,
        };
        Some(type_id)
    }

    /// Fixed storage size in bytes, -1 for variable-length types
    pub fn size(&self) -> i32 {
        match self {
            TypeId::Invalid => 0,
            TypeId::Boolean | TypeId::TinyInt => 1,
            TypeId::SmallInt => 2,
            TypeId::Integer | TypeId::ParameterOffset => 4,
            TypeId::BigInt | TypeId::Decimal | TypeId::Timestamp => 8,
            TypeId::Varchar | TypeId::Varbinary => -1,
        }
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeId::Invalid => "INVALID",
            TypeId::ParameterOffset => "PARAMETER_OFFSET",
            TypeId::Boolean => "BOOLEAN",
            TypeId::TinyInt => "TINYINT",
            TypeId::SmallInt => "SMALLINT",
            TypeId::Integer => "INTEGER",
            TypeId::BigInt => "BIGINT",
            TypeId::Decimal => "DECIMAL",
            TypeId::Timestamp => "TIMESTAMP",
            TypeId::Varchar => "VARCHAR",
            TypeId::Varbinary => "VARBINARY",
        };
        f.write_str(name)
    }
}

/// Value layer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Two values of incompatible types were compared or converted
    #[error("Type mismatch: {left} is not compatible with {right}")]
    TypeMismatch { left: TypeId, right: TypeId },

    /// A literal could not be parsed as the requested type
    #[error("Cannot parse '{input}' as {type_id}")]
    Parse { type_id: TypeId, input: String },
}

/// Result type for value operations
pub type ValueResult<T> = Result<T, ValueError>;

/// A typed SQL value
///
/// NULL keeps its type so that a NULL integer constant and a NULL varchar
/// constant are distinguishable in plans. Decimal NaNs all compare equal
/// to each other, whatever their payload bits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null(TypeId),
    Boolean(bool),
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Decimal(#[serde(with = "decimal_repr")] f64),
    Timestamp(i64),
    Varchar(String),
    Varbinary(Vec<u8>),
}

impl Value {
    /// Get the type of this value
    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null(t) => *t,
            Value::Boolean(_) => TypeId::Boolean,
            Value::TinyInt(_) => TypeId::TinyInt,
            Value::SmallInt(_) => TypeId::SmallInt,
            Value::Integer(_) => TypeId::Integer,
            Value::BigInt(_) => TypeId::BigInt,
            Value::Decimal(_) => TypeId::Decimal,
            Value::Timestamp(_) => TypeId::Timestamp,
            Value::Varchar(_) => TypeId::Varchar,
            Value::Varbinary(_) => TypeId::Varbinary,
        }
    }

    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// Convert to boolean, returns None if NULL or not a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen any integer value to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert any numeric value to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Decimal(f) => Some(*f),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Convert to string reference, returns None if NULL or not a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(s) => Some(s),
            _ => None,
        }
    }

    /// Compare two values under SQL semantics
    ///
    /// Returns `Ok(None)` when either side is NULL. Numeric values compare
    /// across widths; any other pair of differing types is a mismatch.
    pub fn compare(&self, other: &Value) -> ValueResult<Option<Ordering>> {
        if self.is_null() || other.is_null() {
            return Ok(None);
        }
        let mismatch = || ValueError::TypeMismatch {
            left: self.type_id(),
            right: other.type_id(),
        };
        let ordering = match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => a.cmp(b),
            (Value::Varbinary(a), Value::Varbinary(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Decimal(_), _) | (_, Value::Decimal(_)) => {
                let (a, b) = match (self.as_f64(), other.as_f64()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err(mismatch()),
                };
                a.total_cmp(&b)
            }
            _ => match (self.as_i64(), other.as_i64()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => return Err(mismatch()),
            },
        };
        Ok(Some(ordering))
    }

    /// SQL equality: `Ok(None)` if either side is NULL
    pub fn sql_eq(&self, other: &Value) -> ValueResult<Option<bool>> {
        Ok(self.compare(other)?.map(|o| o == Ordering::Equal))
    }

    /// Convert this value to `target`, widening or narrowing numerics
    pub fn cast_to(&self, target: TypeId) -> ValueResult<Value> {
        if self.type_id() == target {
            return Ok(self.clone());
        }
        let mismatch = || ValueError::TypeMismatch {
            left: self.type_id(),
            right: target,
        };
        if self.is_null() {
            return Ok(Value::Null(target));
        }
        if !(self.type_id().is_numeric() && target.is_numeric()) {
            return Err(mismatch());
        }
        if target == TypeId::Decimal {
            return self.as_f64().map(Value::Decimal).ok_or_else(mismatch);
        }
        let wide = self.as_i64().ok_or_else(mismatch)?;
        let value = match target {
            TypeId::TinyInt => Value::TinyInt(i8::try_from(wide).map_err(|_| mismatch())?),
            TypeId::SmallInt => Value::SmallInt(i16::try_from(wide).map_err(|_| mismatch())?),
            TypeId::Integer => Value::Integer(i32::try_from(wide).map_err(|_| mismatch())?),
            TypeId::BigInt => Value::BigInt(wide),
            _ => return Err(mismatch()),
        };
        Ok(value)
    }

    /// Parse a literal (as stored for column defaults) into a value of `type_id`
    ///
    /// `NULL` (any case) yields a typed NULL; string literals may be wrapped
    /// in single quotes.
    pub fn parse(type_id: TypeId, input: &str) -> ValueResult<Value> {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("null") {
            return Ok(Value::Null(type_id));
        }
        let err = || ValueError::Parse {
            type_id,
            input: input.to_string(),
        };
        let value = match type_id {
            TypeId::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "t" | "1" => Value::Boolean(true),
                "false" | "f" | "0" => Value::Boolean(false),
                _ => return Err(err()),
            },
            TypeId::TinyInt => Value::TinyInt(trimmed.parse().map_err(|_| err())?),
            TypeId::SmallInt => Value::SmallInt(trimmed.parse().map_err(|_| err())?),
            TypeId::Integer => Value::Integer(trimmed.parse().map_err(|_| err())?),
            TypeId::BigInt => Value::BigInt(trimmed.parse().map_err(|_| err())?),
            TypeId::Decimal => Value::Decimal(trimmed.parse().map_err(|_| err())?),
            TypeId::Timestamp => Value::Timestamp(trimmed.parse().map_err(|_| err())?),
            TypeId::Varchar => {
                let unquoted = trimmed
                    .strip_prefix('\'')
                    .and_then(|s| s.strip_suffix('\''))
                    .unwrap_or(trimmed);
                Value::Varchar(unquoted.to_string())
            }
            TypeId::Varbinary => Value::Varbinary(trimmed.as_bytes().to_vec()),
            TypeId::Invalid | TypeId::ParameterOffset => return Err(err()),
        };
        Ok(value)
    }
}

fn decimal_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null(a), Value::Null(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::TinyInt(a), Value::TinyInt(b)) => a == b,
            (Value::SmallInt(a), Value::SmallInt(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => decimal_bits(*a) == decimal_bits(*b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Varchar(a), Value::Varchar(b)) => a == b,
            (Value::Varbinary(a), Value::Varbinary(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null(t) => t.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::TinyInt(v) => v.hash(state),
            Value::SmallInt(v) => v.hash(state),
            Value::Integer(v) => v.hash(state),
            Value::BigInt(v) => v.hash(state),
            Value::Decimal(f) => decimal_bits(*f).hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::Varchar(s) => s.hash(state),
            Value::Varbinary(b) => b.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null(_) => write!(f, "NULL"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Timestamp(t) => write!(f, "ts:{}", t),
            Value::Varchar(s) => write!(f, "'{}'", s),
            Value::Varbinary(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

/// JSON form of a decimal: finite values are numbers, the rest are the
/// strings `"inf"`, `"-inf"` and `"nan"`.
mod decimal_repr {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if value.is_sign_positive() {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl Visitor<'_> for DecimalVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or one of \"inf\", \"-inf\", \"nan\"")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            match v {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Varchar(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Varchar(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type_ids() {
        assert_eq!(Value::from(5).type_id(), TypeId::Integer);
        assert_eq!(Value::from("a").type_id(), TypeId::Varchar);
        assert_eq!(Value::Null(TypeId::BigInt).type_id(), TypeId::BigInt);
        assert!(Value::Null(TypeId::Varchar).is_null());
    }

    #[test]
    fn test_value_equality_is_strict() {
        assert_eq!(Value::Integer(1), Value::Integer(1));
        assert_ne!(Value::Integer(1), Value::BigInt(1));
        assert_ne!(Value::Null(TypeId::Integer), Value::Null(TypeId::Varchar));
        assert_eq!(Value::Decimal(1.5), Value::Decimal(1.5));
    }

    #[test]
    fn test_value_compare() {
        assert_eq!(
            Value::Integer(1).compare(&Value::BigInt(2)).unwrap(),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::Decimal(2.0).compare(&Value::Integer(2)).unwrap(),
            Some(Ordering::Equal)
        );
        assert_eq!(Value::Null(TypeId::Integer).compare(&Value::Integer(1)).unwrap(), None);
        assert!(matches!(
            Value::Integer(1).compare(&Value::from("1")),
            Err(ValueError::TypeMismatch {
                left: TypeId::Integer,
                right: TypeId::Varchar
            })
        ));
    }

    #[test]
    fn test_value_cast() {
        assert_eq!(Value::Integer(7).cast_to(TypeId::BigInt).unwrap(), Value::BigInt(7));
        assert_eq!(Value::BigInt(7).cast_to(TypeId::Decimal).unwrap(), Value::Decimal(7.0));
        assert!(Value::BigInt(i64::MAX).cast_to(TypeId::Integer).is_err());
        assert!(Value::from("x").cast_to(TypeId::Integer).is_err());
        assert_eq!(
            Value::Null(TypeId::Integer).cast_to(TypeId::BigInt).unwrap(),
            Value::Null(TypeId::BigInt)
        );
    }

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse(TypeId::Integer, "0").unwrap(), Value::Integer(0));
        assert_eq!(
            Value::parse(TypeId::Varchar, "'default'").unwrap(),
            Value::from("default")
        );
        assert_eq!(
            Value::parse(TypeId::Boolean, "NULL").unwrap(),
            Value::Null(TypeId::Boolean)
        );
        assert!(matches!(
            Value::parse(TypeId::Integer, "abc"),
            Err(ValueError::Parse { .. })
        ));
    }

    #[test]
    fn test_type_code_roundtrip() {
        for t in [TypeId::Boolean, TypeId::Integer, TypeId::Varchar, TypeId::Timestamp] {
            assert_eq!(TypeId::from_code(t.code()), Some(t));
        }
        assert_eq!(TypeId::from_code(99), None);
        assert_eq!(TypeId::Varchar.size(), -1);
        assert_eq!(TypeId::Integer.size(), 4);
    }

    #[test]
    fn test_non_finite_decimal_json() {
        for (value, text) in [
            (f64::INFINITY, r#"{"Decimal":"inf"}"#),
            (f64::NEG_INFINITY, r#"{"Decimal":"-inf"}"#),
            (f64::NAN, r#"{"Decimal":"nan"}"#),
        ] {
            let json = serde_json::to_string(&Value::Decimal(value)).unwrap();
            assert_eq!(json, text);
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, Value::Decimal(value));
        }

        let back: Value = serde_json::from_str(r#"{"Decimal":-0.0}"#).unwrap();
        assert_eq!(back, Value::Decimal(-0.0));
        assert_ne!(back, Value::Decimal(0.0));
        let back: Value = serde_json::from_str(r#"{"Decimal":3}"#).unwrap();
        assert_eq!(back, Value::Decimal(3.0));
        assert!(serde_json::from_str::<Value>(r#"{"Decimal":"infinity"}"#).is_err());
        assert!(serde_json::from_str::<Value>(r#"{"Decimal":null}"#).is_err());
    }

    #[test]
    fn test_nan_payloads_are_one_value() {
        use std::collections::hash_map::DefaultHasher;

        let quiet = Value::Decimal(f64::NAN);
        let other = Value::Decimal(f64::from_bits(f64::NAN.to_bits() | 1));
        assert_eq!(quiet, other);

        let hash = |v: &Value| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&quiet), hash(&other));
    }
}
