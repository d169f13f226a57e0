//! The backend-neutral type system.
//!
//! Every column and parameter carries a [`DbType`] — a logical tag that each
//! backend maps to exactly one native wire type and exactly one host
//! representation ([`HostType`]). Values travel as [`DbValue`], which keeps an
//! explicit `Null` so callers never need the legacy sentinel convention; the
//! sentinels (empty string, `MIN`, nil UUID) are still recognized at the
//! parameter-construction edge for compatibility with callers that use them.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use uuid::Uuid;

/// Logical column/parameter types supported across all backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    /// Variable-length character data.
    VarChar,
    /// Variable-length national (Unicode) character data.
    NVarChar,
    /// Fixed-length character data.
    Char,
    /// 16-bit integer.
    Int16,
    /// 32-bit integer.
    Int32,
    /// 64-bit integer.
    Int64,
    /// 8-bit integer.
    TinyInt,
    /// Double-precision float.
    Double,
    /// Fixed-precision decimal/numeric.
    Decimal,
    /// Date and time.
    DateTime,
    /// High-precision date and time.
    DateTime2,
    /// Time of day.
    Time,
    /// Single bit / boolean.
    Bit,
    /// Globally unique identifier.
    Guid,
    /// Large binary object.
    Blob,
    /// Legacy image/binary data.
    Image,
    /// Variable-length binary data.
    VarBinary,
    /// XML document.
    Xml,
    /// Backend variant type (SQL Server sql_variant).
    SqlVariant,
}

impl DbType {
    /// Every supported logical type, for exhaustiveness checks.
    pub const ALL: [DbType; 19] = [
        DbType::VarChar,
        DbType::NVarChar,
        DbType::Char,
        DbType::Int16,
        DbType::Int32,
        DbType::Int64,
        DbType::TinyInt,
        DbType::Double,
        DbType::Decimal,
        DbType::DateTime,
        DbType::DateTime2,
        DbType::Time,
        DbType::Bit,
        DbType::Guid,
        DbType::Blob,
        DbType::Image,
        DbType::VarBinary,
        DbType::Xml,
        DbType::SqlVariant,
    ];

    /// The host representation for this logical type.
    pub fn host_type(self) -> HostType {
        match self {
            DbType::VarChar | DbType::NVarChar | DbType::Char | DbType::Xml => HostType::String,
            DbType::Int16 | DbType::TinyInt => HostType::I16,
            DbType::Int32 => HostType::I32,
            DbType::Int64 => HostType::I64,
            DbType::Double => HostType::F64,
            DbType::Decimal => HostType::Decimal,
            DbType::DateTime | DbType::DateTime2 => HostType::DateTime,
            DbType::Time => HostType::Time,
            DbType::Bit => HostType::Bool,
            DbType::Guid => HostType::Uuid,
            DbType::Blob | DbType::Image | DbType::VarBinary => HostType::Bytes,
            DbType::SqlVariant => HostType::Variant,
        }
    }

    /// Whether this is a character type (empty string acts as the sentinel).
    pub fn is_character(self) -> bool {
        matches!(
            self,
            DbType::VarChar | DbType::NVarChar | DbType::Char | DbType::Xml
        )
    }

    /// Whether this is a binary type.
    pub fn is_binary(self) -> bool {
        matches!(self, DbType::Blob | DbType::Image | DbType::VarBinary)
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Host-language representation of a logical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    String,
    I16,
    I32,
    I64,
    F64,
    Decimal,
    Bool,
    DateTime,
    Time,
    Uuid,
    Bytes,
    Variant,
}

/// An owned database value with an explicit null.
#[derive(Debug, Clone, PartialEq)]
pub enum DbValue {
    Null,
    String(String),
    I16(i16),
    I32(i32),
    I64(i64),
    F64(f64),
    Decimal(Decimal),
    Bool(bool),
    DateTime(NaiveDateTime),
    Uuid(Uuid),
    Bytes(Vec<u8>),
}

impl DbValue {
    /// Whether this is the explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, DbValue::Null)
    }

    /// Whether this value is the legacy "no value supplied" sentinel for the
    /// given logical type: the empty string for character types, `MIN` for
    /// numeric and date types, the nil UUID for GUIDs. Booleans and binary
    /// data have no sentinel.
    pub fn is_sentinel_for(&self, db_type: DbType) -> bool {
        match self {
            DbValue::Null => false,
            DbValue::String(s) => db_type.is_character() && s.is_empty(),
            DbValue::I16(v) => *v == i16::MIN,
            DbValue::I32(v) => *v == i32::MIN,
            DbValue::I64(v) => *v == i64::MIN,
            DbValue::F64(v) => *v == f64::MIN,
            DbValue::Decimal(v) => *v == Decimal::MIN,
            DbValue::DateTime(v) => *v == NaiveDateTime::MIN,
            DbValue::Uuid(v) => v.is_nil(),
            DbValue::Bool(_) | DbValue::Bytes(_) => false,
        }
    }

    /// Collapse the sentinel for `db_type` into the explicit null. Columns
    /// declared `nullable_as_ref` store sentinel values as real data, so only
    /// a true null stays null for them.
    pub fn resolve_null(self, db_type: DbType, nullable_as_ref: bool) -> DbValue {
        if !nullable_as_ref && self.is_sentinel_for(db_type) {
            return DbValue::Null;
        }
        self
    }

    /// The host representation of this value, if it is not null.
    pub fn host_type(&self) -> Option<HostType> {
        match self {
            DbValue::Null => None,
            DbValue::String(_) => Some(HostType::String),
            DbValue::I16(_) => Some(HostType::I16),
            DbValue::I32(_) => Some(HostType::I32),
            DbValue::I64(_) => Some(HostType::I64),
            DbValue::F64(_) => Some(HostType::F64),
            DbValue::Decimal(_) => Some(HostType::Decimal),
            DbValue::Bool(_) => Some(HostType::Bool),
            DbValue::DateTime(_) => Some(HostType::DateTime),
            DbValue::Uuid(_) => Some(HostType::Uuid),
            DbValue::Bytes(_) => Some(HostType::Bytes),
        }
    }

    /// Numeric view of this value, used for identity keys and catalog flags.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DbValue::I16(v) => Some(i64::from(*v)),
            DbValue::I32(v) => Some(i64::from(*v)),
            DbValue::I64(v) => Some(*v),
            DbValue::F64(v) => Some(*v as i64),
            DbValue::Decimal(v) => v.to_i64(),
            DbValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 32-bit numeric view of this value.
    pub fn as_i32(&self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    /// String slice view, for character values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DbValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view: booleans directly, integers as zero/non-zero, strings
    /// as "1"/"true".
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DbValue::Bool(v) => Some(*v),
            DbValue::I16(v) => Some(*v != 0),
            DbValue::I32(v) => Some(*v != 0),
            DbValue::I64(v) => Some(*v != 0),
            DbValue::String(s) => match s.trim() {
                "1" => Some(true),
                "0" => Some(false),
                other => other.to_ascii_lowercase().parse().ok(),
            },
            _ => None,
        }
    }

    /// Byte slice view, for binary values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DbValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl fmt::Display for DbValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbValue::Null => Ok(()),
            DbValue::String(s) => f.write_str(s),
            DbValue::I16(v) => write!(f, "{}", v),
            DbValue::I32(v) => write!(f, "{}", v),
            DbValue::I64(v) => write!(f, "{}", v),
            DbValue::F64(v) => write!(f, "{}", v),
            DbValue::Decimal(v) => write!(f, "{}", v),
            DbValue::Bool(v) => write!(f, "{}", v),
            DbValue::DateTime(v) => write!(f, "{}", v),
            DbValue::Uuid(v) => write!(f, "{}", v),
            DbValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<&str> for DbValue {
    fn from(value: &str) -> Self {
        DbValue::String(value.to_string())
    }
}

impl From<String> for DbValue {
    fn from(value: String) -> Self {
        DbValue::String(value)
    }
}

impl From<i16> for DbValue {
    fn from(value: i16) -> Self {
        DbValue::I16(value)
    }
}

impl From<i32> for DbValue {
    fn from(value: i32) -> Self {
        DbValue::I32(value)
    }
}

impl From<i64> for DbValue {
    fn from(value: i64) -> Self {
        DbValue::I64(value)
    }
}

impl From<f64> for DbValue {
    fn from(value: f64) -> Self {
        DbValue::F64(value)
    }
}

impl From<bool> for DbValue {
    fn from(value: bool) -> Self {
        DbValue::Bool(value)
    }
}

impl From<Decimal> for DbValue {
    fn from(value: Decimal) -> Self {
        DbValue::Decimal(value)
    }
}

impl From<NaiveDateTime> for DbValue {
    fn from(value: NaiveDateTime) -> Self {
        DbValue::DateTime(value)
    }
}

impl From<Uuid> for DbValue {
    fn from(value: Uuid) -> Self {
        DbValue::Uuid(value)
    }
}

impl From<Vec<u8>> for DbValue {
    fn from(value: Vec<u8>) -> Self {
        DbValue::Bytes(value)
    }
}

impl<T> From<Option<T>> for DbValue
where
    T: Into<DbValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(DbValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_type_has_a_host_type() {
        for db_type in DbType::ALL {
            // host_type is total; this would panic on an unmatched variant
            let _ = db_type.host_type();
        }
        assert_eq!(DbType::Int32.host_type(), HostType::I32);
        assert_eq!(DbType::NVarChar.host_type(), HostType::String);
        assert_eq!(DbType::VarBinary.host_type(), HostType::Bytes);
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(DbValue::from("").is_sentinel_for(DbType::VarChar));
        assert!(!DbValue::from("x").is_sentinel_for(DbType::VarChar));
        assert!(DbValue::from(i32::MIN).is_sentinel_for(DbType::Int32));
        assert!(DbValue::from(i64::MIN).is_sentinel_for(DbType::Int64));
        assert!(DbValue::from(f64::MIN).is_sentinel_for(DbType::Double));
        assert!(DbValue::DateTime(NaiveDateTime::MIN).is_sentinel_for(DbType::DateTime));
        assert!(DbValue::Uuid(Uuid::nil()).is_sentinel_for(DbType::Guid));
        // booleans and bytes have no sentinel
        assert!(!DbValue::from(false).is_sentinel_for(DbType::Bit));
        assert!(!DbValue::Bytes(Vec::new()).is_sentinel_for(DbType::Blob));
    }

    #[test]
    fn test_resolve_null_maps_sentinel() {
        assert_eq!(
            DbValue::from(i32::MIN).resolve_null(DbType::Int32, false),
            DbValue::Null
        );
        assert_eq!(
            DbValue::from(7).resolve_null(DbType::Int32, false),
            DbValue::I32(7)
        );
    }

    #[test]
    fn test_resolve_null_respects_nullable_as_ref() {
        // a nullable-as-reference column stores the sentinel as data
        assert_eq!(
            DbValue::from(i32::MIN).resolve_null(DbType::Int32, true),
            DbValue::I32(i32::MIN)
        );
        assert_eq!(DbValue::Null.resolve_null(DbType::Int32, true), DbValue::Null);
    }

    #[test]
    fn test_numeric_views() {
        assert_eq!(DbValue::from(42i32).as_i64(), Some(42));
        assert_eq!(DbValue::Decimal(Decimal::new(1234, 2)).as_i64(), Some(12));
        assert_eq!(DbValue::from("17").as_i64(), Some(17));
        assert_eq!(DbValue::from(1i32).as_bool(), Some(true));
        assert_eq!(DbValue::from("0").as_bool(), Some(false));
        assert_eq!(DbValue::Null.as_i64(), None);
    }
}
