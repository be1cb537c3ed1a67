//! SQL values and parameter handling.
//!
//! Bound values travel as [`SqlValue`] from expressions to the executor;
//! result values come back the same way and are converted with
//! [`FromSqlValue`].

use crate::error::{Error, Result};

/// A SQL value that can be used as a parameter or read from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Used by literal expressions; bound values never pass through here.
    /// Floats always carry a decimal point or an exponent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLiteral`] for NaN and infinite floats.
    pub fn to_sql_inline(&self) -> Result<String> {
        Ok(match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) if !f.is_finite() => return Err(Error::InvalidLiteral(f.to_string())),
            Self::Float(f) => format!("{f:?}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
        })
    }

    /// Returns true for [`SqlValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn conversion_error(&self, target: &'static str) -> Error {
        Error::Conversion {
            value: format!("{self:?}"),
            target,
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! impl_to_sql_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_int!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

/// Trait for types that can be read back from a result value.
pub trait FromSqlValue: Sized {
    /// Converts a result value, failing on NULL or an incompatible type.
    fn from_sql_value(value: SqlValue) -> Result<Self>;
}

impl FromSqlValue for SqlValue {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromSqlValue for bool {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Bool(b) => Ok(b),
            // SQLite and Db2 store booleans as integers
            SqlValue::Int(0) => Ok(false),
            SqlValue::Int(1) => Ok(true),
            other => Err(other.conversion_error("bool")),
        }
    }
}

macro_rules! impl_from_sql_int {
    ($($ty:ty),+) => {
        $(
            impl FromSqlValue for $ty {
                fn from_sql_value(value: SqlValue) -> Result<Self> {
                    match value {
                        SqlValue::Int(n) => <$ty>::try_from(n)
                            .map_err(|_| SqlValue::Int(n).conversion_error(stringify!($ty))),
                        other => Err(other.conversion_error(stringify!($ty))),
                    }
                }
            }
        )+
    };
}

impl_from_sql_int!(i64, i32, i16, i8, u32, u16, u8);

impl FromSqlValue for f64 {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Float(f) => Ok(f),
            #[allow(clippy::cast_precision_loss)]
            SqlValue::Int(n) => Ok(n as f64),
            other => Err(other.conversion_error("f64")),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(other.conversion_error("String")),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Blob(b) => Ok(b),
            SqlValue::Text(s) => Ok(s.into_bytes()),
            other => Err(other.conversion_error("Vec<u8>")),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql_value(value: SqlValue) -> Result<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_value_inline_null() {
        assert_eq!(SqlValue::Null.to_sql_inline().unwrap(), "NULL");
    }

    #[test]
    fn test_sql_value_inline_bool() {
        assert_eq!(SqlValue::Bool(true).to_sql_inline().unwrap(), "TRUE");
        assert_eq!(SqlValue::Bool(false).to_sql_inline().unwrap(), "FALSE");
    }

    #[test]
    fn test_sql_value_inline_text_escaping() {
        assert_eq!(
            SqlValue::Text(String::from("O'Brien")).to_sql_inline().unwrap(),
            "'O''Brien'"
        );
        let malicious = SqlValue::Text(String::from("'; DROP TABLE users; --"));
        assert_eq!(malicious.to_sql_inline().unwrap(), "'''; DROP TABLE users; --'");
    }

    #[test]
    fn test_sql_value_inline_float() {
        assert_eq!(SqlValue::Float(1.0).to_sql_inline().unwrap(), "1.0");
        assert_eq!(SqlValue::Float(-2.5).to_sql_inline().unwrap(), "-2.5");
        assert!(matches!(
            SqlValue::Float(f64::NAN).to_sql_inline(),
            Err(Error::InvalidLiteral(_))
        ));
        assert!(matches!(
            SqlValue::Float(f64::INFINITY).to_sql_inline(),
            Err(Error::InvalidLiteral(v)) if v == "inf"
        ));
    }

    #[test]
    fn test_sql_value_inline_blob() {
        assert_eq!(
            SqlValue::Blob(vec![0x48, 0x45, 0x4C, 0x4C, 0x4F]).to_sql_inline().unwrap(),
            "X'48454C4C4F'"
        );
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!(
            "hello".to_sql_value(),
            SqlValue::Text(String::from("hello"))
        );
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
        assert_eq!(Some(42_i32).to_sql_value(), SqlValue::Int(42));
    }

    #[test]
    fn test_from_sql_value_conversions() {
        assert_eq!(i64::from_sql_value(SqlValue::Int(7)).unwrap(), 7);
        assert_eq!(i32::from_sql_value(SqlValue::Int(-3)).unwrap(), -3);
        assert!(bool::from_sql_value(SqlValue::Int(1)).unwrap());
        assert!((f64::from_sql_value(SqlValue::Int(2)).unwrap() - 2.0).abs() < f64::EPSILON);
        assert_eq!(
            Option::<String>::from_sql_value(SqlValue::Null).unwrap(),
            None
        );
        assert_eq!(
            Option::<String>::from_sql_value(SqlValue::Text(String::from("x"))).unwrap(),
            Some(String::from("x"))
        );
    }

    #[test]
    fn test_from_sql_value_rejects_null_and_overflow() {
        let err = String::from_sql_value(SqlValue::Null).unwrap_err();
        assert!(matches!(err, Error::Conversion { target: "String", .. }));

        let err = u8::from_sql_value(SqlValue::Int(300)).unwrap_err();
        assert!(matches!(err, Error::Conversion { target: "u8", .. }));
    }
}
