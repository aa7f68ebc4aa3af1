use std::collections::HashMap;
use std::fmt;

use crate::datetime::Datetime;

/// One record of a table: column name to cell value.
pub type Row = HashMap<String, Scalar>;

/// A single cell value produced by evaluating an expression.
///
/// Integers and floating-point numbers are kept apart so that row numbers
/// and counts survive a round trip through JSON as integers.
///
/// # Examples
///
/// ```
/// use tidyblocks::Scalar;
///
/// assert_eq!(Scalar::Integer(3).as_float(), Some(3.0));
/// assert!(Scalar::Missing.is_missing());
/// assert_eq!(Scalar::Text("a".into()).type_name(), "text");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// The missing-value sentinel
    Missing,

    /// Logical (Boolean) value
    Logical(bool),

    /// Integer number
    Integer(i64),

    /// Floating-point number
    Number(f64),

    /// UTF-8 text
    Text(String),

    /// UTC datetime
    Datetime(Datetime),
}

impl Scalar {
    pub fn is_missing(&self) -> bool {
        matches!(self, Scalar::Missing)
    }

    /// Human-readable type name, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Missing => "missing",
            Scalar::Logical(_) => "logical",
            Scalar::Integer(_) => "integer",
            Scalar::Number(_) => "number",
            Scalar::Text(_) => "text",
            Scalar::Datetime(_) => "datetime",
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Integer(n) => Some(*n as f64),
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as logical; only `Logical` values convert
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Scalar::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Missing => write!(f, "MISSING"),
            Scalar::Logical(b) => write!(f, "{}", b),
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s),
            Scalar::Datetime(dt) => write!(f, "{}", dt),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Logical(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(n)
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<Datetime> for Scalar {
    fn from(dt: Datetime) -> Self {
        Scalar::Datetime(dt)
    }
}
