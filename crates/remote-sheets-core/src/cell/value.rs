//! Cell value types

use std::fmt;

use crate::error::{Error, Result};

/// A value held in a view's cache.
///
/// Values read back from the remote service are usually text (formatted
/// rendering); unformatted rendering can also produce numbers and booleans.
/// Values written locally keep their numeric type until they are committed.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Text value; the empty string stands for an empty cell
    Text(String),

    /// Integer value
    Integer(i64),

    /// Floating-point value
    Number(f64),

    /// Boolean value (only produced by unformatted reads)
    Boolean(bool),
}

impl CellValue {
    /// The value of a cell with no content
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }

    /// Try to get the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Integer(n) => Some(*n as f64),
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(n) => write!(f, "{}", n),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Boolean(true) => f.write_str("TRUE"),
            CellValue::Boolean(false) => f.write_str("FALSE"),
        }
    }
}

impl PartialEq<str> for CellValue {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for CellValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<CellValue> for &str {
    fn eq(&self, other: &CellValue) -> bool {
        other.as_str() == Some(*self)
    }
}

/// Anything a caller may write into a cell, before normalization.
///
/// Every accepted input kind has exactly one normalized form, see
/// [`CellInput::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellInput {
    /// No value; written as the empty string
    Empty,
    /// Integer; passes through unchanged
    Integer(i64),
    /// Floating-point number; passes through unchanged
    Float(f64),
    /// Raw bytes; must decode as strict ASCII
    Bytes(Vec<u8>),
    /// Any other value, already stringified
    Text(String),
}

impl CellInput {
    /// Stringify any displayable value
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        CellInput::Text(value.to_string())
    }

    /// Convert into the value stored in the cache and sent on commit
    pub fn normalize(self) -> Result<CellValue> {
        match self {
            CellInput::Empty => Ok(CellValue::empty()),
            CellInput::Integer(n) => Ok(CellValue::Integer(n)),
            CellInput::Float(n) => Ok(CellValue::Number(n)),
            CellInput::Bytes(bytes) => decode_ascii(&bytes).map(CellValue::Text),
            CellInput::Text(s) => Ok(CellValue::Text(s)),
        }
    }
}

fn decode_ascii(bytes: &[u8]) -> Result<String> {
    if let Some(position) = bytes.iter().position(|b| !b.is_ascii()) {
        return Err(Error::AsciiDecode {
            position,
            byte: bytes[position],
        });
    }
    // All bytes are ASCII, so each maps to the char of the same code point
    Ok(bytes.iter().map(|&b| b as char).collect())
}

impl From<&str> for CellInput {
    fn from(s: &str) -> Self {
        CellInput::Text(s.to_string())
    }
}

impl From<String> for CellInput {
    fn from(s: String) -> Self {
        CellInput::Text(s)
    }
}

impl From<&String> for CellInput {
    fn from(s: &String) -> Self {
        CellInput::Text(s.clone())
    }
}

impl From<char> for CellInput {
    fn from(c: char) -> Self {
        CellInput::Text(c.to_string())
    }
}

impl From<bool> for CellInput {
    fn from(b: bool) -> Self {
        CellInput::Text(if b { "TRUE" } else { "FALSE" }.to_string())
    }
}

impl From<&[u8]> for CellInput {
    fn from(bytes: &[u8]) -> Self {
        CellInput::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for CellInput {
    fn from(bytes: &[u8; N]) -> Self {
        CellInput::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for CellInput {
    fn from(bytes: Vec<u8>) -> Self {
        CellInput::Bytes(bytes)
    }
}

impl From<f64> for CellInput {
    fn from(n: f64) -> Self {
        CellInput::Float(n)
    }
}

impl From<f32> for CellInput {
    fn from(n: f32) -> Self {
        CellInput::Float(n as f64)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CellInput {
                fn from(n: $t) -> Self {
                    CellInput::Integer(n as i64)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32);

// Values beyond the i64 range are sent as floating point numbers
macro_rules! impl_from_wide_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CellInput {
                fn from(n: $t) -> Self {
                    match i64::try_from(n) {
                        Ok(n) => CellInput::Integer(n),
                        Err(_) => CellInput::Float(n as f64),
                    }
                }
            }
        )*
    };
}

impl_from_wide_integer!(isize, usize, u64);

impl From<CellValue> for CellInput {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Text(s) => CellInput::Text(s),
            CellValue::Integer(n) => CellInput::Integer(n),
            CellValue::Number(n) => CellInput::Float(n),
            CellValue::Boolean(b) => CellInput::from(b),
        }
    }
}

impl<T: Into<CellInput>> From<Option<T>> for CellInput {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => CellInput::Empty,
        }
    }
}
