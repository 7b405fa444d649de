//! Error types for remote-sheets-core

use std::fmt;

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Axis of a two-dimensional index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => f.write_str("row"),
            Axis::Column => f.write_str("column"),
        }
    }
}

/// Errors that can occur in remote-sheets-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Index outside of a view's bounds (after negative resolution)
    #[error("{axis} index {index} is out of range (length: {len})")]
    IndexOutOfRange { axis: Axis, index: isize, len: usize },

    /// Slicing with a step other than 1
    #[error("slicing with step {0} is not supported")]
    SteppedSlice(isize),

    /// Slice assignment with the wrong number of values
    #[error("tried to assign {actual} values to {expected} element slice")]
    LengthMismatch { expected: usize, actual: usize },

    /// Byte value could not be decoded as ASCII
    #[error("byte 0x{byte:02x} at position {position} is not valid ASCII")]
    AsciiDecode { position: usize, byte: u8 },

    /// Positional lookup past the end of a collection
    #[error("entry {index} is out of range (length: {len})")]
    EntryOutOfRange { index: isize, len: usize },

    /// Key absent from a collection after population
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Invalid cell address format
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range format
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),
}

impl Error {
    /// Create an out-of-range error for the given axis
    pub fn out_of_range(axis: Axis, index: isize, len: usize) -> Self {
        Error::IndexOutOfRange { axis, index, len }
    }
}
