//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The value cached for a cell
//! - [`CellInput`] - A value supplied by a caller, before normalization
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`GridBounds`] and [`A1Range`] - Rectangular regions and their A1 notation

mod address;
mod value;

pub use address::{format_range_a1_notation, quote_sheet_title, A1Range, CellAddress, GridBounds};
pub use value::{CellInput, CellValue};
