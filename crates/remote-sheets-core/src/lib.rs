//! # remote-sheets-core
//!
//! Transport-independent building blocks for remote-sheets.
//!
//! - [`CellValue`] and [`CellInput`] - Cached cell values and value normalization
//! - [`CellAddress`], [`GridBounds`] and [`A1Range`] - Cell addressing and A1 notation
//! - [`Slice`] and [`resolve_index`] - Negative indices and clamped slices
//! - [`LazyOrderedMap`] - An ordered map populated on first use
//!
//! ## Example
//!
//! ```rust
//! use remote_sheets_core::{format_range_a1_notation, GridBounds, Slice};
//!
//! let range = format_range_a1_notation("Sheet1", GridBounds::new(0, 2, 0, 3)).unwrap();
//! assert_eq!(range, "'Sheet1'!A1:C2");
//!
//! assert_eq!(Slice::from(-2isize..).indices(5).unwrap(), 3..5);
//! ```

pub mod cell;
pub mod collection;
pub mod error;
pub mod index;

pub use cell::{format_range_a1_notation, quote_sheet_title, A1Range, CellAddress, CellInput, CellValue, GridBounds};
pub use collection::{Enumerate, LazyOrderedMap, Population};
pub use error::{Axis, Error, Result};
pub use index::{checked_index, resolve_index, Slice};
