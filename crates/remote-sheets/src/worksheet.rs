//! A grid sheet within a document

use remote_sheets_api::SheetProperties;
use remote_sheets_core::{GridBounds, Slice};

use crate::client::Client;
use crate::error::Result;
use crate::view::View;

/// Which part of a worksheet a [`View`] covers.
///
/// Each axis is a slice over the sheet's extent: omitted bounds default to
/// the whole axis, negative bounds count from the end, and everything is
/// clamped to the sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewBounds {
    pub rows: Slice,
    pub cols: Slice,
}

impl ViewBounds {
    /// The whole sheet
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(rows: impl Into<Slice>, cols: impl Into<Slice>) -> Self {
        Self {
            rows: rows.into(),
            cols: cols.into(),
        }
    }

    pub fn with_rows(mut self, rows: impl Into<Slice>) -> Self {
        self.rows = rows.into();
        self
    }

    pub fn with_cols(mut self, cols: impl Into<Slice>) -> Self {
        self.cols = cols.into();
        self
    }

    /// Resolve against a sheet of `rows` x `cols`
    pub fn resolve(&self, rows: usize, cols: usize) -> Result<GridBounds> {
        let r = self.rows.indices(rows)?;
        let c = self.cols.indices(cols)?;
        Ok(GridBounds::new(r.start, r.end, c.start, c.end))
    }
}

/// A grid sheet, as described by the document metadata it was listed from
#[derive(Clone)]
pub struct Worksheet<'c> {
    client: &'c Client,
    spreadsheet_key: String,
    properties: SheetProperties,
}

impl<'c> Worksheet<'c> {
    pub(crate) fn new(client: &'c Client, spreadsheet_key: String, properties: SheetProperties) -> Self {
        Self {
            client,
            spreadsheet_key,
            properties,
        }
    }

    /// Numeric sheet id, stable across renames
    pub fn key(&self) -> i64 {
        self.properties.sheet_id
    }

    pub fn title(&self) -> &str {
        &self.properties.title
    }

    /// Position of the sheet within its document
    pub fn index(&self) -> u32 {
        self.properties.index
    }

    pub fn rows(&self) -> usize {
        self.properties.grid_properties.row_count
    }

    pub fn cols(&self) -> usize {
        self.properties.grid_properties.column_count
    }

    pub fn spreadsheet_key(&self) -> &str {
        &self.spreadsheet_key
    }

    pub fn properties(&self) -> &SheetProperties {
        &self.properties
    }

    /// A view over part of the sheet. Nothing is fetched until a cell is read.
    pub fn view(&self, bounds: ViewBounds) -> Result<View<'c>> {
        let grid = bounds.resolve(self.rows(), self.cols())?;
        Ok(View::new(
            self.client,
            self.spreadsheet_key.clone(),
            self.properties.title.clone(),
            grid,
            self.client.default_fetch(),
        ))
    }

    /// A view over the whole sheet
    pub fn view_all(&self) -> Result<View<'c>> {
        self.view(ViewBounds::all())
    }
}

impl std::fmt::Debug for Worksheet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worksheet")
            .field("spreadsheet_key", &self.spreadsheet_key)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_bounds_resolution() {
        assert_eq!(
            ViewBounds::all().resolve(1000, 26).unwrap(),
            GridBounds::new(0, 1000, 0, 26)
        );
        assert_eq!(
            ViewBounds::new(1isize..3, ..-1isize).resolve(10, 5).unwrap(),
            GridBounds::new(1, 3, 0, 4)
        );
        // Clamped to the extent, and an end before its start collapses
        assert_eq!(
            ViewBounds::new(5isize..50, 4isize..2).resolve(10, 5).unwrap(),
            GridBounds::new(5, 10, 4, 4)
        );
        assert!(ViewBounds::all()
            .with_rows(Slice::full().with_step(2))
            .resolve(10, 5)
            .is_err());
    }
}
