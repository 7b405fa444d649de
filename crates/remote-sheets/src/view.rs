//! Range views: a cached, batched window onto a worksheet's cells
//!
//! A [`View`] covers `[start_row, end_row) x [start_col, end_col)` of one
//! worksheet. Indices passed to a view are relative to the view itself, and
//! negative indices count from the end.
//!
//! - The first read of a cell that is not cached fetches the whole region in
//!   one call. Later reads are served from the cache, and cells the service
//!   left out read as the empty string.
//! - Writes update the cache and queue an update without touching the
//!   network. [`View::commit`] sends every queued update in one batched call.
//! - [`View::refresh`] drops the cache and the queue; [`View::clear`] blanks
//!   the region remotely and then refreshes.
//!
//! ```rust
//! use remote_sheets::prelude::*;
//!
//! let service = MemoryService::new().with_document(
//!     MemoryDocument::new("doc", "Budget").with_sheet(
//!         MemorySheet::new("Sheet1", 2, 3).with_values(vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]),
//!     ),
//! );
//! let client = Client::new(service);
//! let mut spreadsheet = client.open("doc").unwrap();
//! let mut view = spreadsheet.worksheet("Sheet1").unwrap().view_all().unwrap();
//!
//! assert_eq!(view.get(0, 0).unwrap(), "a");
//! view.set(-1, -1, "z").unwrap();
//! assert_eq!(view.get(1, 2).unwrap(), "z");
//! view.commit().unwrap();
//! ```

use std::fmt;
use std::ops::Range;

use ahash::AHashMap;
use remote_sheets_api::{BatchUpdateValuesRequest, ReadOptions, ValueRange};
use remote_sheets_core::error::Axis;
use remote_sheets_core::{
    checked_index, format_range_a1_notation, CellInput, CellValue, Error as CoreError, GridBounds,
    Slice,
};
use serde_json::Value;
use tracing::debug;

use crate::client::Client;
use crate::error::Result;

/// Rendering options for the fetch of a view
pub type FetchOptions = ReadOptions;

/// A write waiting for [`View::commit`], in sheet coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedUpdate {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

/// Whether the region has been fetched since creation or the last refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    Unfetched,
    Fetched,
}

/// A rectangular window onto a worksheet
pub struct View<'c> {
    client: &'c Client,
    spreadsheet_key: String,
    sheet_title: String,
    bounds: GridBounds,
    fetch_options: FetchOptions,
    cells: AHashMap<(usize, usize), CellValue>,
    state: FetchState,
    queued: Vec<QueuedUpdate>,
}

impl<'c> View<'c> {
    pub(crate) fn new(
        client: &'c Client,
        spreadsheet_key: String,
        sheet_title: String,
        bounds: GridBounds,
        fetch_options: FetchOptions,
    ) -> Self {
        Self {
            client,
            spreadsheet_key,
            sheet_title,
            bounds,
            fetch_options,
            cells: AHashMap::new(),
            state: FetchState::Unfetched,
            queued: Vec::new(),
        }
    }

    /// Use different rendering for the next fetch
    pub fn with_fetch_options(mut self, fetch_options: FetchOptions) -> Self {
        self.fetch_options = fetch_options;
        self
    }

    pub fn fetch_options(&self) -> FetchOptions {
        self.fetch_options
    }

    pub fn sheet_title(&self) -> &str {
        &self.sheet_title
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn start_row(&self) -> usize {
        self.bounds.start_row
    }

    pub fn end_row(&self) -> usize {
        self.bounds.end_row
    }

    pub fn start_col(&self) -> usize {
        self.bounds.start_col
    }

    pub fn end_col(&self) -> usize {
        self.bounds.end_col
    }

    pub fn rows(&self) -> usize {
        self.bounds.row_count()
    }

    pub fn cols(&self) -> usize {
        self.bounds.col_count()
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    pub fn fetch_state(&self) -> FetchState {
        self.state
    }

    pub fn is_fetched(&self) -> bool {
        self.state == FetchState::Fetched
    }

    /// Whether writes are waiting for a commit
    pub fn is_dirty(&self) -> bool {
        !self.queued.is_empty()
    }

    pub fn pending_updates(&self) -> &[QueuedUpdate] {
        &self.queued
    }

    /// Value of a cell, fetching the region on a cache miss
    pub fn get(&mut self, row: isize, col: isize) -> Result<CellValue> {
        let (row, col) = self.resolve(row, col)?;
        self.read(row, col)
    }

    /// Write a cell locally and queue the update
    pub fn set(&mut self, row: isize, col: isize, value: impl Into<CellInput>) -> Result<()> {
        let (row, col) = self.resolve(row, col)?;
        let value = value.into().normalize()?;
        self.write(row, col, value);
        Ok(())
    }

    /// One row of the view
    pub fn row(&mut self, row: isize) -> Result<ViewRow<'_, 'c>> {
        let row = self.bounds.start_row + checked_index(Axis::Row, row, self.rows())?;
        let (start_col, end_col) = (self.bounds.start_col, self.bounds.end_col);
        Ok(ViewRow {
            view: self,
            row,
            start_col,
            end_col,
        })
    }

    /// Handles to a contiguous run of rows, handed out one at a time.
    ///
    /// Like [`View::row`], this fetches nothing by itself.
    ///
    /// ```rust
    /// # use remote_sheets::prelude::*;
    /// # let service = MemoryService::new().with_document(
    /// #     MemoryDocument::new("doc", "Budget").with_sheet(MemorySheet::new("Sheet1", 3, 2)),
    /// # );
    /// # let client = Client::new(service);
    /// # let mut spreadsheet = client.open("doc").unwrap();
    /// # let mut view = spreadsheet.worksheet("Sheet1").unwrap().view_all().unwrap();
    /// let mut rows = view.row_slice(1isize..).unwrap();
    /// while let Some(mut row) = rows.next_row() {
    ///     row.set(0, "total").unwrap();
    /// }
    /// assert_eq!(view.pending_updates().len(), 2);
    /// ```
    pub fn row_slice(&mut self, rows: impl Into<Slice>) -> Result<ViewRows<'_, 'c>> {
        let rows = rows.into().indices(self.rows())?;
        Ok(ViewRows { view: self, rows })
    }

    /// Copies of the values of a contiguous run of rows.
    ///
    /// Unlike [`View::row_slice`], this reads every cell and so fetches the
    /// region unless it is already cached.
    pub fn slice(&mut self, rows: impl Into<Slice>) -> Result<Vec<Vec<CellValue>>> {
        let range = rows.into().indices(self.rows())?;
        let b = self.bounds;
        range
            .map(|r| self.read_row(b.start_row + r, b.start_col, b.end_col))
            .collect()
    }

    /// Every value of the view, row by row
    pub fn values(&mut self) -> Result<Vec<Vec<CellValue>>> {
        self.slice(Slice::full())
    }

    /// Overwrite one row; `values` must cover every column of the view
    pub fn set_row<I, V>(&mut self, row: isize, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellInput>,
    {
        self.row(row)?.set_slice(Slice::full(), values)
    }

    /// Overwrite a contiguous run of rows.
    ///
    /// The number of rows and the length of every row must match the slice
    /// and the view's width. Everything is checked before anything is
    /// written.
    pub fn set_slice<R, I, V>(&mut self, rows: impl Into<Slice>, values: R) -> Result<()>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = V>,
        V: Into<CellInput>,
    {
        let range = rows.into().indices(self.rows())?;
        let values: Vec<Vec<CellInput>> = values
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();

        if values.len() != range.len() {
            return Err(CoreError::LengthMismatch {
                expected: range.len(),
                actual: values.len(),
            }
            .into());
        }
        let width = self.cols();
        if let Some(row) = values.iter().find(|row| row.len() != width) {
            return Err(CoreError::LengthMismatch {
                expected: width,
                actual: row.len(),
            }
            .into());
        }
        let normalized = values
            .into_iter()
            .map(|row| row.into_iter().map(CellInput::normalize).collect())
            .collect::<std::result::Result<Vec<Vec<CellValue>>, CoreError>>()?;

        for (r, row) in range.zip(normalized) {
            for (c, value) in row.into_iter().enumerate() {
                self.write(self.bounds.start_row + r, self.bounds.start_col + c, value);
            }
        }
        Ok(())
    }

    /// Send every queued update in one batched write. Nothing is sent when
    /// the queue is empty. The queue is kept if the write fails.
    pub fn commit(&mut self) -> Result<()> {
        if self.queued.is_empty() {
            return Ok(());
        }

        let data = self
            .queued
            .iter()
            .map(|update| {
                let range = format_range_a1_notation(
                    &self.sheet_title,
                    GridBounds::cell(update.row, update.col),
                )?;
                Ok(ValueRange::cell(range, to_json(&update.value)))
            })
            .collect::<Result<Vec<_>>>()?;
        let request = BatchUpdateValuesRequest::user_entered(data);

        let key = &self.spreadsheet_key;
        self.client
            .call(|service| service.write_cells(key, &request))?;
        debug!(
            sheet = %self.sheet_title,
            updates = self.queued.len(),
            "committed view"
        );
        self.queued.clear();
        Ok(())
    }

    /// Clear the region's values remotely, then refresh
    pub fn clear(&mut self) -> Result<()> {
        if !self.bounds.is_empty() {
            let range = format_range_a1_notation(&self.sheet_title, self.bounds)?;
            let key = &self.spreadsheet_key;
            self.client
                .call(|service| service.clear_range(key, &range))?;
            debug!(range = %range, "cleared view");
        }
        self.refresh();
        Ok(())
    }

    /// Drop cached values and queued updates; the next read fetches again
    pub fn refresh(&mut self) {
        self.cells.clear();
        self.queued.clear();
        self.state = FetchState::Unfetched;
    }

    fn resolve(&self, row: isize, col: isize) -> Result<(usize, usize)> {
        let r = checked_index(Axis::Row, row, self.rows())?;
        let c = checked_index(Axis::Column, col, self.cols())?;
        Ok((self.bounds.start_row + r, self.bounds.start_col + c))
    }

    /// Read a cell in sheet coordinates
    fn read(&mut self, row: usize, col: usize) -> Result<CellValue> {
        if let Some(value) = self.cells.get(&(row, col)) {
            return Ok(value.clone());
        }
        self.ensure_fetched()?;
        Ok(self.cells.get(&(row, col)).cloned().unwrap_or_default())
    }

    fn read_row(&mut self, row: usize, start_col: usize, end_col: usize) -> Result<Vec<CellValue>> {
        (start_col..end_col).map(|col| self.read(row, col)).collect()
    }

    /// Write a cell in sheet coordinates
    fn write(&mut self, row: usize, col: usize, value: CellValue) {
        self.cells.insert((row, col), value.clone());
        self.queued.push(QueuedUpdate { row, col, value });
    }

    /// Fill the cache from values read elsewhere and mark the region fetched.
    ///
    /// `values` is row-major from the top-left cell of the view and may be
    /// ragged. Cells already cached (written locally) keep their value.
    pub(crate) fn seed(&mut self, values: Vec<Vec<Value>>) {
        let b = self.bounds;
        for (i, row) in values.into_iter().take(b.row_count()).enumerate() {
            for (j, value) in row.into_iter().take(b.col_count()).enumerate() {
                self.cells
                    .entry((b.start_row + i, b.start_col + j))
                    .or_insert_with(|| from_json(value));
            }
        }
        self.state = FetchState::Fetched;
    }

    /// Fetch the whole region unless it was fetched since the last refresh
    fn ensure_fetched(&mut self) -> Result<()> {
        if self.state == FetchState::Fetched {
            return Ok(());
        }
        if self.bounds.is_empty() {
            self.state = FetchState::Fetched;
            return Ok(());
        }

        let range = format_range_a1_notation(&self.sheet_title, self.bounds)?;
        let key = &self.spreadsheet_key;
        let options = self.fetch_options;
        let response = self
            .client
            .call(|service| service.read_range(key, &range, options))?;
        debug!(range = %range, rows = response.values.len(), "fetched view");
        self.seed(response.values);
        Ok(())
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("sheet_title", &self.sheet_title)
            .field("bounds", &self.bounds)
            .field("state", &self.state)
            .field("queued", &self.queued.len())
            .finish_non_exhaustive()
    }
}

/// One row of a [`View`], possibly narrowed to some of its columns.
///
/// Reads and writes go through the parent view's cache and queue.
pub struct ViewRow<'v, 'c> {
    view: &'v mut View<'c>,
    row: usize,
    start_col: usize,
    end_col: usize,
}

impl<'v, 'c> ViewRow<'v, 'c> {
    /// Sheet row index
    pub fn row_index(&self) -> usize {
        self.row
    }

    pub fn len(&self) -> usize {
        self.end_col - self.start_col
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&mut self, col: isize) -> Result<CellValue> {
        let col = self.resolve(col)?;
        self.view.read(self.row, col)
    }

    pub fn set(&mut self, col: isize, value: impl Into<CellInput>) -> Result<()> {
        let col = self.resolve(col)?;
        let value = value.into().normalize()?;
        self.view.write(self.row, col, value);
        Ok(())
    }

    /// Narrow the row to a contiguous run of its columns
    pub fn slice(self, cols: impl Into<Slice>) -> Result<ViewRow<'v, 'c>> {
        let range = cols.into().indices(self.len())?;
        Ok(ViewRow {
            row: self.row,
            start_col: self.start_col + range.start,
            end_col: self.start_col + range.end,
            view: self.view,
        })
    }

    /// Overwrite a contiguous run of columns with exactly as many values
    pub fn set_slice<I, V>(&mut self, cols: impl Into<Slice>, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<CellInput>,
    {
        let range = cols.into().indices(self.len())?;
        let values: Vec<CellInput> = values.into_iter().map(Into::into).collect();
        if values.len() != range.len() {
            return Err(CoreError::LengthMismatch {
                expected: range.len(),
                actual: values.len(),
            }
            .into());
        }
        let normalized = values
            .into_iter()
            .map(CellInput::normalize)
            .collect::<std::result::Result<Vec<_>, CoreError>>()?;

        for (c, value) in range.zip(normalized) {
            self.view.write(self.row, self.start_col + c, value);
        }
        Ok(())
    }

    pub fn values(&mut self) -> Result<Vec<CellValue>> {
        self.view.read_row(self.row, self.start_col, self.end_col)
    }

    fn resolve(&self, col: isize) -> Result<usize> {
        Ok(self.start_col + checked_index(Axis::Column, col, self.len())?)
    }
}

impl fmt::Debug for ViewRow<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRow")
            .field("row", &self.row)
            .field("start_col", &self.start_col)
            .field("end_col", &self.end_col)
            .finish()
    }
}

/// A run of rows of a [`View`], see [`View::row_slice`]
pub struct ViewRows<'v, 'c> {
    view: &'v mut View<'c>,
    rows: Range<usize>,
}

impl<'v, 'c> ViewRows<'v, 'c> {
    /// The next row, borrowing the view until the handle is dropped
    pub fn next_row(&mut self) -> Option<ViewRow<'_, 'c>> {
        let row = self.rows.next()?;
        let b = self.view.bounds;
        Some(ViewRow {
            view: &mut *self.view,
            row: b.start_row + row,
            start_col: b.start_col,
            end_col: b.end_col,
        })
    }

    /// Rows not handed out yet
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Debug for ViewRows<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRows")
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

fn from_json(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::empty(),
        Value::String(s) => CellValue::Text(s),
        Value::Bool(b) => CellValue::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Integer(i),
            None => CellValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        other => CellValue::Text(other.to_string()),
    }
}

fn to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Text(s) => Value::String(s.clone()),
        CellValue::Integer(n) => Value::from(*n),
        CellValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(n.to_string())),
        CellValue::Boolean(b) => Value::Bool(*b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion() {
        assert_eq!(from_json(json!("a")), CellValue::Text("a".into()));
        assert_eq!(from_json(json!(3)), CellValue::Integer(3));
        assert_eq!(from_json(json!(2.5)), CellValue::Number(2.5));
        assert_eq!(from_json(json!(true)), CellValue::Boolean(true));
        assert_eq!(from_json(Value::Null), CellValue::empty());

        assert_eq!(to_json(&CellValue::Integer(28)), json!(28));
        assert_eq!(to_json(&CellValue::Number(28.3)), json!(28.3));
        assert_eq!(to_json(&CellValue::Text("x".into())), json!("x"));
        assert_eq!(to_json(&CellValue::Number(f64::INFINITY)), json!("inf"));
    }
}
