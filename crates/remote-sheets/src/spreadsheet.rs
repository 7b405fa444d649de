//! A remote document and its worksheets, keyed by title

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use remote_sheets_api::{ApiError, SheetRequest, SheetType, SpreadsheetEntry};
use remote_sheets_core::{format_range_a1_notation, Enumerate, LazyOrderedMap};
use tracing::{debug, info};

use crate::client::Client;
use crate::error::Result;
use crate::view::{FetchOptions, View};
use crate::worksheet::{ViewBounds, Worksheet};

/// Row count of a worksheet added without an explicit size
pub const DEFAULT_ROWS: usize = 1000;
/// Column count of a worksheet added without an explicit size
pub const DEFAULT_COLS: usize = 26;

struct SheetSource<'c> {
    client: &'c Client,
    key: String,
    entry: Option<SpreadsheetEntry>,
    updated: Option<DateTime<Utc>>,
    properties: Option<BTreeMap<String, String>>,
}

impl<'c> SheetSource<'c> {
    /// Cached metadata, fetched on first use
    fn entry(&mut self) -> Result<&SpreadsheetEntry> {
        let entry = match self.entry.take() {
            Some(entry) => entry,
            None => self.fetch()?,
        };
        Ok(self.entry.insert(entry))
    }

    fn fetch(&self) -> Result<SpreadsheetEntry> {
        debug!(key = %self.key, "fetching spreadsheet metadata");
        Ok(self
            .client
            .call(|service| service.get_document(&self.key))?)
    }
}

impl<'c> Enumerate for SheetSource<'c> {
    type Key = String;
    type Value = Worksheet<'c>;
    type Error = crate::Error;

    fn enumerate(&mut self) -> Result<Vec<(String, Worksheet<'c>)>> {
        let client = self.client;
        let key = self.key.clone();
        let entry = self.entry()?;
        Ok(entry
            .sheets
            .iter()
            // Object sheets (charts) have no cells
            .filter(|sheet| sheet.properties.sheet_type == SheetType::Grid)
            .map(|sheet| {
                let properties = sheet.properties.clone();
                (
                    properties.title.clone(),
                    Worksheet::new(client, key.clone(), properties),
                )
            })
            .collect())
    }
}

/// A remote document.
///
/// Worksheets are listed from the document metadata on first access and
/// cached until [`Spreadsheet::refresh`]. Structural changes (adding,
/// deleting, renaming or resizing worksheets, retitling the document) are
/// sent immediately and replace the cached metadata with the service's
/// answer.
pub struct Spreadsheet<'c> {
    sheets: LazyOrderedMap<SheetSource<'c>>,
}

impl<'c> Spreadsheet<'c> {
    pub(crate) fn new(client: &'c Client, key: String) -> Self {
        Self::from_parts(client, key, None)
    }

    pub(crate) fn with_entry(client: &'c Client, entry: SpreadsheetEntry) -> Self {
        let key = entry.spreadsheet_id.clone();
        Self::from_parts(client, key, Some(entry))
    }

    fn from_parts(client: &'c Client, key: String, entry: Option<SpreadsheetEntry>) -> Self {
        Self {
            sheets: LazyOrderedMap::new(SheetSource {
                client,
                key,
                entry,
                updated: None,
                properties: None,
            }),
        }
    }

    /// The document id
    pub fn key(&self) -> &str {
        &self.sheets.source().key
    }

    /// Browser URL of the document
    pub fn url(&self) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}/edit", self.key())
    }

    pub fn title(&mut self) -> Result<&str> {
        Ok(&self.sheets.source_mut().entry()?.properties.title)
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        info!(key = %self.key(), title, "renaming spreadsheet");
        self.batch_update(SheetRequest::set_spreadsheet_title(title))
    }

    /// Last modification time, cached until the next refresh
    pub fn updated(&mut self) -> Result<DateTime<Utc>> {
        let source = self.sheets.source_mut();
        if let Some(updated) = source.updated {
            return Ok(updated);
        }
        let updated = source
            .client
            .call(|service| service.modified_time(&source.key))?;
        source.updated = Some(updated);
        Ok(updated)
    }

    /// Custom properties of the document's file, cached until the next refresh
    pub fn properties(&mut self) -> Result<&BTreeMap<String, String>> {
        let source = self.sheets.source_mut();
        let properties = match source.properties.take() {
            Some(properties) => properties,
            None => {
                debug!(key = %source.key, "fetching file properties");
                source
                    .client
                    .call(|service| service.file_properties(&source.key))?
            }
        };
        Ok(source.properties.insert(properties))
    }

    /// Re-fetch the metadata and forget every cached worksheet
    pub fn refresh(&mut self) -> Result<()> {
        let entry = self.sheets.source().fetch()?;
        self.refresh_with(entry);
        Ok(())
    }

    /// Replace the metadata with `entry` and forget every cached worksheet
    pub fn refresh_with(&mut self, entry: SpreadsheetEntry) {
        let source = self.sheets.source_mut();
        source.entry = Some(entry);
        source.updated = None;
        source.properties = None;
        self.sheets.refresh();
    }

    /// The worksheet with the given title
    pub fn worksheet(&mut self, title: &str) -> Result<&mut Worksheet<'c>> {
        self.sheets.get(title)
    }

    /// The worksheet at a position in document order (negative counts from the end)
    pub fn worksheet_at(&mut self, index: isize) -> Result<&mut Worksheet<'c>> {
        Ok(self.sheets.get_index(index)?.1)
    }

    pub fn contains(&mut self, title: &str) -> Result<bool> {
        self.sheets.contains_key(title)
    }

    /// Worksheet titles in document order
    pub fn titles(&mut self) -> Result<Vec<String>> {
        Ok(self.sheets.keys()?.cloned().collect())
    }

    pub fn worksheets(&mut self) -> Result<impl Iterator<Item = &Worksheet<'c>> + '_> {
        self.sheets.values()
    }

    pub fn len(&mut self) -> Result<usize> {
        self.sheets.len()
    }

    pub fn is_empty(&mut self) -> Result<bool> {
        self.sheets.is_empty()
    }

    /// Views over parts of several worksheets, fetched together in one call.
    ///
    /// Each request names a worksheet and the part of it to cover. The views
    /// come back in request order and already fetched, so reading them makes
    /// no further calls until they are refreshed.
    ///
    /// ```rust
    /// use remote_sheets::prelude::*;
    ///
    /// let service = MemoryService::new().with_document(
    ///     MemoryDocument::new("doc", "Budget")
    ///         .with_sheet(MemorySheet::new("Income", 10, 2).with_values(vec![vec!["salary", "100"]]))
    ///         .with_sheet(MemorySheet::new("Costs", 10, 2).with_values(vec![vec!["rent", "60"]])),
    /// );
    /// let client = Client::new(service);
    /// let mut spreadsheet = client.open("doc").unwrap();
    ///
    /// let mut views = spreadsheet
    ///     .precache([("Income", ViewBounds::all()), ("Costs", ViewBounds::new(..1isize, ..))])
    ///     .unwrap();
    /// assert_eq!(views[1].get(0, 1).unwrap(), "60");
    /// ```
    pub fn precache<I, T>(&mut self, requests: I) -> Result<Vec<View<'c>>>
    where
        I: IntoIterator<Item = (T, ViewBounds)>,
        T: AsRef<str>,
    {
        let options = self.sheets.source().client.default_fetch();
        self.precache_with(requests, options)
    }

    /// [`Spreadsheet::precache`] with explicit rendering options
    pub fn precache_with<I, T>(
        &mut self,
        requests: I,
        options: FetchOptions,
    ) -> Result<Vec<View<'c>>>
    where
        I: IntoIterator<Item = (T, ViewBounds)>,
        T: AsRef<str>,
    {
        let mut views = Vec::new();
        for (title, bounds) in requests {
            let view = self.worksheet(title.as_ref())?.view(bounds)?;
            views.push(view.with_fetch_options(options));
        }

        // Empty views have nothing to read
        let ranges = views
            .iter()
            .filter(|view| !view.bounds().is_empty())
            .map(|view| format_range_a1_notation(view.sheet_title(), view.bounds()))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut fetched = if ranges.is_empty() {
            Vec::new()
        } else {
            let source = self.sheets.source();
            let fetched = source
                .client
                .call(|service| service.read_ranges(&source.key, &ranges, options))?;
            debug!(key = %source.key, ranges = ranges.len(), "precached views");
            fetched
        }
        .into_iter();

        for view in &mut views {
            if view.bounds().is_empty() {
                view.seed(Vec::new());
                continue;
            }
            let range = fetched.next().ok_or_else(|| {
                ApiError::UnexpectedResponse(format!(
                    "batched read answered fewer than {} ranges",
                    ranges.len()
                ))
            })?;
            view.seed(range.values);
        }
        Ok(views)
    }

    pub fn add_worksheet(
        &mut self,
        title: &str,
        rows: usize,
        cols: usize,
    ) -> Result<&mut Worksheet<'c>> {
        info!(key = %self.key(), title, rows, cols, "adding worksheet");
        self.batch_update(SheetRequest::add_sheet(title, rows, cols))?;
        self.worksheet(title)
    }

    pub fn delete_worksheet(&mut self, title: &str) -> Result<()> {
        let sheet_id = self.worksheet(title)?.key();
        info!(key = %self.key(), title, sheet_id, "deleting worksheet");
        self.batch_update(SheetRequest::delete_sheet(sheet_id))
    }

    pub fn rename_worksheet(&mut self, title: &str, new_title: &str) -> Result<()> {
        let sheet_id = self.worksheet(title)?.key();
        info!(key = %self.key(), title, new_title, "renaming worksheet");
        self.batch_update(SheetRequest::rename_sheet(sheet_id, new_title))
    }

    pub fn resize_worksheet(&mut self, title: &str, rows: usize, cols: usize) -> Result<()> {
        let sheet_id = self.worksheet(title)?.key();
        info!(key = %self.key(), title, rows, cols, "resizing worksheet");
        self.batch_update(SheetRequest::resize_sheet(sheet_id, rows, cols))
    }

    /// Send one structural change and adopt the returned metadata
    fn batch_update(&mut self, request: SheetRequest) -> Result<()> {
        let source = self.sheets.source();
        let entry = source
            .client
            .call(|service| service.batch_update(&source.key, vec![request.clone()]))?;
        self.refresh_with(entry);
        Ok(())
    }
}

impl std::fmt::Debug for Spreadsheet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spreadsheet")
            .field("key", &self.key())
            .finish_non_exhaustive()
    }
}
