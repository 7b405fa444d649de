//! The remote spreadsheet service as seen by the client

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::protocol::{
    BatchUpdateValuesRequest, DriveFile, ReadOptions, SheetRequest, SpreadsheetEntry, ValueRange,
};

/// Operations the client needs from the remote service.
///
/// Implementations perform exactly one request per call; retrying is the
/// caller's business.
pub trait SheetsService {
    /// Every spreadsheet document visible to the caller
    fn list_documents(&self) -> Result<Vec<DriveFile>>;

    /// Metadata (properties and sheets) of one document
    fn get_document(&self, spreadsheet_id: &str) -> Result<SpreadsheetEntry>;

    /// Apply structural changes and return the updated metadata
    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<SheetRequest>,
    ) -> Result<SpreadsheetEntry>;

    /// Values of an A1 range, row-major and possibly ragged
    fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        options: ReadOptions,
    ) -> Result<ValueRange>;

    /// Values of several A1 ranges in one call, in the order requested
    fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        options: ReadOptions,
    ) -> Result<Vec<ValueRange>>;

    /// Write every range of `request` in one call
    fn write_cells(&self, spreadsheet_id: &str, request: &BatchUpdateValuesRequest) -> Result<()>;

    /// Clear the values of an A1 range, keeping formatting
    fn clear_range(&self, spreadsheet_id: &str, range: &str) -> Result<()>;

    /// Last modification time of a document
    fn modified_time(&self, spreadsheet_id: &str) -> Result<DateTime<Utc>>;

    /// Custom properties attached to a document's file
    fn file_properties(&self, spreadsheet_id: &str) -> Result<BTreeMap<String, String>>;
}

impl<S: SheetsService + ?Sized> SheetsService for Box<S> {
    fn list_documents(&self) -> Result<Vec<DriveFile>> {
        (**self).list_documents()
    }

    fn get_document(&self, spreadsheet_id: &str) -> Result<SpreadsheetEntry> {
        (**self).get_document(spreadsheet_id)
    }

    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<SheetRequest>,
    ) -> Result<SpreadsheetEntry> {
        (**self).batch_update(spreadsheet_id, requests)
    }

    fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        options: ReadOptions,
    ) -> Result<ValueRange> {
        (**self).read_range(spreadsheet_id, range, options)
    }

    fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        options: ReadOptions,
    ) -> Result<Vec<ValueRange>> {
        (**self).read_ranges(spreadsheet_id, ranges, options)
    }

    fn write_cells(&self, spreadsheet_id: &str, request: &BatchUpdateValuesRequest) -> Result<()> {
        (**self).write_cells(spreadsheet_id, request)
    }

    fn clear_range(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        (**self).clear_range(spreadsheet_id, range)
    }

    fn modified_time(&self, spreadsheet_id: &str) -> Result<DateTime<Utc>> {
        (**self).modified_time(spreadsheet_id)
    }

    fn file_properties(&self, spreadsheet_id: &str) -> Result<BTreeMap<String, String>> {
        (**self).file_properties(spreadsheet_id)
    }
}
