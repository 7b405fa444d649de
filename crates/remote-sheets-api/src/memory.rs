//! An in-process [`SheetsService`] for tests and offline use
//!
//! [`MemoryService`] keeps documents in memory, answers every call the way
//! the REST service would (sparse reads, grid-limit checks, 404s for unknown
//! documents) and records each call it receives. Failures can be injected
//! with [`MemoryService::fail_next`] to exercise retry paths.
//!
//! Clones share state, so a test can hand one clone to a client and keep
//! another to inspect the call log.

use std::cell::{RefCell, RefMut};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use remote_sheets_core::A1Range;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::protocol::{
    BatchUpdateValuesRequest, DriveFile, GridProperties, ReadOptions, SheetEntry, SheetProperties,
    SheetRequest, SheetType, SpreadsheetEntry, SpreadsheetProperties, ValueRange,
    ValueRenderOption,
};
use crate::service::SheetsService;

/// A sheet held by [`MemoryService`]
#[derive(Debug, Clone)]
pub struct MemorySheet {
    sheet_id: Option<i64>,
    title: String,
    sheet_type: SheetType,
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Value>>,
}

impl MemorySheet {
    /// An empty grid sheet of the given extent
    pub fn new(title: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self {
            sheet_id: None,
            title: title.into(),
            sheet_type: SheetType::Grid,
            rows,
            cols,
            cells: vec![vec![empty_value(); cols]; rows],
        }
    }

    /// A sheet without cells, such as a chart sheet
    pub fn object(title: impl Into<String>) -> Self {
        Self {
            sheet_type: SheetType::Object,
            ..Self::new(title, 0, 0)
        }
    }

    pub fn with_id(mut self, sheet_id: i64) -> Self {
        self.sheet_id = Some(sheet_id);
        self
    }

    /// Fill cells starting at `A1`, growing the sheet if the rows do not fit
    pub fn with_values<R, C, V>(mut self, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        for (r, row) in rows.into_iter().enumerate() {
            for (c, value) in row.into_iter().enumerate() {
                if r >= self.rows || c >= self.cols {
                    self.resize(self.rows.max(r + 1), self.cols.max(c + 1));
                }
                self.cells[r][c] = value.into();
            }
        }
        self
    }

    fn resize(&mut self, rows: usize, cols: usize) {
        self.cells.resize_with(rows, Vec::new);
        for row in &mut self.cells {
            row.resize(cols, empty_value());
        }
        self.rows = rows;
        self.cols = cols;
    }

    fn properties(&self, index: usize) -> SheetProperties {
        SheetProperties {
            sheet_id: self.sheet_id.unwrap_or_default(),
            title: self.title.clone(),
            index: index as u32,
            sheet_type: self.sheet_type,
            grid_properties: GridProperties {
                row_count: self.rows,
                column_count: self.cols,
            },
        }
    }
}

/// A document held by [`MemoryService`]
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    id: String,
    title: String,
    modified_time: DateTime<Utc>,
    properties: BTreeMap<String, String>,
    sheets: Vec<MemorySheet>,
}

impl MemoryDocument {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            modified_time: DateTime::<Utc>::default(),
            properties: BTreeMap::new(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: MemorySheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    pub fn with_modified_time(mut self, modified_time: DateTime<Utc>) -> Self {
        self.modified_time = modified_time;
        self
    }

    /// Attach a custom file property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    fn entry(&self) -> SpreadsheetEntry {
        SpreadsheetEntry {
            spreadsheet_id: self.id.clone(),
            properties: SpreadsheetProperties {
                title: self.title.clone(),
                ..SpreadsheetProperties::default()
            },
            sheets: self
                .sheets
                .iter()
                .enumerate()
                .map(|(i, sheet)| SheetEntry {
                    properties: sheet.properties(i),
                })
                .collect(),
            spreadsheet_url: Some(format!(
                "https://docs.google.com/spreadsheets/d/{}/edit",
                self.id
            )),
        }
    }

    fn assign_sheet_ids(&mut self) {
        let mut next = self.next_sheet_id();
        for sheet in &mut self.sheets {
            if sheet.sheet_id.is_none() {
                sheet.sheet_id = Some(next);
                next += 1;
            }
        }
    }

    fn next_sheet_id(&self) -> i64 {
        self.sheets
            .iter()
            .filter_map(|s| s.sheet_id)
            .max()
            .map_or(0, |id| id + 1)
    }

    fn sheet_by_id(&mut self, sheet_id: i64) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.sheet_id == Some(sheet_id))
            .ok_or_else(|| ApiError::http(400, format!("No grid with id: {}", sheet_id)))
    }

    fn check_title_free(&self, title: &str) -> Result<()> {
        if self.sheets.iter().any(|s| s.title == title) {
            return Err(ApiError::http(
                400,
                format!(
                    "A sheet with the name \"{}\" already exists. Please enter another name.",
                    title
                ),
            ));
        }
        Ok(())
    }

    /// Resolve an A1 range to a grid sheet index and bounds inside its extent
    fn locate(&self, range: &str) -> Result<(usize, A1Range)> {
        let parsed = A1Range::parse(range)
            .map_err(|_| ApiError::http(400, format!("Unable to parse range: {}", range)))?;

        let index = match parsed.sheet.as_deref() {
            Some(title) => self.sheets.iter().position(|s| s.title == title),
            None => self
                .sheets
                .iter()
                .position(|s| s.sheet_type == SheetType::Grid),
        }
        .ok_or_else(|| ApiError::http(400, format!("Unable to parse range: {}", range)))?;

        let sheet = &self.sheets[index];
        if parsed.bounds.end_row > sheet.rows || parsed.bounds.end_col > sheet.cols {
            return Err(ApiError::http(
                400,
                format!("Range ({}) exceeds grid limits. Max rows: {}, max columns: {}", range, sheet.rows, sheet.cols),
            ));
        }
        Ok((index, parsed))
    }

    /// Rendered values of a range, with trailing empty cells and rows dropped
    fn read(&self, range: &str, options: ReadOptions) -> Result<ValueRange> {
        let (index, parsed) = self.locate(range)?;
        let sheet = &self.sheets[index];
        let b = parsed.bounds;

        let mut values: Vec<Vec<Value>> = sheet.cells[b.start_row..b.end_row]
            .iter()
            .map(|row| {
                let mut rendered: Vec<Value> = row[b.start_col..b.end_col]
                    .iter()
                    .map(|v| render(v, options.value_render_option))
                    .collect();
                while rendered.last().map_or(false, is_empty_value) {
                    rendered.pop();
                }
                rendered
            })
            .collect();
        while values.last().map_or(false, |row| row.is_empty()) {
            values.pop();
        }

        Ok(ValueRange {
            range: range.to_string(),
            major_dimension: Default::default(),
            values,
        })
    }

    fn touch(&mut self) {
        self.modified_time = Utc::now();
    }
}

/// A call received by [`MemoryService`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    ListDocuments,
    GetDocument(String),
    BatchUpdate {
        spreadsheet_id: String,
        requests: Vec<SheetRequest>,
    },
    ReadRange {
        spreadsheet_id: String,
        range: String,
        options: ReadOptions,
    },
    ReadRanges {
        spreadsheet_id: String,
        ranges: Vec<String>,
        options: ReadOptions,
    },
    WriteCells {
        spreadsheet_id: String,
        data: Vec<ValueRange>,
    },
    ClearRange {
        spreadsheet_id: String,
        range: String,
    },
    ModifiedTime(String),
    FileProperties(String),
}

#[derive(Debug, Default)]
struct State {
    documents: Vec<MemoryDocument>,
    calls: Vec<Call>,
    failures: VecDeque<ApiError>,
}

impl State {
    fn document(&mut self, id: &str) -> Result<&mut MemoryDocument> {
        self.documents
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| ApiError::not_found("Requested entity was not found."))
    }
}

/// In-memory stand-in for the remote service
#[derive(Debug, Clone, Default)]
pub struct MemoryService {
    state: Rc<RefCell<State>>,
}

impl MemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, document: MemoryDocument) -> Self {
        self.add_document(document);
        self
    }

    pub fn add_document(&self, mut document: MemoryDocument) {
        document.assign_sheet_ids();
        self.state.borrow_mut().documents.push(document);
    }

    /// Every call received so far, including those answered with an injected failure
    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Drain the call log
    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// Number of calls received so far matching `pred`
    pub fn count_calls(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }

    /// Answer the next call with `error` instead of serving it. Injected
    /// failures queue up and are consumed one per call.
    pub fn fail_next(&self, error: ApiError) {
        self.state.borrow_mut().failures.push_back(error);
    }

    /// Cell value as stored, without rendering
    pub fn cell(&self, spreadsheet_id: &str, sheet: &str, row: usize, col: usize) -> Option<Value> {
        let state = self.state.borrow();
        let document = state.documents.iter().find(|d| d.id == spreadsheet_id)?;
        let sheet = document.sheets.iter().find(|s| s.title == sheet)?;
        sheet.cells.get(row)?.get(col).cloned()
    }

    /// Change a cell behind the client's back
    pub fn set_cell(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
        row: usize,
        col: usize,
        value: impl Into<Value>,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let document = state.document(spreadsheet_id)?;
        let sheet = document
            .sheets
            .iter_mut()
            .find(|s| s.title == sheet)
            .ok_or_else(|| ApiError::not_found(format!("No sheet titled {}", sheet)))?;
        let cell = sheet
            .cells
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or_else(|| ApiError::http(400, "cell exceeds grid limits"))?;
        *cell = value.into();
        document.touch();
        Ok(())
    }

    /// Set a custom file property behind the client's back
    pub fn set_property(
        &self,
        spreadsheet_id: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let document = state.document(spreadsheet_id)?;
        document.properties.insert(key.into(), value.into());
        document.touch();
        Ok(())
    }

    /// Record `call`, then hand out the state unless a failure is queued
    fn begin(&self, call: Call) -> Result<RefMut<'_, State>> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        match state.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

impl SheetsService for MemoryService {
    fn list_documents(&self) -> Result<Vec<DriveFile>> {
        let state = self.begin(Call::ListDocuments)?;
        Ok(state
            .documents
            .iter()
            .map(|d| DriveFile {
                id: d.id.clone(),
                name: d.title.clone(),
                modified_time: Some(d.modified_time),
                properties: d.properties.clone(),
            })
            .collect())
    }

    fn get_document(&self, spreadsheet_id: &str) -> Result<SpreadsheetEntry> {
        let mut state = self.begin(Call::GetDocument(spreadsheet_id.to_string()))?;
        let document = state.document(spreadsheet_id)?;
        Ok(document.entry())
    }

    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<SheetRequest>,
    ) -> Result<SpreadsheetEntry> {
        let mut state = self.begin(Call::BatchUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            requests: requests.clone(),
        })?;
        let document = state.document(spreadsheet_id)?;

        // Requests apply all-or-nothing
        let mut updated = document.clone();
        for request in requests {
            match request {
                SheetRequest::AddSheet(add) => {
                    updated.check_title_free(&add.properties.title)?;
                    let sheet_id = updated.next_sheet_id();
                    let grid = add.properties.grid_properties;
                    updated.sheets.push(
                        MemorySheet::new(add.properties.title, grid.row_count, grid.column_count)
                            .with_id(sheet_id),
                    );
                }
                SheetRequest::DeleteSheet(delete) => {
                    updated.sheet_by_id(delete.sheet_id)?;
                    if updated.sheets.len() == 1 {
                        return Err(ApiError::http(
                            400,
                            "You can't remove all the sheets in a document.",
                        ));
                    }
                    updated.sheets.retain(|s| s.sheet_id != Some(delete.sheet_id));
                }
                SheetRequest::UpdateSheetProperties(update) => {
                    let props = update.properties;
                    if let Some(title) = &props.title {
                        let current = &updated.sheet_by_id(props.sheet_id)?.title;
                        if current != title {
                            updated.check_title_free(title)?;
                        }
                    }
                    let sheet = updated.sheet_by_id(props.sheet_id)?;
                    if let Some(title) = props.title {
                        sheet.title = title;
                    }
                    if let Some(grid) = props.grid_properties {
                        sheet.resize(grid.row_count, grid.column_count);
                    }
                }
                SheetRequest::UpdateSpreadsheetProperties(update) => {
                    if let Some(title) = update.properties.title {
                        updated.title = title;
                    }
                }
            }
        }

        updated.touch();
        let entry = updated.entry();
        *document = updated;
        Ok(entry)
    }

    fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        options: ReadOptions,
    ) -> Result<ValueRange> {
        let mut state = self.begin(Call::ReadRange {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            options,
        })?;
        let document = state.document(spreadsheet_id)?;
        document.read(range, options)
    }

    fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        options: ReadOptions,
    ) -> Result<Vec<ValueRange>> {
        let mut state = self.begin(Call::ReadRanges {
            spreadsheet_id: spreadsheet_id.to_string(),
            ranges: ranges.to_vec(),
            options,
        })?;
        let document = state.document(spreadsheet_id)?;
        ranges
            .iter()
            .map(|range| document.read(range, options))
            .collect()
    }

    fn write_cells(&self, spreadsheet_id: &str, request: &BatchUpdateValuesRequest) -> Result<()> {
        let mut state = self.begin(Call::WriteCells {
            spreadsheet_id: spreadsheet_id.to_string(),
            data: request.data.clone(),
        })?;
        let document = state.document(spreadsheet_id)?;

        // Validate every range before touching any cell
        let mut writes = Vec::new();
        for data in &request.data {
            let (index, parsed) = document.locate(&data.range)?;
            let b = parsed.bounds;
            if data.values.len() > b.row_count()
                || data.values.iter().any(|row| row.len() > b.col_count())
            {
                return Err(ApiError::http(
                    400,
                    format!(
                        "Requested writing within range [{}], but tried writing beyond it",
                        data.range
                    ),
                ));
            }
            for (r, row) in data.values.iter().enumerate() {
                for (c, value) in row.iter().enumerate() {
                    writes.push((index, b.start_row + r, b.start_col + c, value.clone()));
                }
            }
        }

        for (index, row, col, value) in writes {
            document.sheets[index].cells[row][col] = value;
        }
        document.touch();
        Ok(())
    }

    fn clear_range(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        let mut state = self.begin(Call::ClearRange {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        })?;
        let document = state.document(spreadsheet_id)?;
        let (index, parsed) = document.locate(range)?;
        let b = parsed.bounds;
        for row in &mut document.sheets[index].cells[b.start_row..b.end_row] {
            for cell in &mut row[b.start_col..b.end_col] {
                *cell = empty_value();
            }
        }
        document.touch();
        Ok(())
    }

    fn modified_time(&self, spreadsheet_id: &str) -> Result<DateTime<Utc>> {
        let mut state = self.begin(Call::ModifiedTime(spreadsheet_id.to_string()))?;
        let document = state.document(spreadsheet_id)?;
        Ok(document.modified_time)
    }

    fn file_properties(&self, spreadsheet_id: &str) -> Result<BTreeMap<String, String>> {
        let mut state = self.begin(Call::FileProperties(spreadsheet_id.to_string()))?;
        let document = state.document(spreadsheet_id)?;
        Ok(document.properties.clone())
    }
}

fn empty_value() -> Value {
    Value::String(String::new())
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn render(value: &Value, option: ValueRenderOption) -> Value {
    match option {
        ValueRenderOption::FormattedValue => match value {
            Value::Null => empty_value(),
            Value::Bool(true) => Value::String("TRUE".to_string()),
            Value::Bool(false) => Value::String("FALSE".to_string()),
            Value::Number(n) => Value::String(n.to_string()),
            other => other.clone(),
        },
        ValueRenderOption::UnformattedValue | ValueRenderOption::Formula => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn service() -> MemoryService {
        MemoryService::new().with_document(
            MemoryDocument::new("doc", "Budget")
                .with_sheet(MemorySheet::new("Sheet1", 5, 4).with_values(vec![
                    vec![json!("a"), json!("b"), json!("")],
                    vec![json!("d"), json!(2), json!(true)],
                ]))
                .with_sheet(MemorySheet::object("Chart")),
        )
    }

    #[test]
    fn test_read_is_sparse() {
        let svc = service();
        let range = svc
            .read_range("doc", "'Sheet1'!A1:D4", ReadOptions::default())
            .unwrap();
        assert_eq!(
            range.values,
            vec![
                vec![json!("a"), json!("b")],
                vec![json!("d"), json!("2"), json!("TRUE")],
            ]
        );

        let unformatted = ReadOptions::default().with_value_render(ValueRenderOption::UnformattedValue);
        let range = svc.read_range("doc", "Sheet1!B2:C2", unformatted).unwrap();
        assert_eq!(range.values, vec![vec![json!(2), json!(true)]]);
    }

    #[test]
    fn test_batched_read_is_one_call() {
        let svc = service();
        let ranges = vec!["'Sheet1'!A1:B1".to_string(), "'Sheet1'!B2:C2".to_string()];
        let read = svc.read_ranges("doc", &ranges, ReadOptions::default()).unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].values, vec![vec![json!("a"), json!("b")]]);
        assert_eq!(read[1].values, vec![vec![json!("2"), json!("TRUE")]]);
        assert_eq!(svc.calls().len(), 1);

        // One bad range fails the whole call
        let ranges = vec!["'Sheet1'!A1:A1".to_string(), "'Sheet1'!A1:Z1".to_string()];
        let err = svc.read_ranges("doc", &ranges, ReadOptions::default()).unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_file_properties() {
        let svc = MemoryService::new()
            .with_document(MemoryDocument::new("doc", "Budget").with_property("owner", "finance"));
        assert_eq!(
            svc.file_properties("doc").unwrap(),
            BTreeMap::from([("owner".to_string(), "finance".to_string())])
        );
        svc.set_property("doc", "year", "2024").unwrap();
        assert_eq!(svc.file_properties("doc").unwrap().len(), 2);
        assert!(svc.file_properties("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_read_outside_grid() {
        let err = service()
            .read_range("doc", "'Sheet1'!A1:E1", ReadOptions::default())
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_unknown_document() {
        assert!(service().get_document("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_sheet_ids_are_assigned() {
        let entry = service().get_document("doc").unwrap();
        let ids: Vec<i64> = entry.sheets.iter().map(|s| s.properties.sheet_id).collect();
        assert_eq!(ids, vec![0, 1]);
        assert_eq!(entry.sheets[1].properties.sheet_type, SheetType::Object);
    }

    #[test]
    fn test_write_and_clear() {
        let svc = service();
        svc.write_cells(
            "doc",
            &BatchUpdateValuesRequest::user_entered(vec![
                ValueRange::cell("'Sheet1'!C2:C2", json!("z")),
                ValueRange::cell("'Sheet1'!A5:A5", json!(7)),
            ]),
        )
        .unwrap();
        assert_eq!(svc.cell("doc", "Sheet1", 1, 2), Some(json!("z")));
        assert_eq!(svc.cell("doc", "Sheet1", 4, 0), Some(json!(7)));

        svc.clear_range("doc", "'Sheet1'!A1:B2").unwrap();
        assert_eq!(svc.cell("doc", "Sheet1", 0, 0), Some(json!("")));
        assert_eq!(svc.cell("doc", "Sheet1", 1, 2), Some(json!("z")));
    }

    #[test]
    fn test_rejected_write_changes_nothing() {
        let svc = service();
        let err = svc
            .write_cells(
                "doc",
                &BatchUpdateValuesRequest::user_entered(vec![
                    ValueRange::cell("'Sheet1'!A1:A1", json!("changed")),
                    ValueRange::cell("'Sheet1'!Z99:Z99", json!("out")),
                ]),
            )
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(svc.cell("doc", "Sheet1", 0, 0), Some(json!("a")));
    }

    #[test]
    fn test_batch_update() {
        let svc = service();
        let entry = svc
            .batch_update(
                "doc",
                vec![
                    SheetRequest::add_sheet("Data", 10, 3),
                    SheetRequest::set_spreadsheet_title("Renamed"),
                ],
            )
            .unwrap();
        assert_eq!(entry.properties.title, "Renamed");
        assert_eq!(entry.sheets[2].properties.title, "Data");
        assert_eq!(entry.sheets[2].properties.sheet_id, 2);

        let err = svc
            .batch_update("doc", vec![SheetRequest::add_sheet("Data", 1, 1)])
            .unwrap_err();
        assert_eq!(err.status(), Some(400));

        let entry = svc
            .batch_update("doc", vec![SheetRequest::resize_sheet(0, 2, 2)])
            .unwrap();
        assert_eq!(entry.sheets[0].properties.grid_properties.row_count, 2);
        assert_eq!(svc.cell("doc", "Sheet1", 1, 1), Some(json!(2)));
        assert_eq!(svc.cell("doc", "Sheet1", 1, 2), None);
    }

    #[test]
    fn test_injected_failures_are_logged() {
        let svc = service();
        svc.fail_next(ApiError::http(503, "unavailable"));
        assert_eq!(svc.list_documents().unwrap_err().status(), Some(503));
        assert_eq!(svc.list_documents().unwrap().len(), 1);
        assert_eq!(svc.calls(), vec![Call::ListDocuments, Call::ListDocuments]);
        assert_eq!(svc.take_calls().len(), 2);
        assert!(svc.calls().is_empty());
    }
}
