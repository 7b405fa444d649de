//! Wire types for the spreadsheet and file-listing REST APIs.
//!
//! Only the fields this workspace reads or writes are modelled; unknown fields
//! in responses are ignored.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document metadata as returned by `spreadsheets.get` (without grid data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetEntry {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetProperties {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub sheet_type: SheetType,
    #[serde(default)]
    pub grid_properties: GridProperties,
}

/// Kind of sheet; only grid sheets hold cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SheetType {
    #[default]
    Grid,
    Object,
    DataSource,
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: usize,
    #[serde(default)]
    pub column_count: usize,
}

/// A block of cell values addressed by an A1 range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    #[serde(default)]
    pub major_dimension: MajorDimension,
    /// Row-major values; rows and trailing cells may be missing
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// A single-cell update
    pub fn cell(range: impl Into<String>, value: Value) -> Self {
        Self {
            range: range.into(),
            major_dimension: MajorDimension::Rows,
            values: vec![vec![value]],
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MajorDimension {
    #[default]
    Rows,
    Columns,
}

/// How cell values are rendered in a read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueRenderOption {
    /// Values as displayed in the UI, always strings
    #[default]
    FormattedValue,
    /// Numbers and booleans keep their type, no number formatting
    UnformattedValue,
    /// Formulas instead of their results
    Formula,
}

impl ValueRenderOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueRenderOption::FormattedValue => "FORMATTED_VALUE",
            ValueRenderOption::UnformattedValue => "UNFORMATTED_VALUE",
            ValueRenderOption::Formula => "FORMULA",
        }
    }
}

/// How dates and times are rendered when values are not formatted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateTimeRenderOption {
    #[default]
    SerialNumber,
    FormattedString,
}

impl DateTimeRenderOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateTimeRenderOption::SerialNumber => "SERIAL_NUMBER",
            DateTimeRenderOption::FormattedString => "FORMATTED_STRING",
        }
    }
}

/// Presentation options for a range read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub value_render_option: ValueRenderOption,
    pub date_time_render_option: DateTimeRenderOption,
}

impl ReadOptions {
    pub fn with_value_render(mut self, option: ValueRenderOption) -> Self {
        self.value_render_option = option;
        self
    }

    pub fn with_date_time_render(mut self, option: DateTimeRenderOption) -> Self {
        self.date_time_render_option = option;
        self
    }
}

/// How written values are interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    Raw,
    /// Parsed as if typed into the UI
    #[default]
    UserEntered,
}

/// Body of `spreadsheets.values.batchUpdate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    pub value_input_option: ValueInputOption,
    pub data: Vec<ValueRange>,
}

impl BatchUpdateValuesRequest {
    pub fn user_entered(data: Vec<ValueRange>) -> Self {
        Self {
            value_input_option: ValueInputOption::UserEntered,
            data,
        }
    }
}

/// Selects the values a batched read returns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFilter {
    pub a1_range: String,
}

/// Body of `spreadsheets.values.batchGetByDataFilter`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetValuesRequest {
    pub data_filters: Vec<DataFilter>,
    pub major_dimension: MajorDimension,
    pub value_render_option: ValueRenderOption,
    pub date_time_render_option: DateTimeRenderOption,
}

impl BatchGetValuesRequest {
    pub fn new(ranges: &[String], options: ReadOptions) -> Self {
        Self {
            data_filters: ranges
                .iter()
                .map(|range| DataFilter {
                    a1_range: range.clone(),
                })
                .collect(),
            major_dimension: MajorDimension::Rows,
            value_render_option: options.value_render_option,
            date_time_render_option: options.date_time_render_option,
        }
    }
}

/// The values matched by one or more filters of a batched read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedValueRange {
    pub value_range: ValueRange,
    #[serde(default)]
    pub data_filters: Vec<DataFilter>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetValuesResponse {
    #[serde(default)]
    pub value_ranges: Vec<MatchedValueRange>,
}

impl BatchGetValuesResponse {
    /// Pair every requested range with its values, in request order.
    ///
    /// Ranges are matched through the filters echoed back by the service,
    /// falling back to response order when no filter is echoed.
    pub fn into_ordered(self, ranges: &[String]) -> Option<Vec<ValueRange>> {
        if self.value_ranges.iter().all(|m| m.data_filters.is_empty()) {
            return (self.value_ranges.len() == ranges.len())
                .then(|| self.value_ranges.into_iter().map(|m| m.value_range).collect());
        }
        ranges
            .iter()
            .map(|range| {
                self.value_ranges
                    .iter()
                    .find(|m| m.data_filters.iter().any(|f| &f.a1_range == range))
                    .map(|m| m.value_range.clone())
            })
            .collect()
    }
}

/// One structural change in a `spreadsheets.batchUpdate` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SheetRequest {
    AddSheet(AddSheetRequest),
    DeleteSheet(DeleteSheetRequest),
    UpdateSheetProperties(UpdateSheetPropertiesRequest),
    UpdateSpreadsheetProperties(UpdateSpreadsheetPropertiesRequest),
}

impl SheetRequest {
    pub fn add_sheet(title: impl Into<String>, rows: usize, cols: usize) -> Self {
        SheetRequest::AddSheet(AddSheetRequest {
            properties: NewSheetProperties {
                title: title.into(),
                grid_properties: GridProperties {
                    row_count: rows,
                    column_count: cols,
                },
            },
        })
    }

    pub fn delete_sheet(sheet_id: i64) -> Self {
        SheetRequest::DeleteSheet(DeleteSheetRequest { sheet_id })
    }

    pub fn rename_sheet(sheet_id: i64, title: impl Into<String>) -> Self {
        SheetRequest::UpdateSheetProperties(UpdateSheetPropertiesRequest {
            properties: SheetPropertiesUpdate {
                sheet_id,
                title: Some(title.into()),
                grid_properties: None,
            },
            fields: "title".to_string(),
        })
    }

    pub fn resize_sheet(sheet_id: i64, rows: usize, cols: usize) -> Self {
        SheetRequest::UpdateSheetProperties(UpdateSheetPropertiesRequest {
            properties: SheetPropertiesUpdate {
                sheet_id,
                title: None,
                grid_properties: Some(GridProperties {
                    row_count: rows,
                    column_count: cols,
                }),
            },
            fields: "gridProperties(rowCount,columnCount)".to_string(),
        })
    }

    pub fn set_spreadsheet_title(title: impl Into<String>) -> Self {
        SheetRequest::UpdateSpreadsheetProperties(UpdateSpreadsheetPropertiesRequest {
            properties: SpreadsheetPropertiesUpdate {
                title: Some(title.into()),
            },
            fields: "title".to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSheetRequest {
    pub properties: NewSheetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSheetProperties {
    pub title: String,
    pub grid_properties: GridProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetRequest {
    pub sheet_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetPropertiesRequest {
    pub properties: SheetPropertiesUpdate,
    /// Field mask naming the properties to change
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetPropertiesUpdate {
    pub sheet_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpreadsheetPropertiesRequest {
    pub properties: SpreadsheetPropertiesUpdate,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetPropertiesUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body of `spreadsheets.batchUpdate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateRequest {
    pub requests: Vec<SheetRequest>,
    pub include_spreadsheet_in_response: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub updated_spreadsheet: Option<SpreadsheetEntry>,
}

/// A file as reported by the file-listing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<DateTime<Utc>>,
    /// Custom key-value properties attached to the file
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Error payload shared by both REST APIs
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
    /// Legacy per-error list (file-listing API)
    #[serde(default)]
    pub errors: Vec<ErrorItem>,
    /// Structured details (spreadsheet API)
    #[serde(default)]
    pub details: Vec<ErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorItem {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorDetail {
    /// The first machine-readable reason, falling back to the status name
    pub fn reason(&self) -> Option<String> {
        self.errors
            .iter()
            .chain(self.details.iter())
            .find_map(|item| item.reason.clone())
            .or_else(|| self.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_sheet_request_wire_format() {
        let request = BatchUpdateRequest {
            requests: vec![SheetRequest::add_sheet("Data", 1000, 26)],
            include_spreadsheet_in_response: true,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "requests": [{
                    "addSheet": {
                        "properties": {
                            "title": "Data",
                            "gridProperties": {"rowCount": 1000, "columnCount": 26}
                        }
                    }
                }],
                "includeSpreadsheetInResponse": true
            })
        );

        assert_eq!(
            serde_json::to_value(SheetRequest::set_spreadsheet_title("Budget")).unwrap(),
            json!({
                "updateSpreadsheetProperties": {
                    "properties": {"title": "Budget"},
                    "fields": "title"
                }
            })
        );
    }

    #[test]
    fn test_values_request_wire_format() {
        let request = BatchUpdateValuesRequest::user_entered(vec![ValueRange::cell(
            "'Sheet1'!C2:C2",
            json!("z"),
        )]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "valueInputOption": "USER_ENTERED",
                "data": [{"range": "'Sheet1'!C2:C2", "majorDimension": "ROWS", "values": [["z"]]}]
            })
        );
    }

    #[test]
    fn test_batch_get_wire_format() {
        let ranges = vec!["'Sheet1'!A1:B2".to_string(), "'Sheet2'!C3:C3".to_string()];
        let options = ReadOptions::default().with_value_render(ValueRenderOption::UnformattedValue);
        assert_eq!(
            serde_json::to_value(BatchGetValuesRequest::new(&ranges, options)).unwrap(),
            json!({
                "dataFilters": [{"a1Range": "'Sheet1'!A1:B2"}, {"a1Range": "'Sheet2'!C3:C3"}],
                "majorDimension": "ROWS",
                "valueRenderOption": "UNFORMATTED_VALUE",
                "dateTimeRenderOption": "SERIAL_NUMBER"
            })
        );

        // Answers may come back in any order
        let response: BatchGetValuesResponse = serde_json::from_value(json!({
            "spreadsheetId": "abc",
            "valueRanges": [
                {"valueRange": {"range": "Sheet2!C3", "values": [["z"]]},
                 "dataFilters": [{"a1Range": "'Sheet2'!C3:C3"}]},
                {"valueRange": {"range": "Sheet1!A1:B2", "values": [["a", "b"]]},
                 "dataFilters": [{"a1Range": "'Sheet1'!A1:B2"}]}
            ]
        }))
        .unwrap();
        let ordered = response.clone().into_ordered(&ranges).unwrap();
        assert_eq!(ordered[0].values, vec![vec![json!("a"), json!("b")]]);
        assert_eq!(ordered[1].values, vec![vec![json!("z")]]);

        assert!(response.into_ordered(&["'Other'!A1:A1".to_string()]).is_none());
    }

    #[test]
    fn test_parse_file_properties() {
        let file: DriveFile = serde_json::from_value(json!({
            "properties": {"owner": "finance", "year": "2024"}
        }))
        .unwrap();
        assert_eq!(file.properties.get("owner").map(String::as_str), Some("finance"));
        assert_eq!(file.properties.len(), 2);

        let bare: DriveFile = serde_json::from_value(json!({"id": "abc"})).unwrap();
        assert!(bare.properties.is_empty());
    }

    #[test]
    fn test_parse_spreadsheet_entry() {
        let entry: SpreadsheetEntry = serde_json::from_value(json!({
            "spreadsheetId": "abc",
            "properties": {"title": "Budget", "locale": "en_US"},
            "sheets": [
                {"properties": {"sheetId": 0, "title": "Sheet1", "index": 0, "sheetType": "GRID",
                    "gridProperties": {"rowCount": 1000, "columnCount": 26, "frozenRowCount": 1}}},
                {"properties": {"sheetId": 7, "title": "Chart1", "index": 1, "sheetType": "OBJECT"}}
            ]
        }))
        .unwrap();

        assert_eq!(entry.properties.title, "Budget");
        assert_eq!(entry.sheets.len(), 2);
        assert_eq!(entry.sheets[0].properties.grid_properties.column_count, 26);
        assert_eq!(entry.sheets[1].properties.sheet_type, SheetType::Object);
    }

    #[test]
    fn test_parse_sparse_value_range() {
        let range: ValueRange = serde_json::from_value(json!({
            "range": "Sheet1!A1:C2",
            "majorDimension": "ROWS",
            "values": [["a", "b"], [], ["x"]]
        }))
        .unwrap();
        assert_eq!(range.values[0].len(), 2);
        assert!(range.values[1].is_empty());

        let empty: ValueRange = serde_json::from_value(json!({"range": "Sheet1!A1:C2"})).unwrap();
        assert!(empty.values.is_empty());
    }

    #[test]
    fn test_error_reason() {
        let body: ErrorBody = serde_json::from_value(json!({
            "error": {
                "code": 403,
                "message": "Daily Limit Exceeded",
                "errors": [{"domain": "usageLimits", "reason": "dailyLimitExceeded"}]
            }
        }))
        .unwrap();
        assert_eq!(body.error.reason().as_deref(), Some("dailyLimitExceeded"));

        let body: ErrorBody = serde_json::from_value(json!({
            "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
        }))
        .unwrap();
        assert_eq!(body.error.reason().as_deref(), Some("RESOURCE_EXHAUSTED"));
    }
}
