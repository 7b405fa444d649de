//! Blocking REST transport for the spreadsheet and file-listing APIs.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::{ApiError, Result};
use crate::protocol::{
    BatchGetValuesRequest, BatchGetValuesResponse, BatchUpdateRequest, BatchUpdateResponse,
    BatchUpdateValuesRequest, DriveFile, DriveFileList, ErrorBody, ReadOptions, SheetRequest,
    SpreadsheetEntry, ValueRange,
};
use crate::service::SheetsService;

const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

/// Configuration for [`HttpService`].
pub struct HttpConfig {
    /// OAuth2 bearer token sent with every request.
    pub access_token: String,

    /// Base URL of the spreadsheets resource.
    pub sheets_base_url: String,

    /// Base URL of the files resource of the file-listing API.
    pub drive_base_url: String,

    /// Timeout for a single request. Expiry is reported as [`ApiError::Timeout`].
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            sheets_base_url: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
            drive_base_url: "https://www.googleapis.com/drive/v3/files".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl HttpConfig {
    pub fn with_token(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ..Self::default()
        }
    }
}

/// [`SheetsService`] over HTTPS
pub struct HttpService {
    client: Client,
    config: HttpConfig,
}

impl HttpService {
    pub fn new(config: HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client, config })
    }

    /// `base` with `segments` appended, each percent-encoded
    fn url(&self, base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base).map_err(|e| ApiError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("cannot append a path to {}", base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn sheets_url(&self, segments: &[&str]) -> Result<Url> {
        self.url(&self.config.sheets_base_url, segments)
    }

    fn drive_url(&self, segments: &[&str]) -> Result<Url> {
        self.url(&self.config.drive_base_url, segments)
    }

    fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(&self.config.access_token)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        trace!(url = %response.url(), status = status.as_u16(), "response received");

        let body = response.text().map_err(transport_error)?;
        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl SheetsService for HttpService {
    fn list_documents(&self) -> Result<Vec<DriveFile>> {
        let url = self.drive_url(&[])?;
        let query = format!("mimeType='{}' and trashed=false", SPREADSHEET_MIME_TYPE);
        let mut files = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(url.clone()).query(&[
                ("q", query.as_str()),
                ("fields", "nextPageToken,files(id,name,modifiedTime)"),
                ("pageSize", "1000"),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let page: DriveFileList = self.execute(request)?;
            files.extend(page.files);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(files)
    }

    fn get_document(&self, spreadsheet_id: &str) -> Result<SpreadsheetEntry> {
        let url = self.sheets_url(&[spreadsheet_id])?;
        self.execute(
            self.client
                .get(url)
                .query(&[("includeGridData", "false")]),
        )
    }

    fn batch_update(
        &self,
        spreadsheet_id: &str,
        requests: Vec<SheetRequest>,
    ) -> Result<SpreadsheetEntry> {
        let method = format!("{}:batchUpdate", spreadsheet_id);
        let url = self.sheets_url(&[&method])?;
        let body = BatchUpdateRequest {
            requests,
            include_spreadsheet_in_response: true,
        };
        let response: BatchUpdateResponse = self.execute(self.client.post(url).json(&body))?;
        response.updated_spreadsheet.ok_or_else(|| {
            ApiError::UnexpectedResponse("batch update response lacks the spreadsheet".into())
        })
    }

    fn read_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        options: ReadOptions,
    ) -> Result<ValueRange> {
        let url = self.sheets_url(&[spreadsheet_id, "values", range])?;
        self.execute(self.client.get(url).query(&[
            ("majorDimension", "ROWS"),
            ("valueRenderOption", options.value_render_option.as_str()),
            (
                "dateTimeRenderOption",
                options.date_time_render_option.as_str(),
            ),
        ]))
    }

    fn read_ranges(
        &self,
        spreadsheet_id: &str,
        ranges: &[String],
        options: ReadOptions,
    ) -> Result<Vec<ValueRange>> {
        let url = self.sheets_url(&[spreadsheet_id, "values:batchGetByDataFilter"])?;
        let body = BatchGetValuesRequest::new(ranges, options);
        let response: BatchGetValuesResponse = self.execute(self.client.post(url).json(&body))?;
        response.into_ordered(ranges).ok_or_else(|| {
            ApiError::UnexpectedResponse(format!(
                "batched read of {} ranges did not answer every range",
                ranges.len()
            ))
        })
    }

    fn write_cells(&self, spreadsheet_id: &str, request: &BatchUpdateValuesRequest) -> Result<()> {
        let url = self.sheets_url(&[spreadsheet_id, "values:batchUpdate"])?;
        let _: serde_json::Value = self.execute(self.client.post(url).json(request))?;
        Ok(())
    }

    fn clear_range(&self, spreadsheet_id: &str, range: &str) -> Result<()> {
        let method = format!("{}:clear", range);
        let url = self.sheets_url(&[spreadsheet_id, "values", &method])?;
        let _: serde_json::Value =
            self.execute(self.client.post(url).json(&serde_json::json!({})))?;
        Ok(())
    }

    fn modified_time(&self, spreadsheet_id: &str) -> Result<DateTime<Utc>> {
        let url = self.drive_url(&[spreadsheet_id])?;
        let file: DriveFile = self.execute(
            self.client
                .get(url)
                .query(&[("fields", "modifiedTime")]),
        )?;
        file.modified_time.ok_or_else(|| {
            ApiError::UnexpectedResponse(format!("no modification time for {}", spreadsheet_id))
        })
    }

    fn file_properties(&self, spreadsheet_id: &str) -> Result<BTreeMap<String, String>> {
        let url = self.drive_url(&[spreadsheet_id])?;
        let file: DriveFile = self.execute(
            self.client
                .get(url)
                .query(&[("fields", "properties")]),
        )?;
        Ok(file.properties)
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}

/// Map an error response to [`ApiError::Http`], keeping the raw body when it is not JSON
fn error_from_body(status: u16, body: &str) -> ApiError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => ApiError::Http {
            status,
            reason: parsed.error.reason(),
            message: parsed.error.message,
        },
        Err(_) => ApiError::Http {
            status,
            reason: None,
            message: body.to_string(),
        },
    }
}
