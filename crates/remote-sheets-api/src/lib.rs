//! # remote-sheets-api
//!
//! Access to the remote spreadsheet service for remote-sheets.
//!
//! - [`SheetsService`] - The operations the client needs from the service
//! - [`RetryPolicy`] - Randomized exponential backoff within a wall-clock budget
//! - [`protocol`] - Wire types of the REST APIs
//! - [`MemoryService`] - An in-process service for tests and offline use
//! - `HttpService` - The blocking REST transport (feature `http`)
//!
//! ## Example
//!
//! ```rust
//! use remote_sheets_api::{
//!     MemoryDocument, MemoryService, MemorySheet, ReadOptions, RetryPolicy, SheetsService,
//! };
//!
//! let service = MemoryService::new().with_document(
//!     MemoryDocument::new("doc", "Budget")
//!         .with_sheet(MemorySheet::new("Sheet1", 10, 3).with_values(vec![vec!["a", "b"]])),
//! );
//!
//! let policy = RetryPolicy::default();
//! let range = policy
//!     .run(|| service.read_range("doc", "'Sheet1'!A1:C2", ReadOptions::default()))
//!     .unwrap();
//! assert_eq!(range.values, vec![vec!["a", "b"]]);
//! ```

pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;
pub mod protocol;
pub mod retry;
pub mod service;

pub use error::{ApiError, RateLimitWindow, Result};
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpService};
pub use memory::{Call, MemoryDocument, MemoryService, MemorySheet};
pub use protocol::{
    BatchUpdateValuesRequest, DateTimeRenderOption, DriveFile, ReadOptions, SheetProperties,
    SheetRequest, SheetType, SpreadsheetEntry, ValueRange, ValueRenderOption,
};
pub use retry::{Backoff, RetryPolicy, Sleeper, ThreadSleeper, Transient, MAX_WAIT_TIME};
pub use service::SheetsService;
