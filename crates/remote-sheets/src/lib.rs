//! # remote-sheets
//!
//! A lazy, cached and retrying client for remote spreadsheets.
//!
//! ## Features
//!
//! - Documents and worksheets are listed on first access and cached until refreshed
//! - Views read a rectangular region with a single fetch and serve later reads from cache
//! - Writes are staged locally and committed in one batched call
//! - Every remote call is retried with randomized exponential backoff on
//!   server errors, short-window rate limits and timeouts
//!
//! ## Example
//!
//! ```rust
//! use remote_sheets::prelude::*;
//!
//! let service = MemoryService::new().with_document(
//!     MemoryDocument::new("doc", "Budget")
//!         .with_sheet(MemorySheet::new("Sheet1", 10, 3).with_values(vec![vec!["item", "cost"]])),
//! );
//! let client = Client::new(service);
//!
//! let mut documents = client.collection();
//! let spreadsheet = documents.get("doc").unwrap();
//! assert_eq!(spreadsheet.title().unwrap(), "Budget");
//!
//! let sheet = spreadsheet.worksheet("Sheet1").unwrap();
//! let mut view = sheet.view(ViewBounds::new(0isize..2, ..)).unwrap();
//! view.row(1).unwrap().set_slice(0isize..2, vec!["coffee", "3"]).unwrap();
//! view.commit().unwrap();
//! ```

pub mod client;
pub mod collection;
pub mod error;
pub mod prelude;
pub mod spreadsheet;
pub mod view;
pub mod worksheet;

pub use client::{Client, ClientConfig};
pub use collection::Collection;
pub use error::{Error, Result};
pub use spreadsheet::{Spreadsheet, DEFAULT_COLS, DEFAULT_ROWS};
pub use view::{FetchOptions, FetchState, QueuedUpdate, View, ViewRow, ViewRows};
pub use worksheet::{ViewBounds, Worksheet};

// Re-export core types
pub use remote_sheets_core::{CellAddress, CellInput, CellValue, GridBounds, Slice};

// Re-export service types
#[cfg(feature = "http")]
pub use remote_sheets_api::{HttpConfig, HttpService};
pub use remote_sheets_api::{
    ApiError, Call, DateTimeRenderOption, MemoryDocument, MemoryService, MemorySheet, RetryPolicy,
    SheetsService, Sleeper, ValueRenderOption,
};
