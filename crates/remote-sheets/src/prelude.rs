//! Prelude module - common imports for remote-sheets users
//!
//! ```rust
//! use remote_sheets::prelude::*;
//! ```

pub use crate::{
    // Service types
    ApiError,
    // Cell types
    CellInput,
    CellValue,
    // Main types
    Client,
    ClientConfig,
    Collection,
    DateTimeRenderOption,
    // Error types
    Error,
    FetchOptions,
    MemoryDocument,
    MemoryService,
    MemorySheet,
    Result,
    RetryPolicy,
    SheetsService,
    Slice,
    Spreadsheet,
    ValueRenderOption,
    View,
    ViewBounds,
    ViewRow,
    ViewRows,
    Worksheet,
};

#[cfg(feature = "http")]
pub use crate::{HttpConfig, HttpService};
