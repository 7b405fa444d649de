//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::time::Duration;

use remote_sheets::{Call, Client, MemoryDocument, MemoryService, MemorySheet, RetryPolicy, Sleeper};

/// Skips backoff sleeps so retry paths run instantly
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

/// One document with a 2x3 sheet, an empty 100x10 sheet and a chart sheet
pub fn service() -> MemoryService {
    MemoryService::new()
        .with_document(
            MemoryDocument::new("doc", "Budget")
                .with_sheet(
                    MemorySheet::new("Sheet1", 2, 3)
                        .with_values(vec![vec!["a", "b", "c"], vec!["d", "e", "f"]]),
                )
                .with_sheet(MemorySheet::new("Sheet2", 100, 10))
                .with_sheet(MemorySheet::object("Chart")),
        )
        .with_document(
            MemoryDocument::new("other", "Inventory").with_sheet(MemorySheet::new("Stock", 5, 5)),
        )
}

pub fn client(service: &MemoryService) -> Client {
    Client::new(service.clone()).with_retry_policy(RetryPolicy::default().with_sleeper(NoSleep))
}

/// Single and batched reads alike
pub fn reads(service: &MemoryService) -> usize {
    service.count_calls(|call| matches!(call, Call::ReadRange { .. } | Call::ReadRanges { .. }))
}

pub fn writes(service: &MemoryService) -> usize {
    service.count_calls(|call| matches!(call, Call::WriteCells { .. }))
}
