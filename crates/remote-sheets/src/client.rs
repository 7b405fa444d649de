//! The client: a remote service plus the retry policy every call goes through

use std::time::Duration;

use remote_sheets_api::{ApiError, RetryPolicy, SheetsService, MAX_WAIT_TIME};
use tracing::debug;

use crate::collection::Collection;
use crate::error::{Error, Result};
use crate::spreadsheet::Spreadsheet;
use crate::view::FetchOptions;

/// Configuration for a [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Budget for the total time one call may spend sleeping between retries.
    pub max_wait_time: Duration,

    /// Rendering used when views fetch their cells.
    pub default_fetch: FetchOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_wait_time: MAX_WAIT_TIME,
            default_fetch: FetchOptions::default(),
        }
    }
}

/// Entry point for working with remote spreadsheets.
///
/// Documents, worksheets and views borrow the client, so it must outlive
/// them. Every remote call is made through [`Client::call`] and therefore
/// retried under the client's [`RetryPolicy`].
pub struct Client {
    service: Box<dyn SheetsService>,
    retry: RetryPolicy,
    default_fetch: FetchOptions,
}

impl Client {
    pub fn new(service: impl SheetsService + 'static) -> Self {
        Self::with_config(service, ClientConfig::default())
    }

    pub fn with_config(service: impl SheetsService + 'static, config: ClientConfig) -> Self {
        Self {
            service: Box::new(service),
            retry: RetryPolicy::new(config.max_wait_time),
            default_fetch: config.default_fetch,
        }
    }

    /// Connect to the REST service with a caller-supplied access token
    #[cfg(feature = "http")]
    pub fn connect(config: remote_sheets_api::HttpConfig) -> Result<Self> {
        Ok(Self::new(remote_sheets_api::HttpService::new(config)?))
    }

    /// Replace the retry policy, e.g. to install a non-blocking sleeper in tests
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn default_fetch(&self) -> FetchOptions {
        self.default_fetch
    }

    /// Run one service operation under the retry policy
    pub fn call<T, F>(&self, mut op: F) -> std::result::Result<T, ApiError>
    where
        F: FnMut(&dyn SheetsService) -> std::result::Result<T, ApiError>,
    {
        self.retry.run(|| op(self.service.as_ref()))
    }

    /// All documents visible to the caller, listed on first use
    pub fn collection(&self) -> Collection<'_> {
        Collection::new(self)
    }

    /// Open one document by id without listing the others
    pub fn open(&self, key: &str) -> Result<Spreadsheet<'_>> {
        debug!(key, "opening spreadsheet");
        match self.call(|service| service.get_document(key)) {
            Ok(entry) => Ok(Spreadsheet::with_entry(self, entry)),
            Err(err) if err.is_not_found() => {
                Err(remote_sheets_core::Error::KeyNotFound(key.to_string()).into())
            }
            Err(err) => Err(Error::Api(err)),
        }
    }
}
