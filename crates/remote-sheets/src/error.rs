//! Error types for remote-sheets

use remote_sheets_api::ApiError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the client.
///
/// Caller mistakes (bad indices, slices, values) surface as [`Error::Core`]
/// before any network traffic. Failures of the remote service surface as
/// [`Error::Api`], exactly as the service reported them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] remote_sheets_core::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Error {
    pub fn as_core(&self) -> Option<&remote_sheets_core::Error> {
        match self {
            Error::Core(err) => Some(err),
            Error::Api(_) => None,
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            Error::Core(_) => None,
        }
    }
}
