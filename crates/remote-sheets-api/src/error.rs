//! Error types for remote-sheets-api

use thiserror::Error;

/// Result type alias using [`ApiError`]
pub type Result<T> = std::result::Result<T, ApiError>;

/// Markers in a 429 payload that identify a short-window quota.
///
/// Long-window quotas (e.g. "1d", "per day") do not match and are not retried.
pub const SHORT_TERM_RATE_MARKERS: &[&str] = &["100s", "100 seconds", "per minute"];

/// Which quota window a rate-limit response refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitWindow {
    /// A quota that refills within a couple of minutes
    Short,
    /// A daily (or otherwise long) quota
    Long,
}

/// Errors returned by the remote spreadsheet service or its transport
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        /// First machine-readable reason in the error payload, if any
        reason: Option<String>,
        message: String,
    },

    /// The request did not complete in time
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure other than a timeout
    #[error("transport error: {0}")]
    Transport(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response parsed but lacked data the call requires
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ApiError {
    /// Create an HTTP status error without a reason
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        ApiError::Http {
            status,
            reason: None,
            message: message.into(),
        }
    }

    /// Create a 429 error carrying the given quota description
    pub fn rate_limited(message: impl Into<String>) -> Self {
        ApiError::Http {
            status: 429,
            reason: Some("rateLimitExceeded".to_string()),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::http(404, message)
    }

    /// HTTP status, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Classify a 429 response by quota window; `None` for anything else
    pub fn rate_limit_window(&self) -> Option<RateLimitWindow> {
        match self {
            ApiError::Http {
                status: 429,
                reason,
                message,
            } => {
                let mentions = |text: &str| SHORT_TERM_RATE_MARKERS.iter().any(|m| text.contains(m));
                if mentions(message) || reason.as_deref().map_or(false, mentions) {
                    Some(RateLimitWindow::Short)
                } else {
                    Some(RateLimitWindow::Long)
                }
            }
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Server errors, short-window rate limits and timeouts are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http { status, .. } if *status >= 500 => true,
            ApiError::Http { status: 429, .. } => {
                self.rate_limit_window() == Some(RateLimitWindow::Short)
            }
            ApiError::Timeout => true,
            _ => false,
        }
    }
}
