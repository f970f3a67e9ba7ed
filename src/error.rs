use std::time::Duration;

use thiserror::Error;

/// Why an outbound call to the content backend did not produce a JSON body.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Upstream answered with a non-2xx status. `body` is the raw response text.
    #[error("upstream responded with status {status}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON from upstream: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Why a relative path could not be placed under the CMS base URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("`{0}` contains a `.` or `..` segment")]
    DotSegment(String),

    #[error("base URL cannot take path segments: {0}")]
    Base(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown collection `{0}` (expected services, cases, team, testimonials, posts)")]
pub struct UnknownCollection(pub String);
