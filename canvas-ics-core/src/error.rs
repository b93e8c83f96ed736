use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Non-success status from the Canvas API. Never retried.
    #[error("API request failed: HTTP {status} from {url}: {body}")]
    Upstream {
        status: u16,
        url: String,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network timeout")]
    Timeout,

    /// Nothing to work with (no courses, nothing selected). Not a failure.
    #[error("{0}")]
    EmptyResult(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult(_))
    }
}

/// A timestamp that could not be interpreted.
///
/// Non-fatal: display falls back to the raw text and the calendar export
/// skips only the affected assignment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unparseable timestamp: {input:?}")]
pub struct DateParseWarning {
    pub input: String,
}

impl DateParseWarning {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
