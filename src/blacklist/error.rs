use thiserror::Error;

/// Error type for blacklist retrieval and classification
#[derive(Debug, Error)]
pub enum BlacklistError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout after {timeout:?} while fetching blacklist")]
    Timeout { timeout: std::time::Duration },

    #[error("HTTP error {status}: failed to fetch blacklist from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Malformed blacklist entry on line {line_number}: {content:?}")]
    MalformedEntry { line_number: usize, content: String },

    #[error("Failed to build blocking runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Convenient Result type alias
pub type BlacklistResult<T> = Result<T, BlacklistError>;
