use crate::cache::QueryKey;

/// Everything that can go wrong between a view and the backend.
///
/// The error is `Clone` because a single in-flight fetch can be awaited by
/// several views at once and each of them gets its own copy of the outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Network failure: {0}")]
    Network(String),

    #[error("{method} {path} returned {status}")]
    Http {
        method: String,
        path: String,
        status: u16,
    },

    #[error("Invalid payload: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Storage unavailable: {0}")]
    Storage(String),

    #[error("Cache entry {0} holds another payload type")]
    CacheType(QueryKey),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Error::Network(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::Parse(value.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(value: url::ParseError) -> Self {
        Error::Config(value.to_string())
    }
}

impl Error {
    /// Unauthorized responses mean the stored token is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Http { status: 401, .. })
    }
}
