//! Error types
//!
//! Traversal misses are not errors; they resolve to defaults inside the
//! transforms. What remains is one error per failing stage.

use thiserror::Error;

/// Errors from fetching and extracting an app detail page
#[derive(Debug, Error)]
pub enum Error {
    /// No app id was supplied; nothing was fetched
    #[error("appId missing")]
    MissingAppId,

    /// The details URL could not be built
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Upstream fetch failed; passed through unchanged
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The fetched page held no embedded datasets
    #[error("page contained no embedded datasets")]
    EmptyPage,
}

/// Errors from the HTTP layer
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
}

/// A transform received data it cannot normalize
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("expected {expected}, found {found}")]
    UnexpectedShape {
        expected: &'static str,
        found: &'static str,
    },
}

impl TransformError {
    pub(crate) fn shape(expected: &'static str, found: &'static str) -> Self {
        TransformError::UnexpectedShape { expected, found }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
