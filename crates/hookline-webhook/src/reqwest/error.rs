//! Error types for reqwest-based webhook delivery.

use thiserror::Error;

/// Result type alias for reqwest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<Error> for crate::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) if e.is_timeout() => crate::Error::timeout()
                .with_message(e.to_string())
                .with_source(e),
            Error::Reqwest(e) if e.is_connect() => crate::Error::network_error()
                .with_message("Connection failed")
                .with_source(e),
            Error::Reqwest(e) if e.is_builder() => crate::Error::configuration()
                .with_message(e.to_string())
                .with_source(e),
            Error::Reqwest(e) => crate::Error::network_error()
                .with_message(e.to_string())
                .with_source(e),
        }
    }
}
