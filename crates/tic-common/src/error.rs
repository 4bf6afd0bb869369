//! The error taxonomy shared by every store and adapter. Structured,
//! `thiserror`-backed, and never translated into a panic across a public
//! boundary.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum FeedError {
    #[error("network error fetching feed: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("failed to parse feed response: {0}")]
    Parse(String),
    #[error("feed fetch canceled")]
    Canceled,
}

#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    #[error("exceeded maximum redirect count")]
    MaxRedirects,
    #[error("request timed out")]
    Timeout,
    #[error("malformed URL: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("corrupt store state: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}
