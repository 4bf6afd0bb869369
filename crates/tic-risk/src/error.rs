//! `TicError` unites the per-crate error taxonomies at the one boundary
//! callers actually see. Nothing downstream of this crate should need to
//! match on `FeedError`/`ResolveError`/`StoreError` directly.

use tic_common::{FeedError, ResolveError, StoreError};
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum TicError {
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
