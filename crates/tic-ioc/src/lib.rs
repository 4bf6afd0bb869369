//! Indicator-of-compromise extraction and URL canonicalization. Pure,
//! synchronous, and side-effect free — every other analyzer crate depends
//! on this one to turn raw text or a raw URL into something comparable.

pub mod canonicalize;
pub mod extractor;

pub use tic_common::ExtractedIocs;

pub use canonicalize::{canonicalize as canonicalize_url, registrable_domain};
pub use extractor::extract;
