//! Cooperative cancellation for long-running operations (feed refresh,
//! short-link resolution). No async-cancellation crate is pulled in; a flag
//! checked between hops is sufficient for the suspension points this
//! workspace has.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_observed() {
        let token = CancelToken::new();
        assert!(!token.is_canceled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_canceled());
    }
}
