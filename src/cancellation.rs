//! Cooperative cancellation (spec §5).
//!
//! Each execution stage checks this token at stage boundaries (between fetch, filter,
//! join, write). No example or teacher crate in the pack carries a dedicated
//! cancellation primitive — clarium has no concept of mid-statement cancellation — so
//! this is a minimal, self-contained `Arc<AtomicBool>` flag rather than reaching for a
//! dependency (e.g. `tokio_util::sync::CancellationToken`) disproportionate to the single
//! boolean this engine needs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Checked at each stage boundary; returns the typed error the spec requires a
    /// cancelled statement to surface as.
    pub fn check(&self) -> crate::error::DocSqlResult<()> {
        if self.is_cancelled() {
            Err(crate::error::DocSqlError::plan("cancelled", "statement execution was cancelled"))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let tok = CancellationToken::new();
        assert!(!tok.is_cancelled());
        assert!(tok.check().is_ok());
    }

    #[test]
    fn cancel_is_visible_across_clones() {
        let tok = CancellationToken::new();
        let clone = tok.clone();
        clone.cancel();
        assert!(tok.is_cancelled());
        assert!(tok.check().is_err());
    }
}
