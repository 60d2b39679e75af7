//! Cooperative cancellation.
//!
//! Long-running loops (betweenness passes, power iterations, motif roots,
//! solver steps) poll an [`Interrupt`] once per outer iteration and bail out
//! with [`Error::Interrupted`]. Partial results are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// A fresh, untriggered flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear a previous request.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Interrupted)` once triggered.
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            Err(Error::Interrupted)
        } else {
            Ok(())
        }
    }
}

/// Poll an optional flag.
pub(crate) fn poll(interrupt: Option<&Interrupt>) -> Result<()> {
    interrupt.map_or(Ok(()), Interrupt::check)
}
