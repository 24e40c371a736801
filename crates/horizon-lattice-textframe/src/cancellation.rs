//! Cooperative cancellation for expensive text frame operations.
//!
//! A [`CancellationFlag`] is shared between the caller and a running
//! operation. The operation polls the flag at fixed points and aborts soon
//! after it is set:
//!
//! - layout polls once per produced line and once per scale candidate;
//! - ink bounds and drawing poll once per line and once per line segment.
//!
//! # Example
//!
//! ```
//! use horizon_lattice_textframe::CancellationFlag;
//!
//! let flag = CancellationFlag::new();
//! let worker_flag = flag.clone();
//!
//! assert!(!worker_flag.is_cancelled());
//! flag.cancel();
//! assert!(worker_flag.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared, thread-safe abort signal.
///
/// Cloning the flag shares the underlying state. The flag owns nothing beyond
/// the boolean and does not track which operations observe it.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<AtomicBool>,
}

impl CancellationFlag {
    /// Create a new, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    ///
    /// Only the flag itself is published, so relaxed ordering suffices.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::Relaxed)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.inner.store(true, Ordering::Relaxed);
    }

    /// Reset the flag to the unset state so it can be reused.
    pub fn reset(&self) {
        self.inner.store(false, Ordering::Relaxed);
    }
}

/// Poll an optional flag.
#[inline]
pub(crate) fn is_cancelled(flag: Option<&CancellationFlag>) -> bool {
    flag.is_some_and(CancellationFlag::is_cancelled)
}
