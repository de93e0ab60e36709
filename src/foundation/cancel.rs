use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::foundation::error::{LufsError, LufsResult};

/// Shared flag a caller flips to stop a run between stages.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Return `true` once [`CancelToken::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cancellation token plus optional deadline, checked at stage boundaries.
#[derive(Clone, Debug)]
pub struct RunGuard {
    token: CancelToken,
    deadline: Option<Instant>,
}

impl RunGuard {
    /// Guard that starts counting `timeout` now.
    pub fn new(token: CancelToken, timeout: Option<Duration>) -> Self {
        Self {
            token,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Guard that never fires.
    pub fn unbounded() -> Self {
        Self::new(CancelToken::new(), None)
    }

    /// Fail with `Cancelled` or `TimedOut` if `stage` must not start.
    pub fn check(&self, stage: &'static str) -> LufsResult<()> {
        if self.token.is_cancelled() {
            return Err(LufsError::Cancelled { stage });
        }
        if self.expired() {
            return Err(LufsError::TimedOut { stage });
        }
        Ok(())
    }

    /// Absolute deadline, when a timeout was given.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Return `true` when the deadline has passed.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cancel.rs"]
mod tests;
