//! Call context handed to every handler
//!
//! The context is the only cancellation/deadline channel between a transport
//! and the handlers it drives. The dispatcher never inspects it; handlers
//! that do long work should call [`Context::check`] at sensible points.

use std::time::{Duration, Instant};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Why a context is no longer live
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("context cancelled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation + optional deadline
///
/// Clones share one token. Derived contexts (`child`, `with_deadline`,
/// `with_timeout`) get a child token: cancelling the parent cancels them,
/// cancelling them never reaches the parent.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

/// Handle used to cancel a context and everything derived from it
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl Context {
    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a context with the same deadline and its own cancellation scope
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a context that expires at `deadline`, or earlier if this one
    /// already has an earlier deadline
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.token.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context is cancelled (deadlines are not awaited)
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// `None` while the context is live
    pub fn err(&self) -> Option<ContextError> {
        if self.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ContextError> {
        match self.err() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel when the returned guard is dropped
    pub fn drop_guard(self) -> DropGuard {
        self.token.drop_guard()
    }
}
