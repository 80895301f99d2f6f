//! Cooperative cancellation for a run.
//!
//! Cancelling is advisory: the engine polls the handle before each iteration
//! and before each tool call, and never interrupts a model or
//! tool call already in flight. Collaborators that can abort early may watch
//! [`CancelHandle::token`] themselves.

use tokio_util::sync::CancellationToken;

/// A clonable cancellation signal, one per run.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Underlying token, for collaborators that want to `select!` on it.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Resolves once the handle is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}
