//! Shutdown coordination.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Owns the root cancellation token; long-running tasks hold child tokens
/// so cancelling the root stops all of them, while each child can still be
/// cancelled on its own.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    root: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token for one task, cancelled when shutdown is triggered.
    pub fn child(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        self.root.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Resolves once shutdown has been triggered.
    pub async fn wait(&self) {
        self.root.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_cancels_children() {
        let shutdown = Shutdown::new();
        let a = shutdown.child();
        let b = shutdown.child();

        a.cancel();
        assert!(!shutdown.is_triggered());
        assert!(!b.is_cancelled());

        shutdown.trigger();
        shutdown.trigger();
        assert!(b.is_cancelled());
        shutdown.wait().await;
    }
}
