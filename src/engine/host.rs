// Owned background executor — explicit construction and shutdown instead of
// a process-wide singleton.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Hosts background units of work for the engine and dispatcher.
///
/// Carries a root cancellation token; `shutdown()` cancels it, and every
/// loop or long-running unit holds a child token it observes between
/// suspension points. Cancellation is cooperative: work already in flight
/// runs to completion rather than being force-aborted.
pub struct TaskHost {
    root: CancellationToken,
}

impl TaskHost {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// Schedule a unit of work concurrently with the caller.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        tokio::spawn(future)
    }

    /// Token cancelled when this host shuts down. Long-running units derive
    /// their own child tokens from it.
    pub fn child_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// Request cooperative cancellation of all hosted work.
    pub fn shutdown(&self) {
        debug!("task host shutdown requested");
        self.root.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }
}

impl Default for TaskHost {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_cancels_child_tokens() {
        let host = TaskHost::new();
        let token = host.child_token();
        assert!(!token.is_cancelled());
        host.shutdown();
        assert!(token.is_cancelled());
        assert!(host.is_shut_down());
    }

    #[tokio::test]
    async fn spawned_work_runs_concurrently() {
        let host = TaskHost::new();
        let handle = host.spawn(async { 21 * 2 });
        assert_eq!(handle.await.unwrap(), 42);
    }
}
