use std::future::Future;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Shared stop signal for every task owned by one component.
///
/// Clones observe the same signal; `child()` derives a signal that stops
/// together with its parent but can also be stopped on its own.
#[derive(Debug, Clone, Default)]
pub struct SignalOfStop {
    token: CancellationToken,
}

impl SignalOfStop {
    pub fn new() -> SignalOfStop {
        SignalOfStop {
            token: CancellationToken::new(),
        }
    }

    pub fn child(&self) -> SignalOfStop {
        SignalOfStop {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn wait_cancellation(&self) {
        self.token.cancelled().await
    }

    /// Runs `fut` until it completes or the signal fires, whichever is first.
    pub async fn select<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.token.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Spawns `fut` on the runtime, bound to this signal.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let sos = self.clone();
        tokio::spawn(async move { sos.select(fut).await })
    }

    /// Fires the signal when the returned guard is dropped.
    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_select_returns_none_once_cancelled() {
        let sos = SignalOfStop::new();
        sos.cancel();
        let out = sos.select(tokio::time::sleep(Duration::from_secs(60))).await;
        assert!(out.is_none());
        assert!(sos.cancelled());
    }

    #[tokio::test]
    async fn test_spawned_task_stops_with_parent() {
        let parent = SignalOfStop::new();
        let child = parent.child();
        let handle = child.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            1
        });
        parent.cancel();
        assert_eq!(handle.await.ok().flatten(), None);
        assert!(child.cancelled());
    }

    #[test]
    fn test_drop_guard_cancels() {
        let sos = SignalOfStop::new();
        {
            let _guard = sos.drop_guard();
        }
        assert!(sos.cancelled());
    }
}
