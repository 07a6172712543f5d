//! Trailing-edge debouncer with a single pending slot.

use std::future::Future;
use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;

type Action = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs an action once a burst of triggers has been quiet for `window`.
///
/// Every trigger cancels the pending timer and starts a new one; there is no
/// maximum wait. Once the timer fires the action is detached, so later
/// triggers schedule the next run instead of interrupting the current one.
pub struct Debouncer {
    window: Duration,
    action: Action,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("window", &self.window)
            .field("pending", &self.is_pending())
            .finish_non_exhaustive()
    }
}

impl Debouncer {
    pub fn new<F, Fut>(window: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self { window, action: Arc::new(move || action().boxed()), pending: Mutex::new(None) }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Restart the quiescence timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn trigger(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let action = Arc::clone(&self.action);
        let window = self.window;
        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            tokio::spawn(action());
        }));
    }

    /// Drop the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
