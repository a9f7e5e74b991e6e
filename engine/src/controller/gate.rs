//! Non-blocking single-flight gate

use tokio::sync::{Mutex, MutexGuard};

/// At most one holder at a time; contenders are turned away, not queued.
///
/// The guarded state is only reachable through the guard, so it can only be
/// mutated while the gate is held. Dropping the guard releases the gate on
/// every exit path.
#[derive(Debug, Default)]
pub struct SingleFlight<T> {
    inner: Mutex<T>,
}

impl<T> SingleFlight<T> {
    pub fn new(state: T) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    /// Enter without waiting; `None` while another holder is inside
    pub fn try_enter(&self) -> Option<MutexGuard<'_, T>> {
        self.inner.try_lock().ok()
    }

    /// Wait for the gate, for setup paths that must not be dropped
    pub async fn enter(&self) -> MutexGuard<'_, T> {
        self.inner.lock().await
    }

    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}
