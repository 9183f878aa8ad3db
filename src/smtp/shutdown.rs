//! State shared between sessions: the shutdown flag and the count of live
//! sessions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Broadcast, set-once flag telling sessions to wind down
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    raised: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }
}

/// Counts live sessions so shutdown can wait for them to drain
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    inner: Arc<(Mutex<usize>, Condvar)>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more session. It is uncounted when the guard drops.
    pub fn register(&self) -> SessionGuard {
        let (count, _) = &*self.inner;
        *count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        SessionGuard {
            tracker: self.clone(),
        }
    }

    pub fn active(&self) -> usize {
        let (count, _) = &*self.inner;
        *count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until no session is registered
    pub fn wait_idle(&self) {
        let (count, drained) = &*self.inner;
        let guard = count.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = drained
            .wait_while(guard, |active| *active > 0)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Like [`wait_idle`](Self::wait_idle) but gives up after `timeout`.
    /// Returns whether the tracker drained.
    pub fn wait_idle_timeout(&self, timeout: Duration) -> bool {
        let (count, drained) = &*self.inner;
        let guard = count.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _) = drained
            .wait_timeout_while(guard, timeout, |active| *active > 0)
            .unwrap_or_else(PoisonError::into_inner);
        *guard == 0
    }

    fn release(&self) {
        let (count, drained) = &*self.inner;
        let mut active = count.lock().unwrap_or_else(PoisonError::into_inner);
        *active = active.saturating_sub(1);
        if *active == 0 {
            drained.notify_all();
        }
    }
}

/// Registration of one session with a [`SessionTracker`]
#[derive(Debug)]
pub struct SessionGuard {
    tracker: SessionTracker,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.tracker.release();
    }
}
