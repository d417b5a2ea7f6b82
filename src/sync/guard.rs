//! Loop prevention for one domain.
//!
//! While a remote snapshot is being written into the store, every listener
//! notification raised by that write must be recognizable as "caused by
//! remote", so the outbound path re-baselines instead of pushing the value
//! straight back. The guard is a depth counter owned by one coordinator and
//! shared only with that domain's store listener.
//!
//! The counter is released one scheduler tick after the write, not
//! immediately: notifications that trail the assignment on the same task
//! still observe the guard as held.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Default)]
pub struct RemoteApplyGuard {
    depth: Arc<AtomicUsize>,
}

impl RemoteApplyGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a remote apply is in progress on this domain.
    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }

    /// Run `f` with the guard held, then yield once before releasing it.
    pub async fn apply<R>(&self, f: impl FnOnce() -> R) -> R {
        let token = self.hold();
        let out = f();
        tokio::task::yield_now().await;
        drop(token);
        out
    }

    /// Hold the guard until the returned token drops.
    #[must_use]
    pub fn hold(&self) -> ApplyToken {
        self.depth.fetch_add(1, Ordering::SeqCst);
        ApplyToken { depth: Arc::clone(&self.depth) }
    }
}

/// Releases one level of the guard on drop, even if the apply panicked.
#[derive(Debug)]
pub struct ApplyToken {
    depth: Arc<AtomicUsize>,
}

impl Drop for ApplyToken {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}
