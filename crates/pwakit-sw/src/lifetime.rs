//! Extension tokens that defer worker termination.
//!
//! A handler holds an [`ExtensionToken`] for as long as its asynchronous work
//! runs. The host may only reclaim the worker while [`WorkerLifetime::is_idle`]
//! holds. Nothing here imposes a timeout: a handler that never settles keeps
//! the worker alive indefinitely.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::trace;

#[derive(Debug, Default)]
struct Inner {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Tracks extended operations for one worker instance.
#[derive(Debug, Clone, Default)]
pub struct WorkerLifetime {
    inner: Arc<Inner>,
}

impl WorkerLifetime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extended operation. The worker stays alive until the
    /// returned token is dropped.
    pub fn extend(&self, label: &'static str) -> ExtensionToken {
        let count = self.inner.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(label, in_flight = count, "Lifetime extended");
        ExtensionToken {
            inner: Arc::clone(&self.inner),
            label,
        }
    }

    /// Number of operations still in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Whether the host may terminate the worker.
    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0
    }

    /// Resolve once no operation is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// Keeps the worker alive while held.
#[derive(Debug)]
pub struct ExtensionToken {
    inner: Arc<Inner>,
    label: &'static str,
}

impl ExtensionToken {
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl Drop for ExtensionToken {
    fn drop(&mut self) {
        let remaining = self.inner.in_flight.fetch_sub(1, Ordering::AcqRel) - 1;
        trace!(label = self.label, in_flight = remaining, "Lifetime extension settled");
        if remaining == 0 {
            self.inner.idle.notify_waiters();
        }
    }
}
