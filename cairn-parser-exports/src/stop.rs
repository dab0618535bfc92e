use cairn_time::CairnTime;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Cooperative stop flag shared by the writer thread and its manager
#[derive(Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Condvar, Mutex<bool>)>,
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl StopSignal {
    /// Signal not raised yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal and wakes every waiter
    pub fn stop(&self) {
        let mut stopped = self.inner.1.lock();
        *stopped = true;
        self.inner.0.notify_all();
    }

    /// Whether the signal was raised
    pub fn is_stopped(&self) -> bool {
        *self.inner.1.lock()
    }

    /// Sleeps up to `timeout`, returning early when the signal is raised.
    /// Returns whether it was raised.
    pub fn wait(&self, timeout: CairnTime) -> bool {
        let mut stopped = self.inner.1.lock();
        if !*stopped {
            self.inner
                .0
                .wait_for(&mut stopped, timeout.to_duration());
        }
        *stopped
    }
}
