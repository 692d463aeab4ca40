//! Auto-reset wake signal for the send path.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A single-waiter event that clears itself when a wait consumes it.
///
/// Raising an already raised signal is a no-op, so any number of `send`
/// calls between two drains cost the send path exactly one wake-up.
pub(crate) struct WakeSignal {
    raised: Mutex<bool>,
    condvar: Condvar,
}

impl WakeSignal {
    pub(crate) fn new() -> Self {
        Self {
            raised: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    /// Raises the signal, releasing one waiter.
    pub(crate) fn raise(&self) {
        let mut raised = self.raised.lock();
        *raised = true;
        self.condvar.notify_one();
    }

    /// Blocks until raised, then clears.
    pub(crate) fn wait(&self) {
        let mut raised = self.raised.lock();
        while !*raised {
            self.condvar.wait(&mut raised);
        }
        *raised = false;
    }

    /// Blocks until raised or `timeout` elapses, then clears.
    ///
    /// Returns true if the signal was raised.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = self.raised.lock();
        while !*raised {
            if self.condvar.wait_until(&mut raised, deadline).timed_out() {
                break;
            }
        }
        std::mem::replace(&mut *raised, false)
    }

    /// Clears the signal without waiting.
    pub(crate) fn reset(&self) {
        *self.raised.lock() = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_raise_before_wait() {
        let signal = WakeSignal::new();
        signal.raise();
        signal.wait();
        assert!(!signal.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_raises_coalesce() {
        let signal = WakeSignal::new();
        signal.raise();
        signal.raise();
        signal.raise();

        assert!(signal.wait_timeout(Duration::from_millis(1)));
        assert!(!signal.wait_timeout(Duration::from_millis(1)));
    }

    #[test]
    fn test_wakes_blocked_waiter() {
        let signal = Arc::new(WakeSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait_timeout(Duration::from_secs(5)))
        };

        thread::sleep(Duration::from_millis(20));
        signal.raise();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_reset_clears() {
        let signal = WakeSignal::new();
        signal.raise();
        signal.reset();
        assert!(!signal.wait_timeout(Duration::from_millis(1)));
    }
}
