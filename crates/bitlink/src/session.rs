//! # Exclusive Host Session
//!
//! Two demos sharing one well-known port cannot run side by side. The slot
//! is explicit shared state: whoever builds the [`ExclusiveSession`] hands
//! clones to every host that must not overlap, and a [`SessionGuard`]
//! releases the slot when it drops.
//!
//! ```text
//!   session.try_acquire("tiktak") ──► Ok(guard)        slot: Some("tiktak")
//!   session.try_acquire("stream") ──► Err(SessionBusy)
//!   drop(guard)                                        slot: None
//! ```

use crate::error::{HostError, HostResult};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared "one host at a time" slot. Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct ExclusiveSession {
    holder: Arc<Mutex<Option<&'static str>>>,
}

impl ExclusiveSession {
    /// Creates a free slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::SessionBusy`] naming the current holder if the
    /// slot is taken.
    pub fn try_acquire(&self, name: &'static str) -> HostResult<SessionGuard> {
        let mut holder = self.holder.lock();
        if let Some(current) = *holder {
            return Err(HostError::SessionBusy { holder: current });
        }

        *holder = Some(name);
        Ok(SessionGuard {
            holder: Arc::clone(&self.holder),
            name,
        })
    }

    /// Returns true while some guard is alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.holder.lock().is_some()
    }

    /// Name of the current holder.
    #[must_use]
    pub fn holder(&self) -> Option<&'static str> {
        *self.holder.lock()
    }
}

/// Holds the slot of an [`ExclusiveSession`] until dropped.
#[derive(Debug)]
#[must_use = "the session is released as soon as the guard drops"]
pub struct SessionGuard {
    holder: Arc<Mutex<Option<&'static str>>>,
    name: &'static str,
}

impl SessionGuard {
    /// Name the slot was claimed under.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        *self.holder.lock() = None;
    }
}
