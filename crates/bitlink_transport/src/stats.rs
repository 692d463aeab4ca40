//! # Transport Statistics
//!
//! Counters bumped by the background paths without taking a lock. The host
//! reads a consistent-enough [`TransportStats`] snapshot whenever it likes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of transport counters.
///
/// Counters accumulate over the transport's whole lifetime, across
/// re-initializations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Datagrams handed to the OS.
    pub datagrams_sent: u64,
    /// Datagrams pushed onto the receive queue.
    pub datagrams_received: u64,
    /// Payload bytes handed to the OS.
    pub bytes_sent: u64,
    /// Payload bytes pushed onto the receive queue.
    pub bytes_received: u64,
    /// Transmits that failed and were dropped.
    pub send_errors: u64,
    /// Receives that failed outside shutdown.
    pub recv_errors: u64,
    /// Receive completions from an earlier session, discarded.
    pub stale_discarded: u64,
}

/// Lock-free counterpart of [`TransportStats`].
#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    datagrams_sent: AtomicU64,
    datagrams_received: AtomicU64,
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    send_errors: AtomicU64,
    recv_errors: AtomicU64,
    stale_discarded: AtomicU64,
}

impl AtomicStats {
    pub(crate) fn record_sent(&self, bytes: usize) {
        self.datagrams_sent.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_received(&self, bytes: usize) {
        self.datagrams_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recv_error(&self) {
        self.recv_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TransportStats {
        TransportStats {
            datagrams_sent: self.datagrams_sent.load(Ordering::Relaxed),
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_records() {
        let stats = AtomicStats::default();
        stats.record_sent(10);
        stats.record_sent(5);
        stats.record_received(7);
        stats.record_send_error();
        stats.record_stale();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.datagrams_sent, 2);
        assert_eq!(snapshot.bytes_sent, 15);
        assert_eq!(snapshot.datagrams_received, 1);
        assert_eq!(snapshot.bytes_received, 7);
        assert_eq!(snapshot.send_errors, 1);
        assert_eq!(snapshot.recv_errors, 0);
        assert_eq!(snapshot.stale_discarded, 1);
    }
}
