//! # Frame Loop
//!
//! Fixed-rate pacing for hosts that poll the transport once per frame.
//!
//! ## Design
//!
//! The loop keeps a single deadline, `next_due`. Each poll of [`FrameLoop::due`]
//! reports how many frames have come due since the last poll and pushes the
//! deadline past `now`, keeping the original phase:
//!
//! ```text
//!   next_due        now
//!      │             │
//!  ────┼──────┼──────┼─┼────►  time
//!      └ 1 ───┴ 2 ───┴ 3       3 frames due, next_due moves to ┘
//! ```
//!
//! A host that stalls for a long time gets at most `max_catch_up` frames
//! back to back; the rest are counted as skipped. Waiting is a plain sleep,
//! since a frame only polls a queue and a millisecond of jitter is harmless.

use std::time::{Duration, Instant};

/// Default host frame rate (Hz).
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Highest accepted frame rate (Hz).
pub const MAX_FRAME_RATE: u32 = 10_000;

/// Default cap on frames run back to back after a stall.
pub const DEFAULT_MAX_CATCH_UP: u32 = 4;

/// Deadline-based frame scheduler.
#[derive(Debug)]
pub struct FrameLoop {
    period: Duration,
    next_due: Instant,
    max_catch_up: u32,
    stats: FrameStats,
}

/// Frame timing for one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames executed.
    pub frames: u64,
    /// Frames whose cost exceeded the period.
    pub late_frames: u64,
    /// Due frames dropped by the catch-up cap.
    pub skipped_frames: u64,
    /// Most expensive frame (µs).
    pub max_frame_us: u64,
    /// Sum of all frame costs (µs).
    pub total_frame_us: u64,
}

impl FrameStats {
    /// Mean frame cost (µs), 0 before the first frame.
    #[must_use]
    pub const fn avg_frame_us(&self) -> u64 {
        if self.frames == 0 {
            0
        } else {
            self.total_frame_us / self.frames
        }
    }
}

impl FrameLoop {
    /// Creates a loop running at `frame_rate` Hz, clamped to
    /// `1..=MAX_FRAME_RATE`. The first frame is due immediately.
    #[must_use]
    pub fn new(frame_rate: u32) -> Self {
        Self {
            period: Duration::from_secs(1) / frame_rate.clamp(1, MAX_FRAME_RATE),
            next_due: Instant::now(),
            max_catch_up: DEFAULT_MAX_CATCH_UP,
            stats: FrameStats::default(),
        }
    }

    /// Caps the frames returned by one [`due`](Self::due) call. 0 is treated
    /// as 1.
    #[must_use]
    pub fn with_max_catch_up(mut self, frames: u32) -> Self {
        self.max_catch_up = frames.max(1);
        self
    }

    /// Starts over: the next frame is due now and the statistics are cleared.
    pub fn restart(&mut self) {
        self.next_due = Instant::now();
        self.stats = FrameStats::default();
    }

    /// Number of frames to run now. Advances the deadline past the present.
    pub fn due(&mut self) -> u32 {
        let now = Instant::now();
        if now < self.next_due {
            return 0;
        }

        let behind = now.duration_since(self.next_due).as_nanos() / self.period.as_nanos();
        let owed = u32::try_from(behind.saturating_add(1)).unwrap_or(u32::MAX);
        let run = owed.min(self.max_catch_up);

        self.stats.skipped_frames += u64::from(owed - run);
        self.next_due += self.period * owed;
        run
    }

    /// Sleeps until the next frame is due. Returns at once if it already is.
    pub fn wait(&self) {
        let remaining = self.next_due.saturating_duration_since(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }

    /// Records the cost of one executed frame.
    pub fn record(&mut self, cost: Duration) {
        let cost_us = u64::try_from(cost.as_micros()).unwrap_or(u64::MAX);

        self.stats.frames += 1;
        self.stats.total_frame_us = self.stats.total_frame_us.saturating_add(cost_us);
        self.stats.max_frame_us = self.stats.max_frame_us.max(cost_us);
        if cost > self.period {
            self.stats.late_frames += 1;
        }
    }

    /// Target frame period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Statistics since the last restart.
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_RATE)
    }
}
