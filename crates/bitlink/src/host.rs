//! # Host Runner
//!
//! Drives a [`FrameHandler`] from a [`FrameLoop`], the way a game engine
//! drives a script's per-frame update.
//!
//! ## Frame Order
//!
//! ```text
//! 1. Transport not ready yet        → skip the frame
//! 2. First ready frame              → log the port, call on_ready()
//! 3. Every ready frame              → call on_frame()
//! 4. on_frame() returned Flow::Done → release the session, return
//! ```
//!
//! Every `run` restarts the frame loop, so time spent between building the
//! runner and running it is not paid back as a burst of frames.
//!
//! The handler polls [`DatagramTransport::receive`] itself; nothing here
//! blocks inside a frame.

use crate::error::HostResult;
use crate::frame::{FrameLoop, FrameStats};
use crate::session::ExclusiveSession;
use bitlink_transport::{DatagramTransport, TransportState};
use std::time::{Duration, Instant};
use tracing::info;

/// What the runner should do after a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep running frames.
    Continue,
    /// The handler is finished.
    Done,
}

/// Per-frame behaviour of a host.
pub trait FrameHandler {
    /// Name used for the exclusive session slot and in logs.
    fn name(&self) -> &'static str;

    /// Called once, on the first frame after the transport is ready.
    ///
    /// # Errors
    ///
    /// Any error stops the run.
    fn on_ready(&mut self, transport: &DatagramTransport) -> HostResult<()> {
        let _ = transport;
        Ok(())
    }

    /// Called on every frame while the transport is ready.
    ///
    /// # Errors
    ///
    /// Any error stops the run.
    fn on_frame(&mut self, transport: &DatagramTransport) -> HostResult<Flow>;
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunOutcome {
    /// The handler returned [`Flow::Done`].
    pub completed: bool,
    /// Frames executed in this run, ready or not.
    pub frames: u64,
    /// Frame timing.
    pub stats: FrameStats,
}

/// Runs one handler against one transport.
pub struct HostRunner<'a> {
    transport: &'a DatagramTransport,
    session: ExclusiveSession,
    frame_loop: FrameLoop,
    time_limit: Option<Duration>,
}

impl<'a> HostRunner<'a> {
    /// Creates a runner at the default frame rate with no time limit.
    #[must_use]
    pub fn new(transport: &'a DatagramTransport, session: ExclusiveSession) -> Self {
        Self {
            transport,
            session,
            frame_loop: FrameLoop::default(),
            time_limit: None,
        }
    }

    /// Sets the frame rate (Hz).
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_loop = FrameLoop::new(frame_rate);
        self
    }

    /// Stops the run after `limit` even if the handler is not done.
    #[must_use]
    pub const fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    /// Runs `handler` until it is done, the time limit passes, or the
    /// transport stops.
    ///
    /// # Errors
    ///
    /// - [`HostError::SessionBusy`](crate::HostError::SessionBusy) if another
    ///   handler holds the session.
    /// - [`HostError::Transport`](crate::HostError::Transport) if the
    ///   transport failed to bind.
    /// - Anything the handler returns.
    pub fn run<H: FrameHandler>(&mut self, handler: &mut H) -> HostResult<RunOutcome> {
        let _guard = self.session.try_acquire(handler.name())?;
        self.frame_loop.restart();
        let started = Instant::now();
        let mut announced = false;

        loop {
            if self.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                return Ok(self.outcome(false));
            }
            if matches!(
                self.transport.state(),
                TransportState::Uninitialized | TransportState::ShuttingDown | TransportState::Closed
            ) {
                return Ok(self.outcome(false));
            }

            self.frame_loop.wait();
            for _ in 0..self.frame_loop.due() {
                let start = Instant::now();
                let flow = self.frame(handler, &mut announced);
                self.frame_loop.record(start.elapsed());

                if flow? == Flow::Done {
                    return Ok(self.outcome(true));
                }
            }
        }
    }

    fn frame<H: FrameHandler>(&self, handler: &mut H, announced: &mut bool) -> HostResult<Flow> {
        match self.transport.state() {
            TransportState::Ready => {}
            TransportState::Failed => {
                self.transport.wait_ready(Duration::ZERO)?;
                return Ok(Flow::Continue);
            }
            _ => return Ok(Flow::Continue),
        }

        if !*announced {
            info!(
                handler = handler.name(),
                port = self.transport.listen_port(),
                "host listening"
            );
            handler.on_ready(self.transport)?;
            *announced = true;
        }

        handler.on_frame(self.transport)
    }

    fn outcome(&self, completed: bool) -> RunOutcome {
        RunOutcome {
            completed,
            frames: self.frame_loop.stats().frames,
            stats: *self.frame_loop.stats(),
        }
    }
}
