//! # Datagram Transport
//!
//! One UDP socket talking to one fixed remote endpoint, with socket I/O
//! moved off the host's thread.
//!
//! ## Architecture
//!
//! ```text
//!   host ── send() ──> [send queue] ──> send path ──> socket ──> remote
//!                           │ wake
//!   host <─ receive() ── [receive queue] <── receive path <── socket
//! ```
//!
//! - The receive path binds the socket, publishes the port, then loops on
//!   `recv_from` with a short read timeout so it notices shutdown.
//! - The send path parks until the port is known, then drains the whole
//!   send queue every time it is woken.
//! - Every session carries an epoch. A completion observed after the epoch
//!   moved on belongs to a dead session and is discarded.
//!
//! ## Lifecycle
//!
//! ```text
//!   Uninitialized ─► Initializing ─► Ready ─► ShuttingDown ─► Closed
//!                        │   ▲                                 │
//!                        ▼   └──────── initialize() ◄──────────┘
//!                      Failed (bind error)
//! ```

use crate::config::TransportConfig;
use crate::error::{TransportError, TransportResult};
use crate::signal::WakeSignal;
use crate::stats::{AtomicStats, TransportStats};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::VecDeque;
use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Observable lifecycle state of a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransportState {
    /// Never initialized.
    Uninitialized,
    /// Background paths started, socket not bound yet.
    Initializing,
    /// Socket bound, port known, traffic flowing.
    Ready,
    /// Shutdown requested, background paths still exiting.
    ShuttingDown,
    /// Both background paths have exited.
    Closed,
    /// The session could not bind its socket.
    Failed,
}

/// Bind error kept so every [`DatagramTransport::wait_ready`] call can
/// report it.
struct BindFailure {
    addr: SocketAddr,
    kind: io::ErrorKind,
    message: String,
}

impl BindFailure {
    fn to_error(&self) -> TransportError {
        TransportError::Bind {
            addr: self.addr,
            source: io::Error::new(self.kind, self.message.clone()),
        }
    }
}

/// State shared between the host and both background paths.
struct Shared {
    /// Cleared by shutdown and by a failed bind.
    running: AtomicBool,
    /// Bumped on every initialize and shutdown.
    epoch: AtomicU64,
    /// Background paths of the current session still alive.
    live_paths: AtomicUsize,
    /// Lifecycle state, guarded for `wait_ready`.
    state: Mutex<TransportState>,
    /// Notified on every state change.
    state_changed: Condvar,
    /// Socket handle used for transmits.
    socket: Mutex<Option<Arc<UdpSocket>>>,
    /// Bound local endpoint.
    local_addr: Mutex<Option<SocketAddr>>,
    /// Bound local port, 0 until known.
    listen_port: AtomicU16,
    /// Outbound datagrams, FIFO.
    send_queue: Mutex<VecDeque<Vec<u8>>>,
    /// Inbound datagrams, FIFO.
    inbound_tx: Sender<Vec<u8>>,
    inbound_rx: Receiver<Vec<u8>>,
    /// Wakes the send path.
    wake: WakeSignal,
    /// Why the current session failed, if it did.
    failure: Mutex<Option<BindFailure>>,
    /// Lifetime counters.
    stats: AtomicStats,
}

impl Shared {
    fn new() -> Self {
        let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();
        Self {
            running: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            live_paths: AtomicUsize::new(0),
            state: Mutex::new(TransportState::Uninitialized),
            state_changed: Condvar::new(),
            socket: Mutex::new(None),
            local_addr: Mutex::new(None),
            listen_port: AtomicU16::new(0),
            send_queue: Mutex::new(VecDeque::new()),
            inbound_tx,
            inbound_rx,
            wake: WakeSignal::new(),
            failure: Mutex::new(None),
            stats: AtomicStats::default(),
        }
    }

    #[inline]
    fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[inline]
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }

    fn set_state(&self, state: TransportState) {
        *self.state.lock() = state;
        self.state_changed.notify_all();
    }

    /// Clears everything a previous session left behind and opens a new
    /// epoch. Both paths of the previous session must have exited.
    fn begin_session(&self) -> u64 {
        self.send_queue.lock().clear();
        while self.inbound_rx.try_recv().is_ok() {}
        *self.socket.lock() = None;
        *self.local_addr.lock() = None;
        *self.failure.lock() = None;
        self.listen_port.store(0, Ordering::Release);
        self.wake.reset();

        self.live_paths.store(2, Ordering::Release);
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.running.store(true, Ordering::Release);
        self.set_state(TransportState::Initializing);
        epoch
    }

    /// Stops the current session. Safe to call any number of times.
    fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.wake.raise();

        {
            let mut state = self.state.lock();
            if matches!(*state, TransportState::Initializing | TransportState::Ready) {
                *state = if self.live_paths.load(Ordering::Acquire) == 0 {
                    TransportState::Closed
                } else {
                    TransportState::ShuttingDown
                };
                self.state_changed.notify_all();
            }
        }

        // After the state change, so a racing publish cannot put it back.
        drop(self.socket.lock().take());
        was_running
    }

    /// Publishes a freshly bound socket. Returns false if the session was
    /// stopped in the meantime.
    fn publish(&self, epoch: u64, socket: &Arc<UdpSocket>, local: SocketAddr) -> bool {
        let mut state = self.state.lock();
        if !self.is_current(epoch) || *state != TransportState::Initializing {
            return false;
        }

        *self.socket.lock() = Some(Arc::clone(socket));
        *self.local_addr.lock() = Some(local);
        self.listen_port.store(local.port(), Ordering::Release);
        *state = TransportState::Ready;
        self.state_changed.notify_all();
        drop(state);

        self.wake.raise();
        true
    }

    /// Marks the session failed after a bind error.
    fn fail(&self, epoch: u64, failure: BindFailure) {
        let mut state = self.state.lock();
        if !self.is_current(epoch) {
            return;
        }

        *self.failure.lock() = Some(failure);
        self.running.store(false, Ordering::Release);
        *state = TransportState::Failed;
        self.state_changed.notify_all();
        drop(state);

        self.wake.raise();
    }

    /// Called by each background path on exit.
    fn path_exited(&self) {
        if self.live_paths.fetch_sub(1, Ordering::AcqRel) == 1 {
            let mut state = self.state.lock();
            if *state == TransportState::ShuttingDown {
                *state = TransportState::Closed;
                self.state_changed.notify_all();
            }
        }
    }

    /// Transmits everything queued, oldest first.
    fn drain_send_queue(&self, remote: SocketAddr) {
        let batch = std::mem::take(&mut *self.send_queue.lock());
        if batch.is_empty() {
            return;
        }

        debug!(count = batch.len(), "draining send queue");
        for payload in batch {
            let socket = self.socket.lock();
            let Some(socket) = socket.as_ref() else {
                debug!("socket closed mid-drain, dropping remaining datagrams");
                return;
            };

            match socket.send_to(&payload, remote) {
                Ok(n) => self.stats.record_sent(n),
                Err(e) => {
                    self.stats.record_send_error();
                    warn!(%remote, len = payload.len(), error = %e, "transmit failed, datagram dropped");
                }
            }
        }
    }
}

/// Decrements the live path count however a background path exits.
struct PathGuard(Arc<Shared>);

impl Drop for PathGuard {
    fn drop(&mut self) {
        self.0.path_exited();
    }
}

/// Threaded UDP transport with one fixed remote peer.
///
/// Every method takes `&self`; the transport can be shared across threads.
/// `send` and `receive` never block.
pub struct DatagramTransport {
    config: TransportConfig,
    shared: Arc<Shared>,
    /// Background paths of the current session. Locked for the whole of
    /// `initialize`.
    paths: Mutex<Vec<JoinHandle<()>>>,
}

impl DatagramTransport {
    /// Creates an idle transport. Nothing is bound until [`initialize`].
    ///
    /// [`initialize`]: Self::initialize
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared::new()),
            paths: Mutex::new(Vec::new()),
        }
    }

    /// Starts a session bound to `local_port`. A port of 0 falls back to
    /// [`TransportConfig::local_port`], and when that is 0 as well the OS
    /// picks an ephemeral port.
    ///
    /// Any previous session is shut down and both of its paths are joined
    /// before the queues and port are reset. Binding happens on the receive
    /// path; watch [`is_ready`] or call [`wait_ready`] to observe it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] if a background thread cannot be
    /// spawned.
    ///
    /// [`is_ready`]: Self::is_ready
    /// [`wait_ready`]: Self::wait_ready
    pub fn initialize(&self, local_port: u16) -> TransportResult<()> {
        let mut paths = self.paths.lock();
        if !paths.is_empty() {
            self.shared.stop();
            join_all(&mut paths);
        }

        let epoch = self.shared.begin_session();
        let port = if local_port == 0 {
            self.config.local_port
        } else {
            local_port
        };
        let bind_addr = self.config.local_endpoint(port);

        let spawned = self.spawn_receive_path(epoch, bind_addr).and_then(|receive| {
            paths.push(receive);
            self.spawn_send_path()
        });

        match spawned {
            Ok(send) => {
                paths.push(send);
                debug!(epoch, %bind_addr, "transport session started");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to spawn transport thread");
                self.shared.stop();
                join_all(&mut paths);
                self.shared.set_state(TransportState::Closed);
                Err(TransportError::Io(e))
            }
        }
    }

    fn spawn_receive_path(&self, epoch: u64, bind_addr: SocketAddr) -> io::Result<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let config = self.config.clone();
        thread::Builder::new()
            .name("bitlink-recv".into())
            .spawn(move || receive_path(shared, &config, epoch, bind_addr))
    }

    fn spawn_send_path(&self) -> io::Result<JoinHandle<()>> {
        let shared = Arc::clone(&self.shared);
        let remote = self.config.remote_addr;
        let port_wait = self.config.port_wait();
        let spawned = thread::Builder::new()
            .name("bitlink-send".into())
            .spawn(move || send_path(shared, remote, port_wait));

        if spawned.is_err() {
            // The receive path counted on a sibling that never started.
            self.shared.path_exited();
        }
        spawned
    }

    /// Queues `payload` for the remote endpoint and wakes the send path.
    pub fn send(&self, payload: impl Into<Vec<u8>>) {
        self.shared.send_queue.lock().push_back(payload.into());
        self.shared.wake.raise();
    }

    /// Takes every datagram received so far, oldest first.
    #[must_use]
    pub fn receive(&self) -> Vec<Vec<u8>> {
        self.shared.inbound_rx.try_iter().collect()
    }

    /// Returns true once the socket is bound and the session is live.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == TransportState::Ready
    }

    /// Bound local port, or 0 before the bind completes.
    #[must_use]
    pub fn listen_port(&self) -> u16 {
        self.shared.listen_port.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TransportState {
        *self.shared.state.lock()
    }

    /// Blocks until the session is ready and returns its port.
    ///
    /// For callers without a frame loop (tests, command-line tools).
    ///
    /// # Errors
    ///
    /// - [`TransportError::Bind`] if the session failed to bind.
    /// - [`TransportError::NotReady`] on timeout, or if no session is
    ///   starting.
    pub fn wait_ready(&self, timeout: Duration) -> TransportResult<u16> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();

        loop {
            match *state {
                TransportState::Ready => return Ok(self.listen_port()),
                TransportState::Failed => {
                    let failure = self.shared.failure.lock();
                    return Err(match failure.as_ref() {
                        Some(failure) => failure.to_error(),
                        None => TransportError::SessionFailed {
                            reason: "receive path stopped before binding".into(),
                        },
                    });
                }
                TransportState::Initializing => {
                    if self
                        .shared
                        .state_changed
                        .wait_until(&mut state, deadline)
                        .timed_out()
                        && *state == TransportState::Initializing
                    {
                        break;
                    }
                }
                TransportState::Uninitialized
                | TransportState::ShuttingDown
                | TransportState::Closed => break,
            }
        }

        Err(TransportError::NotReady {
            waited_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Stops the session: clears the running flag, wakes the send path and
    /// closes the socket. Does not wait for the paths to exit.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.shared.stop() {
            info!(remote = %self.config.remote_addr, "datagram transport shutting down");
        }
    }

    /// Bound local endpoint, if any.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.shared.local_addr.lock()
    }

    /// Fixed remote endpoint.
    #[must_use]
    pub const fn remote_addr(&self) -> SocketAddr {
        self.config.remote_addr
    }

    /// Datagrams queued but not yet handed to the OS.
    #[must_use]
    pub fn pending_sends(&self) -> usize {
        self.shared.send_queue.lock().len()
    }

    /// Snapshot of lifetime counters.
    #[must_use]
    pub fn stats(&self) -> TransportStats {
        self.shared.stats.snapshot()
    }

    /// Configuration this transport was built with.
    #[must_use]
    pub const fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Drop for DatagramTransport {
    fn drop(&mut self) {
        self.shutdown();
        join_all(self.paths.get_mut());
    }
}

impl std::fmt::Debug for DatagramTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramTransport")
            .field("remote_addr", &self.config.remote_addr)
            .field("listen_port", &self.listen_port())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn join_all(paths: &mut Vec<JoinHandle<()>>) {
    for handle in paths.drain(..) {
        if handle.join().is_err() {
            error!("transport path panicked");
        }
    }
}

/// Opens the session's UDP socket.
fn bind_socket(config: &TransportConfig, addr: SocketAddr) -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    if config.reuse_address {
        socket.set_reuse_address(true)?;
    }
    socket.bind(&addr.into())?;

    let socket: UdpSocket = socket.into();
    socket.set_read_timeout(Some(config.recv_timeout()))?;
    Ok(socket)
}

/// Receive path body: bind, publish, then receive until stopped.
fn receive_path(shared: Arc<Shared>, config: &TransportConfig, epoch: u64, bind_addr: SocketAddr) {
    let _guard = PathGuard(Arc::clone(&shared));

    let bound = bind_socket(config, bind_addr).and_then(|s| {
        let local = s.local_addr()?;
        Ok((Arc::new(s), local))
    });
    let (socket, local) = match bound {
        Ok(bound) => bound,
        Err(e) => {
            error!(%bind_addr, error = %e, "datagram transport bind failed");
            shared.fail(
                epoch,
                BindFailure {
                    addr: bind_addr,
                    kind: e.kind(),
                    message: e.to_string(),
                },
            );
            return;
        }
    };

    if !shared.publish(epoch, &socket, local) {
        debug!(%local, "session stopped before bind completed");
        return;
    }
    info!(%local, remote = %config.remote_addr, "datagram transport bound");

    let mut buffer = vec![0u8; config.max_datagram_size.max(1)];
    while shared.is_running() {
        match socket.recv_from(&mut buffer) {
            Ok((0, from)) => {
                debug!(%from, "ignoring empty datagram");
            }
            Ok((len, from)) => {
                if !shared.is_current(epoch) {
                    shared.stats.record_stale();
                    debug!(%from, len, "discarding stale receive completion");
                    continue;
                }
                shared.stats.record_received(len);
                // The channel lives as long as `shared`; a send cannot fail.
                let _ = shared.inbound_tx.send(buffer[..len].to_vec());
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {}
            Err(e) if !shared.is_running() => {
                debug!(error = %e, "receive aborted by shutdown");
            }
            Err(e) => {
                // ICMP port unreachable surfaces here on some platforms.
                shared.stats.record_recv_error();
                debug!(error = %e, "receive failed");
            }
        }
    }

    debug!(%local, "receive path exiting");
}

/// Send path body: wait for a port, then drain on every wake.
fn send_path(shared: Arc<Shared>, remote: SocketAddr, port_wait: Duration) {
    let _guard = PathGuard(Arc::clone(&shared));

    while shared.listen_port.load(Ordering::Acquire) == 0 {
        if !shared.is_running() {
            return;
        }
        shared.wake.wait_timeout(port_wait);
    }

    loop {
        shared.drain_send_queue(remote);
        if !shared.is_running() {
            break;
        }
        shared.wake.wait();
    }

    debug!("send path exiting");
}
