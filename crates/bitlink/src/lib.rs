//! # BITLINK
//!
//! Bit-packed messages over a threaded UDP transport, for hosts that run a
//! fixed-rate frame loop and must never block on the network.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────── host frame ────────────────────────────┐
//! │  BitWriter ──► bytes ──► transport.send()                          │
//! │  transport.receive() ──► bytes ──► BitReader                       │
//! └─────────────────────────────────────────────────────────────────────┘
//!           │ send queue                       ▲ receive queue
//!           ▼                                  │
//!      [send thread] ──► UDP ──► remote ──► [receive thread]
//! ```
//!
//! ## Crates
//!
//! - [`codec`]: `bitlink_codec`, the bit-level writer and reader
//! - [`transport`]: `bitlink_transport`, the background UDP socket
//! - this crate: frame pacing, the exclusive session slot, demo hosts
//!
//! ## Example
//!
//! ```rust,no_run
//! use bitlink::demo::TikTakResponder;
//! use bitlink::{DatagramTransport, ExclusiveSession, HostRunner, TransportConfig};
//!
//! let transport = DatagramTransport::new(TransportConfig::resolve("127.0.0.1", 55056)?);
//! transport.initialize(0)?;
//!
//! let mut runner = HostRunner::new(&transport, ExclusiveSession::new());
//! runner.run(&mut TikTakResponder::new())?;
//! # Ok::<(), bitlink::HostError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod demo;
pub mod error;
pub mod frame;
pub mod host;
pub mod session;

pub use bitlink_codec as codec;
pub use bitlink_transport as transport;

pub use bitlink_codec::{BitError, BitMessage, BitReader, BitResult, BitWriter};
pub use bitlink_transport::{
    DatagramTransport, TransportConfig, TransportError, TransportResult, TransportState,
    TransportStats,
};
pub use error::{HostError, HostResult};
pub use frame::{FrameLoop, FrameStats};
pub use host::{FrameHandler, Flow, HostRunner, RunOutcome};
pub use session::{ExclusiveSession, SessionGuard};
