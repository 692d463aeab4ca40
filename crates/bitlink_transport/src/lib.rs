//! # BITLINK Transport
//!
//! Fire-and-forget UDP between a host and one fixed remote peer, with all
//! socket I/O on background threads.
//!
//! ## Design
//!
//! - The host never blocks: [`DatagramTransport::send`] enqueues and
//!   [`DatagramTransport::receive`] drains whatever has arrived.
//! - No reliability, no ordering across datagrams, no retransmission.
//! - Payloads are opaque bytes. Pair with `bitlink_codec` to give them
//!   structure.
//!
//! ## Example
//!
//! ```rust,no_run
//! use bitlink_transport::{DatagramTransport, TransportConfig};
//! use std::time::Duration;
//!
//! let config = TransportConfig::resolve("127.0.0.1", 9000)?;
//! let transport = DatagramTransport::new(config);
//! transport.initialize(9001)?;
//! transport.wait_ready(Duration::from_secs(1))?;
//!
//! transport.send(b"Tik".to_vec());
//! for datagram in transport.receive() {
//!     println!("{} bytes", datagram.len());
//! }
//! transport.shutdown();
//! # Ok::<(), bitlink_transport::TransportError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
mod signal;
pub mod stats;
pub mod transport;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use stats::TransportStats;
pub use transport::{DatagramTransport, TransportState};
