//! # Transport Configuration
//!
//! Construction parameters for a [`DatagramTransport`](crate::DatagramTransport).
//! Usually built in code; hosts that ship a config file load it once at
//! startup:
//!
//! ```toml
//! remote_addr = "127.0.0.1:9000"
//! local_port = 9001
//! recv_timeout_ms = 20
//! ```
//!
//! Every field except `remote_addr` has a default.

use crate::error::{TransportError, TransportResult};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

/// Largest payload an IPv4 UDP datagram can carry.
pub const MAX_UDP_PAYLOAD: usize = 65_507;

/// Default receive poll granularity (ms).
pub const DEFAULT_RECV_TIMEOUT_MS: u64 = 50;

/// Default wait slice for the send path before the port is known (ms).
pub const DEFAULT_PORT_WAIT_MS: u64 = 200;

/// Configuration for one transport session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Fixed endpoint every outbound datagram is sent to.
    pub remote_addr: SocketAddr,
    /// Local port used when `initialize` is given 0. 0 lets the OS pick one.
    #[serde(default)]
    pub local_port: u16,
    /// Local interface to bind.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    /// Set `SO_REUSEADDR` before binding.
    #[serde(default = "default_reuse_address")]
    pub reuse_address: bool,
    /// How often the receive path re-checks for shutdown (ms).
    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,
    /// How often the send path re-checks for a bound port (ms).
    #[serde(default = "default_port_wait_ms")]
    pub port_wait_ms: u64,
    /// Receive buffer size. Longer datagrams are truncated by the OS.
    #[serde(default = "default_max_datagram_size")]
    pub max_datagram_size: usize,
}

const fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

const fn default_reuse_address() -> bool {
    true
}

const fn default_recv_timeout_ms() -> u64 {
    DEFAULT_RECV_TIMEOUT_MS
}

const fn default_port_wait_ms() -> u64 {
    DEFAULT_PORT_WAIT_MS
}

const fn default_max_datagram_size() -> usize {
    MAX_UDP_PAYLOAD
}

impl TransportConfig {
    /// Creates a config sending to `remote_addr`, every other field default.
    #[must_use]
    pub const fn new(remote_addr: SocketAddr) -> Self {
        Self {
            remote_addr,
            local_port: 0,
            bind_address: default_bind_address(),
            reuse_address: default_reuse_address(),
            recv_timeout_ms: DEFAULT_RECV_TIMEOUT_MS,
            port_wait_ms: DEFAULT_PORT_WAIT_MS,
            max_datagram_size: MAX_UDP_PAYLOAD,
        }
    }

    /// Creates a config for a host name or address literal.
    ///
    /// The first resolved address wins.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Resolve`] if nothing resolves.
    pub fn resolve(host: &str, port: u16) -> TransportResult<Self> {
        let unresolved = || TransportError::Resolve {
            host: host.to_string(),
            port,
        };

        let addr = (host, port)
            .to_socket_addrs()
            .map_err(|_| unresolved())?
            .next()
            .ok_or_else(unresolved)?;

        Ok(Self::new(addr))
    }

    /// Sets the local port.
    #[must_use]
    pub const fn with_local_port(mut self, port: u16) -> Self {
        self.local_port = port;
        self
    }

    /// Sets the local interface.
    #[must_use]
    pub const fn with_bind_address(mut self, addr: IpAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enables or disables `SO_REUSEADDR`.
    #[must_use]
    pub const fn with_reuse_address(mut self, reuse: bool) -> Self {
        self.reuse_address = reuse;
        self
    }

    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if the text is malformed or lacks
    /// `remote_addr`.
    pub fn from_toml_str(text: &str) -> TransportResult<Self> {
        toml::from_str(text).map_err(|e| TransportError::Config(e.to_string()))
    }

    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if the file is unreadable or
    /// malformed.
    pub fn load(path: impl AsRef<Path>) -> TransportResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| TransportError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Serializes this config as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> TransportResult<String> {
        toml::to_string(self).map_err(|e| TransportError::Config(e.to_string()))
    }

    /// Local endpoint for a bind on `port`.
    #[must_use]
    pub const fn local_endpoint(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.bind_address, port)
    }

    /// Receive poll granularity. Never zero.
    #[must_use]
    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms.max(1))
    }

    /// Send path wait slice. Never zero.
    #[must_use]
    pub fn port_wait(&self) -> Duration {
        Duration::from_millis(self.port_wait_ms.max(1))
    }
}
