//! # Demo Hosts
//!
//! Small handlers exercising the codec and the transport together.
//!
//! | handler | role |
//! |---|---|
//! | [`TikTakResponder`] | answers every `Tik` with `Taak` |
//! | [`TikTakCaller`] | sends `Tik` on a cadence, counts `Taak` replies |
//! | [`StreamVerifier`] | sends one [`SampleStream`], checks the echo |
//! | [`EchoResponder`] | sends every datagram straight back |

use crate::error::{HostError, HostResult};
use crate::host::{FrameHandler, Flow};
use bitlink_codec::{BitMessage, BitReader, BitResult, BitWriter};
use bitlink_transport::DatagramTransport;
use tracing::{debug, info};

/// Greeting payload.
pub const TIK: &[u8] = b"Tik";

/// Reply payload.
pub const TAAK: &[u8] = b"Taak";

/// Default port both ends of a demo use.
pub const DEMO_PORT: u16 = 55_056;

// ============================================================================
// SAMPLE STREAM
// ============================================================================

/// A message touching every field type at once.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleStream {
    /// 1 bit.
    pub flag: bool,
    /// 8 bits.
    pub marker: u8,
    /// 64 bits.
    pub ratio: f64,
    /// 32 bits.
    pub weight: f32,
    /// 3 bits.
    pub small: u32,
    /// 4 bits.
    pub small_long: u64,
    /// Sign + 3 bits.
    pub offset: i32,
    /// Sign + 4 bits.
    pub offset_long: i64,
    /// Length-prefixed UTF-8.
    pub greeting: String,
}

impl SampleStream {
    /// Width of [`small`](Self::small).
    pub const SMALL_BITS: u32 = 3;
    /// Width of [`small_long`](Self::small_long).
    pub const SMALL_LONG_BITS: u32 = 4;
    /// Magnitude width of [`offset`](Self::offset).
    pub const OFFSET_BITS: u32 = 3;
    /// Magnitude width of [`offset_long`](Self::offset_long).
    pub const OFFSET_LONG_BITS: u32 = 4;

    /// First field that differs from `other`, if any. Floats compare by
    /// bit pattern.
    #[must_use]
    pub fn first_mismatch(&self, other: &Self) -> Option<&'static str> {
        if self.flag != other.flag {
            Some("flag")
        } else if self.marker != other.marker {
            Some("marker")
        } else if self.ratio.to_bits() != other.ratio.to_bits() {
            Some("ratio")
        } else if self.weight.to_bits() != other.weight.to_bits() {
            Some("weight")
        } else if self.small != other.small {
            Some("small")
        } else if self.small_long != other.small_long {
            Some("small_long")
        } else if self.offset != other.offset {
            Some("offset")
        } else if self.offset_long != other.offset_long {
            Some("offset_long")
        } else if self.greeting != other.greeting {
            Some("greeting")
        } else {
            None
        }
    }
}

impl Default for SampleStream {
    fn default() -> Self {
        Self {
            flag: true,
            marker: 0xFA,
            ratio: 1.2,
            weight: 81.12,
            small: 7,
            small_long: 8,
            offset: -7,
            offset_long: -8,
            greeting: "Hello World!".to_string(),
        }
    }
}

impl BitMessage for SampleStream {
    fn encode(&self, writer: &mut BitWriter) -> BitResult<()> {
        writer.write_bool(self.flag);
        writer.write_u8(self.marker);
        writer.write_f64(self.ratio);
        writer.write_f32(self.weight);
        writer.write_u32_bits(self.small, Self::SMALL_BITS);
        writer.write_u64_bits(self.small_long, Self::SMALL_LONG_BITS);
        writer.write_i32_bits(self.offset, Self::OFFSET_BITS);
        writer.write_i64_bits(self.offset_long, Self::OFFSET_LONG_BITS);
        writer.write_str(&self.greeting)
    }

    fn decode(reader: &mut BitReader<'_>) -> BitResult<Self> {
        Ok(Self {
            flag: reader.read_bool()?,
            marker: reader.read_u8()?,
            ratio: reader.read_f64()?,
            weight: reader.read_f32()?,
            small: reader.read_u32_bits(Self::SMALL_BITS)?,
            small_long: reader.read_u64_bits(Self::SMALL_LONG_BITS)?,
            offset: reader.read_i32_bits(Self::OFFSET_BITS)?,
            offset_long: reader.read_i64_bits(Self::OFFSET_LONG_BITS)?,
            greeting: reader.read_string()?,
        })
    }
}

// ============================================================================
// TIK / TAAK
// ============================================================================

/// Answers every `Tik` with `Taak`. Other payloads are ignored.
#[derive(Debug, Default)]
pub struct TikTakResponder {
    replies: u64,
    limit: Option<u64>,
}

impl TikTakResponder {
    /// Runs until stopped from outside.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes after `limit` replies.
    #[must_use]
    pub const fn with_limit(limit: u64) -> Self {
        Self {
            replies: 0,
            limit: Some(limit),
        }
    }

    /// Replies sent so far.
    #[must_use]
    pub const fn replies(&self) -> u64 {
        self.replies
    }
}

impl FrameHandler for TikTakResponder {
    fn name(&self) -> &'static str {
        "tiktak"
    }

    fn on_frame(&mut self, transport: &DatagramTransport) -> HostResult<Flow> {
        for datagram in transport.receive() {
            if datagram == TIK {
                transport.send(TAAK);
                self.replies += 1;
                info!(replies = self.replies, "Tik received, Taak sent");
            } else {
                debug!(len = datagram.len(), "ignoring datagram");
            }
        }

        Ok(match self.limit {
            Some(limit) if self.replies >= limit => Flow::Done,
            _ => Flow::Continue,
        })
    }
}

/// Sends `Tik` every `interval` frames until `target` replies arrive.
#[derive(Debug)]
pub struct TikTakCaller {
    interval: u64,
    target: u64,
    frames: u64,
    sent: u64,
    answered: u64,
}

impl TikTakCaller {
    /// Creates a caller. An interval of 0 is treated as 1.
    #[must_use]
    pub fn new(interval: u64, target: u64) -> Self {
        Self {
            interval: interval.max(1),
            target,
            frames: 0,
            sent: 0,
            answered: 0,
        }
    }

    /// `Tik`s sent.
    #[must_use]
    pub const fn sent(&self) -> u64 {
        self.sent
    }

    /// `Taak`s received.
    #[must_use]
    pub const fn answered(&self) -> u64 {
        self.answered
    }
}

impl FrameHandler for TikTakCaller {
    fn name(&self) -> &'static str {
        "tik"
    }

    fn on_frame(&mut self, transport: &DatagramTransport) -> HostResult<Flow> {
        self.answered += transport.receive().iter().filter(|d| d.as_slice() == TAAK).count() as u64;
        if self.answered >= self.target {
            info!(sent = self.sent, answered = self.answered, "all Taak replies received");
            return Ok(Flow::Done);
        }

        if self.frames % self.interval == 0 {
            transport.send(TIK);
            self.sent += 1;
        }
        self.frames += 1;
        Ok(Flow::Continue)
    }
}

// ============================================================================
// STREAM ECHO
// ============================================================================

/// Sends one message on the first ready frame and checks that the first
/// datagram coming back decodes to the same message.
#[derive(Debug, Default)]
pub struct StreamVerifier {
    message: SampleStream,
    echoed: Option<SampleStream>,
}

impl StreamVerifier {
    /// Verifies the default [`SampleStream`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Verifies `message`.
    #[must_use]
    pub const fn with_message(message: SampleStream) -> Self {
        Self {
            message,
            echoed: None,
        }
    }

    /// The verified echo, once received.
    #[must_use]
    pub const fn echoed(&self) -> Option<&SampleStream> {
        self.echoed.as_ref()
    }
}

impl FrameHandler for StreamVerifier {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn on_ready(&mut self, transport: &DatagramTransport) -> HostResult<()> {
        let bytes = self.message.to_bytes()?;
        info!(bytes = bytes.len(), "sample stream sent");
        transport.send(bytes);
        Ok(())
    }

    fn on_frame(&mut self, transport: &DatagramTransport) -> HostResult<Flow> {
        let Some(echo) = transport.receive().into_iter().next() else {
            return Ok(Flow::Continue);
        };

        let decoded = SampleStream::from_bytes(&echo)?;
        if let Some(field) = self.message.first_mismatch(&decoded) {
            return Err(HostError::EchoMismatch { field });
        }

        info!("sample stream echo verified");
        self.echoed = Some(decoded);
        Ok(Flow::Done)
    }
}

/// Sends every datagram straight back to the remote endpoint.
#[derive(Debug, Default)]
pub struct EchoResponder {
    echoed: u64,
    limit: Option<u64>,
}

impl EchoResponder {
    /// Runs until stopped from outside.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finishes after `limit` echoes.
    #[must_use]
    pub const fn with_limit(limit: u64) -> Self {
        Self {
            echoed: 0,
            limit: Some(limit),
        }
    }

    /// Datagrams echoed so far.
    #[must_use]
    pub const fn echoed(&self) -> u64 {
        self.echoed
    }
}

impl FrameHandler for EchoResponder {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn on_frame(&mut self, transport: &DatagramTransport) -> HostResult<Flow> {
        for datagram in transport.receive() {
            debug!(len = datagram.len(), "echoing datagram");
            transport.send(datagram);
            self.echoed += 1;
        }

        Ok(match self.limit {
            Some(limit) if self.echoed >= limit => Flow::Done,
            _ => Flow::Continue,
        })
    }
}
