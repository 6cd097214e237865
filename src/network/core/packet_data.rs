use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Traffic direction of an intercepted packet, relative to this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Download: arriving from the network
    Inbound,
    /// Upload: leaving towards the network
    Outbound,
}

impl Direction {
    /// Returns true when this direction is selected by an inbound/outbound flag pair.
    pub fn matches(self, inbound: bool, outbound: bool) -> bool {
        match self {
            Direction::Inbound => inbound,
            Direction::Outbound => outbound,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("INBOUND"),
            Direction::Outbound => f.write_str("OUTBOUND"),
        }
    }
}

/// Represents a network packet with metadata for processing.
///
/// The capture layer produces these; the pipeline moves them between the
/// shared chain and module holding queues without ever copying the payload.
#[derive(Debug, Clone)]
pub struct PacketData {
    /// Raw packet bytes
    pub payload: Vec<u8>,

    /// Whether this packet is outbound (upload) or inbound (download)
    pub direction: Direction,

    /// Millisecond timestamp at which a delaying module may release this packet.
    /// Only meaningful while the packet is held by such a module.
    pub release_at: u32,

    /// Timestamp when the packet was captured
    pub arrival_time: Instant,
}

impl PacketData {
    /// Creates a `PacketData` instance, recording the current time as arrival time.
    pub fn new(payload: Vec<u8>, direction: Direction) -> Self {
        PacketData {
            payload,
            direction,
            release_at: 0,
            arrival_time: Instant::now(),
        }
    }

    /// Returns the size of the packet in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Returns the time elapsed since the packet was captured
    pub fn age(&self) -> std::time::Duration {
        self.arrival_time.elapsed()
    }

    pub fn is_outbound(&self) -> bool {
        self.direction == Direction::Outbound
    }
}
