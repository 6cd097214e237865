//! Core network functionality.
//!
//! This module contains the packet representation, the arena-backed packet
//! lists every module splices through, and the timestamp source.

pub mod clock;
pub mod packet_data;
pub mod queue;

// Re-export commonly used types
pub use clock::{ts_diff, Clock, ManualClock, SystemClock};
pub use packet_data::{Direction, PacketData};
pub use queue::{DetachedNode, NodeId, PacketArena, PacketQueue};
