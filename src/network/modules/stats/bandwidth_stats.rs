use crate::network::core::packet_data::Direction;
use crate::network::modules::stats::rate_stats::RATE_UNKNOWN;
use serde::Serialize;

/// Statistics for bandwidth limiting operations
///
/// Tracks what the throttle did with every packet it looked at: admitted,
/// held back for a later tick, or dropped because the holding queue was
/// full. The last rate estimate per direction is kept for status output.
#[derive(Debug, Clone, Serialize)]
pub struct BandwidthStats {
    /// Packets that passed under the ceiling
    admitted_packets: u64,

    /// Bytes that passed under the ceiling
    admitted_bytes: u64,

    /// Rejections that were parked in a holding queue
    queued_packets: u64,

    /// Rejections destroyed because the holding queue was full
    dropped_packets: u64,

    /// Packets currently parked in both holding queues
    buffered_packets: usize,

    /// Last estimated inbound rate in bytes/s, -1 while unknown
    inbound_rate: i32,

    /// Last estimated outbound rate in bytes/s, -1 while unknown
    outbound_rate: i32,
}

impl Default for BandwidthStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BandwidthStats {
    pub fn new() -> Self {
        BandwidthStats {
            admitted_packets: 0,
            admitted_bytes: 0,
            queued_packets: 0,
            dropped_packets: 0,
            buffered_packets: 0,
            inbound_rate: RATE_UNKNOWN,
            outbound_rate: RATE_UNKNOWN,
        }
    }

    pub fn record_admitted(&mut self, bytes: usize) {
        self.admitted_packets += 1;
        self.admitted_bytes += bytes as u64;
    }

    pub fn record_queued(&mut self) {
        self.queued_packets += 1;
    }

    pub fn record_dropped(&mut self) {
        self.dropped_packets += 1;
    }

    pub fn set_buffered(&mut self, buffered: usize) {
        self.buffered_packets = buffered;
    }

    pub fn record_rate(&mut self, direction: Direction, rate: i32) {
        match direction {
            Direction::Inbound => self.inbound_rate = rate,
            Direction::Outbound => self.outbound_rate = rate,
        }
    }

    pub fn admitted_packets(&self) -> u64 {
        self.admitted_packets
    }

    pub fn admitted_bytes(&self) -> u64 {
        self.admitted_bytes
    }

    pub fn queued_packets(&self) -> u64 {
        self.queued_packets
    }

    pub fn dropped_packets(&self) -> u64 {
        self.dropped_packets
    }

    /// Returns the number of packets currently held in the holding queues
    pub fn buffered_packets(&self) -> usize {
        self.buffered_packets
    }

    /// Last rate estimate for `direction`, or `None` while the window is cold.
    pub fn rate(&self, direction: Direction) -> Option<i32> {
        let rate = match direction {
            Direction::Inbound => self.inbound_rate,
            Direction::Outbound => self.outbound_rate,
        };
        (rate != RATE_UNKNOWN).then_some(rate)
    }

    /// Resets all statistics to zero
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = BandwidthStats::new();
        stats.record_admitted(1500);
        stats.record_admitted(500);
        stats.record_queued();
        stats.record_dropped();
        stats.set_buffered(3);

        assert_eq!(stats.admitted_packets(), 2);
        assert_eq!(stats.admitted_bytes(), 2000);
        assert_eq!(stats.queued_packets(), 1);
        assert_eq!(stats.dropped_packets(), 1);
        assert_eq!(stats.buffered_packets(), 3);
    }

    #[test]
    fn test_rate_unknown_until_recorded() {
        let mut stats = BandwidthStats::new();
        assert_eq!(stats.rate(Direction::Inbound), None);

        stats.record_rate(Direction::Inbound, 2048);
        assert_eq!(stats.rate(Direction::Inbound), Some(2048));
        assert_eq!(stats.rate(Direction::Outbound), None);

        stats.reset();
        assert_eq!(stats.rate(Direction::Inbound), None);
        assert_eq!(stats.admitted_packets(), 0);
    }
}
