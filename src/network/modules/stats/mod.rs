use crate::network::modules::stats::bandwidth_stats::BandwidthStats;
use crate::network::modules::stats::lag_stats::LagStats;
use serde::Serialize;

pub mod bandwidth_stats;
pub mod lag_stats;
pub mod rate_stats;

/// Statistics collection for all packet processing modules
///
/// Maintains counters and metrics for the network conditions being
/// simulated, plus pipeline-wide packet totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PacketProcessingStatistics {
    /// Statistics for packet lag
    pub lag_stats: LagStats,
    /// Statistics for bandwidth throttling
    pub bandwidth_stats: BandwidthStats,
    /// Packets handed to the pipeline by the capture side
    pub received_packets: u64,
    /// Packets handed back to the injection side
    pub sent_packets: u64,
    /// Ticks where at least one module reported activity
    pub active_ticks: u64,
    /// All ticks run
    pub ticks: u64,
}

impl PacketProcessingStatistics {
    /// Clears the counters owned by the named module.
    pub fn reset_module(&mut self, name: &str) {
        match name {
            "lag" => self.lag_stats.reset(),
            "bandwidth" => self.bandwidth_stats.reset(),
            _ => {}
        }
    }
}
