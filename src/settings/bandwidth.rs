use crate::error::{LaggardError, Result};
use crate::network::modules::traits::ModuleOptions;
use clap::Args;
use serde::{Deserialize, Serialize};

/// Largest accepted limit, in KB/s
pub const BANDWIDTH_MAX: u32 = 99_999;
/// Largest accepted holding-queue capacity, in packets
pub const QUEUE_MAX: usize = 99_999;

fn default_true() -> bool {
    true
}

/// Options for the Bandwidth module.
///
/// Packets that would push the trailing one-second rate of their direction
/// over `limit` are held back for the next tick, or dropped once
/// `queue_capacity` packets are already held.
#[derive(Args, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BandwidthOptions {
    /// Whether this module is enabled
    #[arg(long = "bandwidth", id = "bandwidth")]
    #[serde(default)]
    pub enabled: bool,

    /// Whether to apply to inbound (download) traffic
    #[arg(skip = true)]
    #[serde(default = "default_true")]
    pub inbound: bool,

    /// Whether to apply to outbound (upload) traffic
    #[arg(skip = true)]
    #[serde(default = "default_true")]
    pub outbound: bool,

    /// Maximum bandwidth limit in KB/s (0 disables throttling)
    #[arg(long = "bandwidth-limit", id = "bandwidth-limit", default_value_t = 0)]
    #[serde(default)]
    pub limit: u32,

    /// Packets held per direction before excess traffic is dropped
    #[arg(long = "bandwidth-queue", id = "bandwidth-queue", default_value_t = 0)]
    #[serde(default)]
    pub queue_capacity: usize,
}

impl Default for BandwidthOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            inbound: true,
            outbound: true,
            limit: 0,
            queue_capacity: 0,
        }
    }
}

impl ModuleOptions for BandwidthOptions {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl BandwidthOptions {
    /// The limit as a byte rate per second.
    pub fn ceiling_bytes(&self) -> i64 {
        i64::from(self.limit) * 1024
    }

    pub fn validate(&self) -> Result<()> {
        LaggardError::check_range("bandwidth.limit", i64::from(self.limit), 0, i64::from(BANDWIDTH_MAX))?;
        LaggardError::check_range(
            "bandwidth.queue_capacity",
            self.queue_capacity as i64,
            0,
            QUEUE_MAX as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BandwidthOptions::default();
        assert!(!options.enabled);
        assert!(options.inbound && options.outbound);
        assert_eq!(options.ceiling_bytes(), 0);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_ceiling_is_kib_per_second() {
        let options = BandwidthOptions {
            limit: 10,
            ..Default::default()
        };
        assert_eq!(options.ceiling_bytes(), 10_240);
    }

    #[test]
    fn test_out_of_range() {
        let options = BandwidthOptions {
            limit: BANDWIDTH_MAX + 1,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        let options = BandwidthOptions {
            queue_capacity: QUEUE_MAX + 1,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
