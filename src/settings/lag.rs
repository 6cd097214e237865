use crate::error::{LaggardError, Result};
use crate::network::types::probability::Probability;
use crate::network::modules::traits::ModuleOptions;
use clap::Args;
use serde::{Deserialize, Serialize};

/// Largest accepted base delay, in milliseconds
pub const LAG_MAX: u32 = 3_000;
/// Base delay used when none is configured
pub const LAG_DEFAULT: u32 = 50;
/// Largest accepted jitter magnitude, in milliseconds
pub const JITTER_MAX: u32 = 99_999;

fn default_true() -> bool {
    true
}

fn default_lag_ms() -> u32 {
    LAG_DEFAULT
}

/// Options for the Lag module.
///
/// Every matching packet is held for `lag_ms`; with `jitter_ms > 0` the
/// release time of a packet is additionally moved by up to `±jitter_ms`
/// with probability `jitter_chance`.
#[derive(Args, Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LagOptions {
    /// Whether this module is enabled
    #[arg(long = "lag", id = "lag")]
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

    /// Lag time in milliseconds to introduce for each packet
    #[arg(long = "lag-ms", id = "lag-ms", default_value_t = LAG_DEFAULT)]
    #[serde(default = "default_lag_ms")]
    pub lag_ms: u32,

    /// Maximum jitter in milliseconds added to or removed from the lag
    #[arg(long = "lag-jitter", id = "lag-jitter", default_value_t = 0)]
    #[serde(default)]
    pub jitter_ms: u32,

    /// Chance in percent (0-100) that a lagged packet gets jitter
    #[arg(long = "lag-jitter-chance", id = "lag-jitter-chance", default_value_t = Probability::ALWAYS)]
    #[serde(default)]
    pub jitter_chance: Probability,
}

impl Default for LagOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            inbound: true,
            outbound: true,
            lag_ms: LAG_DEFAULT,
            jitter_ms: 0,
            jitter_chance: Probability::ALWAYS,
        }
    }
}

impl ModuleOptions for LagOptions {
    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl LagOptions {
    /// True when jitter can be applied to at least some packets.
    pub fn has_jitter(&self) -> bool {
        self.jitter_ms > 0 && !self.jitter_chance.is_never()
    }

    pub fn validate(&self) -> Result<()> {
        LaggardError::check_range("lag.lag_ms", i64::from(self.lag_ms), 0, i64::from(LAG_MAX))?;
        LaggardError::check_range("lag.jitter_ms", i64::from(self.jitter_ms), 0, i64::from(JITTER_MAX))
    }
}
