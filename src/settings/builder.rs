//! Packet manipulation settings.
//!
//! This module provides a fluent builder API for constructing
//! `Settings` in a type-safe and ergonomic way.
//!
//! # Example
//!
//! ```rust
//! use laggard::settings::builder::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new()
//!     .lag(100)  // 100ms lag
//!     .with_jitter(20, 50)  // ±20ms on half the packets
//!     .bandwidth(64)  // 64 KB/s
//!     .with_bandwidth_queue(200)
//!     .build();
//!
//! assert!(settings.lag_enabled() && settings.bandwidth_enabled());
//! ```

use crate::network::types::probability::Probability;
use crate::settings::bandwidth::BandwidthOptions;
use crate::settings::lag::LagOptions;
use crate::settings::manipulation::Settings;

/// Builder for constructing `Settings`.
///
/// Provides a fluent API for configuring network condition simulations.
#[derive(Debug, Default)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    /// Creates a new builder with default (empty) settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables packet lag with the given lag time.
    ///
    /// # Arguments
    ///
    /// * `lag_ms` - Lag in milliseconds
    pub fn lag(mut self, lag_ms: u32) -> Self {
        self.settings.lag = Some(LagOptions {
            enabled: true,
            lag_ms,
            ..Default::default()
        });
        self
    }

    /// Sets jitter magnitude and the chance (percentage, clamped to 100) of applying it.
    pub fn with_jitter(mut self, jitter_ms: u32, chance: u32) -> Self {
        if let Some(ref mut lag) = self.settings.lag {
            lag.jitter_ms = jitter_ms;
            lag.jitter_chance =
                Probability::from_percent(chance.min(100)).unwrap_or(Probability::ALWAYS);
        }
        self
    }

    /// Restricts lag to the given directions.
    pub fn with_lag_directions(mut self, inbound: bool, outbound: bool) -> Self {
        if let Some(ref mut lag) = self.settings.lag {
            lag.inbound = inbound;
            lag.outbound = outbound;
        }
        self
    }

    /// Enables bandwidth limiting.
    ///
    /// # Arguments
    ///
    /// * `limit` - Maximum bandwidth in KB/s
    pub fn bandwidth(mut self, limit: u32) -> Self {
        self.settings.bandwidth = Some(BandwidthOptions {
            enabled: true,
            limit,
            ..Default::default()
        });
        self
    }

    /// Sets how many rejected packets each direction may hold for retry.
    pub fn with_bandwidth_queue(mut self, queue_capacity: usize) -> Self {
        if let Some(ref mut bandwidth) = self.settings.bandwidth {
            bandwidth.queue_capacity = queue_capacity;
        }
        self
    }

    /// Restricts bandwidth limiting to the given directions.
    pub fn with_bandwidth_directions(mut self, inbound: bool, outbound: bool) -> Self {
        if let Some(ref mut bandwidth) = self.settings.bandwidth {
            bandwidth.inbound = inbound;
            bandwidth.outbound = outbound;
        }
        self
    }

    /// Builds the final `Settings`.
    pub fn build(self) -> Settings {
        self.settings
    }
}
