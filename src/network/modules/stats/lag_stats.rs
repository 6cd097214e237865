use serde::Serialize;

/// Statistics for tracking packet lag behavior.
///
/// This struct maintains statistics about packets currently being lagged
/// and about how they left the lag buffer.
#[derive(Debug, Clone, Serialize)]
pub struct LagStats {
    /// Number of packets currently being lagged
    lagged_package_count: usize,

    /// Maximum number of packets that have been lagged simultaneously
    max_lagged: usize,

    /// Packets released because their release time elapsed
    released_on_time: u64,

    /// Packets pushed out early because the buffer was full
    released_on_overflow: u64,

    /// Packets that had jitter applied to their release time
    jittered: u64,
}

impl Default for LagStats {
    /// Creates a new LagStats instance with default values.
    fn default() -> Self {
        Self::new()
    }
}

impl LagStats {
    /// Creates a new LagStats instance with zeroed counters.
    pub fn new() -> Self {
        LagStats {
            lagged_package_count: 0,
            max_lagged: 0,
            released_on_time: 0,
            released_on_overflow: 0,
            jittered: 0,
        }
    }

    /// Updates the count of currently lagged packets.
    ///
    /// # Arguments
    ///
    /// * `value` - The current number of packets being lagged
    ///
    /// # Example
    ///
    /// ```
    /// use laggard::network::modules::stats::lag_stats::LagStats;
    ///
    /// let mut stats = LagStats::new();
    /// stats.lagged_package_count(5);
    /// assert_eq!(stats.current_lagged(), 5);
    /// ```
    pub fn lagged_package_count(&mut self, value: usize) {
        self.lagged_package_count = value;

        // Update maximum count if current count is higher
        if value > self.max_lagged {
            self.max_lagged = value;
        }
    }

    pub fn record_released(&mut self, count: usize) {
        self.released_on_time += count as u64;
    }

    pub fn record_overflow(&mut self, count: usize) {
        self.released_on_overflow += count as u64;
    }

    pub fn record_jittered(&mut self) {
        self.jittered += 1;
    }

    /// Returns the current number of packets being lagged.
    pub fn current_lagged(&self) -> usize {
        self.lagged_package_count
    }

    /// Returns the maximum number of packets that have been lagged simultaneously.
    pub fn max_lagged(&self) -> usize {
        self.max_lagged
    }

    pub fn released_on_time(&self) -> u64 {
        self.released_on_time
    }

    pub fn released_on_overflow(&self) -> u64 {
        self.released_on_overflow
    }

    pub fn jittered(&self) -> u64 {
        self.jittered
    }

    /// Resets all statistics to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
