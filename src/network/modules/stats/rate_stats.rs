use crate::error::{LaggardError, Result};
use crate::network::core::clock::ts_diff;

/// Returned by [`RateStats::calculate`] while there is not enough history.
pub const RATE_UNKNOWN: i32 = -1;

/// Sliding-window throughput accumulator.
///
/// Keeps one byte counter and one sample counter per time unit (slot) in a
/// circular buffer of `window_size` slots. Running totals over the live
/// slots make [`calculate`](Self::calculate) O(1); eviction of expired slots
/// is amortised over the updates and reads that advance the window.
///
/// Timestamps are wrapping `u32` values compared as signed differences.
#[derive(Debug, Clone)]
pub struct RateStats {
    initialized: bool,
    /// Circular slot matching `oldest_ts`
    oldest_index: usize,
    /// Lower bound of the live window
    oldest_ts: u32,
    accumulated_count: i64,
    sample_num: i64,
    window_size: usize,
    scale: f32,
    array_sum: Vec<u64>,
    array_sample: Vec<u32>,
}

impl RateStats {
    /// Creates a window of `window_size` time units.
    ///
    /// `scale` converts the per-unit average into the reported unit, e.g. a
    /// 1000 ms window with scale 1000 reports bytes per second.
    ///
    /// # Errors
    ///
    /// Returns [`LaggardError::Allocation`] if the window is empty or its
    /// slots cannot be reserved.
    pub fn new(window_size: usize, scale: f32) -> Result<Self> {
        if window_size == 0 || window_size > i32::MAX as usize {
            return Err(LaggardError::allocation(
                "rate window",
                format!("unsupported window size {}", window_size),
            ));
        }

        let mut array_sum = Vec::new();
        array_sum
            .try_reserve_exact(window_size)
            .map_err(|e| LaggardError::allocation("rate window sums", e))?;
        array_sum.resize(window_size, 0);

        let mut array_sample = Vec::new();
        array_sample
            .try_reserve_exact(window_size)
            .map_err(|e| LaggardError::allocation("rate window samples", e))?;
        array_sample.resize(window_size, 0);

        let mut rate = RateStats {
            initialized: false,
            oldest_index: 0,
            oldest_ts: 0,
            accumulated_count: 0,
            sample_num: 0,
            window_size,
            scale,
            array_sum,
            array_sample,
        };
        rate.reset();
        Ok(rate)
    }

    /// Zeroes every slot and counter and forgets the window anchor.
    pub fn reset(&mut self) {
        self.array_sum.fill(0);
        self.array_sample.fill(0);
        self.initialized = false;
        self.sample_num = 0;
        self.accumulated_count = 0;
        self.oldest_ts = 0;
        self.oldest_index = 0;
    }

    /// Moves the window's lower bound up to `now_ts - window_size + 1`,
    /// clearing every slot that falls out of it.
    pub fn evict(&mut self, now_ts: u32) {
        if !self.initialized {
            return;
        }

        let new_oldest_ts = now_ts.wrapping_sub(self.window_size as u32).wrapping_add(1);
        if ts_diff(new_oldest_ts, self.oldest_ts) < 0 {
            return;
        }

        while ts_diff(self.oldest_ts, new_oldest_ts) < 0 {
            // Nothing left to subtract; the remaining slots are already zero.
            if self.sample_num == 0 {
                break;
            }
            let index = self.oldest_index;
            self.sample_num -= i64::from(self.array_sample[index]);
            self.accumulated_count -= self.array_sum[index] as i64;
            self.array_sample[index] = 0;
            self.array_sum[index] = 0;
            self.oldest_index += 1;
            if self.oldest_index >= self.window_size {
                self.oldest_index = 0;
            }
            self.oldest_ts = self.oldest_ts.wrapping_add(1);
        }

        debug_assert!(self.sample_num >= 0);
        debug_assert!(self.accumulated_count >= 0);
        self.oldest_ts = new_oldest_ts;
    }

    /// Records `count` bytes observed at `now_ts`.
    ///
    /// The first update anchors the window. Samples older than the window's
    /// lower bound are ignored.
    pub fn update(&mut self, count: u32, now_ts: u32) {
        if !self.initialized {
            self.oldest_ts = now_ts;
            self.oldest_index = 0;
            self.accumulated_count = 0;
            self.sample_num = 0;
            self.initialized = true;
        }

        if ts_diff(now_ts, self.oldest_ts) < 0 {
            return;
        }

        self.evict(now_ts);

        let offset = ts_diff(now_ts, self.oldest_ts) as usize;
        let index = (self.oldest_index + offset) % self.window_size;

        self.sample_num += 1;
        self.accumulated_count += i64::from(count);
        self.array_sum[index] += u64::from(count);
        self.array_sample[index] += 1;
    }

    /// Scaled average rate over the window, rounded to the nearest integer.
    ///
    /// Returns [`RATE_UNKNOWN`] until a full window of time has elapsed since
    /// the first sample, or when the window holds no samples.
    pub fn calculate(&mut self, now_ts: u32) -> i32 {
        let active_size = ts_diff(now_ts, self.oldest_ts).wrapping_add(1);

        self.evict(now_ts);

        if !self.initialized
            || self.sample_num <= 0
            || active_size <= 1
            || (active_size as i64) < self.window_size as i64
        {
            return RATE_UNKNOWN;
        }

        let average = self.accumulated_count as f32 * self.scale / self.window_size as f32;
        debug_assert!(average >= 0.0, "negative rate {}", average);
        (average + 0.5) as i32
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bytes currently accounted inside the window.
    pub fn accumulated_count(&self) -> i64 {
        self.accumulated_count
    }

    /// Samples currently accounted inside the window.
    pub fn sample_num(&self) -> i64 {
        self.sample_num
    }

    pub fn oldest_ts(&self) -> u32 {
        self.oldest_ts
    }
}
