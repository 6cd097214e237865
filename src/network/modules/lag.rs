use crate::error::Result;
use crate::network::core::clock::ts_diff;
use crate::network::core::queue::{PacketArena, PacketQueue};
use crate::network::modules::traits::{ModuleContext, ModuleOptions, PacketModule};
use crate::settings::lag::LagOptions;
use crate::settings::Settings;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Most packets the lag buffer holds before it starts force-releasing
pub const KEEP_AT_MOST: usize = 2000;
/// Packets force-released from the buffer's tail end when it is full
pub const FLUSH_WHEN_FULL: usize = 800;

/// Simulates network latency by holding packets until a release time.
///
/// Each matching packet is stamped with `now + lag_ms`, optionally moved by
/// a random offset in `[-jitter_ms, +jitter_ms]`, and kept in a single
/// holding queue shared by both directions. Packets whose release time has
/// come are put at the front of the outgoing chain.
///
/// Jitter can make a later packet due before an earlier one, so release
/// order is not FIFO.
#[derive(Debug)]
pub struct LagModule {
    options: LagOptions,
    held: Option<PacketQueue>,
    rng: StdRng,
}

impl Default for LagModule {
    fn default() -> Self {
        Self::new()
    }
}

impl LagModule {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Uses a seeded generator so jitter is reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            options: LagOptions::default(),
            held: None,
            rng,
        }
    }

    pub fn with_options(mut self, options: LagOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &LagOptions {
        &self.options
    }

    /// Packets currently held in the lag buffer.
    pub fn held(&self) -> usize {
        self.held.as_ref().map_or(0, PacketQueue::len)
    }
}

impl PacketModule for LagModule {
    fn name(&self) -> &'static str {
        "lag"
    }

    fn configure(&mut self, settings: &Settings) {
        self.options = settings.lag.clone().unwrap_or_default();
    }

    fn is_enabled(&self) -> bool {
        self.options.is_enabled()
    }

    fn is_running(&self) -> bool {
        self.held.is_some()
    }

    fn start(&mut self, arena: &mut PacketArena) -> Result<()> {
        debug_assert_eq!(self.held(), 0, "lag restarted while holding packets");
        if self.held.is_none() {
            self.held = Some(PacketQueue::new(arena));
        }

        info!(
            "lag enabled: {}ms ±{}ms ({}%)",
            self.options.lag_ms, self.options.jitter_ms, self.options.jitter_chance
        );
        Ok(())
    }

    fn process(&mut self, ctx: &mut ModuleContext<'_>) -> bool {
        let Some(held) = &mut self.held else {
            return false;
        };
        let options = &self.options;
        let stats = &mut ctx.statistics.lag_stats;
        let now = ctx.now;

        // Pick up new packets, newest first, and stamp their release time.
        let head = ctx.chain.head();
        let mut cursor = ctx.arena.prev(ctx.chain.tail());
        while held.len() < KEEP_AT_MOST && cursor != head {
            let prev = ctx.arena.prev(cursor);

            if ctx
                .arena
                .packet(cursor)
                .direction
                .matches(options.inbound, options.outbound)
            {
                let node = ctx.chain.pop(ctx.arena, cursor);
                let id = held.push_front(ctx.arena, node);

                let mut release_at = now.wrapping_add(options.lag_ms);
                if options.has_jitter() && options.jitter_chance.roll(&mut self.rng) {
                    let jitter = i64::from(options.jitter_ms);
                    let offset = self.rng.random_range(-jitter..=jitter);
                    // Truncating keeps the offset modulo 2^32, like the timestamps.
                    release_at = release_at.wrapping_add(offset as u32);
                    stats.record_jittered();
                }
                ctx.arena.packet_mut(id).release_at = release_at;
            }

            cursor = prev;
        }
        stats.lagged_package_count(held.len());

        // Send everything that is due, scanning from the oldest end.
        let mut released = 0;
        let mut cursor = ctx.arena.prev(held.tail());
        while cursor != held.head() {
            let prev = ctx.arena.prev(cursor);

            if ts_diff(now, ctx.arena.packet(cursor).release_at) >= 0 {
                let node = held.pop(ctx.arena, cursor);
                ctx.chain.push_front(ctx.arena, node);
                released += 1;
            }

            cursor = prev;
        }
        if released > 0 {
            debug!("Send {} lagged packets, {} still held", released, held.len());
            stats.record_released(released);
        }

        // Buffer still full: push a batch out of the tail end regardless of due time.
        if held.len() >= KEEP_AT_MOST {
            let mut flushed = 0;
            while flushed < FLUSH_WHEN_FULL {
                let Some(node) = held.pop_back(ctx.arena) else {
                    break;
                };
                ctx.chain.push_front(ctx.arena, node);
                flushed += 1;
            }
            warn!("lag buffer full, force released {} packets", flushed);
            stats.record_overflow(flushed);
        }

        stats.lagged_package_count(held.len());
        !held.is_empty()
    }

    fn stop(&mut self, ctx: &mut ModuleContext<'_>) {
        let Some(mut held) = self.held.take() else {
            return;
        };

        info!("Closing down lag, flushing {} packets", held.len());

        // Append after the current end of the chain, keeping buffer order.
        let old_last = ctx.arena.prev(ctx.chain.tail());
        while let Some(node) = held.pop_back(ctx.arena) {
            ctx.chain.insert_after(ctx.arena, node, old_last);
        }

        let leftover = held.dispose(ctx.arena);
        debug_assert!(leftover.is_empty(), "lag buffer not empty after flush");
        ctx.statistics.lag_stats.lagged_package_count(0);
    }
}
