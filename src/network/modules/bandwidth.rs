use crate::error::Result;
use crate::network::core::packet_data::Direction;
use crate::network::core::queue::{PacketArena, PacketQueue};
use crate::network::modules::stats::rate_stats::RateStats;
use crate::network::modules::traits::{ModuleContext, ModuleOptions, PacketModule};
use crate::settings::bandwidth::BandwidthOptions;
use crate::settings::Settings;
use log::{debug, info};

/// Rate window length in milliseconds
pub const RATE_WINDOW_MS: usize = 1000;
/// Converts bytes per millisecond slot into bytes per second
pub const RATE_SCALE: f32 = 1000.0;

/// Per-direction throttle state: its own rate window and holding queue.
#[derive(Debug)]
struct DirectionalThrottle {
    rate: RateStats,
    held: PacketQueue,
}

impl DirectionalThrottle {
    fn new(arena: &mut PacketArena) -> Result<Self> {
        let rate = RateStats::new(RATE_WINDOW_MS, RATE_SCALE)?;
        Ok(Self {
            rate,
            held: PacketQueue::new(arena),
        })
    }

    /// Puts held packets back in front of the chain tail, in arrival order.
    fn flush(&mut self, ctx: &mut ModuleContext<'_>) -> usize {
        let tail = ctx.chain.tail();
        self.held.detach_before(ctx.arena, ctx.chain, tail)
    }
}

/// Limits the byte rate of each traffic direction.
///
/// Every tick the packets held back on the previous tick are re-offered,
/// then the chain is walked newest-first. A packet that would push its
/// direction's estimated one-second rate over the ceiling is taken out of
/// the chain and parked in that direction's holding queue, or destroyed
/// if the queue is full. Admitted packets are recorded in the rate window.
#[derive(Debug, Default)]
pub struct BandwidthModule {
    options: BandwidthOptions,
    inbound: Option<DirectionalThrottle>,
    outbound: Option<DirectionalThrottle>,
}

impl BandwidthModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: BandwidthOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &BandwidthOptions {
        &self.options
    }

    /// Packets currently held back for `direction`.
    pub fn held(&self, direction: Direction) -> usize {
        let throttle = match direction {
            Direction::Inbound => &self.inbound,
            Direction::Outbound => &self.outbound,
        };
        throttle.as_ref().map_or(0, |t| t.held.len())
    }
}

impl PacketModule for BandwidthModule {
    fn name(&self) -> &'static str {
        "bandwidth"
    }

    fn configure(&mut self, settings: &Settings) {
        self.options = settings.bandwidth.clone().unwrap_or_default();
    }

    fn is_enabled(&self) -> bool {
        self.options.is_enabled()
    }

    fn is_running(&self) -> bool {
        self.inbound.is_some() && self.outbound.is_some()
    }

    fn start(&mut self, arena: &mut PacketArena) -> Result<()> {
        if let (Some(inbound), Some(outbound)) = (&mut self.inbound, &mut self.outbound) {
            inbound.rate.reset();
            outbound.rate.reset();
            return Ok(());
        }

        let inbound = DirectionalThrottle::new(arena)?;
        let outbound = match DirectionalThrottle::new(arena) {
            Ok(outbound) => outbound,
            Err(e) => {
                // Nothing was ever linked into it; only the sentinels go back.
                let leftover = inbound.held.dispose(arena);
                debug_assert!(leftover.is_empty());
                return Err(e);
            }
        };
        self.inbound = Some(inbound);
        self.outbound = Some(outbound);

        info!("bandwidth enabled");
        Ok(())
    }

    fn process(&mut self, ctx: &mut ModuleContext<'_>) -> bool {
        let Self {
            options,
            inbound: Some(inbound),
            outbound: Some(outbound),
        } = self
        else {
            return false;
        };

        inbound.flush(ctx);
        outbound.flush(ctx);

        let ceiling = options.ceiling_bytes();
        if ceiling <= 0 {
            ctx.statistics.bandwidth_stats.set_buffered(0);
            return false;
        }

        let mut rejected = 0usize;
        let head = ctx.chain.head();
        let mut cursor = ctx.arena.prev(ctx.chain.tail());

        while cursor != head {
            let prev = ctx.arena.prev(cursor);

            let packet = ctx.arena.packet(cursor);
            let (direction, size) = (packet.direction, packet.size());
            let throttle = match direction {
                Direction::Inbound if options.inbound => Some(&mut *inbound),
                Direction::Outbound if options.outbound => Some(&mut *outbound),
                _ => None,
            };

            if let Some(throttle) = throttle {
                let stats = &mut ctx.statistics.bandwidth_stats;
                let rate = throttle.rate.calculate(ctx.now);
                stats.record_rate(direction, rate);

                if i64::from(rate) + size as i64 > ceiling {
                    rejected += 1;

                    let node = ctx.chain.pop(ctx.arena, cursor);
                    if throttle.held.len() >= options.queue_capacity {
                        debug!(
                            "dropped with bandwidth {}KB/s, direction {}",
                            options.limit, direction
                        );
                        ctx.arena.destroy(node);
                        stats.record_dropped();
                    } else {
                        debug!(
                            "enqueue with dropped {} bufs {} bandwidth {}KB/s, direction {}",
                            rejected,
                            throttle.held.len(),
                            options.limit,
                            direction
                        );
                        throttle.held.push_front(ctx.arena, node);
                        stats.record_queued();
                    }
                } else {
                    let bytes = u32::try_from(size).unwrap_or(u32::MAX);
                    throttle.rate.update(bytes, ctx.now);
                    stats.record_admitted(size);
                }
            }

            cursor = prev;
        }

        ctx.statistics
            .bandwidth_stats
            .set_buffered(inbound.held.len() + outbound.held.len());

        rejected > 0
    }

    fn stop(&mut self, ctx: &mut ModuleContext<'_>) {
        let mut flushed = 0;
        for mut throttle in [self.inbound.take(), self.outbound.take()].into_iter().flatten() {
            flushed += throttle.flush(ctx);
            // Just flushed, so this only frees the sentinels.
            let leftover = throttle.held.dispose(ctx.arena);
            debug_assert!(leftover.is_empty(), "bandwidth queue not empty after flush");
        }
        ctx.statistics.bandwidth_stats.set_buffered(0);

        info!("bandwidth disabled, released {} held packets", flushed);
    }
}
