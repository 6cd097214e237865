use crate::error::{LaggardError, Result};
use crate::network::core::clock::{Clock, SystemClock};
use crate::network::core::packet_data::PacketData;
use crate::network::core::queue::{PacketArena, PacketQueue};
use crate::network::modules::registry;
use crate::network::modules::stats::PacketProcessingStatistics;
use crate::network::modules::traits::{ModuleContext, PacketModule};
use crate::settings::Settings;
use log::{debug, error, info};
use std::sync::{Arc, RwLock};

/// Owns every in-flight packet and runs the enabled modules over them.
///
/// Captured packets are appended to the shared chain; each [`tick`](Self::tick)
/// hands the chain to the running modules in registry order, and
/// [`take_outgoing`](Self::take_outgoing) empties whatever is left in it
/// towards the injection side. Packets parked inside a module stay in the
/// same arena until that module releases them or is stopped.
pub struct Pipeline<C: Clock = SystemClock> {
    arena: PacketArena,
    chain: PacketQueue,
    modules: Vec<Box<dyn PacketModule>>,
    clock: C,
    statistics: Arc<RwLock<PacketProcessingStatistics>>,
    received: u64,
    sent: u64,
}

impl Pipeline<SystemClock> {
    /// Every registered module, stopped, driven by the wall clock.
    pub fn new() -> Self {
        Self::with_modules(registry::create_all(), SystemClock::new())
    }
}

impl Default for Pipeline<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Pipeline<C> {
    /// Every registered module, stopped, driven by `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self::with_modules(registry::create_all(), clock)
    }

    /// Runs exactly `modules`, in the given order.
    pub fn with_modules(modules: Vec<Box<dyn PacketModule>>, clock: C) -> Self {
        let mut arena = PacketArena::new();
        let chain = PacketQueue::new(&mut arena);
        Self {
            arena,
            chain,
            modules,
            clock,
            statistics: Arc::new(RwLock::new(PacketProcessingStatistics::default())),
            received: 0,
            sent: 0,
        }
    }

    /// Shared handle to the statistics, refreshed on every tick.
    pub fn statistics(&self) -> Arc<RwLock<PacketProcessingStatistics>> {
        Arc::clone(&self.statistics)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Names of the modules currently running, in processing order.
    pub fn running_modules(&self) -> Vec<&'static str> {
        self.modules
            .iter()
            .filter(|m| m.is_running())
            .map(|m| m.name())
            .collect()
    }

    /// Packets waiting in the chain for the next tick or for `take_outgoing`.
    pub fn pending(&self) -> usize {
        self.chain.len()
    }

    /// Every packet the pipeline owns, including those held by modules.
    pub fn in_flight(&self) -> usize {
        self.arena.packet_count()
    }

    /// Applies new settings to every module.
    ///
    /// Modules that became disabled are stopped first and their held packets
    /// land in the chain. Modules that became enabled are then started; if
    /// one fails to start, the ones started by this call are stopped again
    /// and the error is returned.
    pub fn apply_settings(&mut self, settings: &Settings) -> Result<()> {
        settings.validate()?;

        let now = self.clock.now_ms();
        let mut stats = self
            .statistics
            .write()
            .map_err(|_| LaggardError::lock_poisoned("packet processing statistics"))?;

        for module in self.modules.iter_mut() {
            module.configure(settings);
        }

        {
            let mut ctx = ModuleContext {
                arena: &mut self.arena,
                chain: &mut self.chain,
                now,
                statistics: &mut stats,
            };
            for module in self
                .modules
                .iter_mut()
                .filter(|m| m.is_running() && !m.is_enabled())
            {
                module.stop(&mut ctx);
            }
        }

        let mut started: Vec<usize> = Vec::new();
        for index in 0..self.modules.len() {
            let module = &mut self.modules[index];
            if !module.is_enabled() || module.is_running() {
                continue;
            }

            if let Err(e) = module.start(&mut self.arena) {
                error!("Failed to start {}: {}", module.display_name(), e);
                let mut ctx = ModuleContext {
                    arena: &mut self.arena,
                    chain: &mut self.chain,
                    now,
                    statistics: &mut stats,
                };
                for &i in &started {
                    self.modules[i].stop(&mut ctx);
                }
                return Err(e);
            }

            stats.reset_module(module.name());
            started.push(index);
        }

        debug!("Running modules: {:?}", self.running_modules());
        Ok(())
    }

    /// Takes ownership of a captured packet, queueing it for the next tick.
    pub fn enqueue(&mut self, packet: PacketData) {
        let node = self.arena.insert(packet);
        self.chain.push_back(&mut self.arena, node);
        self.received += 1;
    }

    /// Runs every running module once over the chain.
    ///
    /// Returns whether any module reported activity, meaning the caller
    /// should tick again soon even without new input.
    pub fn tick(&mut self) -> Result<bool> {
        let now = self.clock.now_ms();
        let mut stats = self
            .statistics
            .write()
            .map_err(|_| LaggardError::lock_poisoned("packet processing statistics"))?;

        let mut ctx = ModuleContext {
            arena: &mut self.arena,
            chain: &mut self.chain,
            now,
            statistics: &mut stats,
        };
        let mut active = false;
        for module in self.modules.iter_mut().filter(|m| m.is_running()) {
            active |= module.process(&mut ctx);
        }

        stats.ticks += 1;
        if active {
            stats.active_ticks += 1;
        }
        stats.received_packets = self.received;
        stats.sent_packets = self.sent;

        Ok(active)
    }

    /// Removes every packet left in the chain, front first.
    pub fn take_outgoing(&mut self) -> Vec<PacketData> {
        let outgoing = self.chain.drain(&mut self.arena);
        self.sent += outgoing.len() as u64;
        outgoing
    }

    /// Stops every running module and returns all packets the pipeline still owns.
    pub fn shutdown(&mut self) -> Result<Vec<PacketData>> {
        let now = self.clock.now_ms();
        {
            let mut stats = self
                .statistics
                .write()
                .map_err(|_| LaggardError::lock_poisoned("packet processing statistics"))?;
            let mut ctx = ModuleContext {
                arena: &mut self.arena,
                chain: &mut self.chain,
                now,
                statistics: &mut stats,
            };
            for module in self.modules.iter_mut().filter(|m| m.is_running()) {
                module.stop(&mut ctx);
            }
        }

        let remaining = self.take_outgoing();
        info!("Pipeline shut down, {} packets released", remaining.len());

        let mut stats = self
            .statistics
            .write()
            .map_err(|_| LaggardError::lock_poisoned("packet processing statistics"))?;
        stats.received_packets = self.received;
        stats.sent_packets = self.sent;
        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::core::clock::ManualClock;
    use crate::network::core::packet_data::Direction;
    use crate::network::modules::{BandwidthModule, LagModule};
    use crate::settings::SettingsBuilder;
    use std::rc::Rc;

    fn pipeline(clock: &Rc<ManualClock>) -> Pipeline<Rc<ManualClock>> {
        let modules: Vec<Box<dyn PacketModule>> = vec![
            Box::new(LagModule::with_seed(7)),
            Box::new(BandwidthModule::new()),
        ];
        Pipeline::with_modules(modules, Rc::clone(clock))
    }

    fn tagged(tag: u8, direction: Direction) -> PacketData {
        PacketData::new(vec![tag; 64], direction)
    }

    /// Follows the bandwidth switch but can never allocate its state.
    #[derive(Default)]
    struct UnstartableModule {
        enabled: bool,
    }

    impl PacketModule for UnstartableModule {
        fn name(&self) -> &'static str {
            "unstartable"
        }

        fn configure(&mut self, settings: &Settings) {
            self.enabled = settings.bandwidth_enabled();
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn is_running(&self) -> bool {
            false
        }

        fn start(&mut self, _arena: &mut PacketArena) -> Result<()> {
            Err(LaggardError::allocation("unstartable state", "out of memory"))
        }

        fn process(&mut self, _ctx: &mut ModuleContext<'_>) -> bool {
            false
        }

        fn stop(&mut self, _ctx: &mut ModuleContext<'_>) {}
    }

    #[test]
    fn test_passthrough_without_modules() {
        let clock = Rc::new(ManualClock::new(0));
        let mut pipeline = pipeline(&clock);
        pipeline.apply_settings(&Settings::default()).unwrap();
        assert!(pipeline.running_modules().is_empty());

        pipeline.enqueue(tagged(1, Direction::Inbound));
        pipeline.enqueue(tagged(2, Direction::Outbound));
        assert!(!pipeline.tick().unwrap());

        let tags: Vec<u8> = pipeline
            .take_outgoing()
            .iter()
            .map(|p| p.payload[0])
            .collect();
        assert_eq!(tags, vec![1, 2]);
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[test]
    fn test_lag_holds_until_due() {
        let clock = Rc::new(ManualClock::new(1_000));
        let mut pipeline = pipeline(&clock);
        pipeline
            .apply_settings(&SettingsBuilder::new().lag(100).build())
            .unwrap();
        assert_eq!(pipeline.running_modules(), vec!["lag"]);

        pipeline.enqueue(tagged(1, Direction::Outbound));
        assert!(pipeline.tick().unwrap());
        assert!(pipeline.take_outgoing().is_empty());
        assert_eq!(pipeline.in_flight(), 1);

        clock.set(1_099);
        pipeline.tick().unwrap();
        assert!(pipeline.take_outgoing().is_empty());

        clock.set(1_100);
        pipeline.tick().unwrap();
        assert_eq!(pipeline.take_outgoing().len(), 1);

        let stats = pipeline.statistics();
        let stats = stats.read().unwrap();
        assert_eq!(stats.received_packets, 1);
        assert_eq!(stats.lag_stats.released_on_time(), 1);
    }

    #[test]
    fn test_disable_releases_held_packets() {
        let clock = Rc::new(ManualClock::new(0));
        let mut pipeline = pipeline(&clock);
        pipeline
            .apply_settings(&SettingsBuilder::new().lag(500).build())
            .unwrap();

        for tag in 0..5 {
            pipeline.enqueue(tagged(tag, Direction::Inbound));
        }
        pipeline.tick().unwrap();
        assert_eq!(pipeline.pending(), 0);

        pipeline.apply_settings(&Settings::default()).unwrap();
        assert!(pipeline.running_modules().is_empty());

        let tags: Vec<u8> = pipeline
            .take_outgoing()
            .iter()
            .map(|p| p.payload[0])
            .collect();
        assert_eq!(tags, vec![0, 1, 2, 3, 4]);
        assert_eq!(pipeline.in_flight(), 0);
    }

    #[test]
    fn test_invalid_settings_leave_modules_untouched() {
        let clock = Rc::new(ManualClock::new(0));
        let mut pipeline = pipeline(&clock);
        let mut settings = SettingsBuilder::new().lag(10).build();
        if let Some(lag) = settings.lag.as_mut() {
            lag.lag_ms = 999_999;
        }

        assert!(pipeline.apply_settings(&settings).is_err());
        assert!(pipeline.running_modules().is_empty());
    }

    #[test]
    fn test_shutdown_returns_everything() {
        let clock = Rc::new(ManualClock::new(0));
        let mut pipeline = pipeline(&clock);
        let settings = SettingsBuilder::new().lag(200).bandwidth(1).build();
        pipeline.apply_settings(&settings).unwrap();
        assert_eq!(pipeline.running_modules(), vec!["lag", "bandwidth"]);

        for tag in 0..10 {
            pipeline.enqueue(tagged(tag, Direction::Outbound));
        }
        pipeline.tick().unwrap();
        pipeline.enqueue(tagged(10, Direction::Inbound));

        let remaining = pipeline.shutdown().unwrap();
        assert_eq!(remaining.len(), 11);
        assert_eq!(pipeline.in_flight(), 0);
        assert!(pipeline.running_modules().is_empty());

        let stats = pipeline.statistics();
        let stats = stats.read().unwrap();
        assert_eq!(stats.received_packets, 11);
        assert_eq!(stats.sent_packets, 11);
    }

    #[test]
    fn test_restart_resets_module_statistics() {
        let clock = Rc::new(ManualClock::new(0));
        let mut pipeline = pipeline(&clock);
        let lag = SettingsBuilder::new().lag(0).build();

        pipeline.apply_settings(&lag).unwrap();
        pipeline.enqueue(tagged(1, Direction::Inbound));
        pipeline.tick().unwrap();
        pipeline.take_outgoing();
        assert_eq!(
            pipeline.statistics().read().unwrap().lag_stats.released_on_time(),
            1
        );

        pipeline.apply_settings(&Settings::default()).unwrap();
        pipeline.apply_settings(&lag).unwrap();
        assert_eq!(
            pipeline.statistics().read().unwrap().lag_stats.released_on_time(),
            0
        );
    }

    #[test]
    fn test_start_failure_rolls_back_started_modules() {
        let clock = Rc::new(ManualClock::new(0));
        let modules: Vec<Box<dyn PacketModule>> = vec![
            Box::new(LagModule::with_seed(3)),
            Box::new(UnstartableModule::default()),
        ];
        let mut pipeline = Pipeline::with_modules(modules, Rc::clone(&clock));

        let settings = SettingsBuilder::new().lag(50).bandwidth(10).build();
        let err = pipeline.apply_settings(&settings).unwrap_err();
        assert!(matches!(err, LaggardError::Allocation { .. }));
        assert!(pipeline.running_modules().is_empty());

        // The lag module was rolled back, so packets pass straight through.
        pipeline.enqueue(tagged(1, Direction::Inbound));
        assert!(!pipeline.tick().unwrap());
        assert_eq!(pipeline.take_outgoing().len(), 1);
        assert_eq!(pipeline.in_flight(), 0);

        // Without the failing module enabled, lag starts normally.
        pipeline
            .apply_settings(&SettingsBuilder::new().lag(50).build())
            .unwrap();
        assert_eq!(pipeline.running_modules(), vec!["lag"]);
    }
}
