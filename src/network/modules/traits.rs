//! Trait definitions for packet manipulation modules.
//!
//! This module provides a unified interface for all packet manipulation
//! modules, enabling consistent behavior and easier extensibility.

use crate::error::Result;
use crate::network::core::queue::{PacketArena, PacketQueue};
use crate::network::modules::registry;
use crate::network::modules::stats::PacketProcessingStatistics;
use crate::settings::Settings;

/// Context passed to packet modules during processing.
///
/// Lends the shared chain (and the arena its nodes live in) to one module
/// for the duration of a single call.
pub struct ModuleContext<'a> {
    /// Storage for every packet node, including the module's own holding queues
    pub arena: &'a mut PacketArena,
    /// The shared chain; new packets sit right before its tail, packets
    /// right after its head go out first
    pub chain: &'a mut PacketQueue,
    /// Millisecond timestamp for this tick
    pub now: u32,
    /// Statistics tracker for all modules
    pub statistics: &'a mut PacketProcessingStatistics,
}

/// Options sections that carry an enable switch.
pub trait ModuleOptions {
    fn is_enabled(&self) -> bool;
}

/// Trait for packet manipulation modules.
///
/// Lifecycle: `configure` may be called at any time; `start` moves a module
/// into the running state; `process` runs once per tick while running;
/// `stop` hands every packet the module still holds back to the chain and
/// returns it to the stopped state. A stopped module owns no packets.
///
/// # Example
///
/// ```rust,ignore
/// struct MyModule { running: bool }
///
/// impl PacketModule for MyModule {
///     fn name(&self) -> &'static str {
///         "my_module"
///     }
///
///     fn process(&mut self, ctx: &mut ModuleContext) -> bool {
///         // Splice packets out of / into ctx.chain
///         false
///     }
///     // ...
/// }
/// ```
pub trait PacketModule {
    /// Returns the unique name identifier for this module
    fn name(&self) -> &'static str;

    /// Returns the human-readable display name for this module,
    /// as listed in the registry
    fn display_name(&self) -> &'static str {
        registry::find_module(self.name()).map_or(self.name(), |m| m.display_name)
    }

    /// Picks this module's section out of `settings`.
    ///
    /// Takes effect from the next `process` call; does not start or stop the module.
    fn configure(&mut self, settings: &Settings);

    /// Whether the current configuration asks for this module to run.
    fn is_enabled(&self) -> bool;

    /// Whether `start` has run without a matching `stop`.
    fn is_running(&self) -> bool;

    /// Allocates the module's runtime state.
    ///
    /// # Errors
    ///
    /// Fails if the state cannot be allocated, in which case the module
    /// stays stopped.
    fn start(&mut self, arena: &mut PacketArena) -> Result<()>;

    /// Applies the impairment to the chain for one tick.
    ///
    /// Returns whether the module did something this tick that makes it
    /// worth ticking again soon (packets held back or rejected).
    fn process(&mut self, ctx: &mut ModuleContext<'_>) -> bool;

    /// Releases every held packet into the chain and tears down runtime state.
    fn stop(&mut self, ctx: &mut ModuleContext<'_>);
}
