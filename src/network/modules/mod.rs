pub mod bandwidth;
pub mod lag;
pub mod registry;
pub mod stats;
pub mod traits;

// Re-export module structs for convenience
pub use bandwidth::BandwidthModule;
pub use lag::LagModule;
pub use traits::{ModuleContext, ModuleOptions, PacketModule};
