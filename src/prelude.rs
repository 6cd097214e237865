//! Prelude module for convenient imports.
//!
//! This module re-exports commonly used types and traits from the crate,
//! allowing users to import everything they need with a single use statement:
//!
//! ```rust
//! use laggard::prelude::*;
//! ```

// Error handling
pub use crate::error::{LaggardError, Result};

// Network core
pub use crate::network::core::{Clock, Direction, ManualClock, PacketData, SystemClock};

// Module traits
pub use crate::network::modules::traits::{ModuleContext, ModuleOptions, PacketModule};

// Pipeline
pub use crate::network::processing::{run_processing_loop, PacketSink, Pipeline};

// Statistics
pub use crate::network::modules::stats::PacketProcessingStatistics;

// Probability type
pub use crate::network::types::probability::Probability;

// Settings
pub use crate::settings::{Settings, SettingsBuilder};

// Individual module options (for advanced usage)
pub use crate::settings::{bandwidth::BandwidthOptions, lag::LagOptions};
