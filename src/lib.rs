//! # Laggard - a packet impairment core
//!
//! Laggard simulates poor network conditions by holding, delaying and
//! dropping packets that a capture layer hands it, before they are passed
//! on to an injection layer.
//!
//! ## Features
//!
//! * Lag - Add latency to packets, with optional random jitter
//! * Bandwidth limiting - Cap the byte rate per direction, queueing or
//!   dropping what does not fit
//!
//! ## Architecture
//!
//! Every in-flight packet lives in a single arena. The pipeline keeps a
//! shared chain of freshly captured packets and, once per tick, lends it
//! to each running module in turn; modules splice packets out of the chain
//! into their own holding queues and back. Time is a wrapping millisecond
//! counter supplied by a [`Clock`](network::core::Clock).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use laggard::prelude::*;
//!
//! # fn main() -> laggard::Result<()> {
//! let settings = SettingsBuilder::new()
//!     .lag(100)                                   // 100ms lag
//!     .with_jitter(20, 100)                       // ±20ms on every packet
//!     .bandwidth(256)                             // 256 KB/s per direction
//!     .build();
//!
//! let mut pipeline = Pipeline::new();
//! pipeline.apply_settings(&settings)?;
//!
//! pipeline.enqueue(PacketData::new(vec![0; 1200], Direction::Outbound));
//! pipeline.tick()?;
//! for packet in pipeline.take_outgoing() {
//!     // hand to the injection layer
//!     let _ = packet;
//! }
//! # Ok(())
//! # }
//! ```

/// Centralized error handling
pub mod error;
/// Packet lists, impairment modules and the processing pipeline
pub mod network;
/// Prelude for convenient imports
pub mod prelude;
/// Configuration settings for packet impairment
pub mod settings;
/// Synthetic traffic source and counting sink
pub mod simulation;
/// Shared utility functions
pub mod utils;

// Re-export commonly used types
pub use error::{LaggardError, Result};
