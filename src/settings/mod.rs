//! Settings module for network condition simulation parameters.
//!
//! This module contains configuration structures for the impairment
//! modules, the TOML file format they are stored in, and a fluent builder.
//!
//! # Example
//!
//! ```rust
//! use laggard::settings::builder::SettingsBuilder;
//!
//! let settings = SettingsBuilder::new()
//!     .lag(100)
//!     .bandwidth(256)
//!     .build();
//! ```

pub mod bandwidth;
pub mod builder;
pub mod lag;
pub mod manipulation;

// Re-export commonly used types
pub use builder::SettingsBuilder;
pub use manipulation::Settings;
