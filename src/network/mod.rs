//! Network module for packet impairment.
//!
//! This module contains the packet lists, the impairment modules and the
//! pipeline that drives them between a capture and an injection side.

pub mod core;
pub mod modules;
pub mod processing;
pub mod types;
