//! Module registry: which modules exist and in which order they run.
//!
//! Adding a module means implementing [`PacketModule`], giving it an entry
//! in [`MODULES`] and a constructor arm in [`create_module`].

use crate::network::modules::traits::PacketModule;
use crate::network::modules::{BandwidthModule, LagModule};
use crate::settings::Settings;

/// Entry for a registered module in the registry.
#[derive(Debug)]
pub struct ModuleEntry {
    /// Unique identifier for this module
    pub name: &'static str,
    /// Human-readable display name
    pub display_name: &'static str,
    /// Order in which this module should be processed (lower = earlier)
    pub order: u32,
}

/// Information about all registered modules.
pub const MODULES: &[ModuleEntry] = &[
    ModuleEntry {
        name: "lag",
        display_name: "Lag",
        order: 20,
    },
    ModuleEntry {
        name: "bandwidth",
        display_name: "Bandwidth Limit",
        order: 70,
    },
];

/// Find a module by name.
pub fn find_module(name: &str) -> Option<&'static ModuleEntry> {
    MODULES.iter().find(|m| m.name == name)
}

/// Checks if a specific module is enabled in settings.
pub fn is_module_enabled(settings: &Settings, name: &str) -> bool {
    match name {
        "lag" => settings.lag_enabled(),
        "bandwidth" => settings.bandwidth_enabled(),
        _ => false,
    }
}

/// Returns a list of currently enabled module names, in processing order.
pub fn get_enabled_modules(settings: &Settings) -> Vec<&'static str> {
    let mut entries: Vec<&ModuleEntry> = MODULES
        .iter()
        .filter(|m| is_module_enabled(settings, m.name))
        .collect();
    entries.sort_by_key(|m| m.order);
    entries.into_iter().map(|m| m.name).collect()
}

/// Builds a fresh, stopped instance of the named module.
pub fn create_module(name: &str) -> Option<Box<dyn PacketModule>> {
    match name {
        "lag" => Some(Box::new(LagModule::new())),
        "bandwidth" => Some(Box::new(BandwidthModule::new())),
        _ => None,
    }
}

/// Instantiates every registered module, sorted by processing order.
pub fn create_all() -> Vec<Box<dyn PacketModule>> {
    let mut entries: Vec<&ModuleEntry> = MODULES.iter().collect();
    entries.sort_by_key(|m| m.order);
    entries
        .into_iter()
        .filter_map(|m| create_module(m.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsBuilder;

    #[test]
    fn test_every_entry_has_a_constructor() {
        for entry in MODULES {
            let module = create_module(entry.name).unwrap();
            assert_eq!(module.name(), entry.name);
            assert_eq!(module.display_name(), entry.display_name);
            assert!(!module.is_running());
        }
        assert!(create_module("tamper").is_none());
    }

    #[test]
    fn test_lag_runs_before_bandwidth() {
        let names: Vec<_> = create_all().iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["lag", "bandwidth"]);
        assert_eq!(names.len(), MODULES.len());
    }

    #[test]
    fn test_enabled_modules() {
        let settings = SettingsBuilder::new().bandwidth(10).build();
        assert_eq!(get_enabled_modules(&settings), vec!["bandwidth"]);
        assert_eq!(find_module("lag").map(|m| m.display_name), Some("Lag"));
        assert!(find_module("drop").is_none());
        assert!(!is_module_enabled(&settings, "lag"));
    }
}
