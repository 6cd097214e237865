use crate::error::Result;
use crate::network::modules::traits::ModuleOptions;
use crate::settings::bandwidth::BandwidthOptions;
use crate::settings::lag::LagOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name used inside the per-user config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Represents all network packet manipulation settings.
///
/// Each module is configured by an optional section; a missing section
/// leaves that module disabled.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Settings {
    /// Controls packet lag simulation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lag: Option<LagOptions>,

    /// Controls bandwidth limitations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<BandwidthOptions>,
}

impl Settings {
    /// Checks every present section against its accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if let Some(lag) = &self.lag {
            lag.validate()?;
        }
        if let Some(bandwidth) = &self.bandwidth {
            bandwidth.validate()?;
        }
        Ok(())
    }

    pub fn lag_enabled(&self) -> bool {
        self.lag.as_ref().is_some_and(|o| o.is_enabled())
    }

    pub fn bandwidth_enabled(&self) -> bool {
        self.bandwidth.as_ref().is_some_and(|o| o.is_enabled())
    }

    /// Default location: `<config dir>/laggard/config.toml`, if the platform has one.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(env!("CARGO_PKG_NAME")).join(CONFIG_FILE_NAME))
    }

    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Saves current configuration to a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path where the configuration will be saved
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        write_creating_parent(path.as_ref(), &content)
    }

    /// Creates a configuration file listing every option at its default
    /// value, commented out for user guidance.
    pub fn create_default_config_file<P: AsRef<Path>>(path: P) -> Result<()> {
        let template = Settings {
            lag: Some(LagOptions::default()),
            bandwidth: Some(BandwidthOptions::default()),
        };

        let serialized = toml::to_string_pretty(&template)?;

        let commented_out = serialized
            .lines()
            .map(|line| {
                if line.trim().is_empty() || line.starts_with('[') {
                    line.to_string()
                } else {
                    format!("# {}", line)
                }
            })
            .collect::<Vec<String>>()
            .join("\n");

        write_creating_parent(path.as_ref(), &commented_out)
    }
}

fn write_creating_parent(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LaggardError;
    use tempfile::tempdir;

    #[test]
    fn test_parse_partial_sections_fill_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            [lag]
            enabled = true
            lag_ms = 120
            jitter_ms = 15
            jitter_chance = 40

            [bandwidth]
            enabled = true
            limit = 64
            outbound = false
            "#,
        )
        .unwrap();

        let lag = settings.lag.as_ref().unwrap();
        assert_eq!(lag.lag_ms, 120);
        assert_eq!(lag.jitter_ms, 15);
        assert_eq!(lag.jitter_chance.percent(), 40);
        assert!(lag.inbound && lag.outbound);

        let bandwidth = settings.bandwidth.as_ref().unwrap();
        assert_eq!(bandwidth.limit, 64);
        assert_eq!(bandwidth.queue_capacity, 0);
        assert!(bandwidth.inbound);
        assert!(!bandwidth.outbound);

        assert!(settings.lag_enabled());
        assert!(settings.bandwidth_enabled());
    }

    #[test]
    fn test_missing_sections_are_disabled() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.lag_enabled());
        assert!(!settings.bandwidth_enabled());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Settings::from_toml_str("[lag]\nlag_ms = 5000\n").unwrap_err();
        assert!(matches!(err, LaggardError::InvalidSetting { name: "lag.lag_ms", .. }));

        let err = Settings::from_toml_str("[lag]\njitter_chance = 101\n").unwrap_err();
        assert!(matches!(err, LaggardError::ConfigDecode(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.toml");
        let settings = Settings {
            lag: Some(LagOptions {
                enabled: true,
                lag_ms: 80,
                ..Default::default()
            }),
            bandwidth: None,
        };

        settings.save_to_file(&path).unwrap();
        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_default_config_file_is_all_comments() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("default.toml");
        Settings::create_default_config_file(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[lag]"));
        assert!(content.contains("[bandwidth]"));
        assert!(content.contains("# lag_ms = 50"));

        // Everything but the headers is commented, so it parses to empty sections.
        let loaded = Settings::load_from_file(&path).unwrap();
        assert_eq!(loaded.lag, Some(LagOptions::default()));
        assert!(!loaded.lag_enabled());
    }
}
