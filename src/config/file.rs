//! Configuration file management for wavebar.
//!
//! This module handles loading and saving application configuration from TOML files.
//! Configuration is stored in the user's config directory. A missing file is not an
//! error; defaults apply until the user saves or edits a config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `wavebar list-devices`
    /// - device name from `wavebar list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Recording sample rate in Hz (actual may differ based on device)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Reference level in dBFS for a full-scale bar (typical: -20 to -6 dBFS)
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_reference_level_db() -> i8 {
    -20
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            reference_level_db: default_reference_level_db(),
        }
    }
}

/// Waveform display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizConfig {
    /// Bar width in terminal columns
    #[serde(default = "default_bar_width")]
    pub bar_width: f32,
    /// Gap between bars in terminal columns
    #[serde(default = "default_bar_spacing")]
    pub bar_spacing: f32,
    /// Raw metering samples averaged into one bar (must be >= 1)
    #[serde(default = "default_group_size")]
    pub group_size: usize,
    /// Metering and sweep cadence in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Draw each bar as a single stick instead of mirrored halves
    #[serde(default)]
    pub single_stick: bool,
}

fn default_bar_width() -> f32 {
    2.0
}

fn default_bar_spacing() -> f32 {
    1.0
}

fn default_group_size() -> usize {
    1
}

fn default_tick_interval_ms() -> u64 {
    crate::viz::DEFAULT_TICK_INTERVAL.as_millis() as u64
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            bar_spacing: default_bar_spacing(),
            group_size: default_group_size(),
            tick_interval_ms: default_tick_interval_ms(),
            single_stick: false,
        }
    }
}

impl VizConfig {
    /// Metering/sweep cadence as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WavebarConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub viz: VizConfig,
}

impl WavebarConfig {
    /// Loads configuration from the user's config directory, falling back
    /// to defaults when no config file exists.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the TOML is malformed
    /// - If a configured value violates an invariant (e.g. group_size of 0)
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;

        let config: Self = if config_path.exists() {
            let config_content = fs::read_to_string(&config_path)?;
            toml::from_str(&config_content)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = get_config_path()?;
        let config_content = toml::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Rejects configurations that would violate core invariants.
    fn validate(&self) -> anyhow::Result<()> {
        if self.viz.group_size == 0 {
            anyhow::bail!("viz.group_size must be at least 1");
        }
        if self.viz.bar_width <= 0.0 {
            anyhow::bail!("viz.bar_width must be positive");
        }
        if self.viz.bar_spacing < 0.0 {
            anyhow::bail!("viz.bar_spacing must not be negative");
        }
        if self.viz.tick_interval_ms == 0 {
            anyhow::bail!("viz.tick_interval_ms must be at least 1");
        }
        Ok(())
    }
}

/// Retrieves the path to the config file, creating the directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> Result<PathBuf, std::io::Error> {
    let config_dir = dirs::home_dir().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not find home directory",
        )
    })?;
    let config_path = config_dir
        .join(".config")
        .join("wavebar")
        .join("wavebar.toml");

    std::fs::create_dir_all(config_path.parent().unwrap())?;

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        WavebarConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_group_size_fails_validation() {
        let mut config = WavebarConfig::default();
        config.viz.group_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: WavebarConfig = toml::from_str(
            r#"
            [viz]
            group_size = 3
            "#,
        )
        .unwrap();
        assert_eq!(config.viz.group_size, 3);
        assert_eq!(config.viz.tick_interval_ms, 50);
        assert_eq!(config.audio.device, "default");
    }
}
