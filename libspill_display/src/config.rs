use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::error::ConfigError;

/// Which backend turns a readout window into a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    #[default]
    Svg,
    Hdf5,
}

/// A readout plane: an inclusive channel range and the acquisition window around a trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaneConfig {
    pub name: String,
    pub first_channel: u32,
    pub last_channel: u32,
    pub pre_window_ns: u64,
    pub post_window_ns: u64,
}

impl PlaneConfig {
    pub fn new(name: &str, first_channel: u32, last_channel: u32) -> Self {
        Self {
            name: name.to_string(),
            first_channel,
            last_channel,
            pre_window_ns: 0,
            post_window_ns: DEFAULT_READOUT_TICKS * DEFAULT_TICK_NS,
        }
    }

    pub fn contains(&self, channel: u32) -> bool {
        (self.first_channel..=self.last_channel).contains(&channel)
    }
}

/// The collection planes of the four APAs
fn default_planes() -> Vec<PlaneConfig> {
    vec![
        PlaneConfig::new("APA1", 800, 1600),
        PlaneConfig::new("APA2", 7200, 7680),
        PlaneConfig::new("APA3", 4160, 4640),
        PlaneConfig::new("APA4", 9280, 9760),
    ]
}

/// Structure representing the application configuration. Contains pathing, clock and window information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub raw_data_path: PathBuf,
    pub trigger_type: u32,
    pub tick_ns: u64,
    pub spill_duration_ms: i64,
    /// Added to detector time (in ms) to land on the beam server UTC clock.
    /// Local time vs UTC shifts of the shift tools belong here as well.
    pub time_base_offset_ms: i64,
    /// Column names to inject when the beam export came without its header row
    pub spill_header: Option<Vec<String>>,
    pub planes: Vec<PlaneConfig>,
    pub renderer: RendererKind,
    pub n_threads: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_data_path: PathBuf::from("."),
            trigger_type: DEFAULT_TRIGGER_TYPE,
            tick_ns: DEFAULT_TICK_NS,
            spill_duration_ms: DEFAULT_SPILL_DURATION_MS,
            time_base_offset_ms: 0,
            spill_header: None,
            planes: default_planes(),
            renderer: RendererKind::default(),
            n_threads: 1,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;
        let config = serde_yaml::from_str::<Self>(&yaml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as YAML
    pub fn write_config_file(&self, config_path: &Path) -> Result<(), ConfigError> {
        std::fs::write(config_path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Reject configurations that would make every classification or window meaningless
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.spill_duration_ms <= 0 {
            return Err(ConfigError::Invalid(String::from(
                "spill_duration_ms must be greater than zero",
            )));
        }
        if self.tick_ns == 0 {
            return Err(ConfigError::Invalid(String::from("tick_ns must be greater than zero")));
        }
        if !self.is_n_threads_valid() {
            return Err(ConfigError::Invalid(String::from("n_threads must be at least 1")));
        }
        for (idx, plane) in self.planes.iter().enumerate() {
            if plane.first_channel > plane.last_channel {
                return Err(ConfigError::Invalid(format!(
                    "plane {} has first_channel {} after last_channel {}",
                    plane.name, plane.first_channel, plane.last_channel
                )));
            }
            for other in self.planes.iter().skip(idx + 1) {
                if plane.contains(other.first_channel) || other.contains(plane.first_channel) {
                    return Err(ConfigError::Invalid(format!(
                        "planes {} and {} have overlapping channel ranges",
                        plane.name, other.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.planes.len(), 4);
        assert_eq!(config.planes[0].post_window_ns, 5_898_240);
    }

    #[test]
    fn test_yaml_round_trip_with_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "spill_duration_ms: 2000\ntime_base_offset_ms: -7200000\n").unwrap();
        let config = Config::read_config_file(&path).unwrap();
        assert_eq!(config.spill_duration_ms, 2000);
        assert_eq!(config.time_base_offset_ms, -7_200_000);
        assert_eq!(config.trigger_type, DEFAULT_TRIGGER_TYPE);
        assert_eq!(config.renderer, RendererKind::Svg);
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = Config {
            spill_duration_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.spill_duration_ms = 10;
        config.planes.push(PlaneConfig::new("overlap", 1500, 1700));
        assert!(config.validate().is_err());

        config.planes.pop();
        config.planes.push(PlaneConfig::new("around APA1", 700, 1700));
        assert!(config.validate().is_err());

        config.planes.pop();
        config.planes.push(PlaneConfig::new("after APA1", 1601, 1700));
        assert!(config.validate().is_ok());

        config.planes.pop();
        config.n_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::read_config_file(Path::new("/nope/config.yml"));
        assert!(matches!(result, Err(ConfigError::BadFilePath(_))));
    }
}
