use serde::{Deserialize, Serialize};

use crate::FleetviewError;
use crate::simulation::SpeedMultiplier;

const CONFIG_FILE_NAME: &str = "config.json";

/// Cadence of the playback loop when no override is given, milliseconds.
pub const REFRESH_RATE_MS: u64 = 100;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub refresh_rate_ms: u64,
    pub default_speed: SpeedMultiplier,
    pub show_alerts: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: REFRESH_RATE_MS,
            default_speed: SpeedMultiplier::X1,
            show_alerts: true,
        }
    }
}

impl AppConfig {
    pub fn from_local_file() -> Option<Self> {
        let config_path = dirs::config_dir()?.join("fleetview").join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let file = std::fs::File::open(config_path).expect("Could not open config file");
            Some(serde_json::from_reader(file).expect("Could not parse config file"))
        } else {
            None
        }
    }

    pub fn save(&self) -> Result<(), FleetviewError> {
        let config_path = dirs::config_dir()
            .ok_or(FleetviewError::NoConfigDir)?
            .join("fleetview")
            .join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            std::fs::create_dir_all(config_path.parent().unwrap())
                .map_err(|e| FleetviewError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| FleetviewError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| FleetviewError::ConfigSerializeError { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());

        let config: AppConfig = serde_json::from_str(r#"{"default_speed":5}"#).unwrap();
        assert_eq!(config.default_speed, SpeedMultiplier::X5);
        assert_eq!(config.refresh_rate_ms, REFRESH_RATE_MS);
    }

    #[test]
    fn test_speed_persists_as_plain_number() {
        let config = AppConfig {
            default_speed: SpeedMultiplier::X10,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""default_speed":10"#));
        assert_eq!(serde_json::from_str::<AppConfig>(&json).unwrap(), config);
    }
}
