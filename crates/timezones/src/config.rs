use std::path::{Path, PathBuf};

use crate::time::{DayPhase, TargetTime};
use crate::time_override::Strategy;

pub const DEFAULT_PERMISSION: &str = "timezones.admin";
pub const DATA_FILE_NAME: &str = "TimeZones";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeZonesConfig {
    /// Directory holding `TimeZones.json` and `lang/`
    pub data_dir: PathBuf,
    /// Permission required for every `timezone` sub-command
    pub permission: String,
    pub day_hour: f32,
    pub night_hour: f32,
    pub strategy: Strategy,
}

impl Default for TimeZonesConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            permission: DEFAULT_PERMISSION.to_string(),
            day_hour: 15.0,
            night_hour: 1.0,
            strategy: Strategy::Auto,
        }
    }
}

impl TimeZonesConfig {
    /// Defaults overridden by `TIMEZONES_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let hour = |key: &str, default: f32| {
            lookup(key)
                .and_then(|v| v.trim().parse::<f32>().ok())
                .filter(|h| (0.0..24.0).contains(h))
                .unwrap_or(default)
        };

        let strategy = match lookup("TIMEZONES_STRATEGY").map(|v| v.parse::<Strategy>()) {
            Some(Ok(strategy)) => strategy,
            Some(Err(e)) => {
                tracing::warn!("TIMEZONES_STRATEGY: {e}, using {:?}", defaults.strategy);
                defaults.strategy
            }
            None => defaults.strategy,
        };

        Self {
            data_dir: lookup("TIMEZONES_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            permission: lookup("TIMEZONES_PERMISSION")
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(defaults.permission),
            day_hour: hour("TIMEZONES_DAY_HOUR", defaults.day_hour),
            night_hour: hour("TIMEZONES_NIGHT_HOUR", defaults.night_hour),
            strategy,
        }
    }

    pub fn with_data_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Time assigned to zones set to `phase`.
    pub fn time_for(&self, phase: DayPhase) -> TargetTime {
        match phase {
            DayPhase::Day => TargetTime::from_hour(self.day_hour),
            DayPhase::Night => TargetTime::from_hour(self.night_hour),
        }
    }

    pub fn lang_dir(&self) -> PathBuf {
        self.data_dir.join("lang")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> TimeZonesConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        TimeZonesConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]);
        assert_eq!(config, TimeZonesConfig::default());
        assert_eq!(config.time_for(DayPhase::Day).hour, 15.0);
        assert_eq!(config.time_for(DayPhase::Night).hour, 1.0);
    }

    #[test]
    fn test_env_overrides() {
        let config = from_pairs(&[
            ("TIMEZONES_DATA_DIR", "/srv/plugins"),
            ("TIMEZONES_PERMISSION", "zones.time"),
            ("TIMEZONES_DAY_HOUR", "12.5"),
            ("TIMEZONES_NIGHT_HOUR", "23"),
            ("TIMEZONES_STRATEGY", "lock"),
        ]);

        assert_eq!(config.data_dir, PathBuf::from("/srv/plugins"));
        assert_eq!(config.lang_dir(), PathBuf::from("/srv/plugins/lang"));
        assert_eq!(config.permission, "zones.time");
        assert_eq!(config.day_hour, 12.5);
        assert_eq!(config.night_hour, 23.0);
        assert_eq!(config.strategy, Strategy::Lock);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_pairs(&[
            ("TIMEZONES_DAY_HOUR", "25"),
            ("TIMEZONES_NIGHT_HOUR", "midnight"),
            ("TIMEZONES_STRATEGY", "teleport"),
            ("TIMEZONES_PERMISSION", "  "),
        ]);

        assert_eq!(config.day_hour, 15.0);
        assert_eq!(config.night_hour, 1.0);
        assert_eq!(config.strategy, Strategy::Auto);
        assert_eq!(config.permission, DEFAULT_PERMISSION);
    }
}
