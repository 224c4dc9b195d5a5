//! Time of day values
//!
//! Hours are what admins and the data file speak; ticks are what clients
//! render. Tick 0 is 06:00 and a day lasts 24000 ticks.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const TICKS_PER_DAY: i64 = 24000;
pub const TICKS_PER_HOUR: f32 = 1000.0;

/// Hour at which the day tick counter starts.
const TICK_ZERO_HOUR: f32 = 6.0;

/// A time of day to force on a player, as an hour in `[0, 24)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetTime {
    pub hour: f32,
}

impl TargetTime {
    pub fn from_hour(hour: f32) -> Self {
        Self {
            hour: hour.rem_euclid(24.0),
        }
    }

    /// Day ticks for this hour.
    pub fn to_ticks(self) -> i64 {
        let ticks = ((self.hour - TICK_ZERO_HOUR).rem_euclid(24.0) * TICKS_PER_HOUR).round() as i64;
        ticks % TICKS_PER_DAY
    }
}

impl fmt::Display for TargetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_minutes = (self.hour * 60.0).round() as u32 % (24 * 60);
        write!(f, "{:02}:{:02}", total_minutes / 60, total_minutes % 60)
    }
}

/// The two presets an admin can assign to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    Day,
    Night,
}

impl DayPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Night => "night",
        }
    }
}

impl fmt::Display for DayPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("time must be day or night")]
pub struct InvalidDayPhase;

impl FromStr for DayPhase {
    type Err = InvalidDayPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "night" => Ok(Self::Night),
            _ => Err(InvalidDayPhase),
        }
    }
}

/// The shared clock and weather the host networks to every client.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldState {
    pub world_age: i64,
    pub time_of_day: i64,
    pub rain_level: f32,
    pub thunder_level: f32,
}

impl Default for WorldState {
    fn default() -> Self {
        Self {
            world_age: 0,
            time_of_day: 6000, // Noon
            rain_level: 0.0,
            thunder_level: 0.0,
        }
    }
}

impl WorldState {
    /// Tick the world time forward
    pub fn tick(&mut self) {
        self.world_age += 1;
        self.time_of_day = (self.time_of_day + 1) % TICKS_PER_DAY;
    }

    pub fn is_raining(&self) -> bool {
        self.rain_level > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_to_ticks() {
        assert_eq!(TargetTime::from_hour(6.0).to_ticks(), 0);
        assert_eq!(TargetTime::from_hour(12.0).to_ticks(), 6000);
        assert_eq!(TargetTime::from_hour(15.0).to_ticks(), 9000);
        assert_eq!(TargetTime::from_hour(1.0).to_ticks(), 19000);
        assert_eq!(TargetTime::from_hour(0.0).to_ticks(), 18000);
    }

    #[test]
    fn test_from_hour_wraps() {
        assert_eq!(TargetTime::from_hour(25.0).hour, 1.0);
        assert_eq!(TargetTime::from_hour(-1.0).hour, 23.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(TargetTime::from_hour(15.0).to_string(), "15:00");
        assert_eq!(TargetTime::from_hour(1.5).to_string(), "01:30");
    }

    #[test]
    fn test_day_phase_literals() {
        assert_eq!("day".parse::<DayPhase>(), Ok(DayPhase::Day));
        assert_eq!("night".parse::<DayPhase>(), Ok(DayPhase::Night));
        assert!("Day".parse::<DayPhase>().is_err());
        assert!("noon".parse::<DayPhase>().is_err());
    }

    #[test]
    fn test_world_tick_wraps() {
        let mut world = WorldState {
            time_of_day: TICKS_PER_DAY - 1,
            ..WorldState::default()
        };
        world.tick();
        assert_eq!(world.time_of_day, 0);
        assert_eq!(world.world_age, 1);
    }
}
