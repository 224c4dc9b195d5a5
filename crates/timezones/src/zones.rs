//! Zone configuration store
//!
//! Maps zone IDs to the time players inside them should see. This is the
//! only state written to disk.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::{DayPhase, TargetTime};

/// Normalized decimal zone identifier, e.g. `"5"`.
pub type ZoneId = String;

/// Parse an admin-supplied zone ID. Only integers are accepted.
pub fn parse_zone_id(input: &str) -> Option<ZoneId> {
    input.trim().parse::<i32>().ok().map(|n| n.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    pub phase: DayPhase,
    pub time: TargetTime,
}

/// Persisted zone table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneData {
    #[serde(default)]
    pub zones: BTreeMap<ZoneId, ZoneInfo>,
}

impl ZoneData {
    /// Insert or overwrite a zone. Returns true when an entry was replaced.
    pub fn upsert(&mut self, zone: ZoneId, phase: DayPhase, time: TargetTime) -> bool {
        self.zones.insert(zone, ZoneInfo { phase, time }).is_some()
    }

    pub fn remove(&mut self, zone: &str) -> Option<ZoneInfo> {
        self.zones.remove(zone)
    }

    pub fn get(&self, zone: &str) -> Option<&ZoneInfo> {
        self.zones.get(zone)
    }

    pub fn contains(&self, zone: &str) -> bool {
        self.zones.contains_key(zone)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ZoneId, &ZoneInfo)> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
