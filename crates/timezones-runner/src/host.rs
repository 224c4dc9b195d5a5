//! In-process stand-in for a game server with a zone-management plugin

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use rustc_hash::FxHashMap;
use timezones::prelude::*;
use timezones::protocol::packet_ids;
use tracing::{info, trace, warn};

/// Name-based offline UUID (version 3 layout).
pub fn offline_uuid(name: &str) -> u128 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let input = format!("OfflinePlayer:{name}");
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    let high = hasher.finish();
    input.hash(&mut hasher);
    let low = hasher.finish();

    let uuid = (u128::from(high) << 64) | u128::from(low);
    let uuid = (uuid & !(0xF_u128 << 76)) | (0x3 << 76);
    (uuid & !(0x3_u128 << 62)) | (0x2 << 62)
}

#[derive(Debug, Default)]
pub struct SimZones {
    zones: BTreeSet<ZoneId>,
    occupants: FxHashMap<PlayerId, BTreeSet<ZoneId>>,
}

impl ZoneProvider for SimZones {
    fn zone_exists(&self, zone: &str) -> bool {
        self.zones.contains(zone)
    }

    fn player_zones(&self, player: PlayerId) -> Vec<ZoneId> {
        self.occupants
            .get(&player)
            .map(|zones| zones.iter().cloned().collect())
            .unwrap_or_default()
    }
}

/// Time lock service that only records and logs what it is asked to do.
#[derive(Debug, Default)]
pub struct LoggingTimeLock {
    locked: Mutex<FxHashMap<PlayerId, f32>>,
}

impl LoggingTimeLock {
    pub fn locked(&self) -> usize {
        self.locked.lock().map_or(0, |locked| locked.len())
    }
}

impl TimeLock for LoggingTimeLock {
    fn lock(&self, player: PlayerId, hour: f32, fog: f32, rain: f32) {
        info!("[lock] {player:032x} pinned at hour {hour} (fog {fog}, rain {rain})");
        if let Ok(mut locked) = self.locked.lock() {
            locked.insert(player, hour);
        }
    }

    fn unlock(&self, player: PlayerId) {
        info!("[lock] {player:032x} released");
        if let Ok(mut locked) = self.locked.lock() {
            locked.remove(&player);
        }
    }
}

pub struct SimHost {
    zones: SimZones,
    online: FxHashMap<PlayerId, String>,
    /// Lowercased names allowed to administer timezones
    admins: BTreeSet<String>,
    permissions: Vec<String>,
    lock: Option<Arc<LoggingTimeLock>>,
    packets_sent: u64,
}

impl SimHost {
    pub fn new(admins: impl IntoIterator<Item = String>, lock_service: bool) -> Self {
        Self {
            zones: SimZones::default(),
            online: FxHashMap::default(),
            admins: admins.into_iter().map(|name| name.to_lowercase()).collect(),
            permissions: Vec::new(),
            lock: lock_service.then(|| Arc::new(LoggingTimeLock::default())),
            packets_sent: 0,
        }
    }

    /// Returns `None` if the name is already online.
    pub fn join(&mut self, name: &str) -> Option<PlayerId> {
        if self.player_id(name).is_some() {
            return None;
        }
        let player = offline_uuid(name);
        self.online.insert(player, name.to_string());
        Some(player)
    }

    pub fn leave(&mut self, name: &str) -> Option<PlayerId> {
        let player = self.player_id(name)?;
        self.online.remove(&player);
        self.zones.occupants.remove(&player);
        Some(player)
    }

    pub fn player_id(&self, name: &str) -> Option<PlayerId> {
        self.online
            .iter()
            .find(|(_, online)| online.eq_ignore_ascii_case(name))
            .map(|(&player, _)| player)
    }

    pub fn add_zone(&mut self, zone: ZoneId) -> bool {
        self.zones.zones.insert(zone)
    }

    /// Delete a zone, returning the players that were standing in it.
    pub fn remove_zone(&mut self, zone: &str) -> Option<Vec<PlayerId>> {
        if !self.zones.zones.remove(zone) {
            return None;
        }
        let mut evicted = Vec::new();
        for (&player, zones) in &mut self.zones.occupants {
            if zones.remove(zone) {
                evicted.push(player);
            }
        }
        Some(evicted)
    }

    /// Returns `false` if the zone is unknown or the player is already in it.
    pub fn enter(&mut self, player: PlayerId, zone: &str) -> bool {
        if !self.zones.zones.contains(zone) {
            return false;
        }
        self.zones
            .occupants
            .entry(player)
            .or_default()
            .insert(zone.to_string())
    }

    pub fn exit(&mut self, player: PlayerId, zone: &str) -> bool {
        self.zones
            .occupants
            .get_mut(&player)
            .is_some_and(|zones| zones.remove(zone))
    }

    pub fn zone_ids(&self) -> impl Iterator<Item = &ZoneId> {
        self.zones.zones.iter()
    }

    /// Hand a packet to the player's connection.
    pub fn deliver(&mut self, player: PlayerId, packet: &Bytes) {
        if !self.online.contains_key(&player) {
            warn!("Dropping packet for offline player {player:032x}");
            return;
        }
        self.packets_sent += 1;

        let id = packet.get(1).copied().map_or(-1, i32::from);
        let kind = match id {
            packet_ids::SET_TIME => "SetTime",
            packet_ids::GAME_EVENT => "GameEvent",
            _ => "unknown",
        };
        trace!("-> {player:032x}: {kind} ({} bytes)", packet.len());
    }

    pub fn packets_sent(&self) -> u64 {
        self.packets_sent
    }

    pub fn lock_service(&self) -> Option<&LoggingTimeLock> {
        self.lock.as_deref()
    }
}

impl Host for SimHost {
    fn zone_provider(&self) -> Option<&dyn ZoneProvider> {
        Some(&self.zones)
    }

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
            && self
                .online
                .get(&player)
                .is_some_and(|name| self.admins.contains(&name.to_lowercase()))
    }

    fn register_permission(&mut self, permission: &str) {
        if !self.permissions.iter().any(|p| p == permission) {
            self.permissions.push(permission.to_string());
        }
    }

    fn find_player(&self, query: &str) -> Option<PlayerId> {
        self.player_id(query).or_else(|| {
            let player = u128::from_str_radix(&query.replace('-', ""), 16).ok()?;
            self.online.contains_key(&player).then_some(player)
        })
    }

    fn player_name(&self, player: PlayerId) -> Option<String> {
        self.online.get(&player).cloned()
    }

    fn online_players(&self) -> Vec<PlayerId> {
        let mut players: Vec<_> = self.online.keys().copied().collect();
        players.sort_unstable();
        players
    }

    fn time_lock(&self) -> Option<Arc<dyn TimeLock>> {
        self.lock.clone().map(|lock| lock as Arc<dyn TimeLock>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_uuid_layout() {
        let uuid = offline_uuid("Notch");
        assert_eq!(uuid, offline_uuid("Notch"));
        assert_ne!(uuid, offline_uuid("jeb_"));
        assert_eq!((uuid >> 76) & 0xF, 3);
        assert_eq!((uuid >> 62) & 0x3, 2);
    }

    #[test]
    fn test_join_and_find() {
        let mut host = SimHost::new(["Alice".to_string()], false);
        let alice = host.join("Alice").unwrap();

        assert!(host.join("alice").is_none());
        assert_eq!(host.find_player("ALICE"), Some(alice));
        assert_eq!(host.find_player(&format!("{alice:032x}")), Some(alice));
        assert_eq!(host.player_name(alice).as_deref(), Some("Alice"));

        // Admin only once the permission exists
        assert!(!host.has_permission(alice, "timezones.admin"));
        host.register_permission("timezones.admin");
        assert!(host.has_permission(alice, "timezones.admin"));
    }

    #[test]
    fn test_zone_occupancy() {
        let mut host = SimHost::new(Vec::new(), false);
        let bob = host.join("bob").unwrap();

        assert!(!host.enter(bob, "5"));
        host.add_zone("5".into());
        assert!(host.enter(bob, "5"));
        assert!(!host.enter(bob, "5"));
        assert_eq!(host.zones.player_zones(bob), vec!["5".to_string()]);

        assert_eq!(host.remove_zone("5"), Some(vec![bob]));
        assert!(host.zones.player_zones(bob).is_empty());
        assert_eq!(host.remove_zone("5"), None);
    }

    #[test]
    fn test_logging_lock_tracks_players() {
        let host = SimHost::new(Vec::new(), true);
        let lock = host.time_lock().unwrap();

        lock.lock(1, 15.0, 0.0, 0.0);
        assert_eq!(host.lock_service().unwrap().locked(), 1);
        lock.unlock(1);
        assert_eq!(host.lock_service().unwrap().locked(), 0);
    }
}
