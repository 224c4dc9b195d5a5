//! Per-player override state. Lives in memory only.

use rustc_hash::FxHashMap;

use crate::time::TargetTime;
use crate::zones::ZoneId;

/// Player UUID.
pub type PlayerId = u128;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    /// An override is currently applied.
    pub active: bool,
    /// Zone events are ignored for this player.
    pub disabled: bool,
    /// Zone that caused the current override.
    pub zone: Option<ZoneId>,
    pub time: Option<TargetTime>,
}

impl PlayerState {
    /// Entries that are neither active nor disabled carry no information.
    pub fn is_idle(&self) -> bool {
        !self.active && !self.disabled
    }

    pub fn activate(&mut self, zone: ZoneId, time: TargetTime) {
        self.active = true;
        self.zone = Some(zone);
        self.time = Some(time);
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.zone = None;
        self.time = None;
    }
}

#[derive(Debug, Default)]
pub struct PlayerTable {
    players: FxHashMap<PlayerId, PlayerState>,
}

impl PlayerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, player: PlayerId) -> &mut PlayerState {
        self.players.entry(player).or_default()
    }

    pub fn get(&self, player: PlayerId) -> Option<&PlayerState> {
        self.players.get(&player)
    }

    pub fn get_mut(&mut self, player: PlayerId) -> Option<&mut PlayerState> {
        self.players.get_mut(&player)
    }

    pub fn remove(&mut self, player: PlayerId) -> Option<PlayerState> {
        self.players.remove(&player)
    }

    pub fn is_disabled(&self, player: PlayerId) -> bool {
        self.players.get(&player).is_some_and(|state| state.disabled)
    }

    /// Players with an override applied, optionally restricted to one zone.
    pub fn active_players(&self, zone: Option<&str>) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|(_, state)| state.active)
            .filter(|(_, state)| zone.is_none_or(|zone| state.zone.as_deref() == Some(zone)))
            .map(|(&player, _)| player)
            .collect()
    }

    /// Drop idle entries. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.players.len();
        self.players.retain(|_, state| !state.is_idle());
        before - self.players.len()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: PlayerId = 0x550e8400_e29b_41d4_a716_446655440000;
    const BOB: PlayerId = 0x6ba7b810_9dad_11d1_80b4_00c04fd430c8;

    #[test]
    fn test_get_or_insert_is_lazy() {
        let mut table = PlayerTable::new();
        assert!(table.get(ALICE).is_none());

        table.get_or_insert(ALICE).disabled = true;
        table.get_or_insert(ALICE);

        assert_eq!(table.len(), 1);
        assert!(table.is_disabled(ALICE));
        assert!(!table.is_disabled(BOB));
    }

    #[test]
    fn test_prune_keeps_active_and_disabled() {
        let mut table = PlayerTable::new();
        table.get_or_insert(ALICE).activate("5".into(), TargetTime::from_hour(15.0));
        table.get_or_insert(BOB);
        table.get_or_insert(3).disabled = true;

        assert_eq!(table.prune(), 1);
        assert!(table.get(ALICE).is_some());
        assert!(table.get(BOB).is_none());
        assert!(table.get(3).is_some());
    }

    #[test]
    fn test_active_players_by_zone() {
        let mut table = PlayerTable::new();
        table.get_or_insert(ALICE).activate("5".into(), TargetTime::from_hour(15.0));
        table.get_or_insert(BOB).activate("6".into(), TargetTime::from_hour(1.0));
        table.get_or_insert(3).disabled = true;

        let mut all = table.active_players(None);
        all.sort_unstable();
        assert_eq!(all, vec![ALICE, BOB]);
        assert_eq!(table.active_players(Some("6")), vec![BOB]);
        assert!(table.active_players(Some("7")).is_empty());
    }

    #[test]
    fn test_deactivate_clears_zone() {
        let mut state = PlayerState::default();
        state.activate("5".into(), TargetTime::from_hour(15.0));
        state.deactivate();
        assert!(state.is_idle());
        assert_eq!(state.zone, None);
        assert_eq!(state.time, None);
    }
}
