//! Forcing a time of day on a single player
//!
//! Two interchangeable strategies:
//! - [`PacketPatch`] rewrites the environment packets sent to that client
//! - [`LockService`] hands the job to a sibling plugin's [`TimeLock`]

use std::sync::Arc;

use bytes::Bytes;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, error};

use crate::host::TimeLock;
use crate::players::PlayerId;
use crate::protocol;
use crate::time::{TargetTime, WorldState};

pub trait TimeOverride {
    fn name(&self) -> &'static str;

    /// Force `time` on the player, with fog and rain cleared.
    fn apply(&mut self, player: PlayerId, time: TargetTime);

    /// Give the player the shared world time and weather back.
    fn revert(&mut self, player: PlayerId);

    /// Drop any state for a player that is no longer connected.
    fn forget(&mut self, player: PlayerId) {
        self.revert(player);
    }

    /// Latest shared clock and weather from the host.
    fn observe_world(&mut self, _world: &WorldState) {}

    /// Whether environment updates must be routed through
    /// [`TimeOverride::rewrite_environment`].
    fn intercepts_network(&self) -> bool {
        false
    }

    /// Replacement packets for one client, or `None` to send the world's.
    fn rewrite_environment(&mut self, _player: PlayerId, _world: &WorldState) -> Option<Vec<Bytes>> {
        None
    }

    /// Packets queued by `apply`/`revert`, addressed per player.
    fn drain_outgoing(&mut self) -> Vec<(PlayerId, Bytes)> {
        Vec::new()
    }
}

/// Which strategy to pick at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Lock service when the host has one, packet patch otherwise.
    #[default]
    Auto,
    Packet,
    Lock,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown strategy '{0}', expected auto, packet or lock")]
pub struct UnknownStrategy(pub String);

impl core::str::FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "packet" => Ok(Self::Packet),
            "lock" => Ok(Self::Lock),
            other => Err(UnknownStrategy(other.to_string())),
        }
    }
}

/// Build the strategy for `preference` given the host's lock service.
pub fn select(preference: Strategy, lock: Option<Arc<dyn TimeLock>>) -> Box<dyn TimeOverride> {
    match (preference, lock) {
        (Strategy::Auto | Strategy::Lock, Some(lock)) => Box::new(LockService::new(lock)),
        (Strategy::Lock, None) => {
            tracing::warn!("No time lock service registered, falling back to packet patching");
            Box::new(PacketPatch::new())
        }
        (Strategy::Auto | Strategy::Packet, _) => Box::new(PacketPatch::new()),
    }
}

// ============================================================================
// Packet patch
// ============================================================================

#[derive(Debug, Default)]
pub struct PacketPatch {
    /// Day ticks forced per player
    overrides: FxHashMap<PlayerId, i64>,
    /// Last environment the host networked
    world: WorldState,
    outgoing: Vec<(PlayerId, Bytes)>,
}

impl PacketPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_overridden(&self, player: PlayerId) -> bool {
        self.overrides.contains_key(&player)
    }

    fn queue(&mut self, player: PlayerId, packets: crate::Result<Vec<Bytes>>) {
        match packets {
            Ok(packets) => self
                .outgoing
                .extend(packets.into_iter().map(|packet| (player, packet))),
            Err(e) => error!("Failed to encode environment for {player:032x}: {e}"),
        }
    }
}

impl TimeOverride for PacketPatch {
    fn name(&self) -> &'static str {
        "packet patch"
    }

    fn apply(&mut self, player: PlayerId, time: TargetTime) {
        let ticks = time.to_ticks();
        self.overrides.insert(player, ticks);
        debug!("Patching environment for {player:032x} to {time} ({ticks} ticks)");

        let packets = protocol::overridden_environment(self.world.world_age, ticks);
        self.queue(player, packets);
    }

    fn revert(&mut self, player: PlayerId) {
        if self.overrides.remove(&player).is_none() {
            return;
        }
        debug!("Restoring world environment for {player:032x}");

        let packets = protocol::world_environment(&self.world);
        self.queue(player, packets);
    }

    fn forget(&mut self, player: PlayerId) {
        self.overrides.remove(&player);
        self.outgoing.retain(|(queued, _)| *queued != player);
    }

    fn observe_world(&mut self, world: &WorldState) {
        self.world = *world;
    }

    fn intercepts_network(&self) -> bool {
        true
    }

    fn rewrite_environment(&mut self, player: PlayerId, world: &WorldState) -> Option<Vec<Bytes>> {
        self.world = *world;
        let ticks = *self.overrides.get(&player)?;

        match protocol::overridden_environment(world.world_age, ticks) {
            Ok(packets) => Some(packets),
            Err(e) => {
                error!("Failed to patch environment for {player:032x}: {e}");
                None
            }
        }
    }

    fn drain_outgoing(&mut self) -> Vec<(PlayerId, Bytes)> {
        core::mem::take(&mut self.outgoing)
    }
}

// ============================================================================
// Lock service
// ============================================================================

pub struct LockService {
    lock: Arc<dyn TimeLock>,
}

impl LockService {
    pub fn new(lock: Arc<dyn TimeLock>) -> Self {
        Self { lock }
    }
}

impl TimeOverride for LockService {
    fn name(&self) -> &'static str {
        "lock service"
    }

    fn apply(&mut self, player: PlayerId, time: TargetTime) {
        debug!("Locking {player:032x} at {time}");
        self.lock.lock(player, time.hour, 0.0, 0.0);
    }

    fn revert(&mut self, player: PlayerId) {
        debug!("Unlocking {player:032x}");
        self.lock.unlock(player);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::protocol::packet_ids;

    const ALICE: PlayerId = 1;
    const BOB: PlayerId = 2;

    #[derive(Default)]
    struct RecordingLock {
        calls: Mutex<Vec<String>>,
    }

    impl TimeLock for RecordingLock {
        fn lock(&self, player: PlayerId, hour: f32, fog: f32, rain: f32) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("lock {player} {hour} {fog} {rain}"));
        }

        fn unlock(&self, player: PlayerId) {
            self.calls.lock().unwrap().push(format!("unlock {player}"));
        }
    }

    fn time_ticks(packet: &Bytes) -> i64 {
        i64::from_be_bytes(packet[10..18].try_into().unwrap())
    }

    #[test]
    fn test_patch_rewrites_only_overridden_players() {
        let mut patch = PacketPatch::new();
        patch.apply(ALICE, TargetTime::from_hour(15.0));

        let world = WorldState::default();
        let packets = patch.rewrite_environment(ALICE, &world).unwrap();
        assert_eq!(packets[0][1] as i32, packet_ids::SET_TIME);
        assert_eq!(time_ticks(&packets[0]), 9000);

        assert!(patch.rewrite_environment(BOB, &world).is_none());
    }

    #[test]
    fn test_patch_queues_apply_and_revert() {
        let mut patch = PacketPatch::new();
        let world = WorldState {
            world_age: 50,
            time_of_day: 2000,
            ..WorldState::default()
        };
        patch.rewrite_environment(ALICE, &world);

        patch.apply(ALICE, TargetTime::from_hour(1.0));
        let applied = patch.drain_outgoing();
        assert_eq!(applied.len(), 4);
        assert!(applied.iter().all(|(player, _)| *player == ALICE));
        assert_eq!(time_ticks(&applied[0].1), 19000);

        patch.revert(ALICE);
        let reverted = patch.drain_outgoing();
        assert_eq!(time_ticks(&reverted[0].1), 2000);
        assert!(!patch.is_overridden(ALICE));
        assert!(patch.drain_outgoing().is_empty());
    }

    #[test]
    fn test_patch_revert_without_override_is_silent() {
        let mut patch = PacketPatch::new();
        patch.revert(ALICE);
        assert!(patch.drain_outgoing().is_empty());
    }

    #[test]
    fn test_patch_forget_drops_queued_packets() {
        let mut patch = PacketPatch::new();
        patch.apply(ALICE, TargetTime::from_hour(15.0));
        patch.apply(BOB, TargetTime::from_hour(15.0));

        patch.forget(ALICE);

        assert!(!patch.is_overridden(ALICE));
        assert!(patch.drain_outgoing().iter().all(|(player, _)| *player == BOB));
    }

    #[test]
    fn test_lock_service_delegates() {
        let lock = Arc::new(RecordingLock::default());
        let mut service = LockService::new(lock.clone());

        service.apply(ALICE, TargetTime::from_hour(15.0));
        service.revert(ALICE);

        assert!(!service.intercepts_network());
        assert_eq!(
            *lock.calls.lock().unwrap(),
            vec!["lock 1 15 0 0".to_string(), "unlock 1".to_string()]
        );
    }

    #[test]
    fn test_select() {
        let lock: Arc<dyn TimeLock> = Arc::new(RecordingLock::default());

        assert_eq!(select(Strategy::Auto, None).name(), "packet patch");
        assert_eq!(select(Strategy::Auto, Some(lock.clone())).name(), "lock service");
        assert_eq!(select(Strategy::Packet, Some(lock.clone())).name(), "packet patch");
        assert_eq!(select(Strategy::Lock, None).name(), "packet patch");
        assert_eq!(select(Strategy::Lock, Some(lock)).name(), "lock service");
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!(" Packet ".parse::<Strategy>(), Ok(Strategy::Packet));
        assert_eq!(
            "Both".parse::<Strategy>(),
            Err(UnknownStrategy("both".to_string()))
        );
    }

    #[test]
    fn test_patch_revert_uses_observed_world() {
        let mut patch = PacketPatch::new();
        patch.observe_world(&WorldState {
            world_age: 120_000,
            time_of_day: 18000,
            ..WorldState::default()
        });

        patch.apply(ALICE, TargetTime::from_hour(15.0));
        let applied = patch.drain_outgoing();
        assert_eq!(
            i64::from_be_bytes(applied[0].1[2..10].try_into().unwrap()),
            120_000
        );

        patch.revert(ALICE);
        let reverted = patch.drain_outgoing();
        assert_eq!(time_ticks(&reverted[0].1), 18000);
    }
}
