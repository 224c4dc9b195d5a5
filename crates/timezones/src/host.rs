//! What the plugin needs from the server hosting it.

use std::sync::Arc;

use crate::players::PlayerId;
use crate::zones::ZoneId;

/// The zone-management plugin that owns zone geometry.
pub trait ZoneProvider {
    /// Whether a zone with this ID exists.
    fn zone_exists(&self, zone: &str) -> bool;

    /// Zones the player currently stands in.
    fn player_zones(&self, player: PlayerId) -> Vec<ZoneId>;
}

/// A sibling plugin able to pin a player's perceived time and weather.
pub trait TimeLock: Send + Sync {
    fn lock(&self, player: PlayerId, hour: f32, fog: f32, rain: f32);
    fn unlock(&self, player: PlayerId);
}

pub trait Host {
    /// `None` when the zone-management plugin is not installed.
    fn zone_provider(&self) -> Option<&dyn ZoneProvider>;

    fn has_permission(&self, player: PlayerId, permission: &str) -> bool;

    fn register_permission(&mut self, _permission: &str) {}

    /// Resolve a player by name or UUID.
    fn find_player(&self, query: &str) -> Option<PlayerId>;

    fn player_name(&self, _player: PlayerId) -> Option<String> {
        None
    }

    fn player_locale(&self, _player: PlayerId) -> Option<String> {
        None
    }

    fn online_players(&self) -> Vec<PlayerId>;

    /// Registered time lock service, if any.
    fn time_lock(&self) -> Option<Arc<dyn TimeLock>> {
        None
    }
}
