//! Plugin lifecycle and zone event handling

use bytes::Bytes;
use tracing::{debug, error, info};

use crate::config::{DATA_FILE_NAME, TimeZonesConfig};
use crate::hooks::Hooks;
use crate::host::Host;
use crate::lang::Lang;
use crate::players::{PlayerId, PlayerTable};
use crate::storage::DataFile;
use crate::time::WorldState;
use crate::time_override::{self, PacketPatch, TimeOverride};
use crate::zones::ZoneData;

pub struct TimeZones {
    pub(crate) config: TimeZonesConfig,
    pub(crate) zones: ZoneData,
    pub(crate) players: PlayerTable,
    pub(crate) lang: Lang,
    pub(crate) strategy: Box<dyn TimeOverride>,
    hooks: Hooks,
    /// Set once the zone provider was found missing; hooks stay off.
    crippled: bool,
    data_file: DataFile<ZoneData>,
}

impl TimeZones {
    pub fn new(config: TimeZonesConfig) -> Self {
        let data_file = DataFile::in_dir(&config.data_dir, DATA_FILE_NAME);
        Self {
            config,
            zones: ZoneData::default(),
            players: PlayerTable::new(),
            lang: Lang::new(),
            strategy: Box::new(PacketPatch::new()),
            hooks: Hooks::empty(),
            crippled: false,
            data_file,
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Register the permission, load messages and zone data, pick the
    /// override strategy.
    pub fn init(&mut self, host: &mut dyn Host) {
        host.register_permission(&self.config.permission);

        match self.lang.load_dir(self.config.lang_dir()) {
            Ok(0) => {}
            Ok(n) => info!("Loaded {n} message locale(s)"),
            Err(e) => tracing::warn!("Failed to read locale directory: {e}"),
        }

        self.load();
        self.players.prune();

        self.strategy = time_override::select(self.config.strategy, host.time_lock());
        info!("Using {} to override player time", self.strategy.name());

        self.hooks = Hooks::initial();
        self.check_subscriptions();
    }

    /// Runs after every plugin is loaded. Without a zone provider the plugin
    /// goes inert.
    pub fn loaded(&mut self, host: &dyn Host) {
        if host.zone_provider().is_none() {
            error!("A zone provider is required for TimeZones to run, zone hooks disabled");
            self.crippled = true;
            self.hooks.remove(Hooks::ZONE_DEPENDENT);
        }
    }

    /// Apply overrides for players already online.
    pub fn server_initialized(&mut self, host: &dyn Host) {
        for player in host.online_players() {
            self.player_init(host, player);
        }
    }

    pub fn server_save(&mut self) {
        if !self.hooks.contains(Hooks::SERVER_SAVE) {
            return;
        }
        let pruned = self.players.prune();
        if pruned > 0 {
            debug!("Pruned {pruned} idle player entries");
        }
        self.check_subscriptions();
        self.save();
    }

    /// Hand every overridden player the world time back and save.
    pub fn unload(&mut self) {
        for player in self.players.active_players(None) {
            if let Some(state) = self.players.get_mut(player) {
                state.deactivate();
            }
            self.strategy.revert(player);
        }
        self.players.prune();
        self.check_subscriptions();
        self.save();
        info!("TimeZones unloaded");
    }

    pub fn player_init(&mut self, host: &dyn Host, player: PlayerId) {
        if !self.hooks.contains(Hooks::PLAYER_INIT) {
            return;
        }
        self.replay_zones(host, player);
    }

    /// Drops the player's entry and anything still queued for them.
    pub fn player_disconnected(&mut self, player: PlayerId) {
        self.players.remove(player);
        self.strategy.forget(player);
        self.check_subscriptions();
    }

    // ========================================================================
    // Zone events
    // ========================================================================

    pub fn enter_zone(&mut self, zone: &str, player: PlayerId) {
        if !self.hooks.contains(Hooks::ENTER_ZONE) || self.players.is_disabled(player) {
            return;
        }
        let Some(info) = self.zones.get(zone).copied() else {
            return;
        };

        self.players
            .get_or_insert(player)
            .activate(zone.to_string(), info.time);
        self.strategy.apply(player, info.time);
        debug!("{player:032x} entered timezone {zone} ({})", info.phase);

        self.check_subscriptions();
    }

    pub fn exit_zone(&mut self, zone: &str, player: PlayerId) {
        if !self.hooks.contains(Hooks::EXIT_ZONE) || self.players.is_disabled(player) {
            return;
        }
        if !self.zones.contains(zone) {
            return;
        }

        if self.players.remove(player).is_some_and(|state| state.active) {
            self.strategy.revert(player);
            debug!("{player:032x} left timezone {zone}");
        }
        self.check_subscriptions();
    }

    // ========================================================================
    // Network
    // ========================================================================

    /// Record the shared clock and weather. Reverts restore this state, so
    /// hosts should call it every tick whether or not anyone is overridden.
    pub fn observe_world(&mut self, world: &WorldState) {
        self.strategy.observe_world(world);
    }

    /// Called before the host sends its time/weather to `player`. `Some`
    /// replaces the host's packets for this client.
    pub fn network_environment(&mut self, player: PlayerId, world: &WorldState) -> Option<Vec<Bytes>> {
        self.strategy.observe_world(world);
        if !self.hooks.contains(Hooks::NETWORK_TIME) {
            return None;
        }
        self.strategy.rewrite_environment(player, world)
    }

    /// Packets queued for individual players since the last drain.
    pub fn drain_outgoing(&mut self) -> Vec<(PlayerId, Bytes)> {
        self.strategy.drain_outgoing()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &TimeZonesConfig {
        &self.config
    }

    pub fn zones(&self) -> &ZoneData {
        &self.zones
    }

    pub fn players(&self) -> &PlayerTable {
        &self.players
    }

    pub fn hooks(&self) -> Hooks {
        self.hooks
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn lang(&self) -> &Lang {
        &self.lang
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Enter every zone the provider reports for `player`.
    pub(crate) fn replay_zones(&mut self, host: &dyn Host, player: PlayerId) {
        let Some(provider) = host.zone_provider() else {
            return;
        };
        for zone in provider.player_zones(player) {
            self.enter_zone(&zone, player);
        }
    }

    /// `NETWORK_TIME` is only worth dispatching while someone may need a
    /// patched environment.
    pub(crate) fn check_subscriptions(&mut self) {
        let wanted =
            !self.crippled && self.strategy.intercepts_network() && !self.players.is_empty();
        self.hooks.set(Hooks::NETWORK_TIME, wanted);
    }

    fn load(&mut self) {
        self.zones = self.data_file.load_or_default();
        info!("Loaded {} timezone(s)", self.zones.len());
    }

    fn save(&self) {
        match self.data_file.write(&self.zones) {
            Ok(()) => debug!("Saved {} timezone(s)", self.zones.len()),
            Err(e) => error!("Failed to save {}: {e}", self.data_file.path().display()),
        }
    }
}
