//! Time Zones
//!
//! Overrides the time of day an individual player sees, based on the zones
//! they stand in. The zone-management plugin reports enter/exit events; admins
//! map zone IDs to `day` or `night` with the `timezone` command.
//!
//! The host drives everything through [`TimeZones`]:
//! - lifecycle: `init`, `loaded`, `server_initialized`, `server_save`, `unload`
//! - players: `player_init`, `player_disconnected`
//! - zones: `enter_zone`, `exit_zone`
//! - commands: `chat_command`, `console_command`
//! - network: `network_environment`, `drain_outgoing`
//!
//! # Example
//!
//! ```ignore
//! let mut plugin = TimeZones::new(TimeZonesConfig::from_env());
//! plugin.init(&mut host);
//! plugin.loaded(&host);
//! plugin.server_initialized(&host);
//!
//! plugin.chat_command(&host, admin, &["set", "5", "day"]);
//! plugin.enter_zone("5", player);
//! for (player, packet) in plugin.drain_outgoing() {
//!     host.send(player, packet);
//! }
//! ```

mod command;
mod config;
mod error;
mod hooks;
mod host;
mod lang;
mod players;
mod plugin;
pub mod protocol;
mod storage;
mod time;
mod time_override;
mod zones;

pub use command::{COMMAND_NAME, CommandSource, parse_args};
pub use config::{DATA_FILE_NAME, DEFAULT_PERMISSION, TimeZonesConfig};
pub use error::{CommandError, Error, Result};
pub use hooks::Hooks;
pub use host::{Host, TimeLock, ZoneProvider};
pub use lang::{Lang, Message};
pub use players::{PlayerId, PlayerState, PlayerTable};
pub use plugin::TimeZones;
pub use storage::DataFile;
pub use time::{DayPhase, InvalidDayPhase, TICKS_PER_DAY, TargetTime, WorldState};
pub use time_override::{LockService, PacketPatch, Strategy, TimeOverride, UnknownStrategy};
pub use zones::{ZoneData, ZoneId, ZoneInfo, parse_zone_id};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        CommandSource, Host, PlayerId, TimeLock, TimeZones, TimeZonesConfig, WorldState,
        ZoneId, ZoneProvider,
    };
}
