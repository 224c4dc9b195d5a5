//! The `timezone` admin command
//!
//! Sub-commands: `toggle [player]`, `set <zone> <day|night>`,
//! `disable <zone>`, `list`, `help`. Every outcome, including rejections, is
//! a localized reply; nothing here fails the caller.

use tracing::info;

use crate::error::CommandError;
use crate::host::Host;
use crate::lang::Message;
use crate::players::PlayerId;
use crate::plugin::TimeZones;
use crate::time::DayPhase;
use crate::zones::parse_zone_id;

pub const COMMAND_NAME: &str = "timezone";

/// Who issued a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    /// Chat command typed by a player
    Player(PlayerId),
    /// Server console, or a remote console connection tied to a player
    Console {
        admin: bool,
        connection: Option<PlayerId>,
    },
}

impl CommandSource {
    fn player(self) -> Option<PlayerId> {
        match self {
            Self::Player(player) => Some(player),
            Self::Console { connection, .. } => connection,
        }
    }

    fn is_console(self) -> bool {
        matches!(self, Self::Console { .. })
    }
}

/// Split a raw command line into tokens.
pub fn parse_args(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

/// A successful outcome, rendered through the message table.
enum Reply {
    Message(Message, Vec<String>),
    Lines(Vec<(Message, Vec<String>)>),
}

impl Reply {
    fn message(message: Message) -> Self {
        Self::Message(message, Vec::new())
    }
}

type CommandResult = Result<Reply, CommandError>;

impl TimeZones {
    /// `/timezone ...` typed in chat by `player`.
    pub fn chat_command(&mut self, host: &dyn Host, player: PlayerId, args: &[&str]) -> String {
        self.run_command(host, CommandSource::Player(player), args)
    }

    /// `timezone ...` entered on the console.
    pub fn console_command(
        &mut self,
        host: &dyn Host,
        admin: bool,
        connection: Option<PlayerId>,
        args: &[&str],
    ) -> String {
        self.run_command(host, CommandSource::Console { admin, connection }, args)
    }

    pub fn run_command(&mut self, host: &dyn Host, source: CommandSource, args: &[&str]) -> String {
        let locale = source.player().and_then(|player| host.player_locale(player));
        let locale = locale.as_deref();

        match self.execute(host, source, args) {
            Ok(Reply::Message(message, message_args)) => self.lang.get(message, locale, &message_args),
            Ok(Reply::Lines(lines)) => lines
                .iter()
                .map(|(message, message_args)| self.lang.get(*message, locale, message_args))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(err) => {
                tracing::debug!("Rejected {COMMAND_NAME} command {args:?}: {err}");
                let (message, message_args) = err.message();
                let message = match message {
                    Message::Syntax if source.is_console() => Message::SyntaxConsole,
                    message => message,
                };
                self.lang.get(message, locale, &message_args)
            }
        }
    }

    fn can_use(&self, host: &dyn Host, source: CommandSource) -> bool {
        let permission = &self.config.permission;
        match source {
            CommandSource::Player(player) => host.has_permission(player, permission),
            CommandSource::Console { admin, connection } => {
                admin || connection.is_some_and(|player| host.has_permission(player, permission))
            }
        }
    }

    fn execute(&mut self, host: &dyn Host, source: CommandSource, args: &[&str]) -> CommandResult {
        if !self.can_use(host, source) {
            return Err(CommandError::AdminsOnly(self.config.permission.clone()));
        }

        let Some(sub) = args.first() else {
            return Err(CommandError::Syntax);
        };

        match sub.to_lowercase().as_str() {
            "toggle" => self.toggle_command(host, source, args),
            "set" => self.set_command(host, args),
            "disable" => self.disable_command(args),
            "list" => Ok(self.list_zones()),
            "default" => Err(CommandError::Syntax),
            _ if source.is_console() => Ok(Reply::message(Message::HelpConsole)),
            _ => Ok(Reply::message(Message::Help)),
        }
    }

    fn toggle_command(&mut self, host: &dyn Host, source: CommandSource, args: &[&str]) -> CommandResult {
        let target = match (source, args.get(1)) {
            (_, Some(query)) if args.len() == 2 => host
                .find_player(query)
                .ok_or_else(|| CommandError::NoPlayerFound((*query).to_string()))?,
            (CommandSource::Player(player), None) => player,
            _ => return Err(CommandError::Syntax),
        };

        let disabled = self.toggle(host, target);
        let name = display_name(host, target);
        info!(
            "TimeZones {} for {name}",
            if disabled { "disabled" } else { "enabled" }
        );

        let message = if disabled {
            Message::TimeZoneDeactivated
        } else {
            Message::TimeZoneActivated
        };
        Ok(Reply::Message(message, vec![name]))
    }

    fn set_command(&mut self, host: &dyn Host, args: &[&str]) -> CommandResult {
        let [_, zone, phase] = args else {
            return Err(CommandError::Syntax);
        };
        let phase: DayPhase = phase.parse().map_err(|_| CommandError::InvalidDayOrNight)?;
        let zone = parse_zone_id(zone).ok_or(CommandError::InvalidZoneId)?;

        let exists = host
            .zone_provider()
            .is_some_and(|provider| provider.zone_exists(&zone));
        if !exists {
            return Err(CommandError::ZoneNotFound(zone));
        }

        let time = self.config.time_for(phase);
        self.zones.upsert(zone.clone(), phase, time);
        info!("Timezone {zone} set to {phase} ({time})");

        // Players already inside pick up the new time
        for player in self.players.active_players(Some(&zone)) {
            if let Some(state) = self.players.get_mut(player) {
                state.time = Some(time);
            }
            self.strategy.apply(player, time);
        }

        Ok(Reply::Message(Message::ZoneSet, vec![zone, phase.to_string()]))
    }

    fn disable_command(&mut self, args: &[&str]) -> CommandResult {
        let [_, zone] = args else {
            return Err(CommandError::Syntax);
        };
        let zone = parse_zone_id(zone).ok_or(CommandError::InvalidZoneId)?;

        if self.zones.remove(&zone).is_none() {
            return Err(CommandError::ZoneNotConfigured(zone));
        }
        info!("Timezone {zone} disabled");

        for player in self.players.active_players(Some(&zone)) {
            self.players.remove(player);
            self.strategy.revert(player);
        }
        self.check_subscriptions();

        Ok(Reply::Message(Message::ZoneRemoved, vec![zone]))
    }

    fn list_zones(&self) -> Reply {
        if self.zones.is_empty() {
            return Reply::message(Message::NoZonesConfigured);
        }

        let mut lines = vec![(Message::ZoneList, vec![self.zones.len().to_string()])];
        lines.extend(self.zones.iter().map(|(zone, info)| {
            (
                Message::ZoneListEntry,
                vec![zone.clone(), info.phase.to_string(), info.time.to_string()],
            )
        }));
        Reply::Lines(lines)
    }

    /// Flip whether zone events apply to `player`. Returns the new disabled
    /// flag.
    pub fn toggle(&mut self, host: &dyn Host, player: PlayerId) -> bool {
        let state = self.players.get_or_insert(player);
        state.disabled = !state.disabled;

        let disabled = state.disabled;
        if disabled {
            let was_active = state.active;
            state.deactivate();
            if was_active {
                self.strategy.revert(player);
            }
        } else {
            self.players.remove(player);
            self.replay_zones(host, player);
        }

        self.check_subscriptions();
        disabled
    }
}

fn display_name(host: &dyn Host, player: PlayerId) -> String {
    host.player_name(player)
        .unwrap_or_else(|| format!("{player:032x}"))
}
