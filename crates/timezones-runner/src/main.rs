//! Console host simulator for the timezones plugin
//!
//! This binary:
//! 1. Loads the plugin against an in-process host with a zone provider
//! 2. Runs a fixed-rate tick loop that advances the world clock and networks
//!    each player's time and weather through the plugin
//! 3. Reads console commands from stdin
//!
//! Commands:
//! - `join <name>` / `leave <name>` - Connect or disconnect a player
//! - `zone add <id>` / `zone remove <id>` - Create or delete a zone
//! - `enter <name> <id>` / `exit <name> <id>` - Move a player across a zone edge
//! - `chat <name> <args...>` - Run `/timezone <args...>` as that player
//! - `timezone <args...>` - Run the console command
//! - `save` - Trigger a server save
//! - `status` - Show world and player state
//! - `help` - Show help
//! - `q` or `quit` - Quit

mod host;

use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use timezones::prelude::*;
use timezones::{Hooks, parse_zone_id, protocol};
use tracing::{debug, error, info, warn};

use crate::host::SimHost;

/// Five minutes at 20 ticks per second
const SAVE_INTERVAL_TICKS: u64 = 20 * 60 * 5;
/// Environment updates go out once a second, like a vanilla server.
const NETWORK_INTERVAL_TICKS: u64 = 20;

/// Commands that can be sent from the input thread
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Join(String),
    Leave(String),
    AddZone(String),
    RemoveZone(String),
    Enter { name: String, zone: String },
    Exit { name: String, zone: String },
    Chat { name: String, args: Vec<String> },
    Console(Vec<String>),
    Save,
    Status,
    Help,
    Quit,
    Unknown(String),
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("timezones_runner=info".parse()?)
                .add_directive("timezones=info".parse()?),
        )
        .init();

    info!("Starting timezones runner");

    let target_fps: f32 = std::env::var("TARGET_FPS")
        .ok()
        .and_then(|fps| fps.parse().ok())
        .filter(|fps: &f32| fps.is_finite() && *fps > 0.0)
        .unwrap_or(20.0);

    let admins: Vec<String> = std::env::var("TIMEZONES_ADMINS")
        .map(|admins| {
            admins
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let lock_service = std::env::var("TIMEZONES_LOCK_SERVICE")
        .is_ok_and(|value| matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes"));

    let config = TimeZonesConfig::from_env();
    info!("Data directory: {}", config.data_dir.display());
    if admins.is_empty() {
        warn!("TIMEZONES_ADMINS is empty, only the console can run timezone commands");
    }

    let mut host = SimHost::new(admins, lock_service);
    let mut plugin = TimeZones::new(config);
    plugin.init(&mut host);
    plugin.loaded(&host);
    plugin.server_initialized(&host);

    // Set up command input channel
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    let ctrlc_tx = cmd_tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Command::Quit);
    })?;

    thread::spawn(move || {
        input_thread(cmd_tx);
    });

    print_help();

    let target_delta = Duration::from_secs_f32(1.0 / target_fps);
    let mut world = WorldState::default();
    let mut tick: u64 = 0;
    let mut running = true;

    while running {
        let start = Instant::now();

        while let Ok(cmd) = cmd_rx.try_recv() {
            running = handle_command(cmd, &mut plugin, &mut host, &world);
            if !running {
                break;
            }
        }

        world.tick();
        plugin.observe_world(&world);
        tick += 1;

        if tick.is_multiple_of(NETWORK_INTERVAL_TICKS) {
            network_environment(&mut plugin, &mut host, &world);
        }
        for (player, packet) in plugin.drain_outgoing() {
            host.deliver(player, &packet);
        }

        if tick.is_multiple_of(SAVE_INTERVAL_TICKS) {
            plugin.server_save();
        }

        // Sleep to maintain target FPS
        let elapsed = start.elapsed();
        if elapsed < target_delta {
            thread::sleep(target_delta - elapsed);
        }
    }

    info!("Shutting down...");
    plugin.unload();
    for (player, packet) in plugin.drain_outgoing() {
        host.deliver(player, &packet);
    }

    Ok(())
}

/// Send every online player their time and weather, letting the plugin
/// replace it for overridden players.
fn network_environment(plugin: &mut TimeZones, host: &mut SimHost, world: &WorldState) {
    for player in host.online_players() {
        let packets = match plugin.network_environment(player, world) {
            Some(patched) => Ok(patched),
            None => protocol::world_environment(world),
        };
        match packets {
            Ok(packets) => {
                for packet in &packets {
                    host.deliver(player, packet);
                }
            }
            Err(e) => error!("Failed to encode environment: {e}"),
        }
    }
}

/// Returns `false` once the loop should stop.
fn handle_command(
    cmd: Command,
    plugin: &mut TimeZones,
    host: &mut SimHost,
    world: &WorldState,
) -> bool {
    match cmd {
        Command::Join(name) => match host.join(&name) {
            Some(player) => {
                info!("{name} joined ({player:032x})");
                plugin.player_init(&*host, player);
            }
            None => warn!("{name} is already online"),
        },
        Command::Leave(name) => match host.leave(&name) {
            Some(player) => {
                plugin.player_disconnected(player);
                info!("{name} left");
            }
            None => warn!("{name} is not online"),
        },
        Command::AddZone(raw) => match parse_zone_id(&raw) {
            Some(zone) => {
                if host.add_zone(zone.clone()) {
                    info!("Created zone {zone}");
                } else {
                    warn!("Zone {zone} already exists");
                }
            }
            None => warn!("Zone IDs are numeric, got '{raw}'"),
        },
        Command::RemoveZone(zone) => match host.remove_zone(&zone) {
            Some(evicted) => {
                for player in evicted {
                    plugin.exit_zone(&zone, player);
                }
                info!("Deleted zone {zone}");
            }
            None => warn!("No zone {zone}"),
        },
        Command::Enter { name, zone } => cross_zone(plugin, host, &name, &zone, true),
        Command::Exit { name, zone } => cross_zone(plugin, host, &name, &zone, false),
        Command::Chat { name, args } => {
            if let Some(player) = online(host, &name) {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                reply(&plugin.chat_command(&*host, player, &args));
            }
        }
        Command::Console(args) => {
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            reply(&plugin.console_command(&*host, true, None, &args));
        }
        Command::Save => {
            plugin.server_save();
            info!("Saved");
        }
        Command::Status => print_status(plugin, host, world),
        Command::Help => print_help(),
        Command::Quit => return false,
        Command::Unknown(s) => {
            if !s.is_empty() {
                info!("Unknown command: '{}'. Type 'help' for commands.", s);
            }
        }
    }
    true
}

/// Move a player across a zone edge in the host, then tell the plugin.
fn cross_zone(plugin: &mut TimeZones, host: &mut SimHost, name: &str, zone: &str, entering: bool) {
    let Some(player) = online(host, name) else {
        return;
    };

    if entering {
        if host.enter(player, zone) {
            plugin.enter_zone(zone, player);
            debug!("{name} entered zone {zone}");
        } else {
            warn!("{name} cannot enter zone {zone}");
        }
    } else if host.exit(player, zone) {
        plugin.exit_zone(zone, player);
        debug!("{name} left zone {zone}");
    } else {
        warn!("{name} is not in zone {zone}");
    }
}

fn online(host: &SimHost, name: &str) -> Option<PlayerId> {
    let player = host.player_id(name);
    if player.is_none() {
        warn!("{name} is not online");
    }
    player
}

fn input_thread(tx: mpsc::Sender<Command>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        let cmd = parse_command(&line);
        let is_quit = cmd == Command::Quit;
        if tx.send(cmd).is_err() || is_quit {
            return;
        }
    }
    // stdin closed
    let _ = tx.send(Command::Quit);
}

fn parse_command(input: &str) -> Command {
    let tokens: Vec<&str> = input.split_whitespace().collect();
    let Some((head, rest)) = tokens.split_first() else {
        return Command::Unknown(String::new());
    };
    let owned = |tokens: &[&str]| -> Vec<String> {
        tokens.iter().map(|t| (*t).to_string()).collect()
    };

    match (head.to_lowercase().as_str(), rest) {
        ("join", [name]) => Command::Join((*name).to_string()),
        ("leave", [name]) => Command::Leave((*name).to_string()),
        ("zone", [action, zone]) => match action.to_lowercase().as_str() {
            "add" => Command::AddZone((*zone).to_string()),
            "remove" | "rm" => Command::RemoveZone((*zone).to_string()),
            _ => Command::Unknown(input.trim().to_string()),
        },
        ("enter", [name, zone]) => Command::Enter {
            name: (*name).to_string(),
            zone: (*zone).to_string(),
        },
        ("exit", [name, zone]) => Command::Exit {
            name: (*name).to_string(),
            zone: (*zone).to_string(),
        },
        ("chat", [name, args @ ..]) => Command::Chat {
            name: (*name).to_string(),
            args: owned(args),
        },
        (timezones::COMMAND_NAME, args) => Command::Console(owned(args)),
        ("save", []) => Command::Save,
        ("status", []) => Command::Status,
        ("help" | "h" | "?", []) => Command::Help,
        ("q" | "quit", []) => Command::Quit,
        _ => Command::Unknown(input.trim().to_string()),
    }
}

#[allow(clippy::print_stdout)]
fn reply(text: &str) {
    println!("{text}");
}

#[allow(clippy::print_stdout)]
fn print_status(plugin: &TimeZones, host: &SimHost, world: &WorldState) {
    println!(
        "World: age {} time {} rain {:.1} thunder {:.1}",
        world.world_age, world.time_of_day, world.rain_level, world.thunder_level
    );
    println!(
        "Strategy: {} | network hook {} | packets sent {}",
        plugin.strategy_name(),
        if plugin.hooks().contains(Hooks::NETWORK_TIME) {
            "on"
        } else {
            "off"
        },
        host.packets_sent()
    );
    if let Some(lock) = host.lock_service() {
        println!("Lock service holds {} player(s)", lock.locked());
    }

    let zones: Vec<String> = host
        .zone_ids()
        .map(|zone| match plugin.zones().get(zone) {
            Some(info) => format!("{zone} ({}, {})", info.phase, info.time),
            None => zone.clone(),
        })
        .collect();
    println!("Zones: {}", zones.join(", "));

    for player in host.online_players() {
        let name = host.player_name(player).unwrap_or_default();
        let state = match plugin.players().get(player) {
            Some(state) if state.disabled => "disabled".to_string(),
            Some(state) if state.active => format!(
                "zone {} at {}",
                state.zone.as_deref().unwrap_or("?"),
                state.time.map(|time| time.to_string()).unwrap_or_default()
            ),
            _ => "world time".to_string(),
        };
        println!("  {name}: {state}");
    }
}

#[allow(clippy::print_stdout)]
fn print_help() {
    println!("Commands:");
    println!("  join <name>              - Connect a player");
    println!("  leave <name>             - Disconnect a player");
    println!("  zone add|remove <id>     - Create or delete a zone");
    println!("  enter <name> <id>        - Move a player into a zone");
    println!("  exit <name> <id>         - Move a player out of a zone");
    println!("  chat <name> <args...>    - Run /timezone as a player");
    println!("  timezone <args...>       - Run the console command");
    println!("  save                     - Save zone data");
    println!("  status                   - Show world and player state");
    println!("  q, quit                  - Quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("join Alice"), Command::Join("Alice".into()));
        assert_eq!(parse_command("zone add 5"), Command::AddZone("5".into()));
        assert_eq!(parse_command("ZONE rm 5"), Command::RemoveZone("5".into()));
        assert_eq!(
            parse_command("enter alice 5"),
            Command::Enter {
                name: "alice".into(),
                zone: "5".into()
            }
        );
        assert_eq!(
            parse_command("chat alice set 5 day"),
            Command::Chat {
                name: "alice".into(),
                args: vec!["set".into(), "5".into(), "day".into()]
            }
        );
        assert_eq!(
            parse_command("timezone list"),
            Command::Console(vec!["list".into()])
        );
        assert_eq!(parse_command("timezone"), Command::Console(Vec::new()));
        assert_eq!(parse_command(" quit "), Command::Quit);
        assert_eq!(parse_command(""), Command::Unknown(String::new()));
        assert_eq!(parse_command("join"), Command::Unknown("join".into()));
        assert_eq!(parse_command("zone move 5"), Command::Unknown("zone move 5".into()));
    }

    #[test]
    fn test_handle_command_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = SimHost::new(["alice".to_string()], false);
        let mut plugin = TimeZones::new(TimeZonesConfig::default().with_data_dir(dir.path()));
        plugin.init(&mut host);
        plugin.loaded(&host);
        let world = WorldState::default();

        for line in [
            "join alice",
            "zone add 5",
            "chat alice set 5 night",
            "enter alice 5",
        ] {
            assert!(handle_command(parse_command(line), &mut plugin, &mut host, &world));
        }

        let alice = host.player_id("alice").unwrap();
        assert!(plugin.players().get(alice).unwrap().active);

        handle_command(parse_command("zone remove 5"), &mut plugin, &mut host, &world);
        assert!(plugin.players().get(alice).is_none());

        assert!(!handle_command(Command::Quit, &mut plugin, &mut host, &world));
    }
}
