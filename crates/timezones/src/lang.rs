//! Player-facing messages
//!
//! English templates are built in. Other locales can be supplied as
//! `lang/<locale>.json` files (message key to template) in the data directory;
//! missing keys fall back to English.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::error::Result;

pub const DEFAULT_LOCALE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    TimeZoneActivated,
    TimeZoneDeactivated,
    AdminsOnly,
    Help,
    HelpConsole,
    Syntax,
    SyntaxConsole,
    ZoneNotFound,
    ZoneSet,
    InvalidZoneId,
    ZoneRemoved,
    ZoneNotConfigured,
    InvalidDayOrNight,
    NoPlayerFound,
    ZoneList,
    ZoneListEntry,
    NoZonesConfigured,
}

impl Message {
    pub const ALL: [Self; 17] = [
        Self::TimeZoneActivated,
        Self::TimeZoneDeactivated,
        Self::AdminsOnly,
        Self::Help,
        Self::HelpConsole,
        Self::Syntax,
        Self::SyntaxConsole,
        Self::ZoneNotFound,
        Self::ZoneSet,
        Self::InvalidZoneId,
        Self::ZoneRemoved,
        Self::ZoneNotConfigured,
        Self::InvalidDayOrNight,
        Self::NoPlayerFound,
        Self::ZoneList,
        Self::ZoneListEntry,
        Self::NoZonesConfigured,
    ];

    /// Key used in locale files.
    pub fn key(self) -> &'static str {
        match self {
            Self::TimeZoneActivated => "TimeZoneActivated",
            Self::TimeZoneDeactivated => "TimeZoneDeactivated",
            Self::AdminsOnly => "AdminsOnly",
            Self::Help => "HelpTimeZone",
            Self::HelpConsole => "HelpTimeZoneConsole",
            Self::Syntax => "SyntaxTimeZone",
            Self::SyntaxConsole => "SyntaxTimeZoneConsole",
            Self::ZoneNotFound => "ZoneNotFound",
            Self::ZoneSet => "ZoneSet",
            Self::InvalidZoneId => "InvalidZoneID",
            Self::ZoneRemoved => "ZoneRemoved",
            Self::ZoneNotConfigured => "ZoneNotConfigured",
            Self::InvalidDayOrNight => "InvalidDayOrNight",
            Self::NoPlayerFound => "NoPlayerFound",
            Self::ZoneList => "ZoneList",
            Self::ZoneListEntry => "ZoneListEntry",
            Self::NoZonesConfigured => "NoZonesConfigured",
        }
    }

    fn english(self) -> &'static str {
        match self {
            Self::TimeZoneActivated => "TimeZones activated for {0}",
            Self::TimeZoneDeactivated => "TimeZones deactivated for {0}",
            Self::AdminsOnly => "This command is only for people with the permission \"{0}\"!",
            Self::Help => concat!(
                "TimeZones\n",
                " Available commands are:\n",
                "/timezone toggle [player] - toggle all timezones on or off for the specified player\n",
                "/timezone set (zone ID) (day/night) - set the specified zone as a timezone\n",
                "/timezone disable (zone ID) - disable the given timezone\n",
                "/timezone list - list all timezones",
            ),
            Self::HelpConsole => concat!(
                "TimeZones\n",
                " Available console commands are:\n",
                "timezone toggle (player) - toggle all timezones on or off for the specified player\n",
                "timezone set (zone ID) (day/night) - set the specified zone as a timezone\n",
                "timezone disable (zone ID) - disable the given timezone\n",
                "timezone list - list all timezones",
            ),
            Self::Syntax => {
                "Invalid syntax, use /timezone help to get a list of available commands"
            }
            Self::SyntaxConsole => {
                "Invalid syntax, use timezone help to get a list of available commands"
            }
            Self::ZoneNotFound => "Zone {0} doesn't exist, please check the given zone ID.",
            Self::ZoneSet => "Success: set the zone with ID {0} as a {1} zone.",
            Self::InvalidZoneId => "Invalid zone ID, please provide a zone ID containing only numbers.",
            Self::ZoneRemoved => "Success: disabled timezone with ID {0}",
            Self::ZoneNotConfigured => "Zone {0} is not a timezone.",
            Self::InvalidDayOrNight => "Invalid time, please provide a day or night value.",
            Self::NoPlayerFound => "No player found matching \"{0}\".",
            Self::ZoneList => "Timezones ({0}):",
            Self::ZoneListEntry => " {0} - {1} ({2})",
            Self::NoZonesConfigured => "No timezones have been set.",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|message| message.key() == key)
    }
}

/// Substitute `{0}`, `{1}`, ... with `args`.
pub fn format(template: &str, args: &[String]) -> String {
    let mut out = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        out = out.replace(&format!("{{{i}}}"), arg);
    }
    out
}

#[derive(Debug, Default)]
pub struct Lang {
    locales: FxHashMap<String, FxHashMap<Message, String>>,
}

impl Lang {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register templates for a locale. Unknown keys are skipped.
    pub fn register(&mut self, locale: &str, templates: impl IntoIterator<Item = (String, String)>) {
        let table = self.locales.entry(locale.to_lowercase()).or_default();
        for (key, template) in templates {
            match Message::from_key(&key) {
                Some(message) => {
                    table.insert(message, template);
                }
                None => tracing::debug!("Ignoring unknown message key {key} for locale {locale}"),
            }
        }
    }

    /// Load every `<locale>.json` in `dir`. A missing directory is not an
    /// error. Returns the number of locales loaded.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be listed.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Ok(0);
        }

        let mut loaded = 0;
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(locale) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let parsed = fs::read_to_string(&path)
                .map_err(crate::Error::from)
                .and_then(|raw| {
                    serde_json::from_str::<FxHashMap<String, String>>(&raw).map_err(Into::into)
                });
            match parsed {
                Ok(templates) => {
                    self.register(locale, templates);
                    loaded += 1;
                }
                Err(e) => tracing::warn!("Skipping locale file {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }

    /// Template for `message` in `locale`, falling back to English.
    pub fn template(&self, message: Message, locale: Option<&str>) -> &str {
        locale
            .and_then(|locale| self.locales.get(&locale.to_lowercase()))
            .or_else(|| self.locales.get(DEFAULT_LOCALE))
            .and_then(|table| table.get(&message))
            .map_or_else(|| message.english(), String::as_str)
    }

    pub fn get(&self, message: Message, locale: Option<&str>, args: &[String]) -> String {
        format(self.template(message, locale), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_placeholders() {
        assert_eq!(
            format("{0} is a {1} zone, {0}!", &["5".into(), "day".into()]),
            "5 is a day zone, 5!"
        );
        assert_eq!(format("no args", &[]), "no args");
    }

    #[test]
    fn test_english_fallback() {
        let lang = Lang::new();
        assert_eq!(
            lang.get(Message::ZoneRemoved, Some("de"), &["5".into()]),
            "Success: disabled timezone with ID 5"
        );
    }

    #[test]
    fn test_locale_override_and_key_fallback() {
        let mut lang = Lang::new();
        lang.register(
            "de",
            [("ZoneRemoved".to_string(), "Zeitzone {0} entfernt".to_string())],
        );

        assert_eq!(
            lang.get(Message::ZoneRemoved, Some("DE"), &["5".into()]),
            "Zeitzone 5 entfernt"
        );
        // Missing key in a registered locale falls back to English
        assert_eq!(
            lang.get(Message::InvalidDayOrNight, Some("de"), &[]),
            Message::InvalidDayOrNight.english()
        );
    }

    #[test]
    fn test_keys_round_trip() {
        for message in Message::ALL {
            assert_eq!(Message::from_key(message.key()), Some(message));
        }
        assert_eq!(Message::from_key("Activated"), None);
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("fr.json"),
            r#"{"ZoneSet": "Zone {0} reglee sur {1}.", "Bogus": "x"}"#,
        )
        .unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut lang = Lang::new();
        assert_eq!(lang.load_dir(dir.path()).unwrap(), 1);
        assert_eq!(
            lang.get(Message::ZoneSet, Some("fr"), &["5".into(), "day".into()]),
            "Zone 5 reglee sur day."
        );
    }

    #[test]
    fn test_load_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut lang = Lang::new();
        assert_eq!(lang.load_dir(dir.path().join("lang")).unwrap(), 0);
    }
}
