use std::io;

use thiserror::Error;

use crate::lang::Message;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A rejected `timezone` command. Every variant maps to a reply message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("caller lacks permission {0}")]
    AdminsOnly(String),
    #[error("invalid syntax")]
    Syntax,
    #[error("zone id is not a number")]
    InvalidZoneId,
    #[error("time must be day or night")]
    InvalidDayOrNight,
    #[error("zone {0} does not exist")]
    ZoneNotFound(String),
    #[error("zone {0} is not a timezone")]
    ZoneNotConfigured(String),
    #[error("no player matches {0}")]
    NoPlayerFound(String),
}

impl CommandError {
    /// The message key and its arguments.
    pub fn message(&self) -> (Message, Vec<String>) {
        match self {
            Self::AdminsOnly(permission) => (Message::AdminsOnly, vec![permission.clone()]),
            Self::Syntax => (Message::Syntax, Vec::new()),
            Self::InvalidZoneId => (Message::InvalidZoneId, Vec::new()),
            Self::InvalidDayOrNight => (Message::InvalidDayOrNight, Vec::new()),
            Self::ZoneNotFound(zone) => (Message::ZoneNotFound, vec![zone.clone()]),
            Self::ZoneNotConfigured(zone) => (Message::ZoneNotConfigured, vec![zone.clone()]),
            Self::NoPlayerFound(query) => (Message::NoPlayerFound, vec![query.clone()]),
        }
    }
}
