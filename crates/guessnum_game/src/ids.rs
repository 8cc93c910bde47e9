//! Identifiers shared by the session service and its clients.

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Letters in a multiplayer room code.
pub const ROOM_CODE_LEN: usize = 4;

/// Prefix that marks a single-player session id.
pub const SINGLE_PLAYER_PREFIX: &str = "SINGLE_";

/// Longest accepted display name, in characters.
pub const MAX_NAME_LEN: usize = 10;

/// Why an identifier or name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum IdError {
    /// Room code is not four letters.
    #[display("invalid room code '{code}': expected 4 letters")]
    RoomCode {
        /// The rejected input.
        code: String,
    },
    /// Session id is neither a room code nor a single-player id.
    #[display("invalid session id '{id}'")]
    SessionId {
        /// The rejected input.
        id: String,
    },
    /// Name is blank.
    #[display("player name must not be empty")]
    EmptyName,
    /// Name exceeds [`MAX_NAME_LEN`].
    #[display("player name must be at most 10 characters, got {len}")]
    NameTooLong {
        /// Character count supplied.
        len: usize,
    },
}

/// Four uppercase letters identifying a host/guesser room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Parses a room code, trimming and upper-casing the input.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let code = raw.trim().to_ascii_uppercase();
        let valid = code.chars().count() == ROOM_CODE_LEN
            && code.chars().all(|c| c.is_ascii_uppercase());
        if valid {
            Ok(Self(code))
        } else {
            Err(IdError::RoomCode {
                code: raw.to_string(),
            })
        }
    }

    /// Generates a random candidate code.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..ROOM_CODE_LEN)
            .map(|_| char::from(rng.random_range(b'A'..=b'Z')))
            .collect();
        Self(code)
    }

    /// The code as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomCode {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomCode {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

/// Identifies a session on the service: a shared room or a solo game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SessionId {
    /// A host/guesser room.
    Room(RoomCode),
    /// A single-player game against the service; holds the full id including prefix.
    SinglePlayer(String),
}

impl SessionId {
    /// Parses either form of id.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let trimmed = raw.trim();
        if let Some(suffix) = trimmed.strip_prefix(SINGLE_PLAYER_PREFIX) {
            if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Ok(Self::SinglePlayer(trimmed.to_string()));
            }
            return Err(IdError::SessionId {
                id: raw.to_string(),
            });
        }

        RoomCode::parse(trimmed).map(Self::Room).map_err(|_| IdError::SessionId {
            id: raw.to_string(),
        })
    }

    /// Builds a single-player id from a millisecond timestamp.
    pub fn single_player(stamp_millis: i64) -> Self {
        Self::SinglePlayer(format!("{SINGLE_PLAYER_PREFIX}{stamp_millis}"))
    }

    /// Whether this id names a solo game.
    pub fn is_single_player(&self) -> bool {
        matches!(self, Self::SinglePlayer(_))
    }

    /// The id as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Room(code) => code.as_str(),
            Self::SinglePlayer(id) => id,
        }
    }
}

impl From<RoomCode> for SessionId {
    fn from(code: RoomCode) -> Self {
        Self::Room(code)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        match id {
            SessionId::Room(code) => code.into(),
            SessionId::SinglePlayer(id) => id,
        }
    }
}

/// A trimmed, non-empty display name of at most ten characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Validates a display name.
    pub fn parse(raw: &str) -> Result<Self, IdError> {
        let name = raw.trim();
        let len = name.chars().count();
        if len == 0 {
            return Err(IdError::EmptyName);
        }
        if len > MAX_NAME_LEN {
            return Err(IdError::NameTooLong { len });
        }
        Ok(Self(name.to_string()))
    }

    /// The name as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerName {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}
