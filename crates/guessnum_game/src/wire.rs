//! JSON bodies exchanged with the session service.
//!
//! Field names follow the service's camelCase contract. Request fields carry raw
//! strings so the service can report its own validation errors.

use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::score::ScoreResult;

/// One scored guess as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct GuessRecord {
    /// The guessed digits.
    pub guess: String,
    /// Its score.
    #[serde(flatten)]
    pub score: ScoreResult,
    /// Submission time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// `POST /create-game`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Host display name.
    pub player_name: String,
    /// The secret the guesser must find.
    pub secret_number: String,
    /// Client-proposed room code; the service may pick another.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<String>,
}

/// Reply to [`CreateGameRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    /// Whether the room was created.
    #[serde(default)]
    pub success: bool,
    /// The authoritative room code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<String>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /create-single-player`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct CreateSinglePlayerRequest {
    /// Player display name.
    pub player_name: String,
}

/// Reply to [`CreateSinglePlayerRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSinglePlayerResponse {
    /// Whether the game was created.
    #[serde(default)]
    pub success: bool,
    /// Single-player session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_id: Option<String>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /join-game`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    /// Room to join.
    pub room_code: String,
    /// Guesser display name.
    pub player_name: String,
}

/// Reply to [`JoinGameRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameResponse {
    /// Whether the join succeeded.
    #[serde(default)]
    pub success: bool,
    /// The host's display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Guesses already made in the room.
    #[serde(default)]
    pub guesses: Vec<GuessRecord>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /submit-guess`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGuessRequest {
    /// Room code or single-player id.
    pub room_code: String,
    /// The guessed digits.
    pub guess: String,
}

/// Reply to [`SubmitGuessRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGuessResponse {
    /// Whether the guess was accepted.
    #[serde(default)]
    pub success: bool,
    /// The stored, scored guess.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<GuessRecord>,
    /// Guesses made so far, including this one.
    #[serde(default)]
    pub total_guesses: usize,
    /// The secret, present once the game is over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_number: Option<String>,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to `GET /game-status/{roomCode}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatusResponse {
    /// Whether the lookup succeeded.
    #[serde(default)]
    pub success: bool,
    /// Whether guesses are currently accepted.
    #[serde(default)]
    pub game_active: bool,
    /// Host (or solo player) display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Guesser display name once someone joined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guesser_name: Option<String>,
    /// Full guess history in submission order.
    #[serde(default)]
    pub guesses: Vec<GuessRecord>,
    /// Length of `guesses`.
    #[serde(default)]
    pub total_guesses: usize,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /leave-game`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGameRequest {
    /// Room code or single-player id.
    pub room_code: String,
}

/// Bare acknowledgement, also the body of every failed request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckResponse {
    /// Whether the request succeeded.
    #[serde(default)]
    pub success: bool,
    /// Failure description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    /// A successful acknowledgement.
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    /// A failure carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Reply to `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, new)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"healthy"` when the service answers.
    pub status: String,
    /// Server time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Rooms and solo games currently stored.
    #[serde(rename = "active_games")]
    pub active_games: usize,
}

/// Common view over service replies.
pub trait Reply {
    /// Whether the service reported success.
    fn is_success(&self) -> bool;

    /// The service's failure description, if any.
    fn error_message(&self) -> Option<&str>;
}

macro_rules! impl_reply {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Reply for $ty {
                fn is_success(&self) -> bool {
                    self.success
                }

                fn error_message(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )+
    };
}

impl_reply!(
    CreateGameResponse,
    CreateSinglePlayerResponse,
    JoinGameResponse,
    SubmitGuessResponse,
    GameStatusResponse,
    AckResponse,
);
