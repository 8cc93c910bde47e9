//! Where sessions live: the remote session service or this process.

mod local;
mod remote;

pub use local::LocalSession;
pub use remote::RemoteSession;

use async_trait::async_trait;
use guessnum_game::wire::GuessRecord;
use guessnum_game::{Guess, PlayerName, RoomCode, Secret, SessionId};

use crate::error::SessionError;

/// Reply to a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRoom {
    /// The host's display name.
    pub host_name: String,
    /// Guesses already made in the room.
    pub history: Vec<GuessRecord>,
}

/// Reply to an accepted guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuessOutcome {
    /// The stored, scored guess.
    pub record: GuessRecord,
    /// Guesses made so far, including this one.
    pub total_guesses: usize,
    /// Disclosed once the game is over.
    pub revealed_secret: Option<String>,
}

/// One status poll.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    /// Whether guesses are currently accepted.
    pub active: bool,
    /// Host (or solo player) name.
    pub host_name: Option<String>,
    /// Guesser name once someone joined.
    pub guesser_name: Option<String>,
    /// Full history in submission order.
    pub history: Vec<GuessRecord>,
    /// Length of the history as the backend counts it.
    pub total_guesses: usize,
}

impl StatusSnapshot {
    /// Whether a guesser has joined.
    pub fn opponent_joined(&self) -> bool {
        self.guesser_name.is_some()
    }
}

/// Session operations, each an independent call.
///
/// Inputs arrive already validated; implementations only report what the
/// backend itself refuses.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Opens a room with `secret`, proposing `candidate` as its code.
    async fn create_game(
        &self,
        player: &PlayerName,
        secret: &Secret,
        candidate: Option<&RoomCode>,
    ) -> Result<RoomCode, SessionError>;

    /// Starts a solo game; the backend picks and keeps the secret.
    async fn create_single_player(&self, player: &PlayerName) -> Result<SessionId, SessionError>;

    /// Takes the guesser seat in `code`.
    async fn join_game(&self, code: &RoomCode, player: &PlayerName)
    -> Result<JoinedRoom, SessionError>;

    /// Scores `guess` in session `id`.
    async fn submit_guess(&self, id: &SessionId, guess: &Guess)
    -> Result<GuessOutcome, SessionError>;

    /// Reads the session without changing it.
    async fn poll_status(&self, id: &SessionId) -> Result<StatusSnapshot, SessionError>;

    /// Drops the session.
    async fn leave_game(&self, id: &SessionId) -> Result<(), SessionError>;
}
