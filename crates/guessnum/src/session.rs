//! Client-side view of one game.

use chrono::{DateTime, Utc};
use derive_getters::Getters;
use guessnum_game::wire::GuessRecord;
use guessnum_game::{Guess, MAX_GUESSES, PlayerName, ScoreResult, Secret, SessionId, Verdict, judge};

/// The part this client plays in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Role {
    /// Picked the secret and watches the guesser.
    Host,
    /// Joined a room to find the host's secret.
    Guesser,
    /// Plays alone against a secret chosen by the backend.
    #[strum(serialize = "Single player")]
    SinglePlayerSelf,
}

impl Role {
    /// Whether this role submits guesses.
    pub fn guesses(self) -> bool {
        matches!(self, Role::Guesser | Role::SinglePlayerSelf)
    }
}

/// Lifecycle of a [`GameSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum SessionStatus {
    /// Host is waiting for a guesser.
    AwaitingOpponent,
    /// Guesses are being made.
    Active,
    /// The secret was found.
    Won,
    /// Every guess was used without finding the secret.
    Lost,
    /// Left before the end.
    Abandoned,
}

impl SessionStatus {
    /// Whether no further guesses can change the outcome.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionStatus::Won | SessionStatus::Lost | SessionStatus::Abandoned
        )
    }
}

/// One guess in submission order.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct HistoryEntry {
    /// The guessed digits as the backend recorded them.
    guess: String,
    /// Its score.
    score: ScoreResult,
    /// Position in the history, starting at 1.
    sequence: usize,
    /// When the backend recorded it.
    timestamp: DateTime<Utc>,
    /// Taken from a submit reply and not yet confirmed by a status poll.
    provisional: bool,
}

impl HistoryEntry {
    /// Builds the entry for `record` at 1-based `sequence`.
    pub fn from_record(record: &GuessRecord, sequence: usize, provisional: bool) -> Self {
        Self {
            guess: record.guess.clone(),
            score: record.score,
            sequence,
            timestamp: DateTime::from_timestamp_millis(record.timestamp).unwrap_or_else(Utc::now),
            provisional,
        }
    }

    /// Builds a full history from service records, all confirmed.
    pub fn confirmed(records: &[GuessRecord]) -> Vec<Self> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| Self::from_record(record, i + 1, false))
            .collect()
    }
}

/// Everything the client knows about the game it is in.
#[derive(Debug, Clone, Getters)]
pub struct GameSession {
    /// Room code or single-player id.
    pub(crate) id: SessionId,
    /// This client's part.
    pub(crate) role: Role,
    /// This client's display name.
    pub(crate) player_name: PlayerName,
    /// Known only to the host.
    pub(crate) secret: Option<Secret>,
    /// Guesses in submission order.
    pub(crate) history: Vec<HistoryEntry>,
    /// Guess budget.
    pub(crate) max_guesses: usize,
    /// Lifecycle.
    pub(crate) status: SessionStatus,
    /// The other party's name, once known.
    pub(crate) opponent_name: Option<String>,
    /// Secret disclosed by the backend when the game ended.
    pub(crate) revealed_secret: Option<String>,
}

impl GameSession {
    pub(crate) fn new(id: SessionId, role: Role, player_name: PlayerName, status: SessionStatus) -> Self {
        Self {
            id,
            role,
            player_name,
            secret: None,
            history: Vec::new(),
            max_guesses: MAX_GUESSES,
            status,
            opponent_name: None,
            revealed_secret: None,
        }
    }

    /// Guesses left before the game is lost.
    pub fn remaining_guesses(&self) -> usize {
        self.max_guesses.saturating_sub(self.history.len())
    }

    /// Outcome implied by the history.
    pub fn verdict(&self) -> Verdict {
        judge(self.history.iter().map(HistoryEntry::score), self.max_guesses)
    }

    /// The secret, if this client is allowed to know it yet.
    pub fn known_secret(&self) -> Option<&str> {
        self.secret
            .as_ref()
            .map(Secret::as_str)
            .or(self.revealed_secret.as_deref())
    }

    /// Whether `guess` was already tried.
    pub fn has_tried(&self, guess: &Guess) -> bool {
        self.history.iter().any(|entry| entry.guess == guess.as_str())
    }
}
