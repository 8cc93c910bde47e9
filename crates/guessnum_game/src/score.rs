//! Guess evaluation and end-of-game detection.

use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Guesses allowed per game before the guesser loses.
pub const MAX_GUESSES: usize = 15;

/// How close a guess came to the secret.
///
/// Serialized with the field names the session service uses on the wire
/// (`correctNumbers`, `correctPositions`, `isWin`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "correctNumbers")]
    matched_digits: u8,
    #[serde(rename = "correctPositions")]
    matched_positions: u8,
    #[serde(rename = "isWin")]
    is_win: bool,
}

impl ScoreResult {
    /// Builds a score; `is_win` is derived from the position count.
    pub fn new(matched_digits: u8, matched_positions: u8) -> Self {
        Self {
            matched_digits,
            matched_positions,
            is_win: usize::from(matched_positions) == crate::CODE_LEN,
        }
    }

    /// Guessed digits that appear anywhere in the secret.
    pub fn matched_digits(&self) -> u8 {
        self.matched_digits
    }

    /// Guessed digits in the right place.
    pub fn matched_positions(&self) -> u8 {
        self.matched_positions
    }

    /// Whether the guess was the secret.
    pub fn is_win(&self) -> bool {
        self.is_win
    }
}

/// Scores `guess` against `secret`.
///
/// Positions are compared pairwise; digits count once per guess position whose
/// character occurs anywhere in the secret. With well-formed codes this equals the
/// size of the digit-set overlap. Malformed input is scored with the same rules
/// and never panics.
#[instrument(skip(secret))]
pub fn evaluate(secret: &str, guess: &str) -> ScoreResult {
    let matched_positions = guess
        .chars()
        .zip(secret.chars())
        .filter(|(g, s)| g == s)
        .count();
    let matched_digits = guess.chars().filter(|g| secret.contains(*g)).count();

    ScoreResult::new(saturate(matched_digits), saturate(matched_positions))
}

fn saturate(count: usize) -> u8 {
    u8::try_from(count).unwrap_or(u8::MAX)
}

/// Where a game stands given its scored guesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Verdict {
    /// More guesses may be made.
    InProgress,
    /// The secret was found.
    Won,
    /// The guess budget ran out without a win.
    Lost,
}

impl Verdict {
    /// Whether the game has ended.
    pub fn is_over(self) -> bool {
        !matches!(self, Verdict::InProgress)
    }
}

/// Judges a game from its scores in submission order.
pub fn judge<'a, I>(scores: I, max_guesses: usize) -> Verdict
where
    I: IntoIterator<Item = &'a ScoreResult>,
{
    let mut count = 0;
    for score in scores {
        if score.is_win() {
            return Verdict::Won;
        }
        count += 1;
    }

    if count >= max_guesses {
        Verdict::Lost
    } else {
        Verdict::InProgress
    }
}
