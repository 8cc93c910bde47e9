//! Guess-the-number rules shared by the session service and its clients.
//!
//! A setter hides a [`Secret`] of four distinct digits; a guesser has
//! [`MAX_GUESSES`] attempts to find it. Each [`Guess`] is scored with
//! [`evaluate`], and [`judge`] decides when a game is over.
//!
//! The [`wire`] module holds the JSON bodies of the session service protocol.
//!
//! # Example
//!
//! ```
//! use guessnum_game::{Guess, Secret, Verdict, judge, MAX_GUESSES};
//!
//! let secret: Secret = "1234".parse().unwrap();
//! let guess: Guess = "4321".parse().unwrap();
//! let score = secret.score(&guess);
//! assert_eq!(score.matched_digits(), 4);
//! assert_eq!(score.matched_positions(), 0);
//! assert_eq!(judge([score].iter(), MAX_GUESSES), Verdict::InProgress);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod code;
mod ids;
mod score;
pub mod wire;

pub use code::{CODE_LEN, Code, CodeError, Guess, Secret};
pub use ids::{
    IdError, MAX_NAME_LEN, PlayerName, ROOM_CODE_LEN, RoomCode, SINGLE_PLAYER_PREFIX, SessionId,
};
pub use score::{MAX_GUESSES, ScoreResult, Verdict, evaluate, judge};
