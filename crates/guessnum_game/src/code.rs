//! Four-digit codes: the secret a setter picks and the guesses made against it.

use std::fmt;
use std::str::FromStr;

use derive_more::{Display, Error};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::score::{ScoreResult, evaluate};

/// Number of digits in every secret and guess.
pub const CODE_LEN: usize = 4;

/// Why a string is not a valid code.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum CodeError {
    /// Not exactly four characters.
    #[display("code must have exactly 4 digits, found {found} characters")]
    WrongLength {
        /// Number of characters supplied.
        found: usize,
    },
    /// A character outside `0-9`.
    #[display("'{ch}' is not a digit")]
    NotADigit {
        /// The offending character.
        ch: char,
    },
    /// A digit used twice.
    #[display("digit '{digit}' appears more than once")]
    RepeatedDigit {
        /// The repeated digit.
        digit: char,
    },
}

/// Four pairwise-distinct decimal digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code {
    digits: String,
}

impl Code {
    /// Parses a code, ignoring surrounding whitespace.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        let trimmed = raw.trim();
        let found = trimmed.chars().count();
        if found != CODE_LEN {
            return Err(CodeError::WrongLength { found });
        }

        let mut seen = Vec::with_capacity(CODE_LEN);
        for ch in trimmed.chars() {
            if !ch.is_ascii_digit() {
                return Err(CodeError::NotADigit { ch });
            }
            if seen.contains(&ch) {
                return Err(CodeError::RepeatedDigit { digit: ch });
            }
            seen.push(ch);
        }

        Ok(Self {
            digits: trimmed.to_string(),
        })
    }

    /// Draws a code uniformly from all codes with distinct digits.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut pool: Vec<char> = ('0'..='9').collect();
        pool.shuffle(rng);
        Self {
            digits: pool.into_iter().take(CODE_LEN).collect(),
        }
    }

    /// The digits as a string slice.
    pub fn as_str(&self) -> &str {
        &self.digits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.digits)
    }
}

impl FromStr for Code {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Code {
    type Error = CodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.digits
    }
}

/// The hidden code a guesser tries to discover.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(Code);

impl Secret {
    /// Parses a secret.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        Code::parse(raw).map(Self)
    }

    /// Generates a random secret.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(Code::random(rng))
    }

    /// The secret digits.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Scores a guess against this secret.
    #[instrument(skip_all, fields(guess = %guess))]
    pub fn score(&self, guess: &Guess) -> ScoreResult {
        evaluate(self.as_str(), guess.as_str())
    }
}

impl From<Code> for Secret {
    fn from(code: Code) -> Self {
        Self(code)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Secret {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// One attempt at the secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guess(Code);

impl Guess {
    /// Parses a guess.
    pub fn parse(raw: &str) -> Result<Self, CodeError> {
        Code::parse(raw).map(Self)
    }

    /// The guessed digits.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Code> for Guess {
    fn from(code: Code) -> Self {
        Self(code)
    }
}

impl fmt::Display for Guess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Guess {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
