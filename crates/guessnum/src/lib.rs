//! Guess-the-number client.
//!
//! [`GameClient`] keeps one game session: it validates input, talks to a
//! [`SessionBackend`] ([`RemoteSession`] for the session service,
//! [`LocalSession`] for offline single-player), polls multiplayer sessions
//! with a [`Poller`], and folds every reply into a [`SessionMachine`] that
//! publishes [`SessionEvent`]s for a presenter such as [`console`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod backend;
mod client;
mod config;
mod error;
mod machine;
mod poller;
mod session;

pub mod console;

pub use backend::{
    GuessOutcome, JoinedRoom, LocalSession, RemoteSession, SessionBackend, StatusSnapshot,
};
pub use client::GameClient;
pub use config::{ClientConfig, ConfigError, SERVER_URL_ENV};
pub use error::{SessionError, SessionErrorKind};
pub use machine::{MachineState, SessionEvent, SessionMachine};
pub use poller::Poller;
pub use session::{GameSession, HistoryEntry, Role, SessionStatus};
