//! Client-side game state machine.
//!
//! `Idle -> AwaitingOpponent -> Active -> {Won | Lost}`, with an explicit leave
//! returning any state to `Idle`. Every transition and every newly observed guess
//! is published once as a [`SessionEvent`].

use guessnum_game::wire::GuessRecord;
use guessnum_game::{Guess, PlayerName, Secret, SessionId, Verdict};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::backend::{GuessOutcome, StatusSnapshot};
use crate::error::SessionError;
use crate::session::{GameSession, HistoryEntry, Role, SessionStatus};

/// Where the machine is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum MachineState {
    /// No session.
    Idle,
    /// Hosting a room nobody joined yet.
    AwaitingOpponent,
    /// Guesses are being made.
    Active,
    /// The secret was found.
    Won,
    /// The guess budget ran out.
    Lost,
}

impl MachineState {
    /// Whether the game has finished.
    pub fn is_terminal(self) -> bool {
        matches!(self, MachineState::Won | MachineState::Lost)
    }

    /// Whether the session still changes on the backend.
    pub fn is_live(self) -> bool {
        matches!(self, MachineState::AwaitingOpponent | MachineState::Active)
    }
}

/// Notifications for a presenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The machine moved between states.
    StateChanged {
        /// Previous state.
        from: MachineState,
        /// New state.
        to: MachineState,
    },
    /// The other party is known.
    OpponentJoined {
        /// Their display name.
        name: String,
    },
    /// A guess appeared in the history for the first time.
    GuessObserved(HistoryEntry),
    /// The game ended.
    GameOver {
        /// How it ended.
        verdict: Verdict,
        /// The secret, when this client may see it.
        secret: Option<String>,
    },
    /// The session was left before it was cleared.
    Abandoned {
        /// The session that was left.
        id: SessionId,
    },
}

/// Owns the current [`GameSession`] and publishes its changes.
#[derive(Debug)]
pub struct SessionMachine {
    state: MachineState,
    session: Option<GameSession>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl SessionMachine {
    /// Creates an idle machine publishing on `events`.
    pub fn new(events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        Self {
            state: MachineState::Idle,
            session: None,
            events,
        }
    }

    /// Current state.
    pub fn state(&self) -> MachineState {
        self.state
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No presenter listening for session events");
        }
    }

    fn transition(&mut self, to: MachineState) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        info!(%from, %to, "Session state changed");
        self.emit(SessionEvent::StateChanged { from, to });
    }

    fn require_idle(&self) -> Result<(), SessionError> {
        if self.state == MachineState::Idle {
            Ok(())
        } else {
            Err(SessionError::illegal(format!(
                "Cannot start a game while {}",
                self.state
            )))
        }
    }

    /// Clears a finished session so a new game can start.
    ///
    /// Returns the cleared id. Fails while a game is waiting or running.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn clear_finished(&mut self) -> Result<Option<SessionId>, SessionError> {
        match self.state {
            MachineState::Idle => Ok(None),
            MachineState::Won | MachineState::Lost => {
                let id = self.session.take().map(|s| s.id);
                self.transition(MachineState::Idle);
                Ok(id)
            }
            MachineState::AwaitingOpponent | MachineState::Active => Err(SessionError::illegal(
                "Leave the current game before starting another",
            )),
        }
    }

    /// Enters a freshly created room as its host.
    #[instrument(skip_all, fields(session = %id))]
    pub fn host(
        &mut self,
        id: SessionId,
        player: PlayerName,
        secret: Secret,
    ) -> Result<(), SessionError> {
        self.require_idle()?;
        let mut session = GameSession::new(id, Role::Host, player, SessionStatus::AwaitingOpponent);
        session.secret = Some(secret);
        self.session = Some(session);
        self.transition(MachineState::AwaitingOpponent);
        Ok(())
    }

    /// Enters a joined room as its guesser.
    #[instrument(skip_all, fields(session = %id, existing = existing.len()))]
    pub fn guest(
        &mut self,
        id: SessionId,
        player: PlayerName,
        host_name: String,
        existing: &[GuessRecord],
    ) -> Result<(), SessionError> {
        self.require_idle()?;
        let mut session = GameSession::new(id, Role::Guesser, player, SessionStatus::Active);
        session.history = HistoryEntry::confirmed(existing);
        session.opponent_name = Some(host_name.clone());
        self.session = Some(session);
        self.transition(MachineState::Active);
        self.emit(SessionEvent::OpponentJoined { name: host_name });
        self.settle();
        Ok(())
    }

    /// Enters a solo game.
    #[instrument(skip_all, fields(session = %id))]
    pub fn single_player(&mut self, id: SessionId, player: PlayerName) -> Result<(), SessionError> {
        self.require_idle()?;
        let session = GameSession::new(id, Role::SinglePlayerSelf, player, SessionStatus::Active);
        self.session = Some(session);
        self.transition(MachineState::Active);
        Ok(())
    }

    /// Checks that this client may submit a guess now.
    pub fn ensure_can_guess(&self) -> Result<&SessionId, SessionError> {
        let session = match (&self.session, self.state) {
            (Some(session), MachineState::Active) => session,
            (_, state) => {
                return Err(SessionError::illegal(format!(
                    "Cannot guess while {}",
                    state
                )));
            }
        };

        if !session.role.guesses() {
            return Err(SessionError::illegal(format!(
                "{} does not guess",
                session.role
            )));
        }
        if session.remaining_guesses() == 0 {
            return Err(SessionError::illegal("No guesses left"));
        }
        Ok(&session.id)
    }

    /// Applies the backend's reply to this client's guess.
    #[instrument(skip_all, fields(guess = %guess, total = outcome.total_guesses))]
    pub fn record_guess(&mut self, guess: &Guess, outcome: GuessOutcome) {
        let Some(session) = self.session.as_mut() else {
            warn!("Guess reply arrived without a session");
            return;
        };
        if self.state != MachineState::Active {
            warn!(state = %self.state, "Guess reply arrived after the game ended");
            return;
        }

        // Polled sessions confirm the entry on the next status poll.
        let provisional = !session.id.is_single_player();
        let entry = HistoryEntry::from_record(&outcome.record, session.history.len() + 1, provisional);
        session.history.push(entry.clone());
        if outcome.revealed_secret.is_some() {
            session.revealed_secret = outcome.revealed_secret;
        }
        debug!(
            local = session.history.len(),
            service = outcome.total_guesses,
            "Guess recorded"
        );

        self.emit(SessionEvent::GuessObserved(entry));
        self.settle();
    }

    /// Folds a status poll into the session.
    ///
    /// The service history replaces the local one; entries past the previous
    /// length are announced. Snapshots shorter than the local history are stale
    /// and ignored. Returns whether the snapshot was applied.
    #[instrument(skip_all, fields(state = %self.state, polled = snapshot.history.len()))]
    pub fn reconcile(&mut self, snapshot: &StatusSnapshot) -> bool {
        if !self.state.is_live() {
            debug!("Ignoring poll for a settled session");
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let known = session.history.len();
        if snapshot.history.len() < known {
            debug!(known, "Ignoring stale poll");
            return false;
        }

        let opponent = match session.role {
            Role::Host => snapshot.guesser_name.clone(),
            Role::Guesser => snapshot.host_name.clone(),
            Role::SinglePlayerSelf => None,
        };
        let newly_joined = session.opponent_name.is_none() && opponent.is_some();
        if newly_joined {
            session.opponent_name = opponent.clone();
        }
        let starts = self.state == MachineState::AwaitingOpponent
            && (snapshot.opponent_joined() || !snapshot.history.is_empty());

        session.history = HistoryEntry::confirmed(&snapshot.history);
        let fresh: Vec<HistoryEntry> = session.history[known..].to_vec();

        if starts {
            session.status = SessionStatus::Active;
            self.transition(MachineState::Active);
        }
        if let (true, Some(name)) = (newly_joined, opponent) {
            self.emit(SessionEvent::OpponentJoined { name });
        }
        for entry in fresh {
            self.emit(SessionEvent::GuessObserved(entry));
        }
        self.settle();
        true
    }

    /// Moves to `Won` or `Lost` when the history says the game is over.
    fn settle(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if self.state != MachineState::Active {
            return;
        }

        let (status, to) = match session.verdict() {
            Verdict::InProgress => return,
            Verdict::Won => (SessionStatus::Won, MachineState::Won),
            Verdict::Lost => (SessionStatus::Lost, MachineState::Lost),
        };
        session.status = status;
        let verdict = session.verdict();
        let secret = session.known_secret().map(ToString::to_string);

        self.transition(to);
        self.emit(SessionEvent::GameOver { verdict, secret });
    }

    /// Abandons the session and returns to `Idle`.
    ///
    /// Returns the left session's id, or `None` when already idle.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn leave(&mut self) -> Option<SessionId> {
        let mut session = self.session.take()?;
        session.status = SessionStatus::Abandoned;
        let id = session.id.clone();

        info!(session = %id, "Session abandoned");
        self.emit(SessionEvent::Abandoned { id: id.clone() });
        self.transition(MachineState::Idle);
        Some(id)
    }
}
