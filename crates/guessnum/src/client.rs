//! The game client: backend calls, state machine and polling in one value.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use guessnum_game::{Guess, PlayerName, RoomCode, ScoreResult, Secret, SessionId};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::backend::SessionBackend;
use crate::error::SessionError;
use crate::machine::{MachineState, SessionEvent, SessionMachine};
use crate::poller::Poller;
use crate::session::{GameSession, HistoryEntry, Role};

/// Plays one game at a time against a [`SessionBackend`].
///
/// Inputs are validated before any network call. Polling runs while a
/// multiplayer session is waiting or active and stops on every terminal
/// transition.
pub struct GameClient {
    backend: Arc<dyn SessionBackend>,
    machine: SessionMachine,
    poller: Option<Poller>,
    poll_interval: Duration,
}

impl fmt::Debug for GameClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameClient")
            .field("state", &self.machine.state())
            .field("polling", &self.is_polling())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl GameClient {
    /// Creates an idle client publishing events on `events`.
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        poll_interval: Duration,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            backend,
            machine: SessionMachine::new(events),
            poller: None,
            poll_interval,
        }
    }

    /// Opens a room hiding `secret` and waits for a guesser.
    #[instrument(skip(self, secret))]
    pub async fn create_game(
        &mut self,
        player_name: &str,
        secret: &str,
    ) -> Result<RoomCode, SessionError> {
        let player = PlayerName::parse(player_name)?;
        let secret = Secret::parse(secret)?;
        self.retire_finished().await?;

        let candidate = RoomCode::generate(&mut rand::rng());
        let code = self
            .backend
            .create_game(&player, &secret, Some(&candidate))
            .await?;
        if code != candidate {
            debug!(%candidate, %code, "Service picked another room code");
        }

        self.machine
            .host(SessionId::Room(code.clone()), player, secret)?;
        self.start_polling();
        info!(room_code = %code, "Hosting room");
        Ok(code)
    }

    /// Starts a solo game against a backend-chosen secret.
    #[instrument(skip(self))]
    pub async fn start_single_player(&mut self, player_name: &str) -> Result<SessionId, SessionError> {
        let player = PlayerName::parse(player_name)?;
        self.retire_finished().await?;

        let id = self.backend.create_single_player(&player).await?;
        self.machine.single_player(id.clone(), player)?;
        info!(game_id = %id, "Single-player game started");
        Ok(id)
    }

    /// Joins room `room_code` as the guesser. Returns the host's name.
    #[instrument(skip(self))]
    pub async fn join_game(
        &mut self,
        room_code: &str,
        player_name: &str,
    ) -> Result<String, SessionError> {
        let code = RoomCode::parse(room_code)?;
        let player = PlayerName::parse(player_name)?;
        self.retire_finished().await?;

        let joined = self.backend.join_game(&code, &player).await?;
        self.machine.guest(
            SessionId::Room(code),
            player,
            joined.host_name.clone(),
            &joined.history,
        )?;
        if self.machine.state().is_live() {
            self.start_polling();
        }
        Ok(joined.host_name)
    }

    /// Submits one guess and returns its score.
    ///
    /// Requires a guessing role in an active game; otherwise fails with
    /// `IllegalOperation` before any network call.
    #[instrument(skip(self))]
    pub async fn submit_guess(&mut self, guess: &str) -> Result<ScoreResult, SessionError> {
        let id = self.machine.ensure_can_guess()?.clone();
        let guess = Guess::parse(guess)?;

        let outcome = self.backend.submit_guess(&id, &guess).await?;
        let score = outcome.record.score;
        self.machine.record_guess(&guess, outcome);

        if self.machine.state().is_terminal() {
            self.stop_polling();
        }
        Ok(score)
    }

    /// Leaves the current session, whatever its state.
    ///
    /// The backend is told on a best-effort basis; a failure is logged and
    /// the local session is cleared anyway. Returns `false` when idle.
    #[instrument(skip(self))]
    pub async fn leave(&mut self) -> bool {
        self.stop_polling();
        let Some(id) = self.machine.leave() else {
            return false;
        };
        self.notify_left(&id).await;
        true
    }

    /// Waits for the next current status poll and applies it.
    ///
    /// Snapshots older than the local history, such as a poll that raced a
    /// submit, are skipped. Returns `false` when no polling is running.
    pub async fn next_poll(&mut self) -> bool {
        loop {
            let Some(poller) = self.poller.as_mut() else {
                return false;
            };
            let Some(snapshot) = poller.next().await else {
                self.poller = None;
                return false;
            };

            let applied = self.machine.reconcile(&snapshot);
            if !self.machine.state().is_live() {
                self.stop_polling();
                return true;
            }
            if applied {
                return true;
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> MachineState {
        self.machine.state()
    }

    /// Current session, if any.
    pub fn session(&self) -> Option<&GameSession> {
        self.machine.session()
    }

    /// This client's role, if in a session.
    pub fn role(&self) -> Option<Role> {
        self.session().map(|s| *s.role())
    }

    /// Guess history, oldest first.
    pub fn history(&self) -> &[HistoryEntry] {
        self.session().map(|s| s.history().as_slice()).unwrap_or(&[])
    }

    /// Guesses left, or `None` outside a session.
    pub fn remaining_guesses(&self) -> Option<usize> {
        self.session().map(GameSession::remaining_guesses)
    }

    /// Whether [`GameClient::submit_guess`] would pass its guard.
    pub fn can_submit(&self) -> bool {
        self.machine.ensure_can_guess().is_ok()
    }

    /// Whether status polling is running.
    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(Poller::is_running)
    }

    fn start_polling(&mut self) {
        // Solo games have nobody else changing them.
        let id = match self.machine.session() {
            Some(session) if !session.id().is_single_player() => session.id().clone(),
            _ => return,
        };

        self.stop_polling();
        self.poller = Some(Poller::start(
            Arc::clone(&self.backend),
            id,
            self.poll_interval,
        ));
    }

    fn stop_polling(&mut self) -> bool {
        self.poller
            .take()
            .is_some_and(|mut poller| poller.cancel())
    }

    async fn retire_finished(&mut self) -> Result<(), SessionError> {
        let role = self.role();
        let Some(id) = self.machine.clear_finished()? else {
            return Ok(());
        };
        self.stop_polling();

        // A guesser's room belongs to its host, who may not have polled the
        // end yet. The sweeper collects it.
        if role == Some(Role::Guesser) {
            debug!(session = %id, "Leaving finished room to its host");
        } else {
            self.notify_left(&id).await;
        }
        Ok(())
    }

    async fn notify_left(&self, id: &SessionId) {
        if let Err(e) = self.backend.leave_game(id).await {
            warn!(session = %id, error = %e, "Backend did not acknowledge leave");
        }
    }
}
