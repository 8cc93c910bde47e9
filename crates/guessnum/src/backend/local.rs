//! Offline backend: single-player games scored in this process.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use guessnum_game::wire::GuessRecord;
use guessnum_game::{Guess, MAX_GUESSES, PlayerName, RoomCode, Secret, SessionId, judge};
use tracing::{debug, info, instrument};

use super::{GuessOutcome, JoinedRoom, SessionBackend, StatusSnapshot};
use crate::error::SessionError;

#[derive(Debug)]
struct LocalGame {
    player: PlayerName,
    secret: Secret,
    guesses: Vec<GuessRecord>,
}

impl LocalGame {
    fn is_over(&self) -> bool {
        judge(self.guesses.iter().map(|g| &g.score), MAX_GUESSES).is_over()
    }
}

/// Plays single-player games without a session service.
#[derive(Debug, Default)]
pub struct LocalSession {
    games: Mutex<HashMap<SessionId, LocalGame>>,
    fixed_secret: Option<Secret>,
}

impl LocalSession {
    /// Creates a backend drawing a random secret per game.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose every game hides `secret`.
    pub fn with_secret(secret: Secret) -> Self {
        Self {
            games: Mutex::default(),
            fixed_secret: Some(secret),
        }
    }

    fn games(&self) -> MutexGuard<'_, HashMap<SessionId, LocalGame>> {
        self.games.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn offline_only() -> SessionError {
        SessionError::illegal("Offline play supports single-player games only")
    }
}

#[async_trait]
impl SessionBackend for LocalSession {
    async fn create_game(
        &self,
        _player: &PlayerName,
        _secret: &Secret,
        _candidate: Option<&RoomCode>,
    ) -> Result<RoomCode, SessionError> {
        Err(Self::offline_only())
    }

    #[instrument(skip_all, fields(player = %player))]
    async fn create_single_player(&self, player: &PlayerName) -> Result<SessionId, SessionError> {
        let secret = match &self.fixed_secret {
            Some(secret) => secret.clone(),
            None => Secret::random(&mut rand::rng()),
        };

        let mut games = self.games();
        let mut stamp = Utc::now().timestamp_millis();
        let id = loop {
            let id = SessionId::single_player(stamp);
            if !games.contains_key(&id) {
                break id;
            }
            stamp += 1;
        };

        games.insert(
            id.clone(),
            LocalGame {
                player: player.clone(),
                secret,
                guesses: Vec::new(),
            },
        );

        info!(game_id = %id, "Offline game started");
        Ok(id)
    }

    async fn join_game(
        &self,
        _code: &RoomCode,
        _player: &PlayerName,
    ) -> Result<JoinedRoom, SessionError> {
        Err(Self::offline_only())
    }

    #[instrument(skip_all, fields(session = %id, guess = %guess))]
    async fn submit_guess(&self, id: &SessionId, guess: &Guess) -> Result<GuessOutcome, SessionError> {
        let mut games = self.games();
        let game = games
            .get_mut(id)
            .ok_or_else(|| SessionError::not_found(format!("No offline game {}", id)))?;

        if game.is_over() {
            return Err(SessionError::conflict("Game is over"));
        }

        let score = game.secret.score(guess);
        let record = GuessRecord::new(guess.to_string(), score, Utc::now().timestamp_millis());
        game.guesses.push(record.clone());

        let total_guesses = game.guesses.len();
        let revealed_secret = game
            .is_over()
            .then(|| game.secret.as_str().to_string());

        debug!(total_guesses, is_win = score.is_win(), "Offline guess scored");
        Ok(GuessOutcome {
            record,
            total_guesses,
            revealed_secret,
        })
    }

    async fn poll_status(&self, id: &SessionId) -> Result<StatusSnapshot, SessionError> {
        let games = self.games();
        let game = games
            .get(id)
            .ok_or_else(|| SessionError::not_found(format!("No offline game {}", id)))?;

        Ok(StatusSnapshot {
            active: !game.is_over(),
            host_name: Some(game.player.to_string()),
            guesser_name: None,
            history: game.guesses.clone(),
            total_guesses: game.guesses.len(),
        })
    }

    #[instrument(skip_all, fields(session = %id))]
    async fn leave_game(&self, id: &SessionId) -> Result<(), SessionError> {
        if self.games().remove(id).is_some() {
            info!("Offline game discarded");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionErrorKind;

    fn name() -> PlayerName {
        PlayerName::parse("Solo").expect("name")
    }

    #[tokio::test]
    async fn test_multiplayer_is_illegal_offline() {
        let local = LocalSession::new();
        let code = RoomCode::parse("ABCD").expect("code");
        let err = local.join_game(&code, &name()).await.expect_err("offline join");
        assert_eq!(err.kind, SessionErrorKind::IllegalOperation);
    }

    #[tokio::test]
    async fn test_secret_revealed_on_win_only() {
        let local = LocalSession::with_secret(Secret::parse("5739").expect("secret"));
        let id = local.create_single_player(&name()).await.expect("create");
        assert!(id.is_single_player());

        let miss = local
            .submit_guess(&id, &Guess::parse("1234").expect("guess"))
            .await
            .expect("submit");
        assert_eq!(miss.total_guesses, 1);
        assert!(miss.revealed_secret.is_none());

        let hit = local
            .submit_guess(&id, &Guess::parse("5739").expect("guess"))
            .await
            .expect("submit");
        assert!(hit.record.score.is_win());
        assert_eq!(hit.revealed_secret.as_deref(), Some("5739"));

        let err = local
            .submit_guess(&id, &Guess::parse("1234").expect("guess"))
            .await
            .expect_err("game over");
        assert_eq!(err.kind, SessionErrorKind::Conflict);

        let status = local.poll_status(&id).await.expect("status");
        assert!(!status.active);
        assert_eq!(status.total_guesses, 2);
    }
}
