//! In-memory room storage for the session service.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use guessnum_game::wire::GuessRecord;
use guessnum_game::{
    Guess, MAX_GUESSES, PlayerName, RoomCode, Secret, SessionId, Verdict, judge,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Why the store refused an operation.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum StoreError {
    /// Malformed name, secret, guess or room code.
    #[display("{message}")]
    Invalid {
        /// What was wrong.
        message: String,
    },
    /// No room or game under that id.
    #[display("{what} not found")]
    NotFound {
        /// "Room" or "Game".
        what: &'static str,
    },
    /// The room is full or not accepting guesses.
    #[display("{message}")]
    Conflict {
        /// What conflicted.
        message: String,
    },
}

impl StoreError {
    fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// Who is in a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Seats {
    /// A host who set the secret, and the guesser once one joins.
    Multiplayer {
        /// Player who chose the secret.
        host: PlayerName,
        /// Player making the guesses.
        guesser: Option<PlayerName>,
    },
    /// One player against a service-generated secret.
    SinglePlayer {
        /// The guessing player.
        player: PlayerName,
    },
}

/// A stored game.
#[derive(Debug, Clone, Getters)]
pub struct Room {
    id: SessionId,
    secret: Secret,
    seats: Seats,
    guesses: Vec<GuessRecord>,
    created_at: DateTime<Utc>,
}

impl Room {
    /// Where the game stands.
    pub fn verdict(&self) -> Verdict {
        judge(self.guesses.iter().map(|g| &g.score), MAX_GUESSES)
    }

    /// Whether a guess may be submitted now.
    pub fn accepts_guesses(&self) -> bool {
        let seated = match &self.seats {
            Seats::Multiplayer { guesser, .. } => guesser.is_some(),
            Seats::SinglePlayer { .. } => true,
        };
        seated && !self.verdict().is_over()
    }

    /// Display name of the host or solo player.
    pub fn host_name(&self) -> &PlayerName {
        match &self.seats {
            Seats::Multiplayer { host, .. } => host,
            Seats::SinglePlayer { player } => player,
        }
    }

    /// Display name of the guesser in a multiplayer room.
    pub fn guesser_name(&self) -> Option<&PlayerName> {
        match &self.seats {
            Seats::Multiplayer { guesser, .. } => guesser.as_ref(),
            Seats::SinglePlayer { .. } => None,
        }
    }
}

/// Result of an accepted guess.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GuessAccepted {
    record: GuessRecord,
    total_guesses: usize,
    revealed_secret: Option<Secret>,
}

/// Produces secrets for single-player games.
pub type SecretSource = Arc<dyn Fn() -> Secret + Send + Sync>;

/// Thread-safe map of every live room.
#[derive(Clone)]
pub struct GameStore {
    rooms: Arc<Mutex<HashMap<SessionId, Room>>>,
    secrets: SecretSource,
}

impl fmt::Debug for GameStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameStore")
            .field("rooms", &self.len())
            .finish_non_exhaustive()
    }
}

impl Default for GameStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStore {
    /// Creates an empty store with random single-player secrets.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating game store");
        Self::with_secret_source(Arc::new(|| Secret::random(&mut rand::rng())))
    }

    /// Creates an empty store drawing single-player secrets from `secrets`.
    pub fn with_secret_source(secrets: SecretSource) -> Self {
        Self {
            rooms: Arc::new(Mutex::new(HashMap::new())),
            secrets,
        }
    }

    fn rooms(&self) -> MutexGuard<'_, HashMap<SessionId, Room>> {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored rooms and solo games.
    pub fn len(&self) -> usize {
        self.rooms().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Opens a multiplayer room, honouring `candidate` when it is valid and free.
    #[instrument(skip(self, secret))]
    pub fn create_game(
        &self,
        host_name: &str,
        secret: &str,
        candidate: Option<&str>,
    ) -> Result<RoomCode, StoreError> {
        let host = PlayerName::parse(host_name)
            .map_err(|e| StoreError::invalid(format!("Invalid player name: {e}")))?;
        let secret = Secret::parse(secret)
            .map_err(|e| StoreError::invalid(format!("Invalid secret number: {e}")))?;

        let mut rooms = self.rooms();
        let taken = |code: &RoomCode| rooms.contains_key(&SessionId::Room(code.clone()));

        let code = match candidate.and_then(|c| RoomCode::parse(c).ok()) {
            Some(code) if !taken(&code) => code,
            _ => {
                let mut rng = rand::rng();
                let mut code = RoomCode::generate(&mut rng);
                while taken(&code) {
                    code = RoomCode::generate(&mut rng);
                }
                code
            }
        };

        let id = SessionId::Room(code.clone());
        rooms.insert(
            id.clone(),
            Room {
                id,
                secret,
                seats: Seats::Multiplayer {
                    host,
                    guesser: None,
                },
                guesses: Vec::new(),
                created_at: Utc::now(),
            },
        );

        info!(room_code = %code, "Created multiplayer room");
        Ok(code)
    }

    /// Starts a solo game whose secret stays in the store.
    #[instrument(skip(self))]
    pub fn create_single_player(&self, player_name: &str) -> Result<SessionId, StoreError> {
        let player = PlayerName::parse(player_name)
            .map_err(|e| StoreError::invalid(format!("Invalid player name: {e}")))?;

        let mut rooms = self.rooms();
        let now = Utc::now();
        let mut stamp = now.timestamp_millis();
        let id = loop {
            let id = SessionId::single_player(stamp);
            if !rooms.contains_key(&id) {
                break id;
            }
            stamp += 1;
        };

        rooms.insert(
            id.clone(),
            Room {
                id: id.clone(),
                secret: (self.secrets)(),
                seats: Seats::SinglePlayer { player },
                guesses: Vec::new(),
                created_at: now,
            },
        );

        info!(game_id = %id, "Created single-player game");
        Ok(id)
    }

    /// Seats a guesser, returning the host name and any existing guesses.
    #[instrument(skip(self))]
    pub fn join(
        &self,
        room_code: &str,
        player_name: &str,
    ) -> Result<(PlayerName, Vec<GuessRecord>), StoreError> {
        let joining = PlayerName::parse(player_name)
            .map_err(|e| StoreError::invalid(format!("Invalid player name: {e}")))?;
        let code = RoomCode::parse(room_code)
            .map_err(|e| StoreError::invalid(format!("Invalid room code: {e}")))?;

        let mut rooms = self.rooms();
        let room = rooms
            .get_mut(&SessionId::Room(code.clone()))
            .ok_or(StoreError::NotFound { what: "Room" })?;

        match &mut room.seats {
            Seats::Multiplayer { host, guesser } => {
                if guesser.is_some() {
                    warn!(room_code = %code, "Room already has a guesser");
                    return Err(StoreError::conflict("Room is full"));
                }
                *guesser = Some(joining);
                info!(room_code = %code, "Guesser joined room");
                Ok((host.clone(), room.guesses.clone()))
            }
            Seats::SinglePlayer { .. } => Err(StoreError::NotFound { what: "Room" }),
        }
    }

    /// Scores and records a guess.
    #[instrument(skip(self))]
    pub fn submit_guess(&self, id: &str, guess: &str) -> Result<GuessAccepted, StoreError> {
        let id = SessionId::parse(id).map_err(|_| StoreError::NotFound { what: "Game" })?;

        let mut rooms = self.rooms();
        let room = rooms
            .get_mut(&id)
            .ok_or(StoreError::NotFound { what: "Game" })?;

        let guess = Guess::parse(guess)
            .map_err(|e| StoreError::invalid(format!("Invalid guess: {e}")))?;

        if !room.accepts_guesses() {
            let message = if room.verdict().is_over() {
                "Game is over"
            } else {
                "Game has not started"
            };
            warn!(game_id = %id, message, "Rejected guess");
            return Err(StoreError::conflict(message));
        }

        let record = GuessRecord::new(
            guess.to_string(),
            room.secret.score(&guess),
            Utc::now().timestamp_millis(),
        );
        room.guesses.push(record.clone());

        let verdict = room.verdict();
        let revealed_secret = verdict.is_over().then(|| room.secret.clone());
        info!(
            game_id = %id,
            guess = %guess,
            total = room.guesses.len(),
            %verdict,
            "Recorded guess"
        );

        Ok(GuessAccepted {
            record,
            total_guesses: room.guesses.len(),
            revealed_secret,
        })
    }

    /// Returns a copy of the room for status reporting.
    #[instrument(skip(self))]
    pub fn status(&self, id: &str) -> Result<Room, StoreError> {
        let id = SessionId::parse(id).map_err(|_| StoreError::NotFound { what: "Room" })?;
        let room = self
            .rooms()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { what: "Room" })?;
        debug!(game_id = %id, guesses = room.guesses.len(), "Status lookup");
        Ok(room)
    }

    /// Deletes a room. Unknown ids are ignored.
    #[instrument(skip(self))]
    pub fn leave(&self, id: &str) -> bool {
        let Ok(id) = SessionId::parse(id) else {
            return false;
        };
        let removed = self.rooms().remove(&id).is_some();
        info!(game_id = %id, removed, "Leave requested");
        removed
    }

    /// Removes rooms created more than `ttl` before `now`; returns how many.
    #[instrument(skip(self))]
    pub fn sweep_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let Some(cutoff) = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
        else {
            return 0;
        };

        let mut rooms = self.rooms();
        let before = rooms.len();
        rooms.retain(|_, room| room.created_at >= cutoff);
        before - rooms.len()
    }

    /// Removes rooms older than `ttl`.
    pub fn sweep_expired(&self, ttl: Duration) -> usize {
        self.sweep_expired_at(Utc::now(), ttl)
    }
}

/// Runs [`GameStore::sweep_expired`] every `every` until the task is aborted.
///
/// `every` must be non-zero; [`crate::ServerConfig::validate`] checks it.
pub fn spawn_sweeper(store: GameStore, ttl: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = store.sweep_expired(ttl);
            if removed > 0 {
                info!(removed, remaining = store.len(), "Swept expired rooms");
            } else {
                debug!("No expired rooms");
            }
        }
    })
}
