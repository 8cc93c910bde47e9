//! Session backend speaking JSON over HTTP to the session service.

use std::time::Duration;

use async_trait::async_trait;
use guessnum_game::wire::{
    AckResponse, CreateGameRequest, CreateGameResponse, CreateSinglePlayerRequest,
    CreateSinglePlayerResponse, GameStatusResponse, JoinGameRequest, JoinGameResponse,
    LeaveGameRequest, Reply, SubmitGuessRequest, SubmitGuessResponse,
};
use guessnum_game::{Guess, PlayerName, RoomCode, Secret, SessionId};
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};

use super::{GuessOutcome, JoinedRoom, SessionBackend, StatusSnapshot};
use crate::config::ClientConfig;
use crate::error::SessionError;

/// The call being made, used to interpret failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
enum Operation {
    #[strum(serialize = "create game")]
    CreateGame,
    #[strum(serialize = "create single-player game")]
    CreateSinglePlayer,
    #[strum(serialize = "join game")]
    JoinGame,
    #[strum(serialize = "submit guess")]
    SubmitGuess,
    #[strum(serialize = "poll status")]
    PollStatus,
    #[strum(serialize = "leave game")]
    LeaveGame,
}

/// Client for the session service.
#[derive(Debug, Clone)]
pub struct RemoteSession {
    /// Service root, including the `/api` mount, without trailing slash.
    base_url: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl RemoteSession {
    /// Creates a client for the service at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SessionError::unavailable(format!("Failed to build HTTP client: {}", e)))?;

        info!("Remote session backend ready");
        Ok(Self {
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Creates a client from `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, SessionError> {
        Self::new(config.server_url(), config.request_timeout())
    }

    /// The service root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post<Req, Resp>(&self, op: Operation, path: &str, body: &Req) -> Result<Resp, SessionError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned + Reply,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::read(op, response).await
    }

    async fn get<Resp>(&self, op: Operation, path: &str) -> Result<Resp, SessionError>
    where
        Resp: DeserializeOwned + Reply,
    {
        let response = self.client.get(self.url(path)).send().await?;
        Self::read(op, response).await
    }

    async fn read<Resp>(op: Operation, response: reqwest::Response) -> Result<Resp, SessionError>
    where
        Resp: DeserializeOwned + Reply,
    {
        let status = response.status();
        let text = response.text().await?;
        debug!(%op, %status, body = %text, "Service replied");

        if !status.is_success() {
            let message = serde_json::from_str::<AckResponse>(&text)
                .ok()
                .and_then(|ack| ack.error)
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(classify(op, Some(status), &message));
        }

        let body: Resp = serde_json::from_str(&text)
            .map_err(|e| SessionError::unavailable(format!("Malformed {} reply: {}", op, e)))?;

        if !body.is_success() {
            let message = body.error_message().unwrap_or("request refused").to_string();
            return Err(classify(op, None, &message));
        }

        Ok(body)
    }
}

/// Maps a refused request to an error kind.
///
/// `status` is `None` when the service answered 200 with `success: false`.
#[track_caller]
fn classify(op: Operation, status: Option<StatusCode>, message: &str) -> SessionError {
    let text = format!("{} failed: {}", op, message);
    match status {
        Some(StatusCode::NOT_FOUND) => SessionError::not_found(text),
        Some(StatusCode::CONFLICT) => SessionError::conflict(text),
        Some(StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => {
            if op == Operation::JoinGame && message.to_lowercase().contains("full") {
                SessionError::conflict(text)
            } else {
                SessionError::validation(text)
            }
        }
        Some(_) => SessionError::unavailable(text),
        None => match op {
            Operation::JoinGame | Operation::SubmitGuess => SessionError::conflict(text),
            _ => SessionError::unavailable(text),
        },
    }
}

#[async_trait]
impl SessionBackend for RemoteSession {
    #[instrument(skip_all, fields(player = %player))]
    async fn create_game(
        &self,
        player: &PlayerName,
        secret: &Secret,
        candidate: Option<&RoomCode>,
    ) -> Result<RoomCode, SessionError> {
        let request = CreateGameRequest::new(
            player.to_string(),
            secret.to_string(),
            candidate.map(ToString::to_string),
        );
        let reply: CreateGameResponse = self
            .post(Operation::CreateGame, "create-game", &request)
            .await?;

        let raw = reply
            .room_code
            .ok_or_else(|| SessionError::unavailable("create game reply has no room code"))?;
        let code = RoomCode::parse(&raw)
            .map_err(|e| SessionError::unavailable(format!("Service sent bad room code: {}", e)))?;

        info!(room_code = %code, "Room created");
        Ok(code)
    }

    #[instrument(skip_all, fields(player = %player))]
    async fn create_single_player(&self, player: &PlayerName) -> Result<SessionId, SessionError> {
        let request = CreateSinglePlayerRequest::new(player.to_string());
        let reply: CreateSinglePlayerResponse = self
            .post(Operation::CreateSinglePlayer, "create-single-player", &request)
            .await?;

        let raw = reply
            .game_id
            .ok_or_else(|| SessionError::unavailable("single-player reply has no game id"))?;
        let id = SessionId::parse(&raw)
            .map_err(|e| SessionError::unavailable(format!("Service sent bad game id: {}", e)))?;

        info!(game_id = %id, "Single-player game created");
        Ok(id)
    }

    #[instrument(skip_all, fields(room_code = %code, player = %player))]
    async fn join_game(
        &self,
        code: &RoomCode,
        player: &PlayerName,
    ) -> Result<JoinedRoom, SessionError> {
        let request = JoinGameRequest::new(code.to_string(), player.to_string());
        let reply: JoinGameResponse = self
            .post(Operation::JoinGame, "join-game", &request)
            .await?;

        let host_name = reply.host_name.unwrap_or_default();
        info!(host = %host_name, existing = reply.guesses.len(), "Joined room");
        Ok(JoinedRoom {
            host_name,
            history: reply.guesses,
        })
    }

    #[instrument(skip_all, fields(session = %id, guess = %guess))]
    async fn submit_guess(&self, id: &SessionId, guess: &Guess) -> Result<GuessOutcome, SessionError> {
        let request = SubmitGuessRequest::new(id.to_string(), guess.to_string());
        let reply: SubmitGuessResponse = self
            .post(Operation::SubmitGuess, "submit-guess", &request)
            .await?;

        let record = reply
            .result
            .ok_or_else(|| SessionError::unavailable("submit guess reply has no result"))?;

        debug!(
            matched_digits = record.score.matched_digits(),
            matched_positions = record.score.matched_positions(),
            total = reply.total_guesses,
            "Guess scored"
        );
        Ok(GuessOutcome {
            record,
            total_guesses: reply.total_guesses,
            revealed_secret: reply.secret_number,
        })
    }

    #[instrument(skip_all, fields(session = %id))]
    async fn poll_status(&self, id: &SessionId) -> Result<StatusSnapshot, SessionError> {
        let reply: GameStatusResponse = self
            .get(Operation::PollStatus, &format!("game-status/{}", id))
            .await?;

        Ok(StatusSnapshot {
            active: reply.game_active,
            host_name: reply.host_name,
            guesser_name: reply.guesser_name,
            history: reply.guesses,
            total_guesses: reply.total_guesses,
        })
    }

    #[instrument(skip_all, fields(session = %id))]
    async fn leave_game(&self, id: &SessionId) -> Result<(), SessionError> {
        let request = LeaveGameRequest::new(id.to_string());
        let result: Result<AckResponse, SessionError> =
            self.post(Operation::LeaveGame, "leave-game", &request).await;
        if let Err(e) = &result {
            warn!(error = %e, "Leave request failed");
        }
        result.map(|_| ())
    }
}
