//! HTTP routes for the session service.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use guessnum_game::wire::{
    AckResponse, CreateGameRequest, CreateGameResponse, CreateSinglePlayerRequest,
    CreateSinglePlayerResponse, GameStatusResponse, HealthResponse, JoinGameRequest,
    JoinGameResponse, LeaveGameRequest, SubmitGuessRequest, SubmitGuessResponse,
};
use tracing::{debug, info, instrument};

use crate::error::ApiError;
use crate::store::GameStore;

/// Builds the service router with every endpoint mounted under `/api`.
pub fn router(store: GameStore) -> Router {
    let api = Router::new()
        .route("/create-game", post(create_game))
        .route("/create-single-player", post(create_single_player))
        .route("/join-game", post(join_game))
        .route("/submit-guess", post(submit_guess))
        .route("/game-status/{room_code}", get(game_status))
        .route("/leave-game", post(leave_game))
        .route("/health", get(health));

    Router::new().nest("/api", api).with_state(store)
}

#[instrument(skip(store, req), fields(player_name = %req.player_name))]
async fn create_game(
    State(store): State<GameStore>,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let code = store.create_game(
        &req.player_name,
        &req.secret_number,
        req.room_code.as_deref(),
    )?;
    Ok(Json(CreateGameResponse {
        success: true,
        room_code: Some(code.into()),
        error: None,
    }))
}

#[instrument(skip(store, req), fields(player_name = %req.player_name))]
async fn create_single_player(
    State(store): State<GameStore>,
    Json(req): Json<CreateSinglePlayerRequest>,
) -> Result<Json<CreateSinglePlayerResponse>, ApiError> {
    let id = store.create_single_player(&req.player_name)?;
    Ok(Json(CreateSinglePlayerResponse {
        success: true,
        game_id: Some(id.into()),
        error: None,
    }))
}

#[instrument(skip(store, req), fields(room_code = %req.room_code, player_name = %req.player_name))]
async fn join_game(
    State(store): State<GameStore>,
    Json(req): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let (host, guesses) = store.join(&req.room_code, &req.player_name)?;
    Ok(Json(JoinGameResponse {
        success: true,
        host_name: Some(host.into()),
        guesses,
        error: None,
    }))
}

#[instrument(skip(store, req), fields(room_code = %req.room_code, guess = %req.guess))]
async fn submit_guess(
    State(store): State<GameStore>,
    Json(req): Json<SubmitGuessRequest>,
) -> Result<Json<SubmitGuessResponse>, ApiError> {
    let accepted = store.submit_guess(&req.room_code, &req.guess)?;
    Ok(Json(SubmitGuessResponse {
        success: true,
        result: Some(accepted.record().clone()),
        total_guesses: *accepted.total_guesses(),
        secret_number: accepted
            .revealed_secret()
            .as_ref()
            .map(|s| s.as_str().to_string()),
        error: None,
    }))
}

#[instrument(skip(store))]
async fn game_status(
    State(store): State<GameStore>,
    Path(room_code): Path<String>,
) -> Result<Json<GameStatusResponse>, ApiError> {
    let room = store.status(&room_code)?;
    debug!(total = room.guesses().len(), "Reporting status");
    Ok(Json(GameStatusResponse {
        success: true,
        game_active: room.accepts_guesses(),
        host_name: Some(room.host_name().to_string()),
        guesser_name: room.guesser_name().map(ToString::to_string),
        guesses: room.guesses().clone(),
        total_guesses: room.guesses().len(),
        error: None,
    }))
}

#[instrument(skip(store, req), fields(room_code = %req.room_code))]
async fn leave_game(
    State(store): State<GameStore>,
    Json(req): Json<LeaveGameRequest>,
) -> Json<AckResponse> {
    store.leave(&req.room_code);
    Json(AckResponse::ok())
}

async fn health(State(store): State<GameStore>) -> Json<HealthResponse> {
    let active = store.len();
    info!(active_games = active, "Health check");
    Json(HealthResponse::new(
        "healthy".to_string(),
        Utc::now().timestamp_millis(),
        active,
    ))
}
