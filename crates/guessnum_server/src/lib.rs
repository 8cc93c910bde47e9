//! Guess-the-number session service.
//!
//! Keeps every room in memory and speaks the JSON protocol from
//! [`guessnum_game::wire`]:
//!
//! - `POST /api/create-game`, `POST /api/create-single-player`
//! - `POST /api/join-game`, `POST /api/submit-guess`, `POST /api/leave-game`
//! - `GET /api/game-status/{roomCode}`, `GET /api/health`
//!
//! Rooms older than the configured TTL are removed by a background sweeper.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod routes;
mod store;

pub use config::{ConfigError, ServerConfig};
pub use error::ApiError;
pub use routes::router;
pub use store::{GameStore, GuessAccepted, Room, Seats, SecretSource, StoreError, spawn_sweeper};

use tokio::net::TcpListener;
use tracing::{info, instrument};

/// Serves `store` on an already bound listener until the server stops.
pub async fn serve(listener: TcpListener, store: GameStore) -> std::io::Result<()> {
    axum::serve(listener, router(store)).await
}

/// Binds according to `config`, starts the sweeper and serves forever.
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
pub async fn run(config: ServerConfig) -> std::io::Result<()> {
    let store = GameStore::new();
    let sweeper = spawn_sweeper(store.clone(), config.room_ttl(), config.sweep_interval());

    let listener = TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!(addr = %listener.local_addr()?, "Session service listening");

    let result = serve(listener, store).await;
    sweeper.abort();
    result
}
