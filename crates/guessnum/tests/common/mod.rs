//! Shared fixtures: a live session service and a backend that can drop calls.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use guessnum::{
    GameClient, GuessOutcome, JoinedRoom, RemoteSession, SessionBackend, SessionError,
    SessionEvent, StatusSnapshot,
};
use guessnum_game::{Guess, PlayerName, RoomCode, Secret, SessionId};
use guessnum_server::GameStore;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Poll interval used by every test client.
pub const POLL: Duration = Duration::from_millis(20);

/// Upper bound for anything a test waits on.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// Serves `store` on an ephemeral port and returns the `/api` base URL.
pub async fn spawn_server(store: GameStore) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(guessnum_server::serve(listener, store));
    format!("http://{}/api", addr)
}

/// Remote backend for `base_url`.
pub fn remote(base_url: &str) -> Arc<dyn SessionBackend> {
    Arc::new(RemoteSession::new(base_url, Duration::from_secs(5)).expect("remote backend"))
}

/// Client polling every [`POLL`], with its event receiver.
pub fn client(backend: Arc<dyn SessionBackend>) -> (GameClient, mpsc::UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (GameClient::new(backend, POLL, tx), rx)
}

/// Everything published so far.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Number of `GuessObserved` events in `events`.
pub fn observed(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::GuessObserved(_)))
        .count()
}

/// Applies polls until `done` holds, panicking after [`PATIENCE`].
pub async fn poll_until(client: &mut GameClient, done: impl Fn(&GameClient) -> bool) {
    let waiting = async {
        while !done(&*client) {
            assert!(client.next_poll().await, "polling stopped before condition held");
        }
    };
    tokio::time::timeout(PATIENCE, waiting)
        .await
        .expect("condition not reached in time");
}

/// Delegates to another backend, failing selected calls.
pub struct LossyBackend {
    inner: Arc<dyn SessionBackend>,
    fail_leave: AtomicBool,
    failing_polls: AtomicUsize,
}

impl LossyBackend {
    /// Wraps `inner` with every call passing through.
    pub fn new(inner: Arc<dyn SessionBackend>) -> Self {
        Self {
            inner,
            fail_leave: AtomicBool::new(false),
            failing_polls: AtomicUsize::new(0),
        }
    }

    /// Makes every leave call fail.
    pub fn fail_leave(self) -> Self {
        self.fail_leave.store(true, Ordering::SeqCst);
        self
    }

    /// Makes the next `count` polls fail.
    pub fn fail_polls(self, count: usize) -> Self {
        self.failing_polls.store(count, Ordering::SeqCst);
        self
    }

    /// Polls still set to fail.
    pub fn polls_left_to_fail(&self) -> usize {
        self.failing_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBackend for LossyBackend {
    async fn create_game(
        &self,
        player: &PlayerName,
        secret: &Secret,
        candidate: Option<&RoomCode>,
    ) -> Result<RoomCode, SessionError> {
        self.inner.create_game(player, secret, candidate).await
    }

    async fn create_single_player(&self, player: &PlayerName) -> Result<SessionId, SessionError> {
        self.inner.create_single_player(player).await
    }

    async fn join_game(
        &self,
        code: &RoomCode,
        player: &PlayerName,
    ) -> Result<JoinedRoom, SessionError> {
        self.inner.join_game(code, player).await
    }

    async fn submit_guess(&self, id: &SessionId, guess: &Guess) -> Result<GuessOutcome, SessionError> {
        self.inner.submit_guess(id, guess).await
    }

    async fn poll_status(&self, id: &SessionId) -> Result<StatusSnapshot, SessionError> {
        let failed = self
            .failing_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(SessionError::unavailable("connection dropped"));
        }
        self.inner.poll_status(id).await
    }

    async fn leave_game(&self, id: &SessionId) -> Result<(), SessionError> {
        if self.fail_leave.load(Ordering::SeqCst) {
            return Err(SessionError::unavailable("connection dropped"));
        }
        self.inner.leave_game(id).await
    }
}
