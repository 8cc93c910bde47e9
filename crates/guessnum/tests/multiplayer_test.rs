//! Host and guesser clients playing through a live session service.

mod common;

use std::sync::Arc;

use common::{LossyBackend, PATIENCE, POLL, client, drain, observed, poll_until, remote, spawn_server};
use guessnum::{MachineState, Role, SessionErrorKind, SessionEvent};
use guessnum_game::{MAX_GUESSES, Verdict};
use guessnum_server::GameStore;

#[tokio::test]
async fn test_host_and_guesser_converge() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, mut host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    assert_eq!(host.state(), MachineState::AwaitingOpponent);
    assert_eq!(host.role(), Some(Role::Host));
    assert!(host.is_polling());
    assert!(!host.can_submit());

    let host_name = guesser
        .join_game(&code.as_str().to_lowercase(), "Bob")
        .await
        .expect("join");
    assert_eq!(host_name, "Ada");
    assert_eq!(guesser.state(), MachineState::Active);
    assert_eq!(guesser.role(), Some(Role::Guesser));
    assert!(guesser.can_submit());

    poll_until(&mut host, |c| c.state() == MachineState::Active).await;
    assert!(drain(&mut host_rx).contains(&SessionEvent::OpponentJoined { name: "Bob".into() }));

    let score = guesser.submit_guess("4321").await.expect("submit");
    assert_eq!(score.matched_digits(), 4);
    assert_eq!(score.matched_positions(), 0);
    assert!(!score.is_win());
    assert_eq!(guesser.state(), MachineState::Active);
    assert_eq!(guesser.history().len(), 1);
    assert_eq!(guesser.remaining_guesses(), Some(MAX_GUESSES - 1));

    poll_until(&mut host, |c| c.history().len() == 1).await;
    assert_eq!(observed(&drain(&mut host_rx)), 1);

    for _ in 0..3 {
        let polled = tokio::time::timeout(PATIENCE, host.next_poll())
            .await
            .expect("poll in time");
        assert!(polled);
    }
    assert_eq!(host.history().len(), 1);
    assert_eq!(host.state(), MachineState::Active);
    assert_eq!(observed(&drain(&mut host_rx)), 0);
}

#[tokio::test]
async fn test_guesser_history_confirmed_by_next_poll() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, _host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(code.as_str(), "Bob").await.expect("join");

    guesser.submit_guess("1256").await.expect("submit");
    assert!(*guesser.history()[0].provisional());

    poll_until(&mut guesser, |c| !*c.history()[0].provisional()).await;
    let entry = &guesser.history()[0];
    assert_eq!(entry.guess(), "1256");
    assert_eq!(entry.score().matched_digits(), 2);
    assert_eq!(entry.score().matched_positions(), 2);
    assert_eq!(*entry.sequence(), 1);
}

#[tokio::test]
async fn test_guesser_win_ends_both_sides() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, mut host_rx) = client(remote(&url));
    let (mut guesser, mut guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(code.as_str(), "Bob").await.expect("join");

    guesser.submit_guess("4321").await.expect("first guess");
    let score = guesser.submit_guess("1234").await.expect("winning guess");
    assert!(score.is_win());
    assert_eq!(guesser.state(), MachineState::Won);
    assert!(!guesser.is_polling());
    assert!(drain(&mut guesser_rx).contains(&SessionEvent::GameOver {
        verdict: Verdict::Won,
        secret: Some("1234".into()),
    }));

    let err = guesser.submit_guess("5678").await.expect_err("game over");
    assert_eq!(err.kind, SessionErrorKind::IllegalOperation);

    poll_until(&mut host, |c| c.state() == MachineState::Won).await;
    assert!(!host.is_polling());
    let events = drain(&mut host_rx);
    assert_eq!(observed(&events), 2);
    assert!(events.contains(&SessionEvent::GameOver {
        verdict: Verdict::Won,
        secret: Some("1234".into()),
    }));
    assert!(!host.next_poll().await);
}

#[tokio::test]
async fn test_fifteen_misses_lose_and_sixteenth_is_rejected() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, _host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(code.as_str(), "Bob").await.expect("join");

    for _ in 0..MAX_GUESSES {
        guesser.submit_guess("5678").await.expect("miss");
    }
    assert_eq!(guesser.state(), MachineState::Lost);
    assert_eq!(guesser.history().len(), MAX_GUESSES);
    assert_eq!(guesser.remaining_guesses(), Some(0));
    assert!(!guesser.can_submit());

    let err = guesser.submit_guess("5678").await.expect_err("no guesses left");
    assert_eq!(err.kind, SessionErrorKind::IllegalOperation);
    assert_eq!(guesser.history().len(), MAX_GUESSES);

    poll_until(&mut host, |c| c.state() == MachineState::Lost).await;
    assert_eq!(host.history().len(), MAX_GUESSES);
}

#[tokio::test]
async fn test_guard_and_validation_errors() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, _host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));
    let (mut late, _late_rx) = client(remote(&url));

    let err = host.create_game("Ada", "1123").await.expect_err("repeated digit");
    assert_eq!(err.kind, SessionErrorKind::Validation);
    let err = host.create_game("", "1234").await.expect_err("empty name");
    assert_eq!(err.kind, SessionErrorKind::Validation);
    assert_eq!(host.state(), MachineState::Idle);

    let code = host.create_game("Ada", "1234").await.expect("create");
    let err = host.submit_guess("4321").await.expect_err("host does not guess");
    assert_eq!(err.kind, SessionErrorKind::IllegalOperation);
    let err = host.create_game("Ada", "5678").await.expect_err("already hosting");
    assert_eq!(err.kind, SessionErrorKind::IllegalOperation);

    let err = guesser.join_game("AB1", "Bob").await.expect_err("bad code");
    assert_eq!(err.kind, SessionErrorKind::Validation);
    let unknown = if code.as_str() == "ZZZZ" { "YYYY" } else { "ZZZZ" };
    let err = guesser.join_game(unknown, "Bob").await.expect_err("unknown room");
    assert_eq!(err.kind, SessionErrorKind::NotFound);
    assert_eq!(guesser.state(), MachineState::Idle);

    guesser.join_game(code.as_str(), "Bob").await.expect("join");
    let err = late.join_game(code.as_str(), "Cy").await.expect_err("room full");
    assert_eq!(err.kind, SessionErrorKind::Conflict);

    let err = guesser.submit_guess("12a4").await.expect_err("not digits");
    assert_eq!(err.kind, SessionErrorKind::Validation);
    assert!(guesser.history().is_empty());
}

#[tokio::test]
async fn test_leave_while_waiting() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, mut host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    drain(&mut host_rx);
    assert!(host.leave().await);
    assert_eq!(host.state(), MachineState::Idle);
    assert!(!host.is_polling());
    assert!(host.session().is_none());
    assert!(!host.leave().await);

    let events = drain(&mut host_rx);
    assert!(matches!(events.first(), Some(SessionEvent::Abandoned { .. })));

    let err = guesser.join_game(code.as_str(), "Bob").await.expect_err("room gone");
    assert_eq!(err.kind, SessionErrorKind::NotFound);
}

#[tokio::test]
async fn test_room_stays_joinable_when_leave_is_lost() {
    let url = spawn_server(GameStore::new()).await;
    let lossy = Arc::new(LossyBackend::new(remote(&url)).fail_leave());
    let (mut host, _host_rx) = client(lossy);
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    assert!(host.leave().await);
    assert_eq!(host.state(), MachineState::Idle);
    assert!(!host.is_polling());

    let host_name = guesser.join_game(code.as_str(), "Bob").await.expect("join");
    assert_eq!(host_name, "Ada");
}

#[tokio::test]
async fn test_failed_polls_are_swallowed() {
    let url = spawn_server(GameStore::new()).await;
    let lossy = Arc::new(LossyBackend::new(remote(&url)).fail_polls(3));
    let (mut host, _host_rx) = client(lossy.clone());
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(code.as_str(), "Bob").await.expect("join");

    poll_until(&mut host, |c| c.state() == MachineState::Active).await;
    assert_eq!(lossy.polls_left_to_fail(), 0);
    assert!(host.is_polling());
}

#[tokio::test]
async fn test_new_game_after_finish() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, _host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let first = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(first.as_str(), "Bob").await.expect("join");
    let err = guesser.join_game(first.as_str(), "Bob").await.expect_err("mid game");
    assert_eq!(err.kind, SessionErrorKind::IllegalOperation);

    guesser.submit_guess("1234").await.expect("win");
    assert_eq!(guesser.state(), MachineState::Won);

    guesser.create_game("Bob", "9876").await.expect("new game");
    assert_eq!(guesser.state(), MachineState::AwaitingOpponent);
    assert_eq!(guesser.role(), Some(Role::Host));
    assert!(guesser.history().is_empty());
    assert!(guesser.is_polling());

    poll_until(&mut host, |c| c.state() == MachineState::Won).await;
    assert_eq!(host.history().len(), 1);
    assert!(!host.is_polling());
}

#[tokio::test]
async fn test_host_sees_result_after_guesser_moves_on() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, _host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(code.as_str(), "Bob").await.expect("join");
    guesser.submit_guess("1234").await.expect("win");
    guesser.start_single_player("Bob").await.expect("solo game");
    assert_eq!(guesser.state(), MachineState::Active);

    poll_until(&mut host, |c| c.state() == MachineState::Won).await;
    assert_eq!(host.history().len(), 1);
}

#[tokio::test]
async fn test_first_poll_after_submit_confirms_it() {
    let url = spawn_server(GameStore::new()).await;
    let (mut host, _host_rx) = client(remote(&url));
    let (mut guesser, _guesser_rx) = client(remote(&url));

    let code = host.create_game("Ada", "1234").await.expect("create");
    guesser.join_game(code.as_str(), "Bob").await.expect("join");

    // Let many polls land unread before submitting.
    tokio::time::sleep(POLL * 30).await;
    guesser.submit_guess("1256").await.expect("submit");
    assert!(*guesser.history()[0].provisional());

    let polled = tokio::time::timeout(PATIENCE, guesser.next_poll())
        .await
        .expect("poll in time");
    assert!(polled);
    assert_eq!(guesser.history().len(), 1);
    assert!(!*guesser.history()[0].provisional());
}
