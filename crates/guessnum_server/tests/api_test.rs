//! HTTP-level tests for the session service router.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use guessnum_game::Secret;
use guessnum_server::{GameStore, router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    router(GameStore::new())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app.clone().oneshot(request).await.expect("Router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn create_room(app: &Router, host: &str, secret: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/create-game",
        Some(json!({"playerName": host, "secretNumber": secret})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "create failed: {body}");
    body["roomCode"].as_str().expect("room code").to_string()
}

#[tokio::test]
async fn test_create_join_guess_status_flow() {
    let app = app();
    let code = create_room(&app, "Ada", "1234").await;
    assert_eq!(code.len(), 4);
    assert!(code.chars().all(|c| c.is_ascii_uppercase()));

    let (status, body) = call(&app, Method::GET, &format!("/api/game-status/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["gameActive"], json!(false));
    assert!(body.get("guesserName").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/join-game",
        Some(json!({"roomCode": code.to_lowercase(), "playerName": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hostName"], json!("Ada"));
    assert_eq!(body["guesses"], json!([]));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/submit-guess",
        Some(json!({"roomCode": code, "guess": "4321"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["correctNumbers"], json!(4));
    assert_eq!(body["result"]["correctPositions"], json!(0));
    assert_eq!(body["result"]["isWin"], json!(false));
    assert_eq!(body["totalGuesses"], json!(1));
    assert!(body.get("secretNumber").is_none());

    let (_, body) = call(&app, Method::GET, &format!("/api/game-status/{code}"), None).await;
    assert_eq!(body["gameActive"], json!(true));
    assert_eq!(body["guesserName"], json!("Bob"));
    assert_eq!(body["totalGuesses"], json!(1));
    assert_eq!(body["guesses"][0]["guess"], json!("4321"));
}

#[tokio::test]
async fn test_error_status_codes() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/create-game",
        Some(json!({"playerName": "", "secretNumber": "1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().expect("message").contains("player name"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/join-game",
        Some(json!({"roomCode": "NOPE", "playerName": "Bob"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let code = create_room(&app, "Ada", "1234").await;
    let join = json!({"roomCode": code, "playerName": "Bob"});
    let (status, _) = call(&app, Method::POST, "/api/join-game", Some(join.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = call(&app, Method::POST, "/api/join-game", Some(join)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Room is full"));

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/submit-guess",
        Some(json!({"roomCode": code, "guess": "1223"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_single_player_reveals_secret_on_win() {
    let store = GameStore::with_secret_source(Arc::new(|| {
        Secret::parse("5739").expect("valid secret")
    }));
    let app = router(store);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/create-single-player",
        Some(json!({"playerName": "Solo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["gameId"].as_str().expect("game id").to_string();
    assert!(id.starts_with("SINGLE_"));
    assert!(body.get("secretNumber").is_none());

    let (_, body) = call(
        &app,
        Method::POST,
        "/api/submit-guess",
        Some(json!({"roomCode": id, "guess": "5739"})),
    )
    .await;
    assert_eq!(body["result"]["isWin"], json!(true));
    assert_eq!(body["secretNumber"], json!("5739"));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/submit-guess",
        Some(json!({"roomCode": id, "guess": "1234"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Game is over"));
}

#[tokio::test]
async fn test_leave_and_health() {
    let app = app();
    let code = create_room(&app, "Ada", "1234").await;

    let (_, body) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["active_games"], json!(1));

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/leave-game",
        Some(json!({"roomCode": code})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, _) = call(&app, Method::GET, &format!("/api/game-status/{code}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/health", None).await;
    assert_eq!(body["active_games"], json!(0));
}
