#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! HTTP client tests against in-process user and room services.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use battleship_client::{
    BattleshipError, HttpConfig, RoomObservation, RoomPoller, RoomServiceClient, RoomStatus,
    ServiceEndpoints, SessionContext, UserServiceClient,
};

// ════════════════════════════════════════════════════════════════════
// In-process services
// ════════════════════════════════════════════════════════════════════

#[derive(Clone, Default)]
struct Services {
    users: Arc<Mutex<Vec<String>>>,
    rooms: Arc<Mutex<HashMap<String, Value>>>,
}

fn rejected(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

async fn register(State(s): State<Services>, Json(body): Json<Value>) -> Response {
    let name = body["username"].as_str().unwrap_or_default().to_string();
    let mut users = s.users.lock().unwrap();
    if users.contains(&name) {
        return rejected(StatusCode::BAD_REQUEST, "Username already exists");
    }
    users.push(name.clone());
    Json(json!({ "message": format!("User {name} registered successfully") })).into_response()
}

async fn login(State(s): State<Services>, Json(body): Json<Value>) -> Response {
    let name = body["username"].as_str().unwrap_or_default();
    if !s.users.lock().unwrap().iter().any(|u| u == name) {
        return rejected(StatusCode::NOT_FOUND, "User not found");
    }
    Json(json!({ "message": format!("Welcome back, {name}!") })).into_response()
}

async fn users(State(s): State<Services>) -> Json<Value> {
    Json(json!({ "registered_users": *s.users.lock().unwrap() }))
}

async fn list_rooms(State(s): State<Services>) -> Json<Value> {
    Json(json!(*s.rooms.lock().unwrap()))
}

async fn create_room(State(s): State<Services>, Json(body): Json<Value>) -> Response {
    let id = body["room_id"].as_str().unwrap_or_default().to_string();
    let mut rooms = s.rooms.lock().unwrap();
    if rooms.contains_key(&id) {
        return rejected(StatusCode::BAD_REQUEST, "Room already exists");
    }
    rooms.insert(
        id.clone(),
        json!({ "host": body["host_player"], "guest": null, "status": "waiting" }),
    );
    Json(json!({ "message": format!("Room {id} created") })).into_response()
}

async fn join_room(State(s): State<Services>, Json(body): Json<Value>) -> Response {
    let id = body["room_id"].as_str().unwrap_or_default();
    let mut rooms = s.rooms.lock().unwrap();
    let Some(room) = rooms.get_mut(id) else {
        return rejected(StatusCode::NOT_FOUND, "Room not found");
    };
    if !room["guest"].is_null() {
        return rejected(StatusCode::BAD_REQUEST, "Room is full");
    }
    room["guest"] = body["guest_player"].clone();
    Json(json!({ "message": format!("Joined room {id}") })).into_response()
}

async fn start_game(
    State(s): State<Services>,
    Path(room_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut rooms = s.rooms.lock().unwrap();
    let Some(room) = rooms.get_mut(&room_id) else {
        return rejected(StatusCode::NOT_FOUND, "Room not found");
    };
    if query.get("username").map(String::as_str) != room["host"].as_str() {
        return rejected(StatusCode::FORBIDDEN, "Only host can start the game");
    }
    room["status"] = json!("started");
    Json(json!({ "message": "Game started", "details": { "message": "game_created" } }))
        .into_response()
}

async fn bare_failure() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Serve both services on one ephemeral port.
async fn spawn_services() -> (ServiceEndpoints, Services) {
    let services = Services::default();
    let app = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/users", get(users))
        .route("/list_rooms", get(list_rooms))
        .route("/create_room", post(create_room))
        .route("/join_room", post(join_room))
        .route("/start_game/{room_id}", post(start_game))
        .with_state(services.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base = format!("http://{addr}");
    let endpoints = ServiceEndpoints {
        user: base.clone(),
        room: base,
        ..ServiceEndpoints::default()
    };
    (endpoints, services)
}

fn clients(endpoints: &ServiceEndpoints) -> (UserServiceClient, RoomServiceClient) {
    let config = HttpConfig::default();
    (
        UserServiceClient::new(endpoints.clone(), &config).unwrap(),
        RoomServiceClient::new(endpoints.clone(), &config).unwrap(),
    )
}

// ════════════════════════════════════════════════════════════════════
// User service
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn register_then_login() {
    let (endpoints, _) = spawn_services().await;
    let (users, _) = clients(&endpoints);

    let message = users.register("  alice ").await.unwrap();
    assert_eq!(message, "User alice registered successfully");
    assert_eq!(users.login("alice").await.unwrap(), "Welcome back, alice!");
    assert_eq!(users.list_users().await.unwrap(), vec!["alice".to_string()]);
}

#[tokio::test]
async fn rejection_detail_is_shown_verbatim() {
    let (endpoints, _) = spawn_services().await;
    let (users, _) = clients(&endpoints);

    users.register("alice").await.unwrap();
    let err = users.register("alice").await.unwrap_err();
    assert!(matches!(err, BattleshipError::Rejected { status: 400, .. }));
    assert_eq!(err.user_message(), "Username already exists");

    let err = users.login("nobody").await.unwrap_err();
    assert_eq!(err.user_message(), "User not found");
}

#[tokio::test]
async fn rejection_without_detail_uses_fallback() {
    let app = Router::new().route("/login", post(bare_failure));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let endpoints = ServiceEndpoints {
        user: format!("http://{addr}"),
        ..ServiceEndpoints::default()
    };
    let (users, _) = clients(&endpoints);
    let err = users.login("alice").await.unwrap_err();
    assert!(matches!(err, BattleshipError::Rejected { status: 500, .. }));
    assert_eq!(err.user_message(), "Request failed");
}

#[tokio::test]
async fn context_login_and_logout() {
    let (endpoints, _) = spawn_services().await;
    let (users, _) = clients(&endpoints);
    let mut ctx = SessionContext::new();

    let err = ctx.login(&users, "ghost").await.unwrap_err();
    assert_eq!(err.user_message(), "User not found");
    assert!(!ctx.is_logged_in());

    ctx.register(&users, "luke").await.unwrap();
    assert_eq!(ctx.username(), Some("luke"));

    ctx.logout();
    assert!(ctx.require_user().is_err());

    ctx.login(&users, " luke").await.unwrap();
    assert_eq!(ctx.username(), Some("luke"));
}

// ════════════════════════════════════════════════════════════════════
// Room service
// ════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn room_lifecycle() {
    let (endpoints, _) = spawn_services().await;
    let (_, rooms) = clients(&endpoints);

    rooms.create_room("R1", "alice").await.unwrap();
    rooms.join_room("R1", "bob").await.unwrap();

    let listed = rooms.list_rooms().await.unwrap();
    let room = listed.get("R1").unwrap();
    assert_eq!(room.host, "alice");
    assert_eq!(room.guest.as_deref(), Some("bob"));
    assert_eq!(room.status, RoomStatus::Waiting);

    let err = rooms.join_room("R1", "carol").await.unwrap_err();
    assert_eq!(err.user_message(), "Room is full");

    let err = rooms.start_game("R1", "bob").await.unwrap_err();
    assert!(matches!(err, BattleshipError::Rejected { status: 403, .. }));
    assert_eq!(err.user_message(), "Only host can start the game");

    let reply = rooms.start_game("R1", "alice").await.unwrap();
    assert_eq!(reply.message, "Game started");
    assert_eq!(
        rooms.list_rooms().await.unwrap().get("R1").unwrap().status,
        RoomStatus::Started
    );
}

#[tokio::test]
async fn poller_sees_the_host_start_the_game() {
    let (endpoints, _) = spawn_services().await;
    let (_, rooms) = clients(&endpoints);
    rooms.create_room("R1", "alice").await.unwrap();
    rooms.join_room("R1", "bob").await.unwrap();

    let (poller, started) = RoomPoller::spawn(rooms.clone(), "R1", Duration::from_millis(50));
    let mut updates = poller.subscribe();
    updates
        .wait_for(|o| {
            matches!(o, RoomObservation::Found(room) if room.status == RoomStatus::Waiting)
        })
        .await
        .unwrap();

    rooms.start_game("R1", "alice").await.unwrap();
    let room = tokio::time::timeout(Duration::from_secs(5), started)
        .await
        .expect("poller never saw the start")
        .unwrap();
    assert_eq!(room.room_id, "R1");
    assert!(room.is_host("alice"));
}

#[tokio::test]
async fn poller_reports_missing_room() {
    let (endpoints, _) = spawn_services().await;
    let (_, rooms) = clients(&endpoints);

    let (poller, _started) = RoomPoller::spawn(rooms, "nope", Duration::from_millis(50));
    let mut updates = poller.subscribe();
    updates
        .wait_for(|o| *o == RoomObservation::NotFound)
        .await
        .unwrap();
}
