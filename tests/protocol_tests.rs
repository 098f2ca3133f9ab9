#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! Wire-format tests for the Battleship client.
//!
//! The fixtures are frames as the game service actually sends them, key
//! order and extra fields included.

use battleship_client::protocol::{
    parse_server_event, Board, Cell, ClientCommand, ServerEvent, ShotResult,
};
use battleship_client::{render, CellClass, SessionState};

// ════════════════════════════════════════════════════════════════════
// Fixtures
// ════════════════════════════════════════════════════════════════════

const CONNECTED_WAITING: &str = r#"{"event": "connected", "message": "waiting_for_game"}"#;

const CONNECTED_IN_GAME: &str = r#"{
    "event": "connected",
    "game_id": "R1",
    "current_turn": "bob",
    "boards": {
        "self": [["O", "O", "~"], ["~", "X", "~"], ["~", "~", "M"]],
        "opponent": [["~", "O", "~"], ["M", "~", "~"], ["~", "~", "X"]]
    }
}"#;

const GAME_CREATED: &str = r#"{
    "event": "game_created",
    "game_id": "R1",
    "players": ["alice", "bob"],
    "current_turn": "alice",
    "boards": {
        "self": [["O", "~"], ["~", "~"]],
        "opponent": [["~", "~"], ["~", "O"]]
    }
}"#;

const MOVE_MADE_WIN: &str = r#"{
    "event": "move_made",
    "game_id": "R1",
    "by": "bob",
    "row": 1,
    "col": 1,
    "result": "sunk Submarine#2 — bob wins!",
    "current_turn": "alice",
    "winner": "bob",
    "boards": {
        "self": [["X", "~"], ["~", "X"]],
        "opponent": [["~", "M"], ["~", "~"]]
    }
}"#;

// ════════════════════════════════════════════════════════════════════
// Inbound events
// ════════════════════════════════════════════════════════════════════

#[test]
fn connected_waiting_has_no_game() {
    let event = parse_server_event(CONNECTED_WAITING).unwrap();
    let ServerEvent::Connected {
        boards,
        current_turn,
        message,
        ..
    } = event
    else {
        panic!("expected connected");
    };
    assert!(boards.is_none());
    assert!(current_turn.is_none());
    assert_eq!(message.as_deref(), Some("waiting_for_game"));
}

#[test]
fn connected_in_game_carries_snapshot() {
    let event = parse_server_event(CONNECTED_IN_GAME).unwrap();
    assert_eq!(event.kind(), "connected");

    let mut state = SessionState::default();
    assert!(!state.apply(&event));
    let boards = state.boards.unwrap();
    assert_eq!(boards.own.size(), 3);
    assert_eq!(boards.own.cell(1, 1), Some(Cell::Hit));
    assert_eq!(boards.opponent.cell(2, 2), Some(Cell::Hit));
    assert_eq!(state.current_turn.as_deref(), Some("bob"));
}

#[test]
fn game_created_lists_players() {
    let event = parse_server_event(GAME_CREATED).unwrap();
    let ServerEvent::GameCreated {
        players,
        current_turn,
        game_id,
        ..
    } = &event
    else {
        panic!("expected game_created");
    };
    assert_eq!(players, &["alice", "bob"]);
    assert_eq!(current_turn.as_deref(), Some("alice"));
    assert_eq!(game_id.as_deref(), Some("R1"));
}

#[test]
fn move_made_with_winner() {
    let event = parse_server_event(MOVE_MADE_WIN).unwrap();
    let ServerEvent::MoveMade {
        by,
        row,
        col,
        result,
        winner,
        ..
    } = &event
    else {
        panic!("expected move_made");
    };
    assert_eq!(by.as_deref(), Some("bob"));
    assert_eq!((*row, *col), (Some(1), Some(1)));
    assert_eq!(winner.as_deref(), Some("bob"));
    assert_eq!(
        ShotResult::parse(result.as_deref().unwrap()),
        ShotResult::Sunk {
            ship: "Submarine#2".into()
        }
    );

    let mut state = SessionState::default();
    assert!(state.apply(&event));
    assert!(state.is_finished());
    // Applying the same frame again does not re-declare the winner.
    assert!(!state.apply(&event));
}

#[test]
fn null_winner_is_unset() {
    let frame = r#"{"event":"move_made","boards":{"self":[],"opponent":[]},"current_turn":"bob","winner":null}"#;
    let event = parse_server_event(frame).unwrap();
    let mut state = SessionState::default();
    assert!(!state.apply(&event));
    assert_eq!(state.winner, None);
}

#[test]
fn unknown_and_malformed_frames_are_dropped() {
    assert!(parse_server_event("not json").is_none());
    assert!(parse_server_event("").is_none());
    assert!(parse_server_event(r#"{"event":"chat","text":"gg"}"#).is_none());
    assert!(parse_server_event(r#"{"boards":{"self":[],"opponent":[]}}"#).is_none());
    // `move_made` requires boards.
    assert!(parse_server_event(r#"{"event":"move_made","current_turn":"bob"}"#).is_none());
}

#[test]
fn unknown_cell_symbols_read_as_water() {
    let board: Board = serde_json::from_str(r#"[["O","?"],["", "M"]]"#).unwrap();
    assert_eq!(board.cell(0, 1), Some(Cell::Water));
    assert_eq!(board.cell(1, 0), Some(Cell::Water));
    assert_eq!(board.cell(1, 1), Some(Cell::Miss));
}

// ════════════════════════════════════════════════════════════════════
// Outbound commands
// ════════════════════════════════════════════════════════════════════

#[test]
fn move_command_matches_service_format() {
    let command = ClientCommand::Move {
        player_name: "alice".into(),
        row: 0,
        col: 11,
        room_id: "R1".into(),
    };
    let json: serde_json::Value = serde_json::to_value(&command).unwrap();
    assert_eq!(json["action"], "move");
    assert_eq!(json["player_name"], "alice");
    assert_eq!(json["row"], 0);
    assert_eq!(json["col"], 11);
    assert_eq!(json["room_id"], "R1");
    assert_eq!(json.as_object().unwrap().len(), 5);
}

// ════════════════════════════════════════════════════════════════════
// Shot results
// ════════════════════════════════════════════════════════════════════

#[test]
fn shot_results_from_service_text() {
    let cases = [
        ("hit", ShotResult::Hit),
        ("miss", ShotResult::Miss),
        ("already", ShotResult::AlreadyTargeted),
        ("invalid", ShotResult::OutOfBounds),
        ("Not your turn.", ShotResult::NotYourTurn),
        ("Game over! alice already won.", ShotResult::GameOver),
        (
            "sunk Carrier — alice wins!",
            ShotResult::Sunk {
                ship: "Carrier".into(),
            },
        ),
        ("splash", ShotResult::Other("splash".into())),
    ];
    for (raw, expected) in cases {
        assert_eq!(ShotResult::parse(raw), expected, "parsing {raw:?}");
    }
}

// ════════════════════════════════════════════════════════════════════
// Fog of war on real frames
// ════════════════════════════════════════════════════════════════════

#[test]
fn opponent_ships_hidden_in_rendered_snapshot() {
    let event = parse_server_event(CONNECTED_IN_GAME).unwrap();
    let mut state = SessionState::default();
    state.apply(&event);
    let boards = state.boards.unwrap();

    let enemy = render(Some(&boards.opponent), true);
    assert!(!enemy.shows_ships());
    assert_eq!(enemy.class_at(0, 1), Some(CellClass::Water));
    assert_eq!(enemy.class_at(1, 0), Some(CellClass::Miss));
    assert_eq!(enemy.class_at(2, 2), Some(CellClass::Hit));

    let own = render(Some(&boards.own), false);
    assert_eq!(own.class_at(0, 0), Some(CellClass::Ship));
}
