#![no_main]

use battleship_client::board_view::render;
use battleship_client::protocol::{parse_server_event, ServerEvent};
use battleship_client::SessionState;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw-byte path, including serde_json's UTF-8 validation.
    let _ = serde_json::from_slice::<ServerEvent>(data);

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Some(event) = parse_server_event(text) else {
        return;
    };

    // Whatever the service sends, applying and rendering it must not panic,
    // and a declared winner must survive.
    let mut state = SessionState::default();
    state.apply(&event);
    let had_winner = state.winner.is_some();
    state.apply(&event);
    assert_eq!(state.winner.is_some(), had_winner);

    if let Some(boards) = &state.boards {
        let fogged = render(Some(&boards.opponent), true);
        assert!(!fogged.shows_ships());
        let _ = fogged.to_string();
        let _ = render(Some(&boards.own), false).to_string();
    }
});
