#![no_main]

use battleship_client::protocol::ShotResult;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|text: &str| {
    let result = ShotResult::parse(text);
    let _ = result.to_string();
});
