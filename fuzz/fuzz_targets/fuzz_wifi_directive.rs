//! Fuzz target: `parse_wifi_config`
//!
//! Feeds arbitrary file contents to the Wi-Fi directive parser.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every accepted credential re-renders to a line that parses back to
//!   the same credential
//! - An accepted credential has a key iff its auth mode requires one
//!
//! cargo fuzz run fuzz_wifi_directive

#![no_main]

use libfuzzer_sys::fuzz_target;
use wfiprov::credentials::wifi_directive::{format_wifi_config, parse_wifi_config};

fuzz_target!(|data: &[u8]| {
    let Ok(credential) = parse_wifi_config(data) else {
        return;
    };

    assert_eq!(
        credential.auth().requires_key(),
        !credential.key().is_empty(),
        "key presence must match auth mode"
    );

    let line = format_wifi_config(&credential);
    let reparsed = parse_wifi_config(line.as_bytes()).expect("rendered directive must parse");
    assert_eq!(reparsed, credential, "render/parse must be stable");
});
