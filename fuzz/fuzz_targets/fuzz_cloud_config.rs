//! Fuzz target: `parse_cloud_config`
//!
//! Feeds arbitrary file contents to the cloud identity parser.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every accepted identity renders to a default-file body that parses
//!   back to the same identity
//! - Key-specific errors always name one of the three known keys
//!
//! cargo fuzz run fuzz_cloud_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use wfiprov::credentials::cloud_json::{
    ID_SCOPE_KEY, PRIMARY_KEY_KEY, REGISTRATION_ID_KEY, format_cloud_config, parse_cloud_config,
};

fuzz_target!(|data: &[u8]| {
    match parse_cloud_config(data) {
        Ok(identity) => {
            let body = format_cloud_config(&identity).expect("identity must serialise");
            let reparsed = parse_cloud_config(&body).expect("rendered body must parse");
            assert_eq!(reparsed, identity, "render/parse must be stable");
        }
        Err(e) => {
            if let Some(key) = e.key() {
                assert!(
                    [ID_SCOPE_KEY, REGISTRATION_ID_KEY, PRIMARY_KEY_KEY].contains(&key),
                    "unexpected key in error: {key}"
                );
            }
        }
    }
});
