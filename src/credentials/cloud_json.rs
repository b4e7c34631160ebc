//! Cloud identity file: a JSON object with three string keys.
//!
//! ```json
//! {
//!   "idScope": "0ne006B6CF8",
//!   "registrationId": "PIC32MZW1",
//!   "primaryKey": "..."
//! }
//! ```
//!
//! Extra keys are ignored.  Values are accepted as-is, including empty
//! strings; only presence and string type are checked.

use core::fmt;

use log::debug;
use serde::Serialize;
use serde_json::Value;
use zeroize::Zeroizing;

use super::{CloudIdentity, CredentialError, trim_padding};

pub const ID_SCOPE_KEY: &str = "idScope";
pub const REGISTRATION_ID_KEY: &str = "registrationId";
pub const PRIMARY_KEY_KEY: &str = "primaryKey";

/// Why a cloud config buffer produced no identity.  Every variant that
/// concerns a single key names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudParseError {
    /// Not valid JSON.
    Malformed { line: usize, column: usize },
    /// Valid JSON, but the top level is not an object.
    NotAnObject,
    MissingKey(&'static str),
    NotAString(&'static str),
    /// Value does not fit the record.
    Invalid(CredentialError),
}

impl CloudParseError {
    /// The key this error concerns, if any.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::MissingKey(key) | Self::NotAString(key) => Some(*key),
            Self::Invalid(CredentialError::TooLong { field, .. }) => Some(*field),
            _ => None,
        }
    }
}

impl fmt::Display for CloudParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { line, column } => {
                write!(f, "malformed JSON at line {line}, column {column}")
            }
            Self::NotAnObject => write!(f, "top-level value is not an object"),
            Self::MissingKey(key) => write!(f, "missing key '{key}'"),
            Self::NotAString(key) => write!(f, "key '{key}' is not a string"),
            Self::Invalid(e) => write!(f, "invalid identity: {e}"),
        }
    }
}

/// Parse a cloud config file buffer.  Pure; never touches the store.
pub fn parse_cloud_config(buffer: &[u8]) -> Result<CloudIdentity, CloudParseError> {
    let doc: Value =
        serde_json::from_slice(trim_padding(buffer)).map_err(|e| CloudParseError::Malformed {
            line: e.line(),
            column: e.column(),
        })?;
    let Value::Object(mut map) = doc else {
        return Err(CloudParseError::NotAnObject);
    };

    // Values are moved out so the key material is wiped on every path.
    let mut take = |key: &'static str| match map.remove(key) {
        Some(Value::String(s)) => Ok(Zeroizing::new(s)),
        Some(_) => Err(CloudParseError::NotAString(key)),
        None => Err(CloudParseError::MissingKey(key)),
    };
    let id_scope = take(ID_SCOPE_KEY)?;
    let registration_id = take(REGISTRATION_ID_KEY)?;
    let primary_key = take(PRIMARY_KEY_KEY)?;

    let identity = CloudIdentity::new(&id_scope, &registration_id, &primary_key)
        .map_err(CloudParseError::Invalid)?;
    debug!(
        "cloud config: id_scope='{}' registration_id='{}'",
        identity.id_scope(),
        identity.registration_id()
    );
    Ok(identity)
}

#[derive(Serialize)]
struct CloudConfigDocument<'a> {
    #[serde(rename = "idScope")]
    id_scope: &'a str,
    #[serde(rename = "registrationId")]
    registration_id: &'a str,
    #[serde(rename = "primaryKey")]
    primary_key: &'a str,
}

/// Render `identity` as the pretty-printed default file body.  The buffer
/// holds the primary key and is wiped when dropped.
pub fn format_cloud_config(identity: &CloudIdentity) -> Result<Zeroizing<Vec<u8>>, serde_json::Error> {
    let doc = CloudConfigDocument {
        id_scope: identity.id_scope(),
        registration_id: identity.registration_id(),
        primary_key: identity.primary_key(),
    };
    let mut body = serde_json::to_string_pretty(&doc)?.into_bytes();
    body.push(b'\n');
    Ok(Zeroizing::new(body))
}
