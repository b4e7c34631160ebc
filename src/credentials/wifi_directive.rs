//! Wi-Fi directive line: `CMD:SEND_UART=wifi <ssid>,<secret|authcode>[,<authcode>]`.
//!
//! | Second field        | Meaning                                   |
//! |---------------------|-------------------------------------------|
//! | exactly 1 character | bare auth code, must be `1` (open)        |
//! | anything longer     | passphrase; third field is the auth code  |
//!
//! A one-character passphrase can never be valid, so the grammar reuses
//! that slot for open networks.

use core::fmt::{self, Write};

use heapless::String;
use log::debug;

use super::{AuthMode, CredentialError, MAX_KEY_LEN, MAX_SSID_LEN, WifiCredential, trim_padding};

/// Directive marker; the first whitespace-separated token must equal it.
pub const WIFI_DIRECTIVE_MARKER: &str = "CMD:SEND_UART=wifi";

/// Longest line [`format_wifi_config`] can produce, including the newline.
pub const MAX_DIRECTIVE_LEN: usize = WIFI_DIRECTIVE_MARKER.len() + MAX_SSID_LEN + MAX_KEY_LEN + 8;

/// Why a Wi-Fi config buffer produced no credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiParseError {
    /// The line does not start with the directive marker.  Not a format
    /// error: the file simply holds no Wi-Fi directive.
    NoDirective,
    /// Buffer is not UTF-8.
    InvalidEncoding,
    /// A required comma field is absent or empty.
    MissingField(&'static str),
    /// A one-character second field other than the open code.
    OpenCodeExpected,
    /// Auth code field is not a decimal number.
    MalformedAuthCode,
    /// Auth code outside the known set.
    UnknownAuthCode(u8),
    /// Fields parsed but do not form a valid credential.
    Invalid(CredentialError),
}

impl WifiParseError {
    /// `true` for a directive that was present but malformed.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::NoDirective)
    }
}

impl fmt::Display for WifiParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDirective => write!(f, "no Wi-Fi directive found"),
            Self::InvalidEncoding => write!(f, "directive is not valid UTF-8"),
            Self::MissingField(field) => write!(f, "directive is missing the {field} field"),
            Self::OpenCodeExpected => {
                write!(f, "single-character field must be the open auth code")
            }
            Self::MalformedAuthCode => write!(f, "auth code is not a number"),
            Self::UnknownAuthCode(code) => write!(f, "unknown auth code {code}"),
            Self::Invalid(e) => write!(f, "invalid credential: {e}"),
        }
    }
}

/// Parse a Wi-Fi config file buffer.
///
/// Pure: the caller decides whether to apply the result.
pub fn parse_wifi_config(buffer: &[u8]) -> Result<WifiCredential, WifiParseError> {
    let text =
        core::str::from_utf8(trim_padding(buffer)).map_err(|_| WifiParseError::InvalidEncoding)?;
    let line = text.lines().next().unwrap_or("").trim();

    let (marker, rest) = line
        .split_once(char::is_whitespace)
        .unwrap_or((line, ""));
    if marker != WIFI_DIRECTIVE_MARKER {
        return Err(WifiParseError::NoDirective);
    }

    let mut fields = rest.split(',');
    let ssid = next_field(&mut fields, "ssid")?;
    let second = next_field(&mut fields, "secret")?;

    let credential = if second.chars().count() == 1 {
        match second.parse::<u8>().ok().and_then(AuthMode::from_code) {
            Some(AuthMode::Open) => WifiCredential::open(ssid),
            _ => return Err(WifiParseError::OpenCodeExpected),
        }
    } else {
        let code = next_field(&mut fields, "auth")?
            .trim()
            .parse::<u8>()
            .map_err(|_| WifiParseError::MalformedAuthCode)?;
        let auth = AuthMode::from_code(code).ok_or(WifiParseError::UnknownAuthCode(code))?;
        WifiCredential::new(ssid, auth, second)
    }
    .map_err(WifiParseError::Invalid)?;

    debug!(
        "wifi directive: ssid='{}' auth={}",
        credential.ssid(),
        credential.auth()
    );
    Ok(credential)
}

fn next_field<'a>(
    fields: &mut impl Iterator<Item = &'a str>,
    name: &'static str,
) -> Result<&'a str, WifiParseError> {
    fields
        .next()
        .filter(|f| !f.is_empty())
        .ok_or(WifiParseError::MissingField(name))
}

/// Render `credential` as a directive line (the default-file template).
pub fn format_wifi_config(credential: &WifiCredential) -> String<MAX_DIRECTIVE_LEN> {
    let mut line = String::new();
    let _ = if credential.auth().requires_key() {
        writeln!(
            line,
            "{} {},{},{}",
            WIFI_DIRECTIVE_MARKER,
            credential.ssid(),
            credential.key(),
            credential.auth().code()
        )
    } else {
        writeln!(
            line,
            "{} {},{}",
            WIFI_DIRECTIVE_MARKER,
            credential.ssid(),
            credential.auth().code()
        )
    };
    line
}
