//! Driver-side link configuration: BSS context, auth context, and the
//! mapping from a stored [`WifiCredential`] onto them.
//!
//! ```text
//!  WifiCredential ──apply_credential──▶ LinkContextPort
//!                                        ├─ set_ssid / set_channel   (BSS)
//!                                        └─ set_open / set_personal  (auth)
//! ```
//!
//! [`LinkConfig`] is the plain-data implementation handed to
//! [`WifiDriverPort::connect`](crate::app::ports::WifiDriverPort::connect).
//! It applies the same checks a station driver applies to its contexts.

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::credentials::{AuthMode, MAX_KEY_LEN, MAX_SSID_LEN, Secret, WifiCredential};

/// Shortest WPA passphrase.
pub const MIN_PASSPHRASE_LEN: usize = 8;
/// Longest WPA passphrase; a 64-character value must be a hex PSK.
pub const MAX_PASSPHRASE_LEN: usize = 63;

// ───────────────────────────────────────────────────────────────
// Channel
// ───────────────────────────────────────────────────────────────

/// Channel written into the BSS context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WifiChannel {
    /// Scan every channel.
    #[default]
    Any,
    /// A single 2.4 GHz channel, 1–14.
    Fixed(u8),
}

impl WifiChannel {
    pub fn is_valid(self) -> bool {
        match self {
            Self::Any => true,
            Self::Fixed(ch) => (1..=14).contains(&ch),
        }
    }
}

impl fmt::Display for WifiChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Fixed(ch) => write!(f, "{ch}"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkConfigError {
    /// SSID empty or longer than 32 bytes.
    InvalidSsid,
    InvalidChannel(u8),
    /// Passphrase is neither 8–63 printable ASCII nor a 64-digit hex PSK.
    InvalidPassphrase,
    /// Auth mode has no driver mapping.
    UnsupportedAuth(AuthMode),
}

impl fmt::Display for LinkConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID rejected by driver context"),
            Self::InvalidChannel(ch) => write!(f, "channel {ch} out of range"),
            Self::InvalidPassphrase => write!(f, "passphrase rejected by driver context"),
            Self::UnsupportedAuth(mode) => write!(f, "{mode} authentication is not supported"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Context port
// ───────────────────────────────────────────────────────────────

/// Setters on the driver's BSS and auth context objects.
pub trait LinkContextPort {
    fn set_ssid(&mut self, ssid: &str) -> Result<(), LinkConfigError>;
    fn set_channel(&mut self, channel: WifiChannel) -> Result<(), LinkConfigError>;
    /// Configure an open network.
    fn set_open(&mut self) -> Result<(), LinkConfigError>;
    /// Configure WPA/WPA2 personal with `passphrase`.
    fn set_personal(&mut self, passphrase: &str) -> Result<(), LinkConfigError>;
}

/// Write `credential` into a pair of driver contexts.
///
/// Stops at the first rejected setter.  WEP and WPA2/WPA3-mixed have no
/// mapping and always fail.
pub fn apply_credential(
    credential: &WifiCredential,
    channel: WifiChannel,
    ctx: &mut impl LinkContextPort,
) -> Result<(), LinkConfigError> {
    ctx.set_ssid(credential.ssid())?;
    ctx.set_channel(channel)?;
    match credential.auth() {
        AuthMode::Open => ctx.set_open(),
        AuthMode::WpaWpaMixedPersonal => ctx.set_personal(credential.key()),
        mode @ (AuthMode::Wep | AuthMode::Wpa2Wpa3Mixed) => {
            Err(LinkConfigError::UnsupportedAuth(mode))
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Plain-data contexts
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BssContext {
    pub ssid: String<MAX_SSID_LEN>,
    pub channel: WifiChannel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthContext {
    #[default]
    Unset,
    Open,
    Personal { passphrase: Secret<MAX_KEY_LEN> },
}

/// A BSS context and an auth context, ready to connect with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkConfig {
    pub bss: BssContext,
    pub auth: AuthContext,
}

impl LinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both contexts have been filled in.
    pub fn is_complete(&self) -> bool {
        !self.bss.ssid.is_empty() && self.auth != AuthContext::Unset
    }
}

fn valid_passphrase(passphrase: &str) -> bool {
    let len = passphrase.len();
    if len == MAX_PASSPHRASE_LEN + 1 {
        return passphrase.bytes().all(|b| b.is_ascii_hexdigit());
    }
    (MIN_PASSPHRASE_LEN..=MAX_PASSPHRASE_LEN).contains(&len)
        && passphrase.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

impl LinkContextPort for LinkConfig {
    fn set_ssid(&mut self, ssid: &str) -> Result<(), LinkConfigError> {
        if ssid.is_empty() {
            return Err(LinkConfigError::InvalidSsid);
        }
        let mut bounded = String::new();
        bounded
            .push_str(ssid)
            .map_err(|_| LinkConfigError::InvalidSsid)?;
        self.bss.ssid = bounded;
        Ok(())
    }

    fn set_channel(&mut self, channel: WifiChannel) -> Result<(), LinkConfigError> {
        match channel {
            WifiChannel::Fixed(ch) if !channel.is_valid() => {
                Err(LinkConfigError::InvalidChannel(ch))
            }
            _ => {
                self.bss.channel = channel;
                Ok(())
            }
        }
    }

    fn set_open(&mut self) -> Result<(), LinkConfigError> {
        self.auth = AuthContext::Open;
        Ok(())
    }

    fn set_personal(&mut self, passphrase: &str) -> Result<(), LinkConfigError> {
        if !valid_passphrase(passphrase) {
            return Err(LinkConfigError::InvalidPassphrase);
        }
        let passphrase = Secret::try_new(passphrase).ok_or(LinkConfigError::InvalidPassphrase)?;
        self.auth = AuthContext::Personal { passphrase };
        Ok(())
    }
}
