//! Credential records consumed by the provisioning flow.
//!
//! Two records exist: the Wi-Fi station credential and the cloud identity.
//! Both are bounded (no heap), both hold secret material wrapped in
//! [`Secret`], and both start life as the compiled-in defaults below.
//!
//! ```text
//!   WIFI.CFG  ──▶ wifi_directive::parse_wifi_config ──▶ WifiCredential ─┐
//!                                                                        ├─▶ CredentialStore
//!   CLOUD.CFG ──▶ cloud_json::parse_cloud_config    ──▶ CloudIdentity  ─┘
//! ```

pub mod cloud_json;
pub mod store;
pub mod wifi_directive;

use core::fmt;

use heapless::String;
use zeroize::Zeroize;

// ───────────────────────────────────────────────────────────────
// Bounds
// ───────────────────────────────────────────────────────────────

/// Maximum SSID length per IEEE 802.11.
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase / key length.
pub const MAX_KEY_LEN: usize = 64;

/// Maximum DPS id-scope length.
pub const MAX_ID_SCOPE_LEN: usize = 64;

/// Maximum DPS registration-id length.
pub const MAX_REGISTRATION_ID_LEN: usize = 64;

/// Maximum symmetric primary-key length (base64 text).
pub const MAX_PRIMARY_KEY_LEN: usize = 128;

// ───────────────────────────────────────────────────────────────
// Compiled-in fallbacks
// ───────────────────────────────────────────────────────────────

pub const DEFAULT_SSID: &str = "wsn-2g";
pub const DEFAULT_PASSPHRASE: &str = "brucenegley";
pub const DEFAULT_AUTH: AuthMode = AuthMode::WpaWpaMixedPersonal;

pub const DEFAULT_ID_SCOPE: &str = "0ne006B6CF8";
pub const DEFAULT_REGISTRATION_ID: &str = "PIC32MZW1";
pub const DEFAULT_PRIMARY_KEY: &str = "mujHRQMx8dUsZETtlWxSonGZ24++L69c8KjIvZDT+5M=";

const _: () = assert!(DEFAULT_SSID.len() <= MAX_SSID_LEN);
const _: () = assert!(DEFAULT_PASSPHRASE.len() <= MAX_KEY_LEN);
const _: () = assert!(DEFAULT_ID_SCOPE.len() <= MAX_ID_SCOPE_LEN);
const _: () = assert!(DEFAULT_REGISTRATION_ID.len() <= MAX_REGISTRATION_ID_LEN);
const _: () = assert!(DEFAULT_PRIMARY_KEY.len() <= MAX_PRIMARY_KEY_LEN);

// ───────────────────────────────────────────────────────────────
// Authentication mode
// ───────────────────────────────────────────────────────────────

/// Station authentication mode.  Discriminants are the numeric codes used
/// in the directive line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AuthMode {
    Open = 1,
    WpaWpaMixedPersonal = 2,
    Wep = 3,
    Wpa2Wpa3Mixed = 4,
}

impl AuthMode {
    /// Decode a directive auth code.  `None` for anything outside the known set.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Open),
            2 => Some(Self::WpaWpaMixedPersonal),
            3 => Some(Self::Wep),
            4 => Some(Self::Wpa2Wpa3Mixed),
            _ => None,
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Every mode except `Open` carries a passphrase.
    pub const fn requires_key(self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::WpaWpaMixedPersonal => write!(f, "WPA/WPA2 personal"),
            Self::Wep => write!(f, "WEP"),
            Self::Wpa2Wpa3Mixed => write!(f, "WPA2/WPA3 personal"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Secret
// ───────────────────────────────────────────────────────────────

/// Bounded secret string.  Wiped on overwrite and on drop; `Debug` and
/// `Display` show only the length.
#[derive(Clone, Default)]
pub struct Secret<const N: usize>(String<N>);

impl<const N: usize> Secret<N> {
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Copy `value` in.  Returns `None` if it exceeds `N` bytes.
    pub fn try_new(value: &str) -> Option<Self> {
        let mut inner = String::new();
        inner.push_str(value).ok()?;
        Some(Self(inner))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn wipe(&mut self) {
        // SAFETY: zero bytes are valid UTF-8 and the string is cleared
        // immediately afterwards.
        let bytes: &mut [u8] = unsafe { self.0.as_mut_vec() };
        bytes.zeroize();
        self.0.clear();
    }
}

impl<const N: usize> Drop for Secret<N> {
    fn drop(&mut self) {
        self.wipe();
    }
}

impl<const N: usize> PartialEq for Secret<N> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<const N: usize> Eq for Secret<N> {}

impl<const N: usize> fmt::Debug for Secret<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

impl<const N: usize> fmt::Display for Secret<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted, {} bytes>", self.0.len())
    }
}

// ───────────────────────────────────────────────────────────────
// Record validation errors
// ───────────────────────────────────────────────────────────────

/// A field value that cannot be held by a credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// SSID is empty.
    EmptySsid,
    /// A field exceeds its storage bound.
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    /// The auth mode needs a passphrase and none was given.
    KeyRequired(AuthMode),
    /// A passphrase was given for an open network.
    KeyNotAllowed,
    /// One-character passphrases collide with the bare auth-code form of
    /// the directive line.
    KeyTooShort,
    /// Commas and line breaks are directive separators.
    ReservedCharacter(&'static str),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySsid => write!(f, "SSID is empty"),
            Self::TooLong { field, len, max } => {
                write!(f, "{field} is {len} bytes (max {max})")
            }
            Self::KeyRequired(mode) => write!(f, "{mode} requires a passphrase"),
            Self::KeyNotAllowed => write!(f, "open networks take no passphrase"),
            Self::KeyTooShort => write!(f, "passphrase must be longer than one character"),
            Self::ReservedCharacter(field) => {
                write!(f, "{field} contains a comma or line break")
            }
        }
    }
}

fn bounded<const N: usize>(field: &'static str, value: &str) -> Result<String<N>, CredentialError> {
    let mut out = String::new();
    out.push_str(value).map_err(|_| CredentialError::TooLong {
        field,
        len: value.len(),
        max: N,
    })?;
    Ok(out)
}

fn bounded_secret<const N: usize>(
    field: &'static str,
    value: &str,
) -> Result<Secret<N>, CredentialError> {
    Secret::try_new(value).ok_or(CredentialError::TooLong {
        field,
        len: value.len(),
        max: N,
    })
}

fn has_separator(value: &str) -> bool {
    value.contains([',', '\r', '\n'])
}

/// Strip the NUL padding a fixed-size file buffer leaves behind.
pub(crate) fn trim_padding(buffer: &[u8]) -> &[u8] {
    let end = buffer
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    &buffer[..end]
}

// ───────────────────────────────────────────────────────────────
// WifiCredential
// ───────────────────────────────────────────────────────────────

/// Station credential.  A constructed value always satisfies: SSID
/// non-empty, key present iff the mode requires one, and every field
/// representable in a directive line.
#[derive(Clone, PartialEq, Eq)]
pub struct WifiCredential {
    ssid: String<MAX_SSID_LEN>,
    auth: AuthMode,
    key: Secret<MAX_KEY_LEN>,
}

impl WifiCredential {
    pub fn new(ssid: &str, auth: AuthMode, key: &str) -> Result<Self, CredentialError> {
        if ssid.is_empty() {
            return Err(CredentialError::EmptySsid);
        }
        if has_separator(ssid) {
            return Err(CredentialError::ReservedCharacter("ssid"));
        }
        let ssid = bounded("ssid", ssid)?;

        match (auth.requires_key(), key.is_empty()) {
            (true, true) => return Err(CredentialError::KeyRequired(auth)),
            (false, false) => return Err(CredentialError::KeyNotAllowed),
            _ => {}
        }
        if key.chars().count() == 1 {
            return Err(CredentialError::KeyTooShort);
        }
        if has_separator(key) {
            return Err(CredentialError::ReservedCharacter("passphrase"));
        }
        let key = bounded_secret("passphrase", key)?;

        Ok(Self { ssid, auth, key })
    }

    /// Credential for an open network.
    pub fn open(ssid: &str) -> Result<Self, CredentialError> {
        Self::new(ssid, AuthMode::Open, "")
    }

    pub fn ssid(&self) -> &str {
        self.ssid.as_str()
    }

    pub fn auth(&self) -> AuthMode {
        self.auth
    }

    /// The passphrase; empty for open networks.
    pub fn key(&self) -> &str {
        self.key.expose()
    }
}

impl Default for WifiCredential {
    fn default() -> Self {
        let mut ssid = String::new();
        let _ = ssid.push_str(DEFAULT_SSID);
        Self {
            ssid,
            auth: DEFAULT_AUTH,
            key: Secret::try_new(DEFAULT_PASSPHRASE).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for WifiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WifiCredential")
            .field("ssid", &self.ssid)
            .field("auth", &self.auth)
            .field("key", &self.key)
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────
// CloudIdentity
// ───────────────────────────────────────────────────────────────

/// Cloud provisioning identity (DPS id-scope, registration id, symmetric key).
///
/// Empty values are accepted: the cloud config parser only checks that each
/// key is present and string-typed.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudIdentity {
    id_scope: String<MAX_ID_SCOPE_LEN>,
    registration_id: String<MAX_REGISTRATION_ID_LEN>,
    primary_key: Secret<MAX_PRIMARY_KEY_LEN>,
}

impl CloudIdentity {
    pub fn new(
        id_scope: &str,
        registration_id: &str,
        primary_key: &str,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            id_scope: bounded(cloud_json::ID_SCOPE_KEY, id_scope)?,
            registration_id: bounded(cloud_json::REGISTRATION_ID_KEY, registration_id)?,
            primary_key: bounded_secret(cloud_json::PRIMARY_KEY_KEY, primary_key)?,
        })
    }

    pub fn id_scope(&self) -> &str {
        self.id_scope.as_str()
    }

    pub fn registration_id(&self) -> &str {
        self.registration_id.as_str()
    }

    pub fn primary_key(&self) -> &str {
        self.primary_key.expose()
    }
}

impl Default for CloudIdentity {
    fn default() -> Self {
        let mut id_scope = String::new();
        let _ = id_scope.push_str(DEFAULT_ID_SCOPE);
        let mut registration_id = String::new();
        let _ = registration_id.push_str(DEFAULT_REGISTRATION_ID);
        Self {
            id_scope,
            registration_id,
            primary_key: Secret::try_new(DEFAULT_PRIMARY_KEY).unwrap_or_default(),
        }
    }
}

impl fmt::Debug for CloudIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudIdentity")
            .field("id_scope", &self.id_scope)
            .field("registration_id", &self.registration_id)
            .field("primary_key", &self.primary_key)
            .finish()
    }
}
