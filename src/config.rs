//! Provisioning configuration parameters.
//!
//! Volume layout, size limits and link settings.  Every field has a
//! default matching the shipped firmware; a JSON document can override
//! any subset of them.

use core::fmt;

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::files::FileName;
use crate::link::WifiChannel;

/// FAT volume labels are at most 11 characters.
pub const MAX_VOLUME_LABEL_LEN: usize = 11;

/// Longest certificate file extension.
pub const MAX_EXTENSION_LEN: usize = 8;

/// Upper bound for either file size limit.
pub const MAX_FILE_LIMIT_BYTES: u32 = 16 * 1024;

/// Core provisioning configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    // ── Volume ──
    /// Label applied after mount and after format
    pub volume_label: String<MAX_VOLUME_LABEL_LEN>,
    /// Wi-Fi directive file name
    pub wifi_config_file: FileName,
    /// Cloud identity file name
    pub cloud_config_file: FileName,
    /// Extension of the `<SERIALHEX>.<ext>` certificate file
    pub device_cert_extension: String<MAX_EXTENSION_LEN>,

    // ── Limits ──
    /// Larger config files are a read fault
    pub max_config_file_bytes: u32,
    /// Larger certificates are not written
    pub max_device_cert_bytes: u32,

    // ── Link ──
    pub wifi_channel: WifiChannel,
    /// Certificate-based cloud auth; not implemented, faults when set
    pub use_device_certificate: bool,

    // ── Timing ──
    /// Host runner pacing between polls (milliseconds)
    pub poll_interval_ms: u32,
}

fn bounded<const N: usize>(value: &str) -> String<N> {
    let mut out = String::new();
    let _ = out.push_str(value);
    out
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            volume_label: bounded("WFI32-IoT"),
            wifi_config_file: bounded("WIFI.CFG"),
            cloud_config_file: bounded("CLOUD.CFG"),
            device_cert_extension: bounded("cer"),

            max_config_file_bytes: 1024,
            max_device_cert_bytes: 1024,

            wifi_channel: WifiChannel::Any,
            use_device_certificate: false,

            poll_interval_ms: 10,
        }
    }
}

fn valid_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', ':']) && name != "." && name != ".."
}

impl ProvisioningConfig {
    /// Range-check every field.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.volume_label.is_empty() {
            return Err(ConfigError::ValidationFailed("volume_label is empty"));
        }
        if !valid_file_name(&self.wifi_config_file) {
            return Err(ConfigError::ValidationFailed("wifi_config_file is not a plain file name"));
        }
        if !valid_file_name(&self.cloud_config_file) {
            return Err(ConfigError::ValidationFailed("cloud_config_file is not a plain file name"));
        }
        if self.wifi_config_file == self.cloud_config_file {
            return Err(ConfigError::ValidationFailed("config files must have distinct names"));
        }
        if !valid_file_name(&self.device_cert_extension) || self.device_cert_extension.contains('.')
        {
            return Err(ConfigError::ValidationFailed("device_cert_extension is invalid"));
        }
        if !(1..=MAX_FILE_LIMIT_BYTES).contains(&self.max_config_file_bytes) {
            return Err(ConfigError::ValidationFailed("max_config_file_bytes out of range"));
        }
        if !(1..=MAX_FILE_LIMIT_BYTES).contains(&self.max_device_cert_bytes) {
            return Err(ConfigError::ValidationFailed("max_device_cert_bytes out of range"));
        }
        if !self.wifi_channel.is_valid() {
            return Err(ConfigError::ValidationFailed("wifi_channel must be 1-14"));
        }
        if !(1..=1000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed("poll_interval_ms must be 1-1000"));
        }
        Ok(())
    }

    /// Deserialize and validate.  Missing fields take their defaults.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors from loading a [`ProvisioningConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Document failed to deserialize (syntax, types, oversized strings).
    Corrupted,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let c = ProvisioningConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.volume_label.as_str(), "WFI32-IoT");
        assert_eq!(c.max_config_file_bytes, 1024);
        assert_eq!(c.wifi_channel, WifiChannel::Any);
        assert!(!c.use_device_certificate);
    }

    #[test]
    fn serde_roundtrip() {
        let c = ProvisioningConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: ProvisioningConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let c = ProvisioningConfig::from_json(br#"{"volume_label":"LAB-KIT","wifi_channel":{"fixed":6}}"#)
            .unwrap();
        assert_eq!(c.volume_label.as_str(), "LAB-KIT");
        assert_eq!(c.wifi_channel, WifiChannel::Fixed(6));
        assert_eq!(c.wifi_config_file.as_str(), "WIFI.CFG");
    }

    #[test]
    fn oversized_label_is_corrupted() {
        assert_eq!(
            ProvisioningConfig::from_json(br#"{"volume_label":"TWELVE-CHARS"}"#),
            Err(ConfigError::Corrupted)
        );
    }

    #[test]
    fn rejects_out_of_range_fields() {
        for doc in [
            br#"{"volume_label":""}"#.as_slice(),
            br#"{"wifi_config_file":"a/b"}"#,
            br#"{"cloud_config_file":"WIFI.CFG"}"#,
            br#"{"device_cert_extension":"c.er"}"#,
            br#"{"max_config_file_bytes":0}"#,
            br#"{"max_device_cert_bytes":99999}"#,
            br#"{"wifi_channel":{"fixed":15}}"#,
            br#"{"poll_interval_ms":0}"#,
        ] {
            assert!(
                matches!(
                    ProvisioningConfig::from_json(doc),
                    Err(ConfigError::ValidationFailed(_))
                ),
                "accepted {}",
                core::str::from_utf8(doc).unwrap()
            );
        }
    }

    #[test]
    fn malformed_document_is_corrupted() {
        assert_eq!(
            ProvisioningConfig::from_json(b"{not json"),
            Err(ConfigError::Corrupted)
        );
    }
}
