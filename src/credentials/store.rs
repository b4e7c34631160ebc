//! Credential Store: the current Wi-Fi credential and cloud identity.
//!
//! Starts from the compiled-in defaults.  Records are only ever replaced
//! whole; the previous value (and its secret) is dropped, which wipes it.

use core::fmt;

use log::info;

use super::{CloudIdentity, WifiCredential};

/// Where a stored record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Compiled-in fallback.
    Default,
    /// Parsed from a config file on the volume.
    File,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::File => write!(f, "file"),
        }
    }
}

#[derive(Debug)]
pub struct CredentialStore {
    wifi: WifiCredential,
    wifi_source: CredentialSource,
    cloud: CloudIdentity,
    cloud_source: CredentialSource,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self {
            wifi: WifiCredential::default(),
            wifi_source: CredentialSource::Default,
            cloud: CloudIdentity::default(),
            cloud_source: CredentialSource::Default,
        }
    }

    pub fn wifi(&self) -> &WifiCredential {
        &self.wifi
    }

    pub fn wifi_source(&self) -> CredentialSource {
        self.wifi_source
    }

    pub fn cloud(&self) -> &CloudIdentity {
        &self.cloud
    }

    pub fn cloud_source(&self) -> CredentialSource {
        self.cloud_source
    }

    /// Replace the Wi-Fi credential with one parsed from a file.
    pub fn replace_wifi(&mut self, credential: WifiCredential) {
        info!(
            "credentials: wifi ssid '{}' ({}) from file",
            credential.ssid(),
            credential.auth()
        );
        self.wifi = credential;
        self.wifi_source = CredentialSource::File;
    }

    /// Replace the cloud identity with one parsed from a file.
    pub fn replace_cloud(&mut self, identity: CloudIdentity) {
        info!(
            "credentials: cloud registration '{}' in scope '{}' from file",
            identity.registration_id(),
            identity.id_scope()
        );
        self.cloud = identity;
        self.cloud_source = CredentialSource::File;
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}
