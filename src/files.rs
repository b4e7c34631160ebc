//! The three provisioning files and how they are named.
//!
//! The device certificate file is named from the secure element's serial
//! number, rendered as uppercase hex: `0123A1B2C3D4E5F6EE.cer`.  The two
//! config file names come from [`ProvisioningConfig`].

use core::fmt::{self, Write};

use heapless::String;

use crate::config::ProvisioningConfig;

/// Secure-element serial number length in bytes.
pub const SERIAL_LEN: usize = 9;

/// Longest file name on the volume (8.3 names plus headroom).
pub const MAX_FILE_NAME_LEN: usize = 32;

/// Raw secure-element serial number.
pub type DeviceSerial = [u8; SERIAL_LEN];

/// Serial number as uppercase hex without separators.
pub type SerialHex = String<{ SERIAL_LEN * 2 }>;

pub type FileName = String<MAX_FILE_NAME_LEN>;

/// Render the serial as uppercase hex, e.g. `0123A1B2C3D4E5F6EE`.
pub fn serial_hex(serial: &DeviceSerial) -> SerialHex {
    let mut hex = SerialHex::new();
    for byte in serial {
        let _ = write!(hex, "{byte:02X}");
    }
    hex
}

/// `<SERIALHEX>.<extension>`.
pub fn device_cert_file_name(serial: &DeviceSerial, extension: &str) -> FileName {
    let mut name = FileName::new();
    let _ = write!(name, "{}.{}", serial_hex(serial), extension);
    name
}

/// Logical identity of a provisioning file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningFile {
    DeviceCertificate,
    CloudConfig,
    WifiConfig,
}

impl fmt::Display for ProvisioningFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceCertificate => write!(f, "device certificate"),
            Self::CloudConfig => write!(f, "cloud config"),
            Self::WifiConfig => write!(f, "wifi config"),
        }
    }
}

/// Resolved names of the provisioning files.  The certificate name is
/// unknown until the serial has been read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    device_cert: Option<FileName>,
    cloud_config: FileName,
    wifi_config: FileName,
}

impl FileSet {
    pub fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            device_cert: None,
            cloud_config: config.cloud_config_file.clone(),
            wifi_config: config.wifi_config_file.clone(),
        }
    }

    /// Resolve the certificate file name from the device serial.
    pub fn set_device_serial(&mut self, serial: &DeviceSerial, extension: &str) -> FileName {
        let name = device_cert_file_name(serial, extension);
        self.device_cert = Some(name.clone());
        name
    }

    /// Certificate file name, once the serial is known.
    pub fn device_cert(&self) -> Option<&str> {
        self.device_cert.as_deref()
    }

    pub fn cloud_config(&self) -> &str {
        &self.cloud_config
    }

    pub fn wifi_config(&self) -> &str {
        &self.wifi_config
    }

    /// Path of `file`, or `None` for the certificate before the serial is known.
    pub fn path(&self, file: ProvisioningFile) -> Option<&str> {
        match file {
            ProvisioningFile::DeviceCertificate => self.device_cert(),
            ProvisioningFile::CloudConfig => Some(self.cloud_config()),
            ProvisioningFile::WifiConfig => Some(self.wifi_config()),
        }
    }
}
