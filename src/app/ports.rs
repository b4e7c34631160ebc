//! Port traits: the hexagonal boundary between the provisioning core and
//! the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Provisioner (domain)
//! ```
//!
//! Storage, mass-storage exposure, the secure element and the Wi-Fi driver
//! are collaborators: the [`Provisioner`](super::service::Provisioner)
//! reaches them only through these traits, bundled by [`Platform`], so the
//! whole flow runs against simulated adapters in tests.
//!
//! ## Contract notes
//!
//! - Every call returns promptly.  Slow work is reported through
//!   [`WifiDriverPort::status`] or through the event channel, never by
//!   blocking.
//! - [`StoragePort::write_file`] is open + write + sync + close: it either
//!   writes every byte or fails.
//! - All port errors are typed, and callers must handle every variant explicitly.

use core::fmt;

use crate::events::EventNotifier;
use crate::files::DeviceSerial;
use crate::link::LinkConfig;

// ───────────────────────────────────────────────────────────────
// Storage port (removable volume backing the USB drive)
// ───────────────────────────────────────────────────────────────

/// Outcome of a successful mount call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountStatus {
    /// Filesystem mounted and usable.
    Ready,
    /// Media is present but carries no filesystem; format it.
    NoFilesystem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
}

pub trait StoragePort {
    /// Mount the volume.  `Err` means "not yet", and the caller retries.
    fn mount(&mut self) -> Result<MountStatus, StorageError>;

    /// Create a fresh filesystem with default parameters and mount it.
    fn format(&mut self) -> Result<(), StorageError>;

    /// Set the volume label shown to the USB host.
    fn set_label(&mut self, label: &str) -> Result<(), StorageError>;

    /// Stat a file.  [`StorageError::NotFound`] when absent.
    fn stat(&self, path: &str) -> Result<FileStat, StorageError>;

    /// Read up to `buf.len()` bytes from the start of the file.
    fn read_file(&self, path: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Create or truncate `path` and write all of `data`.
    fn write_file(&mut self, path: &str, data: &[u8]) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Mass-storage port (volume exposed to a USB host)
// ───────────────────────────────────────────────────────────────

pub trait MassStoragePort {
    /// Open the USB device layer.  Power and bus events are delivered
    /// through `events`.
    fn open(&mut self, events: EventNotifier) -> Result<(), MassStorageError>;

    /// Connect to the bus (VBUS present).
    fn attach(&mut self);

    /// Disconnect from the bus (VBUS gone).
    fn detach(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Secure element port
// ───────────────────────────────────────────────────────────────

/// Narrow request/response access to the secure element.  Every call
/// between `init` and `release` is one transaction.
pub trait SecureElementPort {
    fn init(&mut self) -> Result<(), SecureElementError>;

    fn release(&mut self);

    fn read_serial(&mut self) -> Result<DeviceSerial, SecureElementError>;

    /// Upper bound on the device certificate size.
    fn max_device_cert_size(&mut self) -> Result<usize, SecureElementError>;

    /// Reconstruct the device certificate into `buf`; returns its length.
    fn read_device_cert(&mut self, buf: &mut [u8]) -> Result<usize, SecureElementError>;
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi driver port
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverStatus {
    /// Driver task still initialising.
    Busy,
    Ready,
}

/// Link state reported by the driver's connection callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl fmt::Display for ConnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

pub trait WifiDriverPort {
    fn status(&self) -> DriverStatus;

    fn open(&mut self) -> Result<(), WifiDriverError>;

    fn close(&mut self);

    /// Start connecting with the given contexts.  The result arrives later
    /// through `events` as [`ConnState`] updates.
    fn connect(&mut self, link: &LinkConfig, events: EventNotifier) -> Result<(), WifiDriverError>;
}

// ───────────────────────────────────────────────────────────────
// Platform bundle
// ───────────────────────────────────────────────────────────────

/// Every collaborator the provisioning flow needs.
pub trait Platform {
    type Storage: StoragePort;
    type MassStorage: MassStoragePort;
    type SecureElement: SecureElementPort;
    type Wifi: WifiDriverPort;

    fn storage(&mut self) -> &mut Self::Storage;
    fn mass_storage(&mut self) -> &mut Self::MassStorage;
    fn secure_element(&mut self) -> &mut Self::SecureElement;
    fn wifi(&mut self) -> &mut Self::Wifi;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`ProvisioningEvent`](super::events::ProvisioningEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ProvisioningEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Media not present or not ready.
    NotReady,
    /// Operation needs a mounted volume.
    NotMounted,
    /// File does not exist.
    NotFound,
    OpenFailed,
    ReadFailed,
    WriteFailed,
    /// Fewer bytes written than requested.
    ShortTransfer,
    FormatFailed,
    LabelFailed,
}

/// Errors from [`MassStoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MassStorageError {
    /// USB device layer could not be opened.
    OpenFailed,
}

/// Errors from [`SecureElementPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureElementError {
    /// Device did not respond to wake/init.
    InitFailed,
    /// Called outside an `init`/`release` window.
    NotInitialized,
    /// A command returned a non-success status.
    CommandFailed(u8),
    /// Caller buffer smaller than the data.
    BufferTooSmall,
}

/// Errors from [`WifiDriverPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiDriverError {
    NotReady,
    OpenFailed,
    /// No open handle.
    NotOpen,
    /// Contexts rejected or connect request refused.
    ConnectFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "media not ready"),
            Self::NotMounted => write!(f, "volume not mounted"),
            Self::NotFound => write!(f, "file not found"),
            Self::OpenFailed => write!(f, "file open failed"),
            Self::ReadFailed => write!(f, "file read failed"),
            Self::WriteFailed => write!(f, "file write failed"),
            Self::ShortTransfer => write!(f, "short write"),
            Self::FormatFailed => write!(f, "format failed"),
            Self::LabelFailed => write!(f, "label set failed"),
        }
    }
}

impl fmt::Display for MassStorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenFailed => write!(f, "USB device open failed"),
        }
    }
}

impl fmt::Display for SecureElementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "secure element init failed"),
            Self::NotInitialized => write!(f, "secure element not initialised"),
            Self::CommandFailed(status) => write!(f, "secure element status 0x{status:02X}"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

impl fmt::Display for WifiDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "driver not ready"),
            Self::OpenFailed => write!(f, "driver open failed"),
            Self::NotOpen => write!(f, "driver handle not open"),
            Self::ConnectFailed => write!(f, "connect request failed"),
        }
    }
}
