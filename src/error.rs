//! Reasons the provisioning flow stops in its terminal `Error` state.
//!
//! Retryable conditions (mount not ready, driver busy) never become a
//! [`Fault`]; they keep the machine in its current state.  Everything here
//! is fatal.  All variants are `Copy` so they can sit in the FSM context
//! and travel inside outbound events without allocation.

use core::fmt;

use crate::app::ports::{MassStorageError, SecureElementError, StorageError, WifiDriverError};
use crate::files::ProvisioningFile;
use crate::link::LinkConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Formatting the volume failed.
    Format(StorageError),
    /// USB mass-storage exposure failed.
    MassStorage(MassStorageError),
    /// Secure element init or serial read failed.
    SecureElement(SecureElementError),
    /// A provisioning file could not be written.
    FileWrite(ProvisioningFile, StorageError),
    /// A present provisioning file could not be read.
    FileRead(ProvisioningFile, StorageError),
    /// A config file exceeds the configured size limit.
    FileTooLarge(ProvisioningFile),
    /// A default file body could not be rendered.
    Encode(ProvisioningFile),
    /// The stored credential could not be applied to the driver contexts.
    LinkConfig(LinkConfigError),
    /// The driver refused the connect request.
    Connect(WifiDriverError),
    /// A configured feature with no implementation.
    Unsupported(&'static str),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(e) => write!(f, "format: {e}"),
            Self::MassStorage(e) => write!(f, "mass storage: {e}"),
            Self::SecureElement(e) => write!(f, "secure element: {e}"),
            Self::FileWrite(file, e) => write!(f, "{file} write: {e}"),
            Self::FileRead(file, e) => write!(f, "{file} read: {e}"),
            Self::FileTooLarge(file) => write!(f, "{file} exceeds size limit"),
            Self::Encode(file) => write!(f, "{file} encode failed"),
            Self::LinkConfig(e) => write!(f, "link config: {e}"),
            Self::Connect(e) => write!(f, "connect: {e}"),
            Self::Unsupported(what) => write!(f, "unsupported: {what}"),
        }
    }
}

impl std::error::Error for Fault {}

impl From<LinkConfigError> for Fault {
    fn from(e: LinkConfigError) -> Self {
        Self::LinkConfig(e)
    }
}

impl From<MassStorageError> for Fault {
    fn from(e: MassStorageError) -> Self {
        Self::MassStorage(e)
    }
}

impl From<SecureElementError> for Fault {
    fn from(e: SecureElementError) -> Self {
        Self::SecureElement(e)
    }
}

impl From<WifiDriverError> for Fault {
    fn from(e: WifiDriverError) -> Self {
        Self::Connect(e)
    }
}
