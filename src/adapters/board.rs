//! Platform bundle.
//!
//! [`Board`] owns one adapter per port and implements [`Platform`] by
//! handing out mutable borrows.  Fields are public so tests and the
//! binary can reach adapter-specific knobs.

use crate::app::ports::{MassStoragePort, Platform, SecureElementPort, StoragePort, WifiDriverPort};

use super::mem_storage::MemStorage;
use super::secure_element::SimSecureElement;
use super::usb_msd::SimMassStorage;
use super::wifi::SimWifiDriver;

pub struct Board<S, M, E, W> {
    pub storage: S,
    pub mass_storage: M,
    pub secure_element: E,
    pub wifi: W,
}

/// Fully simulated board: in-memory volume, simulated peripherals.
pub type SimBoard = Board<MemStorage, SimMassStorage, SimSecureElement, SimWifiDriver>;

impl SimBoard {
    /// Blank media (no filesystem), host cable present, driver ready.
    pub fn simulated() -> Self {
        Self {
            storage: MemStorage::new(),
            mass_storage: SimMassStorage::new(),
            secure_element: SimSecureElement::new(),
            wifi: SimWifiDriver::new(),
        }
    }
}

impl<S, M, E, W> Platform for Board<S, M, E, W>
where
    S: StoragePort,
    M: MassStoragePort,
    E: SecureElementPort,
    W: WifiDriverPort,
{
    type Storage = S;
    type MassStorage = M;
    type SecureElement = E;
    type Wifi = W;

    fn storage(&mut self) -> &mut S {
        &mut self.storage
    }

    fn mass_storage(&mut self) -> &mut M {
        &mut self.mass_storage
    }

    fn secure_element(&mut self) -> &mut E {
        &mut self.secure_element
    }

    fn wifi(&mut self) -> &mut W {
        &mut self.wifi
    }
}
