//! Simulated USB mass-storage device layer.
//!
//! Implements [`MassStoragePort`].  Opening the layer reports VBUS as
//! present through the event channel, as a device already plugged into a
//! host would; attach/detach only record bus state.

use log::info;

use crate::app::ports::{MassStorageError, MassStoragePort};
use crate::events::{EventNotifier, UsbEvent};

#[derive(Default)]
pub struct SimMassStorage {
    open: bool,
    attached: bool,
    vbus_present: bool,
    fail_open: bool,
}

impl SimMassStorage {
    /// Device layer with a host connected.
    pub fn new() -> Self {
        Self {
            vbus_present: true,
            ..Self::default()
        }
    }

    /// Device layer with no cable.
    pub fn unplugged() -> Self {
        Self::default()
    }

    pub fn fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl MassStoragePort for SimMassStorage {
    fn open(&mut self, events: EventNotifier) -> Result<(), MassStorageError> {
        if self.fail_open {
            return Err(MassStorageError::OpenFailed);
        }
        self.open = true;
        if self.vbus_present {
            events.usb(UsbEvent::PowerDetected);
        }
        Ok(())
    }

    fn attach(&mut self) {
        self.attached = true;
        info!("usb: attached to host");
    }

    fn detach(&mut self) {
        self.attached = false;
        info!("usb: detached");
    }
}
