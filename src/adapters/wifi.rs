//! Simulated Wi-Fi station driver.
//!
//! Implements [`WifiDriverPort`].  The driver becomes ready after a
//! configurable number of status polls, accepts open/close, and records
//! the last [`LinkConfig`] it was asked to connect with.  Link-state
//! changes go out through the [`EventNotifier`] handed to `connect`, the
//! same path a driver callback takes on hardware.
//!
//! With `auto_connect` set, every accepted connect request is answered
//! with `Connecting` then `Connected` straight away.

use core::cell::Cell;

use log::{info, warn};

use crate::app::ports::{ConnState, DriverStatus, WifiDriverError, WifiDriverPort};
use crate::events::EventNotifier;
use crate::link::{AuthContext, LinkConfig};

#[derive(Default)]
pub struct SimWifiDriver {
    /// Status polls left before the driver reports `Ready`.
    ready_countdown: Cell<u32>,
    open: bool,
    fail_open: bool,
    auto_connect: bool,
    last_connect: Option<LinkConfig>,
    connects: usize,
    notifier: Option<EventNotifier>,
}

impl SimWifiDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ready_after(&mut self, polls: u32) {
        self.ready_countdown.set(polls);
    }

    pub fn fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    pub fn set_auto_connect(&mut self, enabled: bool) {
        self.auto_connect = enabled;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn last_connect(&self) -> Option<&LinkConfig> {
        self.last_connect.as_ref()
    }

    /// Accepted connect requests so far.
    pub fn connects(&self) -> usize {
        self.connects
    }

    /// Deliver a link-state change as the driver callback would.  Returns
    /// `false` if no connect has happened yet.
    pub fn report(&self, state: ConnState) -> bool {
        match self.notifier {
            Some(notifier) => notifier.link_state(state),
            None => {
                warn!("sim wifi: no connect yet, {state} not reported");
                false
            }
        }
    }
}

impl WifiDriverPort for SimWifiDriver {
    fn status(&self) -> DriverStatus {
        match self.ready_countdown.get() {
            0 => DriverStatus::Ready,
            n => {
                self.ready_countdown.set(n - 1);
                DriverStatus::Busy
            }
        }
    }

    fn open(&mut self) -> Result<(), WifiDriverError> {
        if self.fail_open {
            return Err(WifiDriverError::OpenFailed);
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn connect(&mut self, link: &LinkConfig, events: EventNotifier) -> Result<(), WifiDriverError> {
        if !self.open {
            return Err(WifiDriverError::NotOpen);
        }
        if !link.is_complete() {
            return Err(WifiDriverError::ConnectFailed);
        }
        let security = match link.auth {
            AuthContext::Open => "open",
            _ => "personal",
        };
        info!("sim wifi: connect '{}' ({security})", link.bss.ssid);

        self.last_connect = Some(link.clone());
        self.connects += 1;
        self.notifier = Some(events);
        if self.auto_connect {
            events.link_state(ConnState::Connecting);
            events.link_state(ConnState::Connected);
        }
        Ok(())
    }
}
