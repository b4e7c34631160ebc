//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: configuration, the credential store, resolved file names,
//! progress flags, the first fault, and the outbound notices produced
//! since the last flush.  Think of it as the "blackboard" in a blackboard
//! architecture.  The asynchronous link callback never sees it; its
//! events reach the context only through the poll loop.

use heapless::Vec;
use log::{error, warn};

use crate::app::events::ProvisioningEvent;
use crate::app::ports::MountStatus;
use crate::config::ProvisioningConfig;
use crate::credentials::store::CredentialStore;
use crate::error::Fault;
use crate::events::EventNotifier;
use crate::files::{DeviceSerial, FileSet};

use super::StateId;

/// Outbound notices buffered between two flushes.
pub const NOTICE_CAPACITY: usize = 32;

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Configuration --
    pub config: ProvisioningConfig,

    // -- Provisioning data --
    /// Current Wi-Fi credential and cloud identity.
    pub store: CredentialStore,
    /// Names of the three provisioning files.
    pub files: FileSet,
    /// Secure-element serial, once read.
    pub device_serial: Option<DeviceSerial>,

    // -- Progress --
    /// Result of the last successful mount.
    pub mount: Option<MountStatus>,
    /// USB mass-storage device layer is open.
    pub msd_exposed: bool,
    /// USB mass-storage device is attached to the bus.
    pub msd_attached: bool,
    /// Wi-Fi driver handle is open.
    pub driver_open: bool,
    /// Driver last reported `Connected`.
    pub link_up: bool,

    // -- Faults --
    /// First fatal fault; set once, never cleared.
    pub fault: Option<Fault>,

    // -- Output --
    /// Notices for the event sink, in order.
    pub notices: Vec<ProvisioningEvent, NOTICE_CAPACITY>,
    /// Producer handle passed to collaborators that report asynchronously.
    pub notifier: EventNotifier,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: ProvisioningConfig, notifier: EventNotifier) -> Self {
        let files = FileSet::from_config(&config);
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            config,
            store: CredentialStore::new(),
            files,
            device_serial: None,
            mount: None,
            msd_exposed: false,
            msd_attached: false,
            driver_open: false,
            link_up: false,
            fault: None,
            notices: Vec::new(),
            notifier,
        }
    }

    /// Queue an outbound notice.
    pub fn notify(&mut self, event: ProvisioningEvent) {
        if self.notices.push(event).is_err() {
            warn!("notice buffer full, dropping {event:?}");
        }
    }

    /// Record a fault without leaving the current state.  Only the first
    /// fault is kept; every fault is logged.
    pub fn record_fault(&mut self, fault: Fault) {
        error!("FAULT: {fault}");
        if self.fault.is_none() {
            self.fault = Some(fault);
        }
    }

    /// Record `fault` and request the transition to `Error`.
    pub fn fail(&mut self, fault: Fault) -> Option<StateId> {
        self.record_fault(fault);
        Some(StateId::Error)
    }

    /// Returns `true` if a fault has been recorded.
    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }
}
