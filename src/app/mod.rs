//! Application core: provisioning logic, zero direct I/O.
//!
//! The provisioning flow (mount, defaults, credential parsing, link
//! bring-up) lives here and in [`crate::fsm`].  All interaction with the
//! volume, the USB device layer, the secure element and the Wi-Fi driver
//! happens through **port traits** defined in [`ports`], keeping this layer
//! fully testable against simulated adapters.

pub mod events;
pub mod ports;
pub mod service;
