//! Outbound provisioning events.
//!
//! The [`Provisioner`](super::service::Provisioner) emits these through the
//! [`EventSink`](super::ports::EventSink) port after every poll, in the
//! order they happened.  Secrets never appear in an event.

use crate::credentials::cloud_json::CloudParseError;
use crate::credentials::wifi_directive::WifiParseError;
use crate::error::Fault;
use crate::files::ProvisioningFile;
use crate::fsm::StateId;

use super::ports::ConnState;

/// Structured events emitted by the provisioning core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningEvent {
    /// The service has started (carries the initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The volume had no filesystem and was formatted.
    StorageFormatted,

    /// An absent config file was created with compiled-in defaults.
    DefaultWritten(ProvisioningFile),

    /// A device certificate was copied from the secure element.
    /// `fingerprint` is the first 8 bytes of its SHA-256.
    CertificateProvisioned { bytes: usize, fingerprint: [u8; 8] },

    /// A config file parsed and replaced the stored record.
    CredentialsLoaded(ProvisioningFile),

    /// The Wi-Fi config file was present but yielded no credential.
    WifiConfigRejected(WifiParseError),

    /// The cloud config file was present but yielded no identity.
    CloudConfigRejected(CloudParseError),

    /// The driver reported a link-state change.
    LinkStateChanged(ConnState),

    /// The machine entered its terminal error state.
    Faulted(Fault),
}
