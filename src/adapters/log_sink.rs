//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured provisioning events to
//! the `log` facade (env_logger on the host console).  A telemetry adapter
//! would implement the same trait.

use log::{error, info, warn};

use crate::app::events::ProvisioningEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ProvisioningEvent`] to the console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ProvisioningEvent) {
        match event {
            ProvisioningEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            ProvisioningEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            ProvisioningEvent::StorageFormatted => {
                info!("STORAGE | formatted");
            }
            ProvisioningEvent::DefaultWritten(file) => {
                info!("DEFAULT | {} written", file);
            }
            ProvisioningEvent::CertificateProvisioned { bytes, fingerprint } => {
                info!(
                    "CERT | {} bytes | sha256 {:02x}{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
                    bytes,
                    fingerprint[0],
                    fingerprint[1],
                    fingerprint[2],
                    fingerprint[3],
                    fingerprint[4],
                    fingerprint[5],
                    fingerprint[6],
                    fingerprint[7],
                );
            }
            ProvisioningEvent::CredentialsLoaded(file) => {
                info!("CREDS | {} loaded", file);
            }
            ProvisioningEvent::WifiConfigRejected(e) => {
                warn!("CREDS | wifi config rejected: {}", e);
            }
            ProvisioningEvent::CloudConfigRejected(e) => {
                warn!("CREDS | cloud config rejected: {}", e);
            }
            ProvisioningEvent::LinkStateChanged(state) => {
                info!("LINK | {}", state);
            }
            ProvisioningEvent::Faulted(fault) => {
                error!("FAULT | {}", fault);
            }
        }
    }
}
