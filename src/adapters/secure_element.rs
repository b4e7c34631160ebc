//! Simulated secure element.
//!
//! Implements [`SecureElementPort`] with a fixed serial number and a
//! synthetic DER-shaped device certificate.  Every read outside an
//! `init`/`release` window fails, as it does on the device.

use log::debug;

use crate::app::ports::{SecureElementError, SecureElementPort};
use crate::files::DeviceSerial;

/// Serial used by [`SimSecureElement::new`].  The leading 0x01 0x23 is
/// the fixed manufacturer prefix.
pub const SIM_SERIAL: DeviceSerial = [0x01, 0x23, 0x8A, 0x4F, 0x5C, 0x19, 0xD2, 0x77, 0xEE];

const SIM_CERT_LEN: usize = 512;
/// Template size reported by the size query; larger than any certificate.
const SIM_MAX_CERT_LEN: usize = 640;

/// Status byte reported for injected command failures.
const STATUS_EXECUTION_ERROR: u8 = 0x0F;

pub struct SimSecureElement {
    serial: DeviceSerial,
    certificate: Vec<u8>,
    open: bool,
    fail_init: bool,
    fail_cert_read: bool,
}

impl SimSecureElement {
    pub fn new() -> Self {
        Self::with_serial(SIM_SERIAL)
    }

    pub fn with_serial(serial: DeviceSerial) -> Self {
        Self {
            serial,
            certificate: synthetic_certificate(&serial),
            open: false,
            fail_init: false,
            fail_cert_read: false,
        }
    }

    pub fn fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    pub fn fail_cert_read(&mut self, fail: bool) {
        self.fail_cert_read = fail;
    }

    /// Inside an `init`/`release` window.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn certificate(&self) -> &[u8] {
        &self.certificate
    }

    fn ensure_open(&self) -> Result<(), SecureElementError> {
        if self.open {
            Ok(())
        } else {
            Err(SecureElementError::NotInitialized)
        }
    }
}

impl Default for SimSecureElement {
    fn default() -> Self {
        Self::new()
    }
}

/// SEQUENCE header followed by a body seeded from the serial.
fn synthetic_certificate(serial: &DeviceSerial) -> Vec<u8> {
    let body_len = SIM_CERT_LEN - 4;
    let mut cert = Vec::with_capacity(SIM_CERT_LEN);
    cert.extend_from_slice(&[0x30, 0x82, (body_len >> 8) as u8, body_len as u8]);
    cert.extend((0..body_len).map(|i| serial[i % serial.len()] ^ (i as u8)));
    cert
}

impl SecureElementPort for SimSecureElement {
    fn init(&mut self) -> Result<(), SecureElementError> {
        if self.fail_init {
            return Err(SecureElementError::InitFailed);
        }
        self.open = true;
        debug!("secure element: session opened");
        Ok(())
    }

    fn release(&mut self) {
        self.open = false;
        debug!("secure element: session released");
    }

    fn read_serial(&mut self) -> Result<DeviceSerial, SecureElementError> {
        self.ensure_open()?;
        Ok(self.serial)
    }

    fn max_device_cert_size(&mut self) -> Result<usize, SecureElementError> {
        self.ensure_open()?;
        Ok(SIM_MAX_CERT_LEN)
    }

    fn read_device_cert(&mut self, buf: &mut [u8]) -> Result<usize, SecureElementError> {
        self.ensure_open()?;
        if self.fail_cert_read {
            return Err(SecureElementError::CommandFailed(STATUS_EXECUTION_ERROR));
        }
        let len = self.certificate.len();
        if buf.len() < len {
            return Err(SecureElementError::BufferTooSmall);
        }
        buf[..len].copy_from_slice(&self.certificate);
        Ok(len)
    }
}
