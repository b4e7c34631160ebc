//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers, with no closures and no dynamic
//! dispatch.  Update handlers are generic over the [`Platform`] and reach
//! collaborators only through its ports.
//!
//! ```text
//!  MOUNT ──▶ MOUNTED_CHECK ──[no fs]──▶ FORMAT
//!    ▲ retry       │                      │
//!    └─────┘       ▼                      ▼
//!               EXPOSE_MSD ◀──────────────┘
//!                  │
//!                  ▼
//!  CHECK_DEVICE_CERT ──▶ CHECK_CLOUD_CFG ──▶ CHECK_WIFI_CFG ──▶ READ_CFG
//!                                                                  │
//!           ┌──────────────────────────────────────────────────────┘
//!           ▼
//!      INIT_WAIT ──▶ INIT_READY ──▶ CHECK_CREDENTIALS ──▶ CONFIGURE ──▶ IDLE
//!           ▲                                                         │
//!           └──────────────── RECONNECT ◀──[link down/failed]─────────┘
//!
//!  Any fatal fault ──▶ ERROR (terminal)
//! ```

use core::fmt::Write;

use log::{debug, error, info, warn};
use zeroize::Zeroizing;

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::app::events::ProvisioningEvent;
use crate::app::ports::{
    DriverStatus, MassStoragePort, MountStatus, Platform, SecureElementPort, StorageError,
    StoragePort, WifiDriverPort,
};
use crate::credentials::cloud_json::{format_cloud_config, parse_cloud_config};
use crate::credentials::wifi_directive::{WifiParseError, format_wifi_config, parse_wifi_config};
use crate::credentials::{CloudIdentity, WifiCredential};
use crate::error::Fault;
use crate::files::{ProvisioningFile, serial_hex};
use crate::link::{LinkConfig, apply_credential};

// ───────────────────────────────────────────────────────────────
// Table builder
// ───────────────────────────────────────────────────────────────

/// Build the static state table.  Called once at startup.
pub fn build_state_table<P: Platform>() -> [StateDescriptor<P>; StateId::COUNT] {
    [
        // Index 0: MountStorage
        StateDescriptor {
            id: StateId::MountStorage,
            name: "MountStorage",
            on_enter: None,
            on_exit: None,
            on_update: mount_update::<P>,
        },
        // Index 1: StorageMountedCheck
        StateDescriptor {
            id: StateId::StorageMountedCheck,
            name: "StorageMountedCheck",
            on_enter: None,
            on_exit: None,
            on_update: mounted_check_update::<P>,
        },
        // Index 2: FormatStorage
        StateDescriptor {
            id: StateId::FormatStorage,
            name: "FormatStorage",
            on_enter: Some(format_enter),
            on_exit: None,
            on_update: format_update::<P>,
        },
        // Index 3: ExposeMassStorage
        StateDescriptor {
            id: StateId::ExposeMassStorage,
            name: "ExposeMassStorage",
            on_enter: None,
            on_exit: None,
            on_update: expose_update::<P>,
        },
        // Index 4: CheckDeviceCertFile
        StateDescriptor {
            id: StateId::CheckDeviceCertFile,
            name: "CheckDeviceCertFile",
            on_enter: None,
            on_exit: None,
            on_update: device_cert_update::<P>,
        },
        // Index 5: CheckCloudConfigFile
        StateDescriptor {
            id: StateId::CheckCloudConfigFile,
            name: "CheckCloudConfigFile",
            on_enter: None,
            on_exit: None,
            on_update: cloud_file_update::<P>,
        },
        // Index 6: CheckWifiConfigFile
        StateDescriptor {
            id: StateId::CheckWifiConfigFile,
            name: "CheckWifiConfigFile",
            on_enter: None,
            on_exit: None,
            on_update: wifi_file_update::<P>,
        },
        // Index 7: ReadConfigFiles
        StateDescriptor {
            id: StateId::ReadConfigFiles,
            name: "ReadConfigFiles",
            on_enter: None,
            on_exit: None,
            on_update: read_config_update::<P>,
        },
        // Index 8: InitWait
        StateDescriptor {
            id: StateId::InitWait,
            name: "InitWait",
            on_enter: Some(init_wait_enter),
            on_exit: None,
            on_update: init_wait_update::<P>,
        },
        // Index 9: InitReady
        StateDescriptor {
            id: StateId::InitReady,
            name: "InitReady",
            on_enter: None,
            on_exit: None,
            on_update: init_ready_update::<P>,
        },
        // Index 10: CheckCredentials
        StateDescriptor {
            id: StateId::CheckCredentials,
            name: "CheckCredentials",
            on_enter: None,
            on_exit: None,
            on_update: check_credentials_update::<P>,
        },
        // Index 11: Configure
        StateDescriptor {
            id: StateId::Configure,
            name: "Configure",
            on_enter: None,
            on_exit: None,
            on_update: configure_update::<P>,
        },
        // Index 12: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update::<P>,
        },
        // Index 13: Reconnect
        StateDescriptor {
            id: StateId::Reconnect,
            name: "Reconnect",
            on_enter: Some(reconnect_enter),
            on_exit: None,
            on_update: reconnect_update::<P>,
        },
        // Index 14: Error
        StateDescriptor {
            id: StateId::Error,
            name: "Error",
            on_enter: Some(error_enter),
            on_exit: Some(error_exit),
            on_update: error_update::<P>,
        },
    ]
}

// ───────────────────────────────────────────────────────────────
// MOUNT: retried until the media answers
// ───────────────────────────────────────────────────────────────

fn mount_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    match p.storage().mount() {
        Ok(status) => {
            info!("MOUNT: {:?} after {} attempt(s)", status, ctx.ticks_in_state);
            ctx.mount = Some(status);
            Some(StateId::StorageMountedCheck)
        }
        Err(e) => {
            debug!("MOUNT: {e}, retrying");
            None
        }
    }
}

fn apply_label<S: StoragePort>(storage: &mut S, label: &str) {
    if let Err(e) = storage.set_label(label) {
        warn!("MOUNT: volume label '{label}' not applied: {e}");
    }
}

fn mounted_check_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    if ctx.mount == Some(MountStatus::NoFilesystem) {
        info!("MOUNT: no filesystem on media");
        return Some(StateId::FormatStorage);
    }
    apply_label(p.storage(), &ctx.config.volume_label);
    Some(StateId::ExposeMassStorage)
}

// ───────────────────────────────────────────────────────────────
// FORMAT
// ───────────────────────────────────────────────────────────────

fn format_enter(_ctx: &mut FsmContext) {
    warn!("FORMAT: creating a new filesystem, existing data is lost");
}

fn format_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    if let Err(e) = p.storage().format() {
        return ctx.fail(Fault::Format(e));
    }
    ctx.mount = Some(MountStatus::Ready);
    ctx.notify(ProvisioningEvent::StorageFormatted);
    apply_label(p.storage(), &ctx.config.volume_label);
    Some(StateId::ExposeMassStorage)
}

// ───────────────────────────────────────────────────────────────
// EXPOSE: USB mass-storage device layer
// ───────────────────────────────────────────────────────────────

fn expose_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    if let Err(e) = p.mass_storage().open(ctx.notifier) {
        return ctx.fail(e.into());
    }
    ctx.msd_exposed = true;
    info!("MSD: volume exposed, waiting for VBUS");
    Some(StateId::CheckDeviceCertFile)
}

// ───────────────────────────────────────────────────────────────
// DEVICE CERTIFICATE: copied from the secure element once
// ───────────────────────────────────────────────────────────────

fn device_cert_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    if let Err(e) = p.secure_element().init() {
        return ctx.fail(e.into());
    }
    let result = provision_device_cert(ctx, p);
    p.secure_element().release();

    match result {
        Ok(()) => Some(StateId::CheckCloudConfigFile),
        Err(fault) => ctx.fail(fault),
    }
}

fn provision_device_cert<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Result<(), Fault> {
    let serial = p.secure_element().read_serial()?;
    ctx.device_serial = Some(serial);
    info!("CERT: device serial {}", serial_hex(&serial));

    let path = ctx
        .files
        .set_device_serial(&serial, &ctx.config.device_cert_extension);
    if let Ok(stat) = p.storage().stat(&path) {
        info!("CERT: {path} present ({} bytes)", stat.size);
        return Ok(());
    }

    let limit = ctx.config.max_device_cert_bytes as usize;
    let Some(cert) = read_device_cert(p.secure_element(), limit) else {
        return Ok(());
    };

    p.storage()
        .write_file(&path, &cert)
        .map_err(|e| Fault::FileWrite(ProvisioningFile::DeviceCertificate, e))?;

    let digest = hmac_sha256::Hash::hash(&cert);
    let mut fingerprint = [0u8; 8];
    fingerprint.copy_from_slice(&digest[..8]);
    info!(
        "CERT: wrote {path} ({} bytes, sha256 {}...)",
        cert.len(),
        hex8(&fingerprint)
    );
    ctx.notify(ProvisioningEvent::CertificateProvisioned {
        bytes: cert.len(),
        fingerprint,
    });
    Ok(())
}

/// Size query then read.  Any failure is logged and yields `None`; the
/// flow continues without a certificate file.
fn read_device_cert<E: SecureElementPort>(se: &mut E, limit: usize) -> Option<Vec<u8>> {
    let max = match se.max_device_cert_size() {
        Ok(max) => max,
        Err(e) => {
            warn!("CERT: size query failed: {e}");
            return None;
        }
    };
    let mut buf = vec![0u8; max.min(limit)];
    match se.read_device_cert(&mut buf) {
        Ok(len) => {
            buf.truncate(len);
            Some(buf)
        }
        Err(e) => {
            warn!("CERT: read failed: {e} (max {max} bytes, limit {limit})");
            None
        }
    }
}

fn hex8(bytes: &[u8; 8]) -> heapless::String<16> {
    let mut out = heapless::String::new();
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

// ───────────────────────────────────────────────────────────────
// DEFAULT CONFIG FILES: written only when absent
// ───────────────────────────────────────────────────────────────

fn write_default<P: Platform>(
    ctx: &mut FsmContext,
    p: &mut P,
    file: ProvisioningFile,
    path: &str,
    body: &[u8],
) -> Result<(), Fault> {
    p.storage()
        .write_file(path, body)
        .map_err(|e| Fault::FileWrite(file, e))?;
    info!("DEFAULTS: wrote {path} ({} bytes)", body.len());
    ctx.notify(ProvisioningEvent::DefaultWritten(file));
    Ok(())
}

fn cloud_file_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    let path = ctx.files.cloud_config().to_owned();
    if p.storage().stat(&path).is_ok() {
        return Some(StateId::CheckWifiConfigFile);
    }
    let body = match format_cloud_config(&CloudIdentity::default()) {
        Ok(body) => body,
        Err(e) => {
            error!("DEFAULTS: cloud template: {e}");
            return ctx.fail(Fault::Encode(ProvisioningFile::CloudConfig));
        }
    };
    match write_default(ctx, p, ProvisioningFile::CloudConfig, &path, &body) {
        Ok(()) => Some(StateId::CheckWifiConfigFile),
        Err(fault) => ctx.fail(fault),
    }
}

fn wifi_file_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    let path = ctx.files.wifi_config().to_owned();
    if p.storage().stat(&path).is_ok() {
        return Some(StateId::ReadConfigFiles);
    }
    let line = format_wifi_config(&WifiCredential::default());
    match write_default(ctx, p, ProvisioningFile::WifiConfig, &path, line.as_bytes()) {
        Ok(()) => Some(StateId::ReadConfigFiles),
        Err(fault) => ctx.fail(fault),
    }
}

// ───────────────────────────────────────────────────────────────
// READ CONFIG: parse both files into the credential store
// ───────────────────────────────────────────────────────────────

/// Read a config file into `buf`.  `Ok(None)` when the file is absent; a
/// read shorter than the file's size is a fault.
fn read_config<S: StoragePort>(
    storage: &S,
    file: ProvisioningFile,
    path: &str,
    buf: &mut [u8],
) -> Result<Option<usize>, Fault> {
    let stat = match storage.stat(path) {
        Ok(stat) => stat,
        Err(StorageError::NotFound) => return Ok(None),
        Err(e) => return Err(Fault::FileRead(file, e)),
    };
    if stat.size > buf.len() as u64 {
        return Err(Fault::FileTooLarge(file));
    }
    let len = storage
        .read_file(path, buf)
        .map_err(|e| Fault::FileRead(file, e))?;
    if len as u64 != stat.size {
        warn!("READ: {path}: read {len} of {} bytes", stat.size);
        return Err(Fault::FileRead(file, StorageError::ReadFailed));
    }
    Ok(Some(len))
}

fn read_config_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    if ctx.config.use_device_certificate {
        return ctx.fail(Fault::Unsupported("certificate-based cloud authentication"));
    }

    let mut buf = Zeroizing::new(vec![0u8; ctx.config.max_config_file_bytes as usize]);

    let wifi_path = ctx.files.wifi_config().to_owned();
    match read_config(&*p.storage(), ProvisioningFile::WifiConfig, &wifi_path, &mut buf[..]) {
        Ok(Some(len)) => match parse_wifi_config(&buf[..len]) {
            Ok(credential) => {
                ctx.store.replace_wifi(credential);
                ctx.notify(ProvisioningEvent::CredentialsLoaded(ProvisioningFile::WifiConfig));
            }
            Err(WifiParseError::NoDirective) => {
                info!("READ: {wifi_path} holds no wifi directive, keeping current credential");
                ctx.notify(ProvisioningEvent::WifiConfigRejected(WifiParseError::NoDirective));
            }
            Err(e) => {
                warn!("READ: {wifi_path} rejected: {e}");
                ctx.notify(ProvisioningEvent::WifiConfigRejected(e));
            }
        },
        Ok(None) => info!("READ: {wifi_path} absent, keeping current credential"),
        Err(fault) => ctx.record_fault(fault),
    }

    buf.fill(0);
    let cloud_path = ctx.files.cloud_config().to_owned();
    match read_config(&*p.storage(), ProvisioningFile::CloudConfig, &cloud_path, &mut buf[..]) {
        Ok(Some(len)) => match parse_cloud_config(&buf[..len]) {
            Ok(identity) => {
                ctx.store.replace_cloud(identity);
                ctx.notify(ProvisioningEvent::CredentialsLoaded(ProvisioningFile::CloudConfig));
            }
            Err(e) => {
                warn!("READ: {cloud_path} rejected: {e}");
                ctx.notify(ProvisioningEvent::CloudConfigRejected(e));
            }
        },
        Ok(None) => info!("READ: {cloud_path} absent, keeping current identity"),
        Err(fault) => ctx.record_fault(fault),
    }

    if ctx.has_fault() {
        Some(StateId::Error)
    } else {
        Some(StateId::InitWait)
    }
}

// ───────────────────────────────────────────────────────────────
// DRIVER BRING-UP
// ───────────────────────────────────────────────────────────────

fn init_wait_enter(_ctx: &mut FsmContext) {
    info!("WIFI: waiting for driver");
}

fn init_wait_update<P: Platform>(_ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    match p.wifi().status() {
        DriverStatus::Ready => Some(StateId::InitReady),
        DriverStatus::Busy => None,
    }
}

fn init_ready_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    match p.wifi().open() {
        Ok(()) => {
            ctx.driver_open = true;
            Some(StateId::CheckCredentials)
        }
        Err(e) => {
            debug!("WIFI: open failed: {e}, retrying");
            None
        }
    }
}

fn check_credentials_update<P: Platform>(ctx: &mut FsmContext, _p: &mut P) -> Option<StateId> {
    info!(
        "CREDENTIALS: wifi '{}' ({}, {}), cloud '{}' ({})",
        ctx.store.wifi().ssid(),
        ctx.store.wifi().auth(),
        ctx.store.wifi_source(),
        ctx.store.cloud().registration_id(),
        ctx.store.cloud_source()
    );
    Some(StateId::Configure)
}

fn configure_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    let mut link = LinkConfig::new();
    if let Err(e) = apply_credential(ctx.store.wifi(), ctx.config.wifi_channel, &mut link) {
        return ctx.fail(e.into());
    }
    match p.wifi().connect(&link, ctx.notifier) {
        Ok(()) => {
            info!(
                "WIFI: connecting to '{}' on channel {}",
                link.bss.ssid, link.bss.channel
            );
            Some(StateId::Idle)
        }
        Err(e) => ctx.fail(e.into()),
    }
}

// ───────────────────────────────────────────────────────────────
// IDLE: steady state; the link callback may request a reconnect
// ───────────────────────────────────────────────────────────────

fn idle_enter(_ctx: &mut FsmContext) {
    info!("IDLE: provisioning complete, waiting for link events");
}

fn idle_update<P: Platform>(_ctx: &mut FsmContext, _p: &mut P) -> Option<StateId> {
    None
}

// ───────────────────────────────────────────────────────────────
// RECONNECT
// ───────────────────────────────────────────────────────────────

fn reconnect_enter(ctx: &mut FsmContext) {
    ctx.link_up = false;
    info!("RECONNECT: closing driver handle");
}

fn reconnect_update<P: Platform>(ctx: &mut FsmContext, p: &mut P) -> Option<StateId> {
    if ctx.driver_open {
        p.wifi().close();
        ctx.driver_open = false;
    }
    Some(StateId::InitWait)
}

// ───────────────────────────────────────────────────────────────
// ERROR: terminal
// ───────────────────────────────────────────────────────────────

fn error_enter(ctx: &mut FsmContext) {
    match ctx.fault {
        Some(fault) => {
            error!("ERROR: provisioning halted: {fault}");
            ctx.notify(ProvisioningEvent::Faulted(fault));
        }
        None => error!("ERROR: provisioning halted"),
    }
}

fn error_exit(_ctx: &mut FsmContext) {
    warn!("ERROR: leaving terminal state on external request");
}

fn error_update<P: Platform>(_ctx: &mut FsmContext, _p: &mut P) -> Option<StateId> {
    None
}
