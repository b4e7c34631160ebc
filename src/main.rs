//! WFI32 provisioning: host entry point.
//!
//! Runs the provisioning flow against a directory standing in for the
//! removable volume, with simulated USB, secure-element and Wi-Fi
//! adapters.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FsStorage        SimMassStorage   SimSecureElement            │
//! │  (StoragePort)    (MassStorage)    (SecureElementPort)         │
//! │  SimWifiDriver    LogEventSink                                 │
//! │  (WifiDriverPort) (EventSink)                                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │           Provisioner (FSM + credential store)         │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `wfiprov [STORAGE_DIR] [CONFIG_JSON]`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use log::{info, warn};

use wfiprov::adapters::board::Board;
use wfiprov::adapters::fs_storage::FsStorage;
use wfiprov::adapters::log_sink::LogEventSink;
use wfiprov::adapters::secure_element::SimSecureElement;
use wfiprov::adapters::usb_msd::SimMassStorage;
use wfiprov::adapters::wifi::SimWifiDriver;
use wfiprov::app::service::Provisioner;
use wfiprov::config::ProvisioningConfig;
use wfiprov::events::PLATFORM_EVENTS;
use wfiprov::fsm::StateId;

const DEFAULT_STORAGE_DIR: &str = "wfi32-volume";

fn load_config(path: Option<PathBuf>) -> Result<ProvisioningConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(ProvisioningConfig::default());
    };
    let bytes = std::fs::read(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = ProvisioningConfig::from_json(&bytes)
        .with_context(|| format!("loading config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  WFI32 provisioning v{}           ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Arguments and config ───────────────────────────────
    let mut args = std::env::args_os().skip(1);
    let storage_dir = args
        .next()
        .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);
    let config = load_config(args.next().map(PathBuf::from))?;
    let poll_interval = Duration::from_millis(u64::from(config.poll_interval_ms));

    // ── 3. Platform adapters ──────────────────────────────────
    let mut wifi = SimWifiDriver::new();
    wifi.set_auto_connect(true);
    let mut board = Board {
        storage: FsStorage::new(&storage_dir),
        mass_storage: SimMassStorage::new(),
        secure_element: SimSecureElement::new(),
        wifi,
    };
    info!("Volume root: {}", storage_dir.display());

    // ── 4. Provisioning loop ──────────────────────────────────
    let mut sink = LogEventSink::new();
    let mut provisioner = Provisioner::new(config, &PLATFORM_EVENTS);
    provisioner.start(&mut sink);

    loop {
        provisioner.poll(&mut board, &mut sink);

        match provisioner.state() {
            StateId::Error => match provisioner.fault() {
                Some(fault) => bail!("provisioning failed: {fault}"),
                None => bail!("provisioning failed"),
            },
            StateId::Idle if provisioner.is_link_up() => break,
            _ => {}
        }

        if provisioner.poll_count() % 1000 == 0 {
            warn!(
                "Still in {:?} after {} polls",
                provisioner.state(),
                provisioner.poll_count()
            );
        }
        std::thread::sleep(poll_interval);
    }

    let store = provisioner.store();
    info!(
        "Provisioned: wifi '{}' ({}), cloud registration '{}' ({})",
        store.wifi().ssid(),
        store.wifi_source(),
        store.cloud().registration_id(),
        store.cloud_source()
    );
    if let Some(cert) = provisioner.device_cert_file() {
        info!("Device certificate: {}", storage_dir.join(cert).display());
    }
    Ok(())
}
