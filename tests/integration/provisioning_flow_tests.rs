//! End-to-end provisioning flow: media to Idle, defaults, user files.

use wfiprov::adapters::board::Board;
use wfiprov::app::events::ProvisioningEvent;
use wfiprov::app::ports::StorageError;
use wfiprov::config::ProvisioningConfig;
use wfiprov::credentials::cloud_json::{CloudParseError, parse_cloud_config};
use wfiprov::credentials::store::CredentialSource;
use wfiprov::credentials::wifi_directive::{WifiParseError, parse_wifi_config};
use wfiprov::credentials::{
    AuthMode, DEFAULT_PRIMARY_KEY, DEFAULT_REGISTRATION_ID, DEFAULT_SSID, WifiCredential,
};
use wfiprov::error::Fault;
use wfiprov::files::ProvisioningFile;
use wfiprov::fsm::StateId;
use wfiprov::link::AuthContext;

use crate::mock_platform::{
    RecordingSink, formatted_board, new_service, new_service_with, provision, run_until,
};

// ── Fresh media ───────────────────────────────────────────────

#[test]
fn blank_media_is_formatted_and_seeded_with_defaults() {
    let mut service = new_service();
    let mut board = Board::simulated();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(sink.contains(&ProvisioningEvent::StorageFormatted));
    assert!(sink.contains(&ProvisioningEvent::DefaultWritten(ProvisioningFile::CloudConfig)));
    assert!(sink.contains(&ProvisioningEvent::DefaultWritten(ProvisioningFile::WifiConfig)));
    assert_eq!(board.storage.label(), Some("WFI32-IoT"));

    let wifi = parse_wifi_config(board.storage.file("WIFI.CFG").unwrap()).unwrap();
    assert_eq!(wifi.ssid(), DEFAULT_SSID);
    let cloud = parse_cloud_config(board.storage.file("CLOUD.CFG").unwrap()).unwrap();
    assert_eq!(cloud.registration_id(), DEFAULT_REGISTRATION_ID);
    assert_eq!(cloud.primary_key(), DEFAULT_PRIMARY_KEY);
}

#[test]
fn defaults_written_are_read_back_as_file_credentials() {
    let mut service = new_service();
    let mut board = Board::simulated();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(sink.contains(&ProvisioningEvent::CredentialsLoaded(ProvisioningFile::WifiConfig)));
    assert!(sink.contains(&ProvisioningEvent::CredentialsLoaded(ProvisioningFile::CloudConfig)));
    assert_eq!(service.store().wifi_source(), CredentialSource::File);
    assert_eq!(service.store().cloud_source(), CredentialSource::File);
}

#[test]
fn state_sequence_for_blank_media() {
    let mut service = new_service();
    let mut board = Board::simulated();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert_eq!(
        sink.states_entered(),
        vec![
            StateId::StorageMountedCheck,
            StateId::FormatStorage,
            StateId::ExposeMassStorage,
            StateId::CheckDeviceCertFile,
            StateId::CheckCloudConfigFile,
            StateId::CheckWifiConfigFile,
            StateId::ReadConfigFiles,
            StateId::InitWait,
            StateId::InitReady,
            StateId::CheckCredentials,
            StateId::Configure,
            StateId::Idle,
        ]
    );
}

#[test]
fn device_certificate_is_named_after_serial() {
    let mut service = new_service();
    let mut board = Board::simulated();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert_eq!(service.device_cert_file(), Some("01238A4F5C19D277EE.cer"));
    let cert = board.storage.file("01238A4F5C19D277EE.cer").unwrap();
    assert_eq!(cert, board.secure_element.certificate());
    assert_eq!(
        sink.count(|e| matches!(e, ProvisioningEvent::CertificateProvisioned { .. })),
        1
    );
}

// ── User-supplied files ───────────────────────────────────────

#[test]
fn user_files_are_applied() {
    let mut board = formatted_board();
    board
        .storage
        .insert_file("WIFI.CFG", b"CMD:SEND_UART=wifi Lab Net,hunter2hunter2,2\n");
    board.storage.insert_file(
        "CLOUD.CFG",
        br#"{"idScope":"0ne00FFFF","registrationId":"bench-7","primaryKey":"c2VjcmV0"}"#,
    );
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(!sink.contains(&ProvisioningEvent::StorageFormatted));
    assert_eq!(
        sink.count(|e| matches!(e, ProvisioningEvent::DefaultWritten(_))),
        0
    );
    let wifi = service.store().wifi();
    assert_eq!(wifi.ssid(), "Lab Net");
    assert_eq!(wifi.auth(), AuthMode::WpaWpaMixedPersonal);
    assert_eq!(wifi.key(), "hunter2hunter2");
    assert_eq!(service.store().cloud().registration_id(), "bench-7");
}

#[test]
fn user_credential_reaches_the_driver() {
    let mut board = formatted_board();
    board
        .storage
        .insert_file("WIFI.CFG", b"CMD:SEND_UART=wifi Guest,1\n");
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    let link = board.wifi.last_connect().unwrap();
    assert_eq!(link.bss.ssid.as_str(), "Guest");
    assert_eq!(link.auth, AuthContext::Open);
}

#[test]
fn cloud_file_missing_key_keeps_prior_identity() {
    let mut board = formatted_board();
    board.storage.insert_file(
        "CLOUD.CFG",
        br#"{"idScope":"0ne00FFFF","registrationId":"bench-7"}"#,
    );
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(sink.contains(&ProvisioningEvent::CloudConfigRejected(
        CloudParseError::MissingKey("primaryKey")
    )));
    assert_eq!(service.store().cloud_source(), CredentialSource::Default);
    assert_eq!(
        service.store().cloud().registration_id(),
        DEFAULT_REGISTRATION_ID
    );
    assert!(service.fault().is_none());
}

#[test]
fn wifi_file_without_directive_keeps_default() {
    let mut board = formatted_board();
    board.storage.insert_file("WIFI.CFG", b"# edit me\n");
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(sink.contains(&ProvisioningEvent::WifiConfigRejected(
        WifiParseError::NoDirective
    )));
    assert_eq!(service.store().wifi_source(), CredentialSource::Default);
    assert_eq!(service.store().wifi().ssid(), DEFAULT_SSID);
}

#[test]
fn malformed_wifi_directive_is_reported() {
    let mut board = formatted_board();
    board
        .storage
        .insert_file("WIFI.CFG", b"CMD:SEND_UART=wifi Lab,x\n");
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(sink.contains(&ProvisioningEvent::WifiConfigRejected(
        WifiParseError::OpenCodeExpected
    )));
    assert_eq!(service.store().wifi_source(), CredentialSource::Default);
}

#[test]
fn existing_device_certificate_is_not_rewritten() {
    let mut board = formatted_board();
    board
        .storage
        .insert_file("01238A4F5C19D277EE.cer", b"user-supplied");
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert_eq!(
        board.storage.file("01238A4F5C19D277EE.cer"),
        Some(&b"user-supplied"[..])
    );
    assert_eq!(
        sink.count(|e| matches!(e, ProvisioningEvent::CertificateProvisioned { .. })),
        0
    );
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn oversized_config_file_is_fatal() {
    let mut board = formatted_board();
    board.storage.insert_file("CLOUD.CFG", &[b' '; 2048]);
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);

    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Error, 50));
    let fault = Fault::FileTooLarge(ProvisioningFile::CloudConfig);
    assert_eq!(service.fault(), Some(fault));
    assert!(sink.contains(&ProvisioningEvent::Faulted(fault)));
}

#[test]
fn short_config_read_is_fatal() {
    let mut board = formatted_board();
    board.storage.insert_file("WIFI.CFG", b"CMD:SEND_UART=wifi Lab Net,hunter2hunter2,2\n");
    board.storage.set_read_limit(Some(8));
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);

    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Error, 50));
    let fault = Fault::FileRead(ProvisioningFile::WifiConfig, StorageError::ReadFailed);
    assert_eq!(service.fault(), Some(fault));
    assert!(sink.contains(&ProvisioningEvent::Faulted(fault)));
    assert!(!sink.contains(&ProvisioningEvent::CredentialsLoaded(
        ProvisioningFile::WifiConfig
    )));
}

#[test]
fn failed_config_read_is_fatal() {
    let mut board = formatted_board();
    board.storage.fail_reads(true);
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);

    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Error, 50));
    assert_eq!(
        service.fault(),
        Some(Fault::FileRead(
            ProvisioningFile::WifiConfig,
            StorageError::ReadFailed
        ))
    );
    assert!(sink.states_entered().contains(&StateId::ReadConfigFiles));
    assert!(!sink.states_entered().contains(&StateId::InitWait));
}

#[test]
fn unwritable_volume_is_fatal() {
    let mut board = formatted_board();
    board.storage.fail_writes(true);
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);

    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Error, 50));
    assert_eq!(
        service.fault(),
        Some(Fault::FileWrite(
            ProvisioningFile::DeviceCertificate,
            StorageError::WriteFailed
        ))
    );
}

#[test]
fn unsupported_auth_mode_stops_before_connect() {
    let mut board = formatted_board();
    board
        .storage
        .insert_file("WIFI.CFG", b"CMD:SEND_UART=wifi Legacy,abcde,3\n");
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);

    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Error, 50));
    assert_eq!(service.store().wifi().auth(), AuthMode::Wep);
    assert!(matches!(service.fault(), Some(Fault::LinkConfig(_))));
    assert!(board.wifi.last_connect().is_none());
}

#[test]
fn custom_file_names_are_honoured() {
    let config = ProvisioningConfig::from_json(
        br#"{"wifi_config_file":"NET.TXT","cloud_config_file":"IOT.JSON"}"#,
    )
    .unwrap();
    let mut board = formatted_board();
    let mut service = new_service_with(config);
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(board.storage.file("NET.TXT").is_some());
    assert!(board.storage.file("IOT.JSON").is_some());
    assert!(board.storage.file("WIFI.CFG").is_none());
}

#[test]
fn slow_driver_only_delays_idle() {
    let mut board = formatted_board();
    board.wifi.set_ready_after(25);
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    let expected = WifiCredential::default();
    assert_eq!(service.store().wifi(), &expected);
    assert!(board.wifi.is_open());
}
