//! USB device-layer events: VBUS attach and detach.

use wfiprov::adapters::usb_msd::SimMassStorage;
use wfiprov::events::UsbEvent;
use wfiprov::fsm::StateId;

use crate::mock_platform::{RecordingSink, formatted_board, new_service, provision, run_until};

#[test]
fn vbus_present_at_expose_attaches() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    assert!(board.mass_storage.is_open());
    assert!(board.mass_storage.is_attached());
    assert!(service.is_msd_attached());
}

#[test]
fn cable_plugged_later_attaches() {
    let mut board = formatted_board();
    board.mass_storage = SimMassStorage::unplugged();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);
    assert!(!board.mass_storage.is_attached());

    service.notifier().usb(UsbEvent::PowerDetected);
    service.poll(&mut board, &mut sink);
    assert!(board.mass_storage.is_attached());
}

#[test]
fn vbus_removed_detaches() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    service.notifier().usb(UsbEvent::PowerRemoved);
    service.poll(&mut board, &mut sink);
    assert!(!board.mass_storage.is_attached());
    assert!(!service.is_msd_attached());
    assert_eq!(service.state(), StateId::Idle);
}

#[test]
fn bus_events_do_not_disturb_flow() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    service.start(&mut sink);
    assert!(run_until(
        &mut service,
        &mut board,
        &mut sink,
        StateId::CheckDeviceCertFile,
        10
    ));

    let notifier = service.notifier();
    notifier.usb(UsbEvent::Reset);
    notifier.usb(UsbEvent::Configured);
    notifier.usb(UsbEvent::Suspended);
    notifier.usb(UsbEvent::Resumed);
    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Idle, 50));
    assert!(service.is_msd_attached());
}
