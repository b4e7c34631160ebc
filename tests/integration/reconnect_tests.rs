//! Link-loss handling: callbacks from the driver drive Reconnect.

use wfiprov::app::events::ProvisioningEvent;
use wfiprov::app::ports::ConnState;
use wfiprov::events::{EVENT_QUEUE_DEPTH, UsbEvent};
use wfiprov::fsm::StateId;

use crate::mock_platform::{RecordingSink, formatted_board, new_service, provision, run_until};

#[test]
fn connected_callback_marks_link_up() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);
    assert!(!service.is_link_up());

    assert!(board.wifi.report(ConnState::Connected));
    service.poll(&mut board, &mut sink);
    assert!(service.is_link_up());
    assert!(sink.contains(&ProvisioningEvent::LinkStateChanged(ConnState::Connected)));
    assert_eq!(service.state(), StateId::Idle);
}

#[test]
fn auto_connect_driver_comes_up_without_help() {
    let mut board = formatted_board();
    board.wifi.set_auto_connect(true);
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    service.poll(&mut board, &mut sink);
    assert!(service.is_link_up());
}

#[test]
fn disconnect_in_idle_reconnects_and_returns_to_idle() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);
    board.wifi.report(ConnState::Connected);
    service.poll(&mut board, &mut sink);

    board.wifi.report(ConnState::Disconnected);
    service.poll(&mut board, &mut sink);
    assert_eq!(service.state(), StateId::InitWait);
    assert!(!service.is_link_up());
    assert!(!board.wifi.is_open());

    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Idle, 20));
    assert_eq!(board.wifi.connects(), 2);
    assert!(board.wifi.is_open());
}

#[test]
fn failed_connect_also_reconnects() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    board.wifi.report(ConnState::Failed);
    service.poll(&mut board, &mut sink);
    assert!(sink.contains(&ProvisioningEvent::StateChanged {
        from: StateId::Idle,
        to: StateId::Reconnect,
    }));
    assert_eq!(service.state(), StateId::InitWait);
}

#[test]
fn reconnect_waits_for_slow_driver() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    board.wifi.set_ready_after(10);
    board.wifi.report(ConnState::Disconnected);
    for _ in 0..5 {
        service.poll(&mut board, &mut sink);
    }
    assert_eq!(service.state(), StateId::InitWait);
    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Idle, 20));
}

#[test]
fn repeated_drops_reconnect_each_time() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);

    for round in 1..=3 {
        board.wifi.report(ConnState::Disconnected);
        assert!(run_until(&mut service, &mut board, &mut sink, StateId::Idle, 20));
        assert_eq!(board.wifi.connects(), round + 1);
    }
    assert_eq!(
        sink.count(|e| *e == ProvisioningEvent::StateChanged {
            from: StateId::Idle,
            to: StateId::Reconnect
        }),
        3
    );
}

#[test]
fn link_loss_survives_a_full_bus_queue() {
    let mut board = formatted_board();
    let mut service = new_service();
    let mut sink = RecordingSink::new();
    provision(&mut service, &mut board, &mut sink);
    board.wifi.report(ConnState::Connected);
    service.poll(&mut board, &mut sink);
    assert!(service.is_link_up());

    let notifier = service.notifier();
    for _ in 0..EVENT_QUEUE_DEPTH {
        assert!(notifier.usb(UsbEvent::Reset));
    }
    assert!(!notifier.usb(UsbEvent::Reset));
    assert!(notifier.link_state(ConnState::Disconnected));

    service.poll(&mut board, &mut sink);
    assert_ne!(service.state(), StateId::Idle);
    assert!(!service.is_link_up());
    assert!(sink.contains(&ProvisioningEvent::StateChanged {
        from: StateId::Idle,
        to: StateId::Reconnect,
    }));
    assert!(run_until(&mut service, &mut board, &mut sink, StateId::Idle, 20));
    assert_eq!(board.wifi.connects(), 2);
}
