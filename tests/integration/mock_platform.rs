//! Shared helpers for integration tests.
//!
//! Every test gets its own leaked event channel so parallel tests never
//! see each other's link or USB events.

use wfiprov::adapters::board::{Board, SimBoard};
use wfiprov::adapters::mem_storage::MemStorage;
use wfiprov::app::events::ProvisioningEvent;
use wfiprov::app::ports::EventSink;
use wfiprov::app::service::Provisioner;
use wfiprov::config::ProvisioningConfig;
use wfiprov::events::EventChannel;
use wfiprov::fsm::StateId;

// ── RecordingSink ─────────────────────────────────────────────

/// Sink that keeps every event for later assertions.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<ProvisioningEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &ProvisioningEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&ProvisioningEvent) -> bool) -> usize {
        self.events.iter().filter(|&e| pred(e)).count()
    }

    /// States entered, in order.
    pub fn states_entered(&self) -> Vec<StateId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ProvisioningEvent::StateChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ProvisioningEvent) {
        self.events.push(*event);
    }
}

// ── Setup helpers ─────────────────────────────────────────────

pub fn leaked_channel() -> &'static EventChannel {
    Box::leak(Box::new(EventChannel::new()))
}

#[allow(dead_code)]
pub fn new_service() -> Provisioner<SimBoard> {
    new_service_with(ProvisioningConfig::default())
}

pub fn new_service_with(config: ProvisioningConfig) -> Provisioner<SimBoard> {
    Provisioner::new(config, leaked_channel())
}

/// Board whose volume already carries a filesystem.
#[allow(dead_code)]
pub fn formatted_board() -> SimBoard {
    let mut board = Board::simulated();
    board.storage = MemStorage::formatted();
    board
}

/// Poll until `state` is reached or `limit` polls pass.  Returns `true`
/// when the state was reached.
pub fn run_until(
    service: &mut Provisioner<SimBoard>,
    board: &mut SimBoard,
    sink: &mut RecordingSink,
    state: StateId,
    limit: usize,
) -> bool {
    for _ in 0..limit {
        service.poll(board, sink);
        if service.state() == state {
            return true;
        }
    }
    false
}

/// Start the service and run it to `Idle`.
#[allow(dead_code)]
pub fn provision(
    service: &mut Provisioner<SimBoard>,
    board: &mut SimBoard,
    sink: &mut RecordingSink,
) {
    service.start(sink);
    assert!(
        run_until(service, board, sink, StateId::Idle, 100),
        "stuck in {:?} (fault: {:?})",
        service.state(),
        service.fault()
    );
}
