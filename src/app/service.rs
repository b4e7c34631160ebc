//! Application service: the hexagonal core.
//!
//! [`Provisioner`] owns the FSM and its shared context.  Each call to
//! [`Provisioner::poll`] takes pending platform events, runs one FSM
//! tick against the injected [`Platform`], and flushes the resulting
//! notices to an [`EventSink`].
//!
//! ```text
//!  link / USB callbacks ──▶ EventChannel ──▶ ┌──────────────────────┐ ──▶ EventSink
//!                                             │     Provisioner      │
//!            Platform ports ◀─────────────────│  FSM · CredentialStore│
//!                                             └──────────────────────┘
//! ```

use log::{debug, info};

use crate::config::ProvisioningConfig;
use crate::credentials::store::CredentialStore;
use crate::error::Fault;
use crate::events::{EventChannel, EventNotifier};
use crate::files::DeviceSerial;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};

use super::events::ProvisioningEvent;
use super::ports::{ConnState, EventSink, MassStoragePort, Platform};

// ───────────────────────────────────────────────────────────────
// Provisioner
// ───────────────────────────────────────────────────────────────

/// Drives the provisioning flow from power-on to a configured link.
pub struct Provisioner<P: Platform> {
    fsm: Fsm<P>,
    ctx: FsmContext,
    events: &'static EventChannel,
    poll_count: u64,
}

impl<P: Platform> Provisioner<P> {
    /// Construct the service.  Does **not** start the FSM; call
    /// [`start`](Self::start) next.
    pub fn new(config: ProvisioningConfig, events: &'static EventChannel) -> Self {
        let ctx = FsmContext::new(config, EventNotifier::new(events));
        let fsm = Fsm::new(build_state_table(), StateId::MountStorage);
        Self {
            fsm,
            ctx,
            events,
            poll_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&ProvisioningEvent::Started(self.fsm.current_state()));
        self.flush(sink);
        info!("Provisioner started in {:?}", self.fsm.current_state());
    }

    // ── Per-poll orchestration ────────────────────────────────

    /// One pass of the provisioning loop: take platform events, tick the
    /// FSM, then emit everything that happened.
    pub fn poll(&mut self, platform: &mut P, sink: &mut impl EventSink) {
        self.poll_count += 1;

        self.take_link_events();
        if let Some(present) = self.events.take_vbus() {
            self.on_vbus(present, platform);
        }
        while let Some(event) = self.events.try_receive_bus() {
            debug!("USB: {event:?}");
        }

        self.fsm.tick(&mut self.ctx, platform);
        self.flush(sink);
    }

    // ── Event handling ────────────────────────────────────────

    /// A loss latched since the last poll always wins.  A `Connected`
    /// reported alongside it belongs to the link being torn down, and
    /// Reconnect brings up a fresh one.
    fn take_link_events(&mut self) {
        let lost = self.events.take_link_loss();
        if let Some(state) = lost {
            self.on_link_state(state);
        }
        match (lost, self.events.take_link_state()) {
            (None, Some(ConnState::Connected)) => self.on_link_state(ConnState::Connected),
            (Some(_), Some(ConnState::Connected)) => {
                debug!("link up superseded by loss in the same poll")
            }
            _ => {}
        }
    }

    fn on_link_state(&mut self, state: ConnState) {
        self.ctx.notify(ProvisioningEvent::LinkStateChanged(state));
        match state {
            ConnState::Connected => {
                info!("link up");
                self.ctx.link_up = true;
            }
            ConnState::Disconnected | ConnState::Failed => {
                self.ctx.link_up = false;
                let current = self.fsm.current_state();
                if matches!(current, StateId::Error | StateId::Reconnect) {
                    debug!("link {state} ignored in {current:?}");
                } else {
                    info!("link {state}, reconnecting");
                    self.fsm.force_transition(StateId::Reconnect, &mut self.ctx);
                }
            }
            ConnState::Connecting => {}
        }
    }

    fn on_vbus(&mut self, present: bool, platform: &mut P) {
        if !self.ctx.msd_exposed {
            debug!("VBUS {present} before device layer opened, ignored");
            return;
        }
        if present {
            platform.mass_storage().attach();
            self.ctx.msd_attached = true;
            info!("USB: VBUS detected, attached");
        } else {
            platform.mass_storage().detach();
            self.ctx.msd_attached = false;
            info!("USB: VBUS removed, detached");
        }
    }

    fn flush(&mut self, sink: &mut impl EventSink) {
        for notice in &self.ctx.notices {
            sink.emit(notice);
        }
        self.ctx.notices.clear();
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Total polls executed since startup.
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    pub fn store(&self) -> &CredentialStore {
        &self.ctx.store
    }

    pub fn config(&self) -> &ProvisioningConfig {
        &self.ctx.config
    }

    /// First fatal fault, if any.
    pub fn fault(&self) -> Option<Fault> {
        self.ctx.fault
    }

    pub fn is_link_up(&self) -> bool {
        self.ctx.link_up
    }

    pub fn is_msd_attached(&self) -> bool {
        self.ctx.msd_attached
    }

    pub fn device_serial(&self) -> Option<&DeviceSerial> {
        self.ctx.device_serial.as_ref()
    }

    /// Device certificate file name, once the serial is known.
    pub fn device_cert_file(&self) -> Option<&str> {
        self.ctx.files.device_cert()
    }

    /// Producer handle for the queue this service drains.
    pub fn notifier(&self) -> EventNotifier {
        self.ctx.notifier
    }
}
