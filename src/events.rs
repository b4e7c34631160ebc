//! Inbound platform events.
//!
//! Events are produced outside the poll loop:
//! - the Wi-Fi driver's connection-state callback
//! - USB device-layer events (VBUS power, bus reset, configuration)
//!
//! They are consumed by [`Provisioner::poll`](crate::app::service::Provisioner::poll),
//! which takes everything pending before ticking the state machine.
//! Producers never touch the state machine or the credential store
//! directly.
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ link callback   │────▶│ link / VBUS latch│────▶│  poll loop   │
//! │ USB event cb    │────▶│ bus queue (8)    │────▶│  (consumer)  │
//! └─────────────────┘     └──────────────────┘     └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use log::{debug, warn};

use crate::app::ports::ConnState;

/// Maximum number of undelivered bus events.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// USB device-layer events relevant to mass-storage exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbEvent {
    /// VBUS detected: attach to the bus.
    PowerDetected,
    /// VBUS removed: detach from the bus.
    PowerRemoved,
    Reset,
    Configured,
    Suspended,
    Resumed,
}

/// Link and VBUS changes are latched rather than queued, so a burst of bus
/// events can never push a link loss or a cable change out of the queue.
/// Only informational bus events share the bounded channel.
pub struct EventChannel {
    link_lost: Signal<CriticalSectionRawMutex, ConnState>,
    link_state: Signal<CriticalSectionRawMutex, ConnState>,
    vbus: Signal<CriticalSectionRawMutex, bool>,
    bus: Channel<CriticalSectionRawMutex, UsbEvent, EVENT_QUEUE_DEPTH>,
}

impl EventChannel {
    pub const fn new() -> Self {
        Self {
            link_lost: Signal::new(),
            link_state: Signal::new(),
            vbus: Signal::new(),
            bus: Channel::new(),
        }
    }

    /// Most recent `Disconnected`/`Failed` since the last call.
    pub fn take_link_loss(&self) -> Option<ConnState> {
        self.link_lost.try_take()
    }

    /// Most recent link state since the last call.
    pub fn take_link_state(&self) -> Option<ConnState> {
        self.link_state.try_take()
    }

    /// Latest VBUS level since the last call.
    pub fn take_vbus(&self) -> Option<bool> {
        self.vbus.try_take()
    }

    /// Next queued bus event other than a VBUS change.
    pub fn try_receive_bus(&self) -> Option<UsbEvent> {
        self.bus.try_receive().ok()
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide queue used by the firmware binary.
pub static PLATFORM_EVENTS: EventChannel = EventChannel::new();

/// Producer handle given to drivers.  Cheap to copy; safe to call from
/// any thread.
#[derive(Clone, Copy)]
pub struct EventNotifier {
    channel: &'static EventChannel,
}

impl EventNotifier {
    pub const fn new(channel: &'static EventChannel) -> Self {
        Self { channel }
    }

    /// Connection-state callback.  `Connecting` is informational and not
    /// recorded.  Link states are latched and never dropped.
    pub fn link_state(&self, state: ConnState) -> bool {
        debug!("link callback: {state}");
        match state {
            ConnState::Connecting => {}
            ConnState::Connected => self.channel.link_state.signal(state),
            ConnState::Disconnected | ConnState::Failed => {
                // Latest state first: a consumer that sees the loss also
                // sees the state that caused it.
                self.channel.link_state.signal(state);
                self.channel.link_lost.signal(state);
            }
        }
        true
    }

    /// USB device-layer callback.  VBUS changes are latched; other events
    /// are queued.  Returns `false` if the event was dropped.
    pub fn usb(&self, event: UsbEvent) -> bool {
        debug!("usb callback: {event:?}");
        match event {
            UsbEvent::PowerDetected => self.channel.vbus.signal(true),
            UsbEvent::PowerRemoved => self.channel.vbus.signal(false),
            other => return self.push(other),
        }
        true
    }

    fn push(&self, event: UsbEvent) -> bool {
        match self.channel.bus.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!("event queue full, dropping {dropped:?}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaked_channel() -> &'static EventChannel {
        Box::leak(Box::new(EventChannel::new()))
    }

    #[test]
    fn link_loss_is_latched_with_latest_state() {
        let channel = leaked_channel();
        let notifier = EventNotifier::new(channel);
        assert!(notifier.link_state(ConnState::Disconnected));

        assert_eq!(channel.take_link_loss(), Some(ConnState::Disconnected));
        assert_eq!(channel.take_link_state(), Some(ConnState::Disconnected));
        assert_eq!(channel.take_link_loss(), None);
        assert_eq!(channel.take_link_state(), None);
    }

    #[test]
    fn reconnect_after_loss_keeps_the_loss() {
        let channel = leaked_channel();
        let notifier = EventNotifier::new(channel);
        notifier.link_state(ConnState::Failed);
        notifier.link_state(ConnState::Connected);

        assert_eq!(channel.take_link_loss(), Some(ConnState::Failed));
        assert_eq!(channel.take_link_state(), Some(ConnState::Connected));
    }

    #[test]
    fn connecting_is_not_recorded() {
        let channel = leaked_channel();
        let notifier = EventNotifier::new(channel);
        assert!(notifier.link_state(ConnState::Connecting));
        assert_eq!(channel.take_link_state(), None);
        assert_eq!(channel.take_link_loss(), None);
    }

    #[test]
    fn vbus_keeps_the_latest_level() {
        let channel = leaked_channel();
        let notifier = EventNotifier::new(channel);
        notifier.usb(UsbEvent::PowerDetected);
        notifier.usb(UsbEvent::PowerRemoved);
        assert_eq!(channel.take_vbus(), Some(false));
        assert_eq!(channel.try_receive_bus(), None);
    }

    #[test]
    fn full_bus_queue_drops_newest_but_not_link_loss() {
        let channel = leaked_channel();
        let notifier = EventNotifier::new(channel);
        for _ in 0..EVENT_QUEUE_DEPTH {
            assert!(notifier.usb(UsbEvent::Reset));
        }
        assert!(!notifier.usb(UsbEvent::Configured));
        assert!(notifier.link_state(ConnState::Disconnected));
        assert!(notifier.usb(UsbEvent::PowerRemoved));

        let mut drained = 0;
        while let Some(event) = channel.try_receive_bus() {
            assert_eq!(event, UsbEvent::Reset);
            drained += 1;
        }
        assert_eq!(drained, EVENT_QUEUE_DEPTH);
        assert_eq!(channel.take_link_loss(), Some(ConnState::Disconnected));
        assert_eq!(channel.take_vbus(), Some(false));
    }

    #[test]
    fn notifier_is_usable_from_other_threads() {
        let channel = leaked_channel();
        let notifier = EventNotifier::new(channel);
        std::thread::spawn(move || notifier.link_state(ConnState::Disconnected))
            .join()
            .unwrap();
        assert_eq!(channel.take_link_loss(), Some(ConnState::Disconnected));
    }
}
