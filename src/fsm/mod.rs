//! Function-pointer finite state machine engine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌──────────────────┬──────────┬──────────┬──────────────────────┐│
//! │  │ StateId          │ on_enter │ on_exit  │ on_update            ││
//! │  ├──────────────────┼──────────┼──────────┼──────────────────────┤│
//! │  │ MountStorage     │ fn(ctx)  │ fn(ctx)  │ fn(ctx, p)->Option<> ││
//! │  │ ...              │          │          │                      ││
//! │  │ Error            │ fn(ctx)  │ fn(ctx)  │ fn(ctx, p)->Option<> ││
//! │  └──────────────────┴──────────┴──────────┴──────────────────────┘│
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state with
//! the shared [`FsmContext`] and the platform `P`.  If it returns
//! `Some(next_id)`, the engine runs `on_exit` for the current state, then
//! `on_enter` for the next, and updates the current pointer.  Entry and
//! exit actions see only the context; collaborator calls happen in
//! `on_update`.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::app::events::ProvisioningEvent;

// ───────────────────────────────────────────────────────────────
// State identity
// ───────────────────────────────────────────────────────────────

/// Enumeration of all provisioning states.
/// Must stay in sync with the state table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    MountStorage = 0,
    StorageMountedCheck = 1,
    FormatStorage = 2,
    ExposeMassStorage = 3,
    CheckDeviceCertFile = 4,
    CheckCloudConfigFile = 5,
    CheckWifiConfigFile = 6,
    ReadConfigFiles = 7,
    InitWait = 8,
    InitReady = 9,
    CheckCredentials = 10,
    Configure = 11,
    Idle = 12,
    Reconnect = 13,
    Error = 14,
}

impl StateId {
    /// Total number of states, used to size the table array.
    pub const COUNT: usize = 15;

    /// Every state, in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::MountStorage,
        Self::StorageMountedCheck,
        Self::FormatStorage,
        Self::ExposeMassStorage,
        Self::CheckDeviceCertFile,
        Self::CheckCloudConfigFile,
        Self::CheckWifiConfigFile,
        Self::ReadConfigFiles,
        Self::InitWait,
        Self::InitReady,
        Self::CheckCredentials,
        Self::Configure,
        Self::Idle,
        Self::Reconnect,
        Self::Error,
    ];

    /// Convert an index back to `StateId`.  Panics on out-of-range in
    /// debug builds; returns `Error` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match Self::ALL.get(idx) {
            Some(&id) => id,
            None => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Error
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Function-pointer type aliases
// ───────────────────────────────────────────────────────────────

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each state transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn<P> = fn(&mut FsmContext, &mut P) -> Option<StateId>;

// ───────────────────────────────────────────────────────────────
// State descriptor (one row in the table)
// ───────────────────────────────────────────────────────────────

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array, no heap and no `dyn`.
pub struct StateDescriptor<P> {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn<P>,
}

// ───────────────────────────────────────────────────────────────
// FSM engine
// ───────────────────────────────────────────────────────────────

/// The finite state machine engine.
///
/// Owns the state table; the [`FsmContext`] and platform are threaded
/// through every call by the owner.
pub struct Fsm<P> {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor<P>; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    /// Monotonically increasing tick counter.
    tick_count: u64,
    /// Tick at which the current state was entered.
    state_entry_tick: u64,
}

impl<P> Fsm<P> {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor<P>; StateId::COUNT], initial: StateId) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, d)| d.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run the initial `on_enter` for the starting state.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Call `on_update` for the current state.
    /// 2. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    pub fn tick(&mut self, ctx: &mut FsmContext, platform: &mut P) {
        self.tick_count += 1;
        ctx.ticks_in_state = self.tick_count - self.state_entry_tick;
        ctx.total_ticks = self.tick_count;

        let next = (self.table[self.current].on_update)(ctx, platform);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    /// Force an immediate transition (used for the asynchronous reconnect
    /// request, regardless of what `on_update` would return).
    pub fn force_transition(&mut self, next: StateId, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    /// The current state's identity.
    pub fn current_state(&self) -> StateId {
        self.table[self.current].id
    }

    /// Display name of `state`.
    pub fn state_name(&self, state: StateId) -> &'static str {
        self.table[state as usize].name
    }

    /// How many ticks the FSM has been in the current state.
    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    // ───────────────────────────────────────────────────────────
    // Internal
    // ───────────────────────────────────────────────────────────

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;
        let from = self.table[self.current].id;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        // Exit current state
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        // Update pointer and timing
        self.current = next_idx;
        self.state_entry_tick = self.tick_count;
        ctx.ticks_in_state = 0;
        ctx.notify(ProvisioningEvent::StateChanged { from, to: next_id });

        // Enter new state
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::context::FsmContext;
    use super::*;
    use crate::adapters::board::{Board, SimBoard};
    use crate::config::ProvisioningConfig;
    use crate::events::{EventChannel, EventNotifier};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_is_absorbing(ticks in 1usize..200) {
            let channel: &'static EventChannel = Box::leak(Box::new(EventChannel::new()));
            let mut ctx = FsmContext::new(ProvisioningConfig::default(), EventNotifier::new(channel));
            let mut fsm: Fsm<SimBoard> = Fsm::new(states::build_state_table(), StateId::MountStorage);
            let mut board = Board::simulated();
            fsm.start(&mut ctx);
            fsm.force_transition(StateId::Error, &mut ctx);

            for _ in 0..ticks {
                fsm.tick(&mut ctx, &mut board);
                prop_assert_eq!(fsm.current_state(), StateId::Error);
            }
        }

        #[test]
        fn happy_path_reaches_idle_for_any_driver_delay(delay in 0u32..40) {
            let channel: &'static EventChannel = Box::leak(Box::new(EventChannel::new()));
            let mut ctx = FsmContext::new(ProvisioningConfig::default(), EventNotifier::new(channel));
            let mut fsm: Fsm<SimBoard> = Fsm::new(states::build_state_table(), StateId::MountStorage);
            let mut board = Board::simulated();
            board.wifi.set_ready_after(delay);
            fsm.start(&mut ctx);

            for _ in 0..(delay as usize + 40) {
                fsm.tick(&mut ctx, &mut board);
            }
            prop_assert_eq!(fsm.current_state(), StateId::Idle);
            prop_assert!(ctx.fault.is_none());
            prop_assert!(board.wifi.last_connect().is_some());
        }
    }
}
