//! Function-pointer finite state machine engine for one auto-fill run.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌────────────────┬───────────┬───────────────────┐            │
//! │  │ StateId        │ on_enter  │ on_update         │            │
//! │  ├────────────────┼───────────┼───────────────────┤            │
//! │  │ Idle           │ fn(ctx)   │ fn(ctx)->Option<> │            │
//! │  │ Filling        │ fn(ctx)   │ fn(ctx)->Option<> │            │
//! │  │ StoppedFull    │ fn(ctx)   │ fn(ctx)->Option<> │            │
//! │  │ StoppedTimeout │ fn(ctx)   │ fn(ctx)->Option<> │            │
//! │  │ StoppedFloat   │ fn(ctx)   │ fn(ctx)->Option<> │            │
//! │  └────────────────┴───────────┴───────────────────┘            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** state.
//! If it returns `Some(next_id)`, the engine moves the current pointer
//! and runs `on_enter` for the next state. Handlers never touch hardware: they read the poll
//! inputs from [`FsmContext`] and write the fill-pump command back into
//! it. The [`AutoFillController`](crate::app::autofill::AutoFillController)
//! applies that command through the actuator port after every tick.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

use crate::telemetry::StopReason;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every state of one auto-fill invocation.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    Idle = 0,
    Filling = 1,
    StoppedFull = 2,
    StoppedTimeout = 3,
    StoppedFloat = 4,
}

impl StateId {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 5;

    /// Convert an index back to `StateId`. Out-of-range indices map to
    /// `StoppedTimeout` in release builds, the one stop that latches the
    /// lockout.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::Filling,
            2 => Self::StoppedFull,
            3 => Self::StoppedTimeout,
            4 => Self::StoppedFloat,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::StoppedTimeout
            }
        }
    }

    /// Terminal for this invocation.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::StoppedFull | Self::StoppedTimeout | Self::StoppedFloat
        )
    }

    /// Stop reason carried on the wire, for terminal states.
    pub fn stop_reason(self) -> Option<StopReason> {
        match self {
            Self::StoppedFull => Some(StopReason::Fill),
            Self::StoppedTimeout => Some(StopReason::Timer),
            Self::StoppedFloat => Some(StopReason::FloatSwitch),
            Self::Idle | Self::Filling => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter`. Runs exactly once per transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<StateId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    /// Index of the currently active state.
    current: usize,
    tick_count: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
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
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        self.tick_count += 1;

        let next = (self.table[self.current].on_update)(ctx);

        if let Some(next_id) = next {
            self.transition(next_id, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut FsmContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition @{}: {} -> {}",
            self.tick_count, self.table[self.current].name, self.table[next_idx].name
        );

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
