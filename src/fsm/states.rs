//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  IDLE ──[start]──▶ FILLING ──[cancel]────────▶ STOPPED_FLOAT
//!                       │
//!                       ├──[volume >= stop]──▶ STOPPED_FULL
//!                       │
//!                       └──[elapsed >= cutoff]▶ STOPPED_TIMEOUT
//! ```
//!
//! The three stopped states are terminal for the invocation and all turn
//! the pump off on entry.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Called once per auto-fill run.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Idle
        StateDescriptor {
            name: "Idle",
            on_enter: Some(pump_off),
            on_update: idle_update,
        },
        // Index 1 — Filling
        StateDescriptor {
            name: "Filling",
            on_enter: Some(filling_enter),
            on_update: filling_update,
        },
        // Index 2 — StoppedFull
        StateDescriptor {
            name: "StoppedFull",
            on_enter: Some(stopped_full_enter),
            on_update: stay,
        },
        // Index 3 — StoppedTimeout
        StateDescriptor {
            name: "StoppedTimeout",
            on_enter: Some(stopped_timeout_enter),
            on_update: stay,
        },
        // Index 4 — StoppedFloat
        StateDescriptor {
            name: "StoppedFloat",
            on_enter: Some(stopped_float_enter),
            on_update: stay,
        },
    ]
}

fn pump_off(ctx: &mut FsmContext) {
    ctx.commands.fill_pump_on = false;
}

fn stay(_ctx: &mut FsmContext) -> Option<StateId> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE
// ═══════════════════════════════════════════════════════════════════════════

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    ctx.start_requested.then_some(StateId::Filling)
}

// ═══════════════════════════════════════════════════════════════════════════
//  FILLING
// ═══════════════════════════════════════════════════════════════════════════

fn filling_enter(ctx: &mut FsmContext) {
    ctx.elapsed_ms = 0;
    ctx.commands.fill_pump_on = true;
    info!(
        "FILLING: pump on, target {:.1} gal, cut-off {}s",
        ctx.limits.stop_gallons,
        ctx.limits.cutoff_ms / 1000
    );
}

fn filling_update(ctx: &mut FsmContext) -> Option<StateId> {
    // Cancellation is checked first so a tripped float always reports FL-SW.
    if ctx.cancel_requested {
        return Some(StateId::StoppedFloat);
    }
    if ctx.stop_volume_reached() {
        return Some(StateId::StoppedFull);
    }
    if ctx.cutoff_reached() {
        return Some(StateId::StoppedTimeout);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  Terminal states
// ═══════════════════════════════════════════════════════════════════════════

fn stopped_full_enter(ctx: &mut FsmContext) {
    pump_off(ctx);
    info!("STOPPED_FULL: target reached after {:.0}s", ctx.elapsed_secs());
}

fn stopped_timeout_enter(ctx: &mut FsmContext) {
    pump_off(ctx);
    warn!(
        "STOPPED_TIMEOUT: cut-off after {:.0}s without reaching {:.1} gal",
        ctx.elapsed_secs(),
        ctx.limits.stop_gallons
    );
}

fn stopped_float_enter(ctx: &mut FsmContext) {
    pump_off(ctx);
    warn!("STOPPED_FLOAT: high-water float tripped after {:.0}s", ctx.elapsed_secs());
}
