//! Cycle sequencer: the reactor's phase state machine.
//!
//! ```text
//!  influent ──▶ react ──▶ effluent ──▶ wait ──▶ dose ──▶ wait ──┐
//!     ▲        (timed)    (level ▼)   (timed)  (timed)  (timed) │
//!     │ (level ▲)                                               │
//!     └──────────────────────────<──────────────────────────────┘
//!
//!  any phase ──[cycle-elapsed ≥ cycle-max]──▶ influent (timers zeroed)
//! ```
//!
//! Each tick the engine accumulates elapsed time, applies the cycle-max
//! safety cutoff, then checks the current phase's completion target: a
//! calibrated level crossing for level phases, an elapsed duration for
//! timed phases. Completion advances to the next phase in the fixed
//! order, wrapping after the last.
//!
//! While inactive the machine is frozen: phase and both timers keep
//! their last values until an explicit reset.

pub mod phases;

use std::time::Duration;

use log::{info, warn};

pub use phases::{
    LevelDirection, PhaseDescriptor, PhaseId, PhaseKind, PhaseTarget, PHASE_TABLE,
};

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Cycle state
// ---------------------------------------------------------------------------

/// The single mutable record of where the cycle is.
///
/// `phase_elapsed <= cycle_elapsed` holds at all times: both advance by
/// the same tick delta and every event that zeroes cycle-elapsed zeroes
/// phase-elapsed with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleState {
    pub active: bool,
    pub phase: PhaseId,
    pub phase_elapsed: Duration,
    pub cycle_elapsed: Duration,
}

impl Default for CycleState {
    fn default() -> Self {
        Self {
            active: false,
            phase: PhaseId::FIRST,
            phase_elapsed: Duration::ZERO,
            cycle_elapsed: Duration::ZERO,
        }
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Inactive, or the current phase's target not yet reached.
    Held,
    /// The current phase completed and the cycle moved on.
    Advanced { from: PhaseId, to: PhaseId },
    /// Cycle-max exceeded: forced back to the first phase with both
    /// timers zeroed. A logged safety event, not an error.
    SafetyCutoff { cycle_elapsed: Duration },
}

// ---------------------------------------------------------------------------
// Sequencer engine
// ---------------------------------------------------------------------------

/// Advances [`CycleState`] through the phase table.
#[derive(Debug, Default)]
pub struct Sequencer {
    state: CycleState,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cycle by one tick.
    ///
    /// `reading_of` resolves a calibrated reading per analog channel;
    /// level phases look up the channel named in their table row.
    /// No-op while inactive.
    pub fn tick(
        &mut self,
        reading_of: impl Fn(u8) -> f32,
        dt: Duration,
        cfg: &SystemConfig,
    ) -> TickOutcome {
        if !self.state.active {
            return TickOutcome::Held;
        }

        self.state.cycle_elapsed += dt;
        self.state.phase_elapsed += dt;

        // Safety ceiling on total cycle duration, independent of the
        // current phase's own completion condition.
        let cycle_max = Duration::from_secs(phases::minutes_to_secs(cfg.cycle_time_max_minutes));
        if self.state.cycle_elapsed >= cycle_max {
            let elapsed = self.state.cycle_elapsed;
            warn!(
                "cycle-max reached after {}s in phase {}, forcing restart at {}",
                elapsed.as_secs(),
                self.state.phase.name(),
                PhaseId::FIRST.name()
            );
            self.state.phase = PhaseId::FIRST;
            self.state.phase_elapsed = Duration::ZERO;
            self.state.cycle_elapsed = Duration::ZERO;
            return TickOutcome::SafetyCutoff {
                cycle_elapsed: elapsed,
            };
        }

        if self.phase_complete(&reading_of, cfg) {
            let from = self.state.phase;
            let to = from.next();
            info!("phase {} complete -> {}", from.name(), to.name());
            self.state.phase = to;
            self.state.phase_elapsed = Duration::ZERO;
            return TickOutcome::Advanced { from, to };
        }

        debug_assert!(self.state.phase_elapsed <= self.state.cycle_elapsed);
        TickOutcome::Held
    }

    /// Desired state of one process coil given the current phase: ON
    /// exactly when the coil is the active phase's designated coil.
    pub fn auto_want(&self, coil: u8) -> bool {
        self.state.active && self.state.phase.process_coil() == Some(coil)
    }

    // ── Commands ──────────────────────────────────────────────

    /// Resume the cycle from the last phase and elapsed times.
    pub fn start(&mut self) {
        self.state.active = true;
        info!(
            "cycle started in phase {} (cycle {}s, phase {}s)",
            self.state.phase.name(),
            self.state.cycle_elapsed.as_secs(),
            self.state.phase_elapsed.as_secs()
        );
    }

    /// Freeze phase and timers at their current values.
    pub fn stop(&mut self) {
        self.state.active = false;
        info!("cycle stopped in phase {}", self.state.phase.name());
    }

    /// Stop and rewind to the first phase with both timers zeroed.
    pub fn reset(&mut self) {
        self.state = CycleState::default();
        info!("cycle reset");
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn phase(&self) -> PhaseId {
        self.state.phase
    }

    pub fn phase_elapsed(&self) -> Duration {
        self.state.phase_elapsed
    }

    pub fn cycle_elapsed(&self) -> Duration {
        self.state.cycle_elapsed
    }

    // ── Internal ──────────────────────────────────────────────

    fn phase_complete(&self, reading_of: &impl Fn(u8) -> f32, cfg: &SystemConfig) -> bool {
        match PhaseTarget::for_phase(self.state.phase, cfg) {
            PhaseTarget::Level {
                channel,
                threshold,
                direction,
            } => direction.crossed(reading_of(channel), threshold),
            PhaseTarget::Seconds(secs) => self.state.phase_elapsed >= Duration::from_secs(secs),
        }
    }
}
