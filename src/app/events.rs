//! Outbound application events and broadcast snapshots.
//!
//! The [`ReactorService`](super::service::ReactorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them: log them, push them to
//! connected control panels, archive them.
//!
//! Snapshots are built after a tick fully completes, so readers always
//! see a consistent (possibly stale-for-a-faulted-channel) view, never a
//! half-updated record.

use serde::Serialize;

use crate::relay::RelayMode;
use crate::sequencer::{PhaseId, PhaseTarget};

/// Structured events emitted by the reactor core.
#[derive(Debug, Clone)]
pub enum ReactorEvent {
    /// The cycle was started (resumed) in the given phase.
    Started { phase: PhaseId },

    /// The cycle was stopped; state is frozen in the given phase.
    Stopped { phase: PhaseId },

    /// The cycle was rewound to the first phase with timers zeroed.
    CycleReset,

    /// The sequencer advanced between phases.
    PhaseChanged { from: PhaseId, to: PhaseId },

    /// Cycle-max exceeded: the cycle was forced back to the first phase.
    /// A safety event, not an error.
    SafetyCutoff { cycle_elapsed_secs: u64 },

    /// A relay's physical output changed.
    RelayChanged { unit: u8, coil: u8, on: bool },

    /// A relay's operating mode changed.
    RelayModeChanged { unit: u8, coil: u8, mode: RelayMode },

    /// A channel's calibration was replaced; carries the derived fit for
    /// the confirmation broadcast.
    CalibrationUpdated {
        channel: u8,
        scale: f32,
        offset: f32,
    },

    /// Phase thresholds, cycle-max, or heating setpoints changed.
    PhaseTimesChanged(PhaseTimesSnapshot),

    /// Periodic full-state snapshot.
    Telemetry(TelemetrySnapshot),
}

// ───────────────────────────────────────────────────────────────
// Snapshots
// ───────────────────────────────────────────────────────────────

/// Per-phase configuration as the control panel renders it: level
/// thresholds for the two level phases, minutes plus derived seconds
/// for the timed phases, the cycle ceiling, and the heating band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhaseTimesSnapshot {
    pub influent_threshold: f32,
    pub effluent_threshold: f32,
    pub react_minutes: f32,
    pub react_seconds: u64,
    pub wait_minutes: f32,
    pub wait_seconds: u64,
    pub dose_nutrients_minutes: f32,
    pub dose_nutrients_seconds: u64,
    pub wait_after_dose_minutes: f32,
    pub wait_after_dose_seconds: u64,
    pub cycle_time_max_minutes: f32,
    pub heating_on_temp: f32,
    pub heating_off_temp: f32,
}

/// Run/stop state and where the cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub active: bool,
    pub phase: PhaseId,
    pub phase_elapsed_secs: u64,
}

/// Per-period timer view: total cycle elapsed, the current phase, its
/// elapsed time, and its live completion target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub cycle_elapsed_secs: u64,
    pub phase: PhaseId,
    pub phase_elapsed_secs: u64,
    pub phase_target: PhaseTarget,
}

/// One calibrated analog reading plus the metadata needed to label it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingSnapshot {
    pub channel: u8,
    pub label: &'static str,
    pub raw: u16,
    pub value: f32,
    pub unit_label: String,
}

/// Mode and physical state of one relay coil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelaySnapshot {
    pub unit: u8,
    pub coil: u8,
    pub mode: RelayMode,
    pub physical: bool,
}

/// Full state handoff for the broadcast collaborator, published after
/// each telemetry interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub status: StatusSnapshot,
    pub timer: TimerSnapshot,
    pub readings: Vec<ReadingSnapshot>,
    pub relays: Vec<RelaySnapshot>,
    /// Lifetime fault count, the panel's non-blocking fault indicator.
    pub fault_total: u64,
}
