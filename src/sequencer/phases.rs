//! Phase identity and the static phase table.
//!
//! One row per process phase, in cycle order. Each row carries the
//! phase's completion kind and, where the phase drives a pump, the
//! process coil that wants ON while the phase is active. Thresholds and
//! durations are configuration, read through [`PhaseTarget::for_phase`]
//! so operator updates apply on the very next completion check.

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;

// ---------------------------------------------------------------------------
// Bus addresses of the reactor's actuators (relay unit 0)
// ---------------------------------------------------------------------------

/// Relay unit carrying the reactor's process actuators.
pub const PROCESS_UNIT: u8 = 0;
pub const INFLUENT_PUMP_COIL: u8 = 0;
pub const EFFLUENT_PUMP_COIL: u8 = 1;
pub const NUTRIENT_PUMP_COIL: u8 = 2;
/// Heating valve, driven by the hysteresis controller rather than the
/// phase table.
pub const HEATING_VALVE_COIL: u8 = 5;

/// Coils the sequencer feeds want-states to. Compressor coils 3 and 4
/// stay operator-controlled and are deliberately absent here.
pub const PROCESS_COILS: [u8; 3] = [
    INFLUENT_PUMP_COIL,
    EFFLUENT_PUMP_COIL,
    NUTRIENT_PUMP_COIL,
];

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// The six phases of one treatment cycle, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PhaseId {
    Influent = 0,
    React = 1,
    Effluent = 2,
    Wait = 3,
    DoseNutrients = 4,
    WaitAfterDose = 5,
}

impl PhaseId {
    /// Total number of phases, used to size the table array.
    pub const COUNT: usize = 6;

    /// The first phase of every cycle.
    pub const FIRST: PhaseId = PhaseId::Influent;

    /// Convert a `usize` index back to a `PhaseId`. Out-of-range indices
    /// wrap to the first phase (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Influent,
            1 => Self::React,
            2 => Self::Effluent,
            3 => Self::Wait,
            4 => Self::DoseNutrients,
            5 => Self::WaitAfterDose,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Influent
            }
        }
    }

    /// The phase after this one, wrapping to the first after the last.
    pub fn next(self) -> Self {
        Self::from_index((self as usize + 1) % Self::COUNT)
    }

    /// Display name as the control panel shows it.
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    /// This phase's static table row.
    pub fn descriptor(self) -> &'static PhaseDescriptor {
        &PHASE_TABLE[self as usize]
    }

    /// The process coil that wants ON while this phase is active, if any.
    pub fn process_coil(self) -> Option<u8> {
        self.descriptor().process_coil
    }
}

// ---------------------------------------------------------------------------
// Phase table
// ---------------------------------------------------------------------------

/// How a phase completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseKind {
    /// Completes when the calibrated reading on `channel` crosses the
    /// configured threshold in the configured direction.
    Level { channel: u8 },
    /// Completes when phase-elapsed reaches the configured duration.
    Timed,
}

/// Which way a level phase's reading must cross its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelDirection {
    /// Complete at or above the threshold (tank filling).
    Rising,
    /// Complete at or below the threshold (tank draining).
    Falling,
}

impl LevelDirection {
    /// True when `value` has crossed `threshold` in this direction.
    pub fn crossed(self, value: f32, threshold: f32) -> bool {
        match self {
            Self::Rising => value >= threshold,
            Self::Falling => value <= threshold,
        }
    }
}

/// Static descriptor for a single phase. Stored in a fixed-size array.
pub struct PhaseDescriptor {
    pub id: PhaseId,
    pub name: &'static str,
    pub kind: PhaseKind,
    /// Process coil that wants ON during this phase (None for hold
    /// phases; every process coil then wants OFF).
    pub process_coil: Option<u8>,
}

/// The cycle's phase table. Order is fixed at build time; only the
/// threshold values behind each row are configurable.
pub static PHASE_TABLE: [PhaseDescriptor; PhaseId::COUNT] = [
    PhaseDescriptor {
        id: PhaseId::Influent,
        name: "influent",
        kind: PhaseKind::Level {
            channel: crate::calibration::LEVEL_CHANNEL,
        },
        process_coil: Some(INFLUENT_PUMP_COIL),
    },
    PhaseDescriptor {
        id: PhaseId::React,
        name: "react",
        kind: PhaseKind::Timed,
        process_coil: None,
    },
    PhaseDescriptor {
        id: PhaseId::Effluent,
        name: "effluent",
        kind: PhaseKind::Level {
            channel: crate::calibration::LEVEL_CHANNEL,
        },
        process_coil: Some(EFFLUENT_PUMP_COIL),
    },
    PhaseDescriptor {
        id: PhaseId::Wait,
        name: "wait",
        kind: PhaseKind::Timed,
        process_coil: None,
    },
    PhaseDescriptor {
        id: PhaseId::DoseNutrients,
        name: "dose_nutrients",
        kind: PhaseKind::Timed,
        process_coil: Some(NUTRIENT_PUMP_COIL),
    },
    PhaseDescriptor {
        id: PhaseId::WaitAfterDose,
        name: "wait_after_dose",
        kind: PhaseKind::Timed,
        process_coil: None,
    },
];

// ---------------------------------------------------------------------------
// Per-phase completion target (threshold accessor)
// ---------------------------------------------------------------------------

/// The current completion target of a phase, resolved against live
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseTarget {
    /// Calibrated level threshold plus crossing direction.
    Level {
        channel: u8,
        threshold: f32,
        direction: LevelDirection,
    },
    /// Phase duration in whole seconds.
    Seconds(u64),
}

impl PhaseTarget {
    /// Resolve `phase`'s target from configuration.
    pub fn for_phase(phase: PhaseId, cfg: &SystemConfig) -> Self {
        match phase.descriptor().kind {
            PhaseKind::Level { channel } => match phase {
                PhaseId::Influent => Self::Level {
                    channel,
                    threshold: cfg.influent_threshold,
                    direction: cfg.influent_direction,
                },
                _ => Self::Level {
                    channel,
                    threshold: cfg.effluent_threshold,
                    direction: cfg.effluent_direction,
                },
            },
            PhaseKind::Timed => Self::Seconds(minutes_to_secs(cfg.phase_minutes(phase))),
        }
    }
}

/// Convert a minutes setting to whole seconds, the resolution the cycle
/// timers run at.
pub fn minutes_to_secs(minutes: f32) -> u64 {
    (minutes * 60.0).round().max(0.0) as u64
}
