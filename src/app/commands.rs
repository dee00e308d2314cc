//! Inbound commands to the reactor service.
//!
//! These represent actions requested by the outside world (control
//! panel, remote API, test harness) that the
//! [`ReactorService`](super::service::ReactorService) interprets and
//! acts upon. Commands arrive on a channel separate from the tick
//! driver and are applied between ticks, so a tick never observes a
//! half-updated configuration.

use crate::relay::RelayMode;
use crate::sequencer::PhaseId;

/// Commands that external adapters can send into the reactor core.
#[derive(Debug, Clone)]
pub enum ReactorCommand {
    /// Resume the cycle from the last phase and elapsed times.
    Start,

    /// Freeze the cycle; AUTO process relays are driven off.
    Stop,

    /// Stop, rewind to the first phase, zero both timers.
    Reset,

    /// Update a phase's completion threshold: calibrated level for the
    /// level phases, minutes for the timed phases.
    SetPhaseThreshold { phase: PhaseId, value: f32 },

    /// Update the cycle-time safety ceiling (minutes).
    SetCycleMax { minutes: f32 },

    /// Replace the heating band.
    SetHeatingSetpoints { on_temp: f32, off_temp: f32 },

    /// Replace one analog channel's two-point calibration.
    SetCalibration {
        channel: u8,
        raw1: u16,
        phys1: f32,
        raw2: u16,
        phys2: f32,
        unit_label: String,
    },

    /// Change a relay's operating mode.
    SetRelayMode { unit: u8, coil: u8, mode: RelayMode },
}
