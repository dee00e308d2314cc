//! System configuration parameters.
//!
//! All operator-tunable values for the reactor: phase thresholds and
//! durations, the cycle-time safety ceiling, heating setpoints, and the
//! per-channel calibration table. Loaded once at startup through
//! [`ConfigPort`](crate::app::ports::ConfigPort) and saved back on each
//! validated operator write.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationTable;
use crate::control::heating::HeatingSetpoints;
use crate::sequencer::{LevelDirection, PhaseId};
use crate::{Error, Result};

/// Core system configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Level phases ---
    /// Calibrated level at which the influent phase completes.
    pub influent_threshold: f32,
    /// Calibrated level at which the effluent phase completes.
    pub effluent_threshold: f32,
    /// Crossing direction for the influent completion check.
    pub influent_direction: LevelDirection,
    /// Crossing direction for the effluent completion check.
    pub effluent_direction: LevelDirection,

    // --- Timed phases (minutes) ---
    pub react_minutes: f32,
    pub wait_minutes: f32,
    pub dose_nutrients_minutes: f32,
    pub wait_after_dose_minutes: f32,

    // --- Safety ---
    /// Ceiling on total cycle duration; exceeding it forces the cycle
    /// back to the first phase.
    pub cycle_time_max_minutes: f32,

    // --- Heating ---
    pub heating: HeatingSetpoints,

    // --- Analog inputs ---
    pub calibration: CalibrationTable,

    // --- Timing ---
    /// Control loop interval (milliseconds).
    pub tick_interval_ms: u32,
    /// Telemetry snapshot interval (seconds).
    pub telemetry_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            influent_threshold: 50.0,
            effluent_threshold: 10.0,
            influent_direction: LevelDirection::Rising,
            effluent_direction: LevelDirection::Falling,

            react_minutes: 10.0,
            wait_minutes: 5.0,
            dose_nutrients_minutes: 2.0,
            wait_after_dose_minutes: 5.0,

            cycle_time_max_minutes: 60.0,

            heating: HeatingSetpoints::default(),
            calibration: CalibrationTable::default(),

            tick_interval_ms: 1000, // 1 Hz
            telemetry_interval_secs: 10,
        }
    }
}

impl SystemConfig {
    /// Duration setting of a timed phase, in minutes. Level phases have
    /// no duration and report zero.
    pub fn phase_minutes(&self, phase: PhaseId) -> f32 {
        match phase {
            PhaseId::React => self.react_minutes,
            PhaseId::Wait => self.wait_minutes,
            PhaseId::DoseNutrients => self.dose_nutrients_minutes,
            PhaseId::WaitAfterDose => self.wait_after_dose_minutes,
            PhaseId::Influent | PhaseId::Effluent => 0.0,
        }
    }

    /// Update one phase's threshold: a calibrated level for level
    /// phases, minutes for timed phases. Negative or non-finite values
    /// are rejected and the prior value stays in force.
    pub fn set_phase_value(&mut self, phase: PhaseId, value: f32) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidParameter("phase threshold must be >= 0"));
        }
        match phase {
            PhaseId::Influent => self.influent_threshold = value,
            PhaseId::Effluent => self.effluent_threshold = value,
            PhaseId::React => self.react_minutes = value,
            PhaseId::Wait => self.wait_minutes = value,
            PhaseId::DoseNutrients => self.dose_nutrients_minutes = value,
            PhaseId::WaitAfterDose => self.wait_after_dose_minutes = value,
        }
        Ok(())
    }

    /// Update the cycle-time safety ceiling. Rejects negative values.
    pub fn set_cycle_max(&mut self, minutes: f32) -> Result<()> {
        if !minutes.is_finite() || minutes < 0.0 {
            return Err(Error::InvalidParameter("cycle max must be >= 0"));
        }
        self.cycle_time_max_minutes = minutes;
        Ok(())
    }

    /// Replace the heating band. Rejects `off_temp < on_temp`, keeping
    /// the prior setpoints in force.
    pub fn set_heating(&mut self, on_temp: f32, off_temp: f32) -> Result<()> {
        self.heating = HeatingSetpoints::validated(on_temp, off_temp)?;
        Ok(())
    }
}
