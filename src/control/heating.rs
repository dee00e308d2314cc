//! Hysteresis controller for the reactor heating valve.
//!
//! Simple on/off control: open the valve when the calibrated temperature
//! falls to the ON setpoint, close it again once the OFF setpoint is
//! reached. Readings inside the band hold the previous output, which is
//! what keeps the valve from chattering around a single setpoint.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Heating band. Invariant `off_temp >= on_temp`, enforced at write time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatingSetpoints {
    /// Valve opens at or below this temperature (°C).
    pub on_temp: f32,
    /// Valve closes at or above this temperature (°C).
    pub off_temp: f32,
}

impl HeatingSetpoints {
    /// Validate a candidate band. The caller keeps its prior setpoints
    /// when this fails.
    pub fn validated(on_temp: f32, off_temp: f32) -> Result<Self> {
        if !(on_temp.is_finite() && off_temp.is_finite()) {
            return Err(Error::InvalidParameter("setpoints must be finite"));
        }
        if off_temp < on_temp {
            return Err(Error::InvalidSetpoints);
        }
        Ok(Self { on_temp, off_temp })
    }
}

impl Default for HeatingSetpoints {
    fn default() -> Self {
        Self {
            on_temp: 18.0,
            off_temp: 22.0,
        }
    }
}

/// The controller's last want is itself state (that is what implements
/// the hysteresis) and persists across ticks.
#[derive(Debug, Default)]
pub struct HeatingController {
    want_on: bool,
}

impl HeatingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one calibrated temperature reading against the band and
    /// return the valve want-state.
    pub fn evaluate(&mut self, temp_c: f32, setpoints: &HeatingSetpoints) -> bool {
        if !self.want_on && temp_c <= setpoints.on_temp {
            self.want_on = true;
        } else if self.want_on && temp_c >= setpoints.off_temp {
            self.want_on = false;
        }
        self.want_on
    }

    /// The want from the most recent evaluation.
    pub fn want_on(&self) -> bool {
        self.want_on
    }
}
