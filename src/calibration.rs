//! Two-point analog calibration engine.
//!
//! Each analog channel carries a linear fit derived from two
//! (raw count, physical value) reference pairs:
//!
//! ```text
//!   physical = raw * scale + offset
//!   scale    = (phys2 - phys1) / (raw2 - raw1)
//!   offset   = phys1 - scale * raw1
//! ```
//!
//! The raw reference counts are fixed plant-wide (4 mA and 20 mA into a
//! 12-bit ADC); operators only ever adjust the physical endpoints and the
//! unit label. Conversion interpolates and extrapolates freely; physical
//! values outside [phys1, phys2] are legitimate.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Raw count corresponding to 4 mA on the analog input modules.
pub const RAW_LOW: u16 = 819;
/// Raw count corresponding to 20 mA (full scale, 12-bit).
pub const RAW_HIGH: u16 = 4095;

/// Number of calibratable analog channels (four input modules, four
/// channels each).
pub const NUM_CHANNELS: usize = 16;

/// Reactor channel assignments on the first analog input module.
pub const LEVEL_CHANNEL: u8 = 0;
pub const PH_CHANNEL: u8 = 1;
pub const TEMPERATURE_CHANNEL: u8 = 2;
pub const OXYGEN_CHANNEL: u8 = 3;

/// Maximum length of an operator-supplied unit label.
pub const UNIT_LABEL_CAP: usize = 16;

/// Display label for the reactor's monitored channels.
pub fn channel_label(channel: u8) -> &'static str {
    match channel {
        LEVEL_CHANNEL => "Level Sensor",
        PH_CHANNEL => "pH",
        TEMPERATURE_CHANNEL => "Temperature",
        OXYGEN_CHANNEL => "Dissolved Oxygen",
        _ => "Analog Input",
    }
}

/// One channel's two-point linear fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    pub raw1: u16,
    pub phys1: f32,
    pub raw2: u16,
    pub phys2: f32,
    /// Display label for the physical unit (e.g. "cm", "pH", "\u{00b0}C").
    pub unit_label: heapless::String<UNIT_LABEL_CAP>,
}

impl CalibrationPoint {
    /// Build a point from two references. Fails with
    /// [`Error::InvalidCalibration`] when the raw counts coincide.
    pub fn from_two_points(
        raw1: u16,
        phys1: f32,
        raw2: u16,
        phys2: f32,
        unit_label: &str,
    ) -> Result<Self> {
        if raw1 == raw2 {
            return Err(Error::InvalidCalibration);
        }
        let mut label = heapless::String::new();
        let _ = label.push_str(&unit_label[..unit_label.len().min(UNIT_LABEL_CAP)]);
        Ok(Self {
            raw1,
            phys1,
            raw2,
            phys2,
            unit_label: label,
        })
    }

    /// Slope of the fit in physical units per raw count.
    pub fn scale(&self) -> f32 {
        (self.phys2 - self.phys1) / (f32::from(self.raw2) - f32::from(self.raw1))
    }

    /// Physical value at raw count zero.
    pub fn offset(&self) -> f32 {
        self.phys1 - self.scale() * f32::from(self.raw1)
    }

    /// Convert a raw count to physical units.
    #[inline]
    pub fn calibrate(&self, raw: u16) -> f32 {
        f32::from(raw) * self.scale() + self.offset()
    }

    /// Convert a physical value back to a (fractional) raw count.
    #[inline]
    pub fn decalibrate(&self, physical: f32) -> f32 {
        (physical - self.offset()) / self.scale()
    }
}

impl Default for CalibrationPoint {
    /// Factory fit: 819 -> 0.0, 4095 -> 100.0, no unit label.
    fn default() -> Self {
        Self {
            raw1: RAW_LOW,
            phys1: 0.0,
            raw2: RAW_HIGH,
            phys2: 100.0,
            unit_label: heapless::String::new(),
        }
    }
}

/// Summary returned after a successful calibration update, for the
/// confirmation broadcast.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationSummary {
    pub channel: u8,
    pub scale: f32,
    pub offset: f32,
    pub phys1: f32,
    pub phys2: f32,
    pub unit_label: heapless::String<UNIT_LABEL_CAP>,
}

/// All channels' calibration points. Persisted as part of the system
/// configuration; replaced atomically per channel on operator writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    points: [CalibrationPoint; NUM_CHANNELS],
}

impl Default for CalibrationTable {
    fn default() -> Self {
        Self {
            points: core::array::from_fn(|_| CalibrationPoint::default()),
        }
    }
}

impl CalibrationTable {
    /// The channel's current fit. Channel indices wrap at the table size
    /// so a display layer can never index out of bounds.
    pub fn point(&self, channel: u8) -> &CalibrationPoint {
        &self.points[channel as usize % NUM_CHANNELS]
    }

    /// Convert a raw count on `channel` to physical units.
    pub fn calibrate(&self, channel: u8, raw: u16) -> f32 {
        self.point(channel).calibrate(raw)
    }

    /// Convert a physical value on `channel` back to a raw count.
    pub fn decalibrate(&self, channel: u8, physical: f32) -> f32 {
        self.point(channel).decalibrate(physical)
    }

    /// Validate and atomically replace one channel's fit.
    ///
    /// On `raw1 == raw2` the update is rejected with
    /// [`Error::InvalidCalibration`] and the prior fit stays in force for
    /// subsequent conversions.
    pub fn set_points(
        &mut self,
        channel: u8,
        raw1: u16,
        phys1: f32,
        raw2: u16,
        phys2: f32,
        unit_label: &str,
    ) -> Result<CalibrationSummary> {
        if channel as usize >= NUM_CHANNELS {
            return Err(Error::InvalidParameter("calibration channel out of range"));
        }
        if !(phys1.is_finite() && phys2.is_finite()) {
            return Err(Error::InvalidParameter("calibration endpoints must be finite"));
        }
        let point = CalibrationPoint::from_two_points(raw1, phys1, raw2, phys2, unit_label)?;
        let summary = CalibrationSummary {
            channel,
            scale: point.scale(),
            offset: point.offset(),
            phys1,
            phys2,
            unit_label: point.unit_label.clone(),
        };
        self.points[channel as usize] = point;
        Ok(summary)
    }
}
