//! Simulated I/O bench.
//!
//! Stands in for the physical bus driver when no RS-485 stick is
//! attached: analog channels are settable registers, coils are an
//! in-memory bank, and reads/writes can be made to fail for fault-path
//! testing. A small tank model (`step_plant`) lets the demo binary run
//! believable full cycles: the level rises while the influent pump
//! runs and falls while the effluent pump drains.

use crate::app::ports::IoPort;
use crate::calibration::{self, NUM_CHANNELS, RAW_HIGH, RAW_LOW};
use crate::error::IoError;
use crate::relay::{COILS_PER_UNIT, RELAY_UNITS};
use crate::sequencer::phases::{
    EFFLUENT_PUMP_COIL, HEATING_VALVE_COIL, INFLUENT_PUMP_COIL, PROCESS_UNIT,
};
use std::time::Duration;

/// In-memory stand-in for the relay and analog input modules.
pub struct SimIo {
    analog: [f32; NUM_CHANNELS],
    coils: [[bool; COILS_PER_UNIT]; RELAY_UNITS],
    fail_reads: bool,
    fail_writes: bool,
    write_count: usize,
}

impl Default for SimIo {
    fn default() -> Self {
        Self::new()
    }
}

impl SimIo {
    /// All channels at the 4 mA reference, all coils off.
    pub fn new() -> Self {
        Self {
            analog: [f32::from(RAW_LOW); NUM_CHANNELS],
            coils: [[false; COILS_PER_UNIT]; RELAY_UNITS],
            fail_reads: false,
            fail_writes: false,
            write_count: 0,
        }
    }

    /// Pin an analog channel to a raw count.
    pub fn set_analog(&mut self, channel: u8, raw: u16) {
        if let Some(slot) = self.analog.get_mut(channel as usize) {
            *slot = f32::from(raw);
        }
    }

    /// Current state of a coil in the bank.
    pub fn coil(&self, unit: u8, coil: u8) -> bool {
        self.coils[unit as usize][coil as usize]
    }

    /// Coil writes attempted so far (including failed ones' attempts).
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Make subsequent analog/coil reads fail with a timeout.
    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Make subsequent coil writes fail with a timeout.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Advance the bench's little tank model by `dt`.
    ///
    /// Raw counts move roughly 1% of span per second while a pump runs,
    /// and the temperature channel creeps up under the heating valve and
    /// relaxes toward ambient otherwise.
    pub fn step_plant(&mut self, dt: Duration) {
        let secs = dt.as_secs_f32();
        let span = f32::from(RAW_HIGH - RAW_LOW);
        let lvl = calibration::LEVEL_CHANNEL as usize;
        let tmp = calibration::TEMPERATURE_CHANNEL as usize;
        let unit = PROCESS_UNIT as usize;

        if self.coils[unit][INFLUENT_PUMP_COIL as usize] {
            self.analog[lvl] += span * 0.01 * secs;
        }
        if self.coils[unit][EFFLUENT_PUMP_COIL as usize] {
            self.analog[lvl] -= span * 0.012 * secs;
        }
        self.analog[lvl] = self.analog[lvl].clamp(f32::from(RAW_LOW), f32::from(RAW_HIGH));

        // Ambient sits around 20% of span; the valve adds heat slowly.
        let ambient = f32::from(RAW_LOW) + span * 0.2;
        if self.coils[unit][HEATING_VALVE_COIL as usize] {
            self.analog[tmp] += span * 0.002 * secs;
        } else {
            self.analog[tmp] += (ambient - self.analog[tmp]) * 0.01 * secs;
        }
        self.analog[tmp] = self.analog[tmp].clamp(f32::from(RAW_LOW), f32::from(RAW_HIGH));
    }
}

impl IoPort for SimIo {
    fn read_analog(&mut self, channel: u8) -> Result<u16, IoError> {
        if self.fail_reads {
            return Err(IoError::Timeout);
        }
        self.analog
            .get(channel as usize)
            .map(|&v| v as u16)
            .ok_or(IoError::AddressOutOfRange)
    }

    fn read_coil(&mut self, unit: u8, coil: u8) -> Result<bool, IoError> {
        if self.fail_reads {
            return Err(IoError::Timeout);
        }
        self.coils
            .get(unit as usize)
            .and_then(|c| c.get(coil as usize))
            .copied()
            .ok_or(IoError::AddressOutOfRange)
    }

    fn write_coil(&mut self, unit: u8, coil: u8, on: bool) -> Result<(), IoError> {
        self.write_count += 1;
        if self.fail_writes {
            return Err(IoError::Timeout);
        }
        let slot = self
            .coils
            .get_mut(unit as usize)
            .and_then(|c| c.get_mut(coil as usize))
            .ok_or(IoError::AddressOutOfRange)?;
        *slot = on;
        Ok(())
    }
}
