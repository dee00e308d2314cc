//! Mock bus and collaborator adapters for integration tests.
//!
//! Records every coil write so tests can assert on the full command
//! history, not just the final state.

use obelix::app::events::ReactorEvent;
use obelix::app::ports::{ConfigError, ConfigPort, EventSink, IoPort};
use obelix::config::SystemConfig;
use obelix::IoError;
use std::cell::RefCell;

// ── Recording bus ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoilWrite {
    pub unit: u8,
    pub coil: u8,
    pub on: bool,
}

pub struct RecordingIo {
    analog: [u16; 16],
    coils: [[bool; 8]; 5],
    pub writes: Vec<CoilWrite>,
    fail_writes: bool,
    fail_reads: bool,
}

#[allow(dead_code)]
impl RecordingIo {
    pub fn new() -> Self {
        Self {
            analog: [819; 16],
            coils: [[false; 8]; 5],
            writes: Vec::new(),
            fail_writes: false,
            fail_reads: false,
        }
    }

    pub fn set_analog(&mut self, channel: u8, raw: u16) {
        self.analog[channel as usize] = raw;
    }

    pub fn coil(&self, unit: u8, coil: u8) -> bool {
        self.coils[unit as usize][coil as usize]
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Writes that targeted one specific coil.
    pub fn writes_to(&self, unit: u8, coil: u8) -> Vec<CoilWrite> {
        self.writes
            .iter()
            .filter(|w| w.unit == unit && w.coil == coil)
            .copied()
            .collect()
    }
}

impl IoPort for RecordingIo {
    fn read_analog(&mut self, channel: u8) -> Result<u16, IoError> {
        if self.fail_reads {
            return Err(IoError::Timeout);
        }
        self.analog
            .get(channel as usize)
            .copied()
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
        if self.fail_writes {
            return Err(IoError::Timeout);
        }
        let slot = self
            .coils
            .get_mut(unit as usize)
            .and_then(|c| c.get_mut(coil as usize))
            .ok_or(IoError::AddressOutOfRange)?;
        *slot = on;
        self.writes.push(CoilWrite { unit, coil, on });
        Ok(())
    }
}

// ── Recording event sink ──────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<ReactorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn phase_changes(&self) -> Vec<(String, String)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReactorEvent::PhaseChanged { from, to } => {
                    Some((from.name().to_string(), to.name().to_string()))
                }
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ReactorEvent) {
        self.events.push(event.clone());
    }
}

// ── In-memory config store ────────────────────────────────────

pub struct MemoryConfig {
    saved: RefCell<Vec<SystemConfig>>,
}

#[allow(dead_code)]
impl MemoryConfig {
    pub fn new() -> Self {
        Self {
            saved: RefCell::new(Vec::new()),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.borrow().len()
    }

    pub fn last_saved(&self) -> Option<SystemConfig> {
        self.saved.borrow().last().cloned()
    }
}

impl ConfigPort for MemoryConfig {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.saved.borrow().last().cloned().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        self.saved.borrow_mut().push(config.clone());
        Ok(())
    }
}
