//! Relay mode/override manager.
//!
//! Every coil on the bus carries a mode and the last known physical
//! state:
//!
//! ```text
//!          ┌───────────┐  operator   ┌────────────┐
//!          │   AUTO    │────────────▶│ MANUAL_ON  │
//!          │ (want fed │◀────────────│ MANUAL_OFF │
//!          │  by seq / │  operator   └────────────┘
//!          │  heating) │       MANUAL_ON ⇄ MANUAL_OFF
//!          └───────────┘
//! ```
//!
//! All transitions are operator-triggered and unconditional. A manual
//! override holds until the operator explicitly returns the coil to
//! AUTO; there is no timed fallback. While a coil is in a manual mode
//! the automatic producers keep reporting want-states, but the manager
//! discards them.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::app::ports::IoPort;
use crate::{Error, Result};

/// Relay units on the bus (four relay modules plus the EX1608DD block).
pub const RELAY_UNITS: usize = 5;
/// Coils per relay unit.
pub const COILS_PER_UNIT: usize = 8;

/// Operating mode of one relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayMode {
    /// The coil follows want-states from the sequencer or the heating
    /// controller.
    Auto,
    /// Forced on until the operator clears the override.
    ManualOn,
    /// Forced off until the operator clears the override.
    ManualOff,
}

/// Mode plus last known physical state for one (unit, coil) pair.
///
/// `physical` always reflects the last value actually written to (or
/// confirmed read from) the hardware, independent of mode; the mode only
/// determines what the manager will write next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayEntry {
    pub mode: RelayMode,
    pub physical: bool,
}

impl Default for RelayEntry {
    fn default() -> Self {
        Self {
            mode: RelayMode::Auto,
            physical: false,
        }
    }
}

/// Arbitrates between automatic want-states and manual overrides for
/// every coil, and owns the write-on-change policy towards the bus.
pub struct RelayManager {
    entries: [[RelayEntry; COILS_PER_UNIT]; RELAY_UNITS],
}

impl Default for RelayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayManager {
    /// All coils start in AUTO with an assumed-off physical state.
    pub fn new() -> Self {
        Self {
            entries: [[RelayEntry::default(); COILS_PER_UNIT]; RELAY_UNITS],
        }
    }

    /// Change a coil's mode.
    ///
    /// Manual modes write the corresponding state to the bus immediately;
    /// switching to AUTO performs no write: the coil resumes following
    /// whichever automatic producer next reports a want for it. On a
    /// failed write the mode is left unchanged and
    /// [`Error::RelayWrite`] is returned.
    pub fn set_mode(
        &mut self,
        io: &mut impl IoPort,
        unit: u8,
        coil: u8,
        mode: RelayMode,
    ) -> Result<()> {
        let entry = self.entry_checked(unit, coil)?;
        match mode {
            RelayMode::ManualOn | RelayMode::ManualOff => {
                let on = mode == RelayMode::ManualOn;
                if io.write_coil(unit, coil, on).is_err() {
                    warn!("relay u{unit} c{coil}: manual write failed, mode unchanged");
                    return Err(Error::RelayWrite { unit, coil });
                }
                let entry = &mut self.entries[unit as usize][coil as usize];
                entry.mode = mode;
                entry.physical = on;
                info!("relay u{unit} c{coil}: {mode:?}, forced {}", if on { "ON" } else { "OFF" });
            }
            RelayMode::Auto => {
                let prev = entry.mode;
                self.entries[unit as usize][coil as usize].mode = RelayMode::Auto;
                if prev != RelayMode::Auto {
                    info!("relay u{unit} c{coil}: back to AUTO");
                }
            }
        }
        Ok(())
    }

    /// Feed an automatic want-state into a coil.
    ///
    /// Discarded unless the coil is in AUTO. Writes only when the want
    /// differs from the last known physical state, to avoid redundant
    /// bus traffic. Returns `Ok(true)` when a write went out.
    pub fn apply_auto_want(
        &mut self,
        io: &mut impl IoPort,
        unit: u8,
        coil: u8,
        want_on: bool,
    ) -> Result<bool> {
        let entry = self.entry_checked(unit, coil)?;
        if entry.mode != RelayMode::Auto || entry.physical == want_on {
            return Ok(false);
        }
        if io.write_coil(unit, coil, want_on).is_err() {
            // Next tick's want evaluation retries naturally.
            return Err(Error::RelayWrite { unit, coil });
        }
        self.entries[unit as usize][coil as usize].physical = want_on;
        info!("relay u{unit} c{coil}: auto {}", if want_on { "ON" } else { "OFF" });
        Ok(true)
    }

    /// Reconcile the cached physical state from a confirmed hardware
    /// read. Does not touch the mode.
    pub fn report_physical(&mut self, unit: u8, coil: u8, is_on: bool) {
        if let Some(entry) = self.entry_mut(unit, coil) {
            entry.physical = is_on;
        }
    }

    /// Current mode of a coil (AUTO for out-of-range addresses).
    pub fn mode(&self, unit: u8, coil: u8) -> RelayMode {
        self.entry(unit, coil).map_or(RelayMode::Auto, |e| e.mode)
    }

    /// Last known physical state of a coil.
    pub fn physical(&self, unit: u8, coil: u8) -> bool {
        self.entry(unit, coil).is_some_and(|e| e.physical)
    }

    /// Iterate all (unit, coil, entry) triples for snapshot building.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8, RelayEntry)> + '_ {
        self.entries.iter().enumerate().flat_map(|(u, coils)| {
            coils
                .iter()
                .enumerate()
                .map(move |(c, e)| (u as u8, c as u8, *e))
        })
    }

    // ── Internal ──────────────────────────────────────────────

    fn entry(&self, unit: u8, coil: u8) -> Option<&RelayEntry> {
        self.entries
            .get(unit as usize)
            .and_then(|coils| coils.get(coil as usize))
    }

    fn entry_mut(&mut self, unit: u8, coil: u8) -> Option<&mut RelayEntry> {
        self.entries
            .get_mut(unit as usize)
            .and_then(|coils| coils.get_mut(coil as usize))
    }

    fn entry_checked(&self, unit: u8, coil: u8) -> Result<RelayEntry> {
        self.entry(unit, coil)
            .copied()
            .ok_or(Error::InvalidParameter("relay address out of range"))
    }
}
