//! Runtime fault log.
//!
//! A bounded in-memory ring of the most recent fault records: failed
//! channel reads, failed coil writes, rejected commands, config-save
//! failures, and cycle safety cutoffs. The ring backs the non-blocking
//! fault indicator in the status snapshot, so a flaky bus shows up here
//! instead of freezing the display.

use heapless::Deque;

/// Most recent records kept; older entries fall off the front.
const FAULT_RING_CAP: usize = 20;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// An analog channel read failed; its last good value was reused.
    ChannelRead { channel: u8 },
    /// A coil write failed; the want retries on the next tick.
    RelayWrite { unit: u8, coil: u8 },
    /// An operator command was rejected by validation.
    CommandRejected,
    /// A validated config write could not be persisted.
    ConfigSave,
    /// Cycle-max exceeded; the cycle was forced back to phase one.
    SafetyCutoff,
}

/// One fault occurrence, stamped with the control tick it happened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultRecord {
    pub tick: u64,
    pub kind: FaultKind,
}

/// Bounded ring of recent faults plus a lifetime counter.
#[derive(Debug, Default)]
pub struct FaultLog {
    ring: Deque<FaultRecord, FAULT_RING_CAP>,
    total: u64,
}

impl FaultLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, evicting the oldest when full.
    pub fn record(&mut self, tick: u64, kind: FaultKind) {
        if self.ring.is_full() {
            let _ = self.ring.pop_front();
        }
        let _ = self.ring.push_back(FaultRecord { tick, kind });
        self.total += 1;
    }

    /// Faults ever recorded (not capped by the ring size).
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Records currently held, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &FaultRecord> {
        self.ring.iter()
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Drop all held records. The lifetime counter is preserved.
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}
