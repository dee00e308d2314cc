//! Port traits: the hexagonal boundary between domain logic and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ReactorService (domain)
//! ```
//!
//! Driven adapters (the bus driver, config storage, event sinks)
//! implement these traits. The [`ReactorService`](super::service::ReactorService)
//! consumes them via generics, so the domain core never touches a serial
//! line or the filesystem directly.

use crate::config::SystemConfig;
use crate::error::IoError;

// ───────────────────────────────────────────────────────────────
// Raw I/O port (driven adapter: bus ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Access to the plant's analog inputs and relay coils.
///
/// Implementations must carry a bounded timeout on every call: a stalled
/// device surfaces as [`IoError::Timeout`] rather than hanging the
/// control loop. The domain never retries within a tick; the next
/// scheduled tick retries naturally.
pub trait IoPort {
    /// Read one analog input channel's raw count.
    fn read_analog(&mut self, channel: u8) -> Result<u16, IoError>;

    /// Read the confirmed state of one relay coil.
    fn read_coil(&mut self, unit: u8, coil: u8) -> Result<bool, IoError>;

    /// Write one relay coil.
    fn write_coil(&mut self, unit: u8, coil: u8, on: bool) -> Result<(), IoError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate values before persisting. Invalid
/// ranges are rejected with [`ConfigError::ValidationFailed`], not
/// silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → broadcast / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured
/// [`ReactorEvent`](super::events::ReactorEvent)s through this port.
/// Adapters decide where they go: the log, a websocket broadcast, a
/// historian.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ReactorEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first start).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation; the message names the
    /// field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
