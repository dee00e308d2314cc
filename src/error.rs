//! Unified error types for the reactor controller.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! the control loop's error handling uniform. Configuration validation
//! errors are resolved inside the command handler and reported back to
//! the operator synchronously; bus errors are caught per operation so a
//! single failed channel never aborts the rest of a tick.

use thiserror::Error;

/// Every fallible operation in the controller funnels into this type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// A configuration value is negative or otherwise out of domain.
    /// The prior value stays in force.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Calibration submitted with raw1 == raw2; the linear fit would
    /// divide by zero. The channel's prior calibration stays in force.
    #[error("invalid calibration: raw reference points must differ")]
    InvalidCalibration,

    /// Heating setpoints submitted with off_temp < on_temp. The prior
    /// setpoints stay in force.
    #[error("invalid setpoints: off temperature must be >= on temperature")]
    InvalidSetpoints,

    /// A bus read or write failed.
    #[error("bus: {0}")]
    Io(#[from] IoError),

    /// A coil write failed. Mode and cached physical state are left
    /// unchanged; the next tick's want evaluation retries naturally.
    #[error("relay write failed: unit {unit} coil {coil}")]
    RelayWrite { unit: u8, coil: u8 },
}

/// Errors surfaced by [`IoPort`](crate::app::ports::IoPort)
/// implementations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// The device did not answer within the port's bounded timeout.
    #[error("bus timeout")]
    Timeout,

    /// The device answered with a malformed or unexpected frame.
    #[error("protocol error")]
    Protocol,

    /// The requested unit/coil/channel does not exist on the bus.
    #[error("address out of range")]
    AddressOutOfRange,
}

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
