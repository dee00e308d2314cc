//! Obelix reactor control library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All physical-bus I/O flows through the port traits in
//! [`app::ports`]; the library itself never touches a serial line.

#![deny(unused_must_use)]

pub mod app;
pub mod calibration;
pub mod config;
pub mod control;
pub mod diagnostics;
pub mod relay;
pub mod sequencer;

mod error;

pub mod adapters;

pub use error::{Error, IoError, Result};
