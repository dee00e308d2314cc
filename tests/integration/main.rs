//! Host-side integration tests for the reactor core.
//!
//! These verify the full chain from an operator command or a tick down
//! to coil writes and broadcast events, without any real bus hardware.

mod cycle_tests;
mod mock_io;
mod service_tests;
