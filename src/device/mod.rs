//! Device abstraction layer for CH340 relay boards.
//!
//! Provides serial port discovery and the relay driver.

pub mod detect;
pub mod driver;

pub use detect::{PortCandidate, find_relay_board, list_ports};
pub use driver::{RelayDriver, RelayTransport, SerialTransport};
