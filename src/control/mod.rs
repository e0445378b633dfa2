//! Function mapping and load modeling on top of the relay driver.

pub mod controller;
pub mod report;

pub use controller::{FunctionDef, RelayController, parallel_resistance, validate_functions};
pub use report::{ChannelReport, StateReport};
