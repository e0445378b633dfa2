//! CH340 Relay Board Library
//!
//! A Rust driver for CH340-based USB relay boards (4 and 8 channel).
//!
//! # Features
//!
//! - Auto-detect the board on USB serial ports
//! - Switch individual relays or the whole bank
//! - Map named functions (charge, resistive loads) onto channels
//! - Model the combined load and expected current draw
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use ch340_relay::control::{FunctionDef, RelayController};
//! use ch340_relay::device::RelayDriver;
//! use ch340_relay::protocol::BoardType;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Find and open the board
//!     let mut driver = RelayDriver::connect(BoardType::FourChannel)?;
//!
//!     // Raw channel control
//!     driver.relay_on(2)?;
//!     driver.relay_off(2)?;
//!
//!     // Or work with named functions
//!     let mut controller = RelayController::new(&mut driver);
//!     let mut functions = BTreeMap::new();
//!     functions.insert("load_6ohm".to_string(), FunctionDef::load(2, 6.0));
//!     controller.configure(functions)?;
//!
//!     controller.set_function("load_6ohm", true)?;
//!     println!("Expected draw: {:.2} A", controller.get_expected_current(4.2)?);
//!
//!     controller.all_off()?;
//!     Ok(())
//! }
//! ```

pub mod control;
pub mod device;
pub mod error;
pub mod protocol;
pub mod storage;
pub mod utils;

// Re-exports for convenience
pub use control::{FunctionDef, RelayController};
pub use device::RelayDriver;
pub use error::{RelayError, Result};
pub use protocol::BoardType;
