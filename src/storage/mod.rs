//! Configuration storage and persistence module.
//!
//! Handles saving and loading config.json to/from disk, plus the built-in
//! defaults used on first run.

pub mod defaults;
pub mod settings;
pub mod types;

// Re-export commonly used items
pub use defaults::default_config;
pub use settings::*;
pub use types::*;
