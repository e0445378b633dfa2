//! Custom error types for relay board operations.
//!
//! This module provides fine-grained error handling for device discovery,
//! serial communication, and configuration validation.

use thiserror::Error;

/// Main error type for relay board operations.
#[derive(Error, Debug)]
pub enum RelayError {
    /// No matching serial device found, or the chosen port could not be opened.
    #[error("Relay board not found: {reason}")]
    DeviceNotFound { reason: String },

    /// Relay channel outside the board's valid range.
    #[error("Invalid relay channel {channel}. Valid range: 1-{max}")]
    InvalidChannel { channel: u8, max: u8 },

    /// I/O error while transmitting command bytes.
    #[error("Serial write failed: {0}")]
    WriteFailure(#[from] std::io::Error),

    /// Serial subsystem error (enumeration, port parameters).
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Function definitions reference an out-of-range or duplicate channel,
    /// or carry a non-positive resistance.
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// No function with the given name is configured.
    #[error("Unknown function '{name}'. Check the configured function names.")]
    UnknownFunction { name: String },

    /// User-supplied input (console command, argument) could not be parsed.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Expected-current requested with zero active loads (open circuit).
    #[error("No active load. Expected current is undefined with an open circuit.")]
    NoActiveLoad,

    /// Configuration file could not be read, written, or parsed.
    #[error("Config error: {message}")]
    ConfigError { message: String },
}

/// Result type alias for relay board operations.
pub type Result<T> = std::result::Result<T, RelayError>;
