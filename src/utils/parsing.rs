//! Parsing utilities for CLI arguments and configuration values.
//!
//! This module provides reusable parsing functions for common input formats
//! used throughout the application.

use crate::error::{RelayError, Result};
use crate::protocol::BoardType;

// =============================================================================
// Board Type Parsing
// =============================================================================

/// Parse a board type string into a BoardType enum.
///
/// Accepts the config spelling (`4-relay`, `8-relay`) and the bare channel
/// count (`4`, `8`). Case-insensitive.
///
/// # Arguments
/// * `name` - Board type string from config or user input
///
/// # Returns
/// The corresponding BoardType variant
///
/// # Example
/// ```
/// use ch340_relay::utils::parsing::parse_board_type;
/// use ch340_relay::protocol::BoardType;
///
/// let board = parse_board_type("4-relay").unwrap();
/// assert!(matches!(board, BoardType::FourChannel));
///
/// let board = parse_board_type("8").unwrap();
/// assert!(matches!(board, BoardType::EightChannel));
/// ```
pub fn parse_board_type(name: &str) -> Result<BoardType> {
    match name.trim().to_lowercase().as_str() {
        "4-relay" | "4" => Ok(BoardType::FourChannel),
        "8-relay" | "8" => Ok(BoardType::EightChannel),
        _ => Err(RelayError::InvalidConfiguration {
            message: format!("Unknown board type '{}'. Use: 4-relay or 8-relay", name),
        }),
    }
}

// =============================================================================
// Switch State Parsing
// =============================================================================

/// Parse a switch state string into a boolean.
///
/// # Arguments
/// * `value` - State string: "on", "off", "1", or "0"
///
/// # Returns
/// `true` for on, `false` for off
pub fn parse_switch_state(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        _ => Err(RelayError::InvalidInput {
            message: format!("Unknown state '{}'. Use: on or off", value),
        }),
    }
}

// =============================================================================
// Numeric Input Parsing
// =============================================================================

/// Parse a relay channel number from user input.
///
/// Range validation against the board happens in the driver; this only
/// rejects text that is not a number at all.
pub fn parse_channel(value: &str) -> Result<u8> {
    value.trim().parse().map_err(|_| RelayError::InvalidInput {
        message: format!("Invalid channel '{}'. Use a relay number like 1", value),
    })
}

/// Parse a voltage from user input.
pub fn parse_voltage(value: &str) -> Result<f64> {
    value.trim().parse().map_err(|_| RelayError::InvalidInput {
        message: format!("Invalid voltage '{}'. Use a number like 4.2", value),
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board_type() {
        assert!(matches!(
            parse_board_type("4-relay").unwrap(),
            BoardType::FourChannel
        ));
        assert!(matches!(
            parse_board_type("8-RELAY").unwrap(),
            BoardType::EightChannel
        ));
        assert!(matches!(
            parse_board_type("4").unwrap(),
            BoardType::FourChannel
        ));
    }

    #[test]
    fn test_parse_board_type_invalid() {
        assert!(parse_board_type("16-relay").is_err());
        assert!(parse_board_type("").is_err());
    }

    #[test]
    fn test_parse_switch_state() {
        assert!(parse_switch_state("on").unwrap());
        assert!(parse_switch_state("ON").unwrap());
        assert!(parse_switch_state("1").unwrap());
        assert!(!parse_switch_state("off").unwrap());
        assert!(!parse_switch_state("0").unwrap());
    }

    #[test]
    fn test_parse_switch_state_invalid() {
        for bad in ["toggle", ""] {
            assert!(matches!(
                parse_switch_state(bad),
                Err(RelayError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_parse_channel() {
        assert_eq!(parse_channel("3").unwrap(), 3);
        assert_eq!(parse_channel(" 8 ").unwrap(), 8);
    }

    #[test]
    fn test_parse_channel_invalid_is_input_error() {
        for bad in ["x", "-1", "1.5", ""] {
            assert!(matches!(
                parse_channel(bad),
                Err(RelayError::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_parse_voltage() {
        assert!((parse_voltage("4.2").unwrap() - 4.2).abs() < 1e-9);
    }

    #[test]
    fn test_parse_voltage_invalid_is_input_error() {
        assert!(matches!(
            parse_voltage("volts"),
            Err(RelayError::InvalidInput { .. })
        ));
    }
}
