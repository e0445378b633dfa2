//! Wire protocol definitions for CH340 USB relay boards.
//!
//! The boards speak a write-only 4-byte framed protocol over the CH340
//! USB-serial bridge. There is no acknowledgement channel: commands are
//! fire-and-forget and the hardware never reports back.

use std::time::Duration;

use crate::error::{RelayError, Result};

// =============================================================================
// Constants
// =============================================================================

/// Start flag opening every command frame.
pub const START_FLAG: u8 = 0xA0;

/// State byte for switching a relay on.
pub const STATE_ON: u8 = 0x01;

/// State byte for switching a relay off.
pub const STATE_OFF: u8 = 0x00;

/// Command frame length in bytes: start flag, relay number, state, checksum.
pub const COMMAND_LENGTH: usize = 4;

/// Serial baud rate expected by the board (8 data bits, no parity, 1 stop bit).
pub const BAUD_RATE: u32 = 9600;

/// Minimum spacing between consecutive frames on one connection.
///
/// The board's MCU drops frames that arrive faster than this.
pub const COMMAND_SPACING: Duration = Duration::from_millis(50);

/// QinHeng CH340 USB-serial bridge Vendor ID.
pub const CH340_VID: u16 = 0x1A86;

/// QinHeng CH340 USB-serial bridge Product ID.
pub const CH340_PID: u16 = 0x7523;

// =============================================================================
// Board Types
// =============================================================================

/// Relay board size, fixed at configuration time.
///
/// Channels are numbered contiguously starting at 1; there is no channel 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardType {
    /// 4-channel relay board.
    FourChannel,
    /// 8-channel relay board.
    EightChannel,
}

impl BoardType {
    /// Get the number of relay channels on this board.
    pub const fn channel_count(&self) -> u8 {
        match self {
            BoardType::FourChannel => 4,
            BoardType::EightChannel => 8,
        }
    }

    /// Validate a relay channel number for this board.
    pub fn validate_channel(&self, channel: u8) -> Result<u8> {
        let max = self.channel_count();

        if channel < 1 || channel > max {
            return Err(RelayError::InvalidChannel { channel, max });
        }

        Ok(channel)
    }
}

impl std::fmt::Display for BoardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoardType::FourChannel => write!(f, "4-relay"),
            BoardType::EightChannel => write!(f, "8-relay"),
        }
    }
}

// =============================================================================
// Command Builders
// =============================================================================

/// Compute the additive checksum for a command frame.
///
/// The checksum is the byte sum of start flag, relay number, and state,
/// wrapping at 256.
pub fn checksum(relay_num: u8, state: u8) -> u8 {
    START_FLAG.wrapping_add(relay_num).wrapping_add(state)
}

/// Build a relay switch command frame.
///
/// # Arguments
/// * `relay_num` - Relay channel number (1-based; validated by the caller
///   against the board size)
/// * `on` - Target state
///
/// # Returns
/// A 4-byte frame ready to write to the serial port.
pub fn build_relay_command(relay_num: u8, on: bool) -> [u8; COMMAND_LENGTH] {
    let state = if on { STATE_ON } else { STATE_OFF };
    [START_FLAG, relay_num, state, checksum(relay_num, state)]
}
