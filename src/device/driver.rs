//! CH340 relay board driver.
//!
//! Owns the serial connection and the per-channel state table, and enforces
//! the board's minimum inter-command spacing.

use std::collections::BTreeMap;
use std::io::Write;
use std::time::{Duration, Instant};

use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::device::detect::{find_relay_board, list_ports};
use crate::error::{RelayError, Result};
use crate::protocol::{BAUD_RATE, BoardType, COMMAND_SPACING, build_relay_command};

// =============================================================================
// Constants
// =============================================================================

/// Serial write timeout.
const WRITE_TIMEOUT: Duration = Duration::from_millis(100);

// =============================================================================
// Transport
// =============================================================================

/// Byte transport carrying command frames to the board.
///
/// The board never sends anything back, so the transport is write-only.
/// Production code uses [`SerialTransport`]; tests substitute a recording
/// fake to verify frames and timing without hardware.
pub trait RelayTransport: Send {
    /// Write one command frame.
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()>;
}

/// Serial transport over an open CH340 port.
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open `port_name` with the board's fixed serial parameters
    /// (9600 baud, 8-N-1, no flow control).
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if the port cannot be opened.
    pub fn open(port_name: &str) -> Result<Self> {
        let port = serialport::new(port_name, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| RelayError::DeviceNotFound {
                reason: format!("failed to open {}: {}", port_name, e),
            })?;

        Ok(Self { port })
    }
}

impl RelayTransport for SerialTransport {
    fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()
    }
}

// =============================================================================
// RelayDriver
// =============================================================================

/// CH340 relay board handle.
///
/// The protocol is write-only: the state table records what was last
/// commanded successfully, not what the hardware reports (it reports
/// nothing). All channels start OFF, reflecting the board's unknown boot
/// state.
///
/// # Example
///
/// ```no_run
/// use ch340_relay::device::RelayDriver;
/// use ch340_relay::protocol::BoardType;
///
/// let mut driver = RelayDriver::connect(BoardType::FourChannel)?;
/// driver.relay_on(1)?;
/// assert!(driver.get_state(1));
///
/// driver.all_off()?;
/// driver.close();
/// # Ok::<(), ch340_relay::error::RelayError>(())
/// ```
pub struct RelayDriver {
    transport: Option<Box<dyn RelayTransport>>,
    board: BoardType,
    states: BTreeMap<u8, bool>,
    last_command: Option<Instant>,
}

impl RelayDriver {
    /// Connect to the first CH340 relay board found on the system.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if no port matches the CH340 signature or
    /// the matched port cannot be opened.
    pub fn connect(board: BoardType) -> Result<Self> {
        let candidates = list_ports()?;

        if let Some(candidate) = find_relay_board(&candidates) {
            let transport = SerialTransport::open(&candidate.name)?;
            return Ok(Self::with_transport(Box::new(transport), board));
        }

        Err(RelayError::DeviceNotFound {
            reason: format!(
                "no CH340 device found among {} serial port(s)",
                candidates.len()
            ),
        })
    }

    /// Connect to a specific serial port, bypassing auto-detection.
    ///
    /// # Errors
    /// Returns `DeviceNotFound` if the port cannot be opened.
    pub fn connect_port(port_name: &str, board: BoardType) -> Result<Self> {
        let transport = SerialTransport::open(port_name)?;
        Ok(Self::with_transport(Box::new(transport), board))
    }

    /// Build a driver over an already-open transport.
    ///
    /// This is the injection seam for driving a board through a transport
    /// other than system serial enumeration, and for testing against a fake.
    pub fn with_transport(transport: Box<dyn RelayTransport>, board: BoardType) -> Self {
        let states = (1..=board.channel_count()).map(|ch| (ch, false)).collect();

        Self {
            transport: Some(transport),
            board,
            states,
            last_command: None,
        }
    }

    /// The board size this driver was configured for.
    pub fn board(&self) -> BoardType {
        self.board
    }

    /// Switch a relay on.
    ///
    /// # Errors
    /// Returns `InvalidChannel` if `channel` is outside the board, or
    /// `WriteFailure` if the serial write fails. The state table is only
    /// updated when the write succeeds.
    pub fn relay_on(&mut self, channel: u8) -> Result<()> {
        self.send_command(channel, true)
    }

    /// Switch a relay off.
    ///
    /// # Errors
    /// Returns `InvalidChannel` if `channel` is outside the board, or
    /// `WriteFailure` if the serial write fails.
    pub fn relay_off(&mut self, channel: u8) -> Result<()> {
        self.send_command(channel, false)
    }

    /// Switch every relay on, one frame per channel.
    ///
    /// Frames are spaced like any other command. On failure the state table
    /// reflects exactly the frames that were written.
    pub fn all_on(&mut self) -> Result<()> {
        for channel in 1..=self.board.channel_count() {
            self.relay_on(channel)?;
        }
        Ok(())
    }

    /// Switch every relay off, one frame per channel.
    pub fn all_off(&mut self) -> Result<()> {
        for channel in 1..=self.board.channel_count() {
            self.relay_off(channel)?;
        }
        Ok(())
    }

    /// Last commanded state for a channel.
    ///
    /// Pure read of the in-memory table; the hardware is never queried.
    /// Channels outside the board read as OFF.
    pub fn get_state(&self, channel: u8) -> bool {
        self.states.get(&channel).copied().unwrap_or(false)
    }

    /// Last commanded states for every channel, in channel order.
    pub fn states(&self) -> Vec<(u8, bool)> {
        self.states.iter().map(|(&ch, &on)| (ch, on)).collect()
    }

    /// Release the serial handle.
    ///
    /// The state table survives; further commands fail with `WriteFailure`
    /// until a fresh connect.
    pub fn close(&mut self) {
        self.transport = None;
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn send_command(&mut self, channel: u8, on: bool) -> Result<()> {
        self.board.validate_channel(channel)?;

        let transport = self.transport.as_mut().ok_or_else(|| {
            RelayError::WriteFailure(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "connection closed",
            ))
        })?;

        // The board's MCU drops frames sent faster than COMMAND_SPACING
        if let Some(last) = self.last_command {
            let elapsed = last.elapsed();
            if elapsed < COMMAND_SPACING {
                std::thread::sleep(COMMAND_SPACING - elapsed);
            }
        }

        let frame = build_relay_command(channel, on);
        transport.send(&frame)?;

        self.last_command = Some(Instant::now());
        self.states.insert(channel, on);
        Ok(())
    }
}

impl std::fmt::Debug for RelayDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayDriver")
            .field("board", &self.board)
            .field("states", &self.states)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{START_FLAG, STATE_OFF, STATE_ON};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording {
        frames: Vec<[u8; 4]>,
        stamps: Vec<Instant>,
        fail_after: Option<usize>,
    }

    struct MockTransport {
        recording: Arc<Mutex<Recording>>,
    }

    impl RelayTransport for MockTransport {
        fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
            let mut rec = self.recording.lock().unwrap();

            if let Some(limit) = rec.fail_after
                && rec.frames.len() >= limit
            {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "port unplugged",
                ));
            }

            let mut buf = [0u8; 4];
            buf.copy_from_slice(frame);
            rec.frames.push(buf);
            rec.stamps.push(Instant::now());
            Ok(())
        }
    }

    fn mock_driver(board: BoardType) -> (RelayDriver, Arc<Mutex<Recording>>) {
        let recording = Arc::new(Mutex::new(Recording::default()));
        let transport = MockTransport {
            recording: recording.clone(),
        };
        (
            RelayDriver::with_transport(Box::new(transport), board),
            recording,
        )
    }

    #[test]
    fn test_on_off_round_trip() {
        let (mut driver, _) = mock_driver(BoardType::FourChannel);

        for channel in 1..=4 {
            driver.relay_on(channel).unwrap();
            assert!(driver.get_state(channel));
        }
        for channel in 1..=4 {
            driver.relay_off(channel).unwrap();
            assert!(!driver.get_state(channel));
        }
    }

    #[test]
    fn test_invalid_channel_leaves_state_unchanged() {
        let (mut driver, recording) = mock_driver(BoardType::FourChannel);

        for channel in [0, 5, 9, 255] {
            assert!(matches!(
                driver.relay_on(channel),
                Err(RelayError::InvalidChannel { .. })
            ));
            assert!(matches!(
                driver.relay_off(channel),
                Err(RelayError::InvalidChannel { .. })
            ));
        }

        assert!(driver.states().iter().all(|&(_, on)| !on));
        assert!(recording.lock().unwrap().frames.is_empty());
    }

    #[test]
    fn test_emitted_frames_checksum() {
        let (mut driver, recording) = mock_driver(BoardType::EightChannel);

        driver.relay_on(2).unwrap();
        driver.relay_off(7).unwrap();

        let rec = recording.lock().unwrap();
        assert_eq!(rec.frames.len(), 2);
        assert_eq!(rec.frames[0], [START_FLAG, 2, STATE_ON, 0xA3]);
        assert_eq!(rec.frames[1], [START_FLAG, 7, STATE_OFF, 0xA7]);

        for frame in &rec.frames {
            let sum = (frame[0] as u16 + frame[1] as u16 + frame[2] as u16) % 256;
            assert_eq!(frame[3] as u16, sum);
        }
    }

    #[test]
    fn test_all_on_emits_spaced_frames() {
        let (mut driver, recording) = mock_driver(BoardType::FourChannel);

        driver.all_on().unwrap();

        let rec = recording.lock().unwrap();
        assert_eq!(rec.frames.len(), 4);
        for (i, frame) in rec.frames.iter().enumerate() {
            assert_eq!(frame[1], i as u8 + 1);
            assert_eq!(frame[2], STATE_ON);
        }
        for pair in rec.stamps.windows(2) {
            assert!(pair[1] - pair[0] >= COMMAND_SPACING);
        }

        assert!(driver.states().iter().all(|&(_, on)| on));
    }

    #[test]
    fn test_partial_failure_keeps_state_consistent() {
        let (mut driver, recording) = mock_driver(BoardType::FourChannel);
        recording.lock().unwrap().fail_after = Some(2);

        let result = driver.all_on();
        assert!(matches!(result, Err(RelayError::WriteFailure(_))));

        // Channels 1-2 were written, 3-4 were not
        assert_eq!(
            driver.states(),
            vec![(1, true), (2, true), (3, false), (4, false)]
        );
        assert_eq!(recording.lock().unwrap().frames.len(), 2);
    }

    #[test]
    fn test_commands_after_close_fail() {
        let (mut driver, recording) = mock_driver(BoardType::FourChannel);

        driver.relay_on(1).unwrap();
        driver.close();

        assert!(matches!(
            driver.relay_off(1),
            Err(RelayError::WriteFailure(_))
        ));
        // Table still reflects the last successful write
        assert!(driver.get_state(1));
        assert_eq!(recording.lock().unwrap().frames.len(), 1);
    }
}
