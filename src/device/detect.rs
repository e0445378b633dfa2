//! Serial port discovery for CH340 relay boards.
//!
//! Enumeration is the only environment-dependent step in connecting; the
//! matching logic is a pure function over port descriptors so it can be
//! tested without hardware.

use serialport::SerialPortType;

use crate::error::Result;
use crate::protocol::{CH340_PID, CH340_VID};

/// Descriptor substrings that identify a CH340 bridge when a platform
/// reports the adapter without usable VID/PID metadata.
const DESCRIPTION_MARKERS: [&str; 2] = ["CH340", "USB-SERIAL"];

// =============================================================================
// Port Candidates
// =============================================================================

/// A serial port discovered during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    /// System port name (e.g. `/dev/ttyUSB0`, `COM7`).
    pub name: String,
    /// USB vendor ID, if the port is a USB device.
    pub vid: Option<u16>,
    /// USB product ID, if the port is a USB device.
    pub pid: Option<u16>,
    /// Manufacturer string reported by the device.
    pub manufacturer: Option<String>,
    /// Product string reported by the device.
    pub product: Option<String>,
}

impl PortCandidate {
    /// Whether this port matches the CH340 relay board signature.
    ///
    /// Matches on VID/PID first, then falls back to the "CH340" /
    /// "USB-SERIAL" descriptor strings.
    pub fn is_relay_board(&self) -> bool {
        if self.vid == Some(CH340_VID) && self.pid == Some(CH340_PID) {
            return true;
        }

        for field in [&self.product, &self.manufacturer] {
            if let Some(text) = field {
                let upper = text.to_uppercase();
                if DESCRIPTION_MARKERS.iter().any(|m| upper.contains(m)) {
                    return true;
                }
            }
        }

        false
    }
}

impl From<serialport::SerialPortInfo> for PortCandidate {
    fn from(info: serialport::SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => Self {
                name: info.port_name,
                vid: Some(usb.vid),
                pid: Some(usb.pid),
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            _ => Self {
                name: info.port_name,
                vid: None,
                pid: None,
                manufacturer: None,
                product: None,
            },
        }
    }
}

// =============================================================================
// Discovery Functions
// =============================================================================

/// List all serial ports on the system.
pub fn list_ports() -> Result<Vec<PortCandidate>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortCandidate::from).collect())
}

/// Find the first candidate matching the CH340 relay board signature.
pub fn find_relay_board(candidates: &[PortCandidate]) -> Option<&PortCandidate> {
    candidates.iter().find(|c| c.is_relay_board())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, vid: Option<u16>, pid: Option<u16>, product: Option<&str>) -> PortCandidate {
        PortCandidate {
            name: name.to_string(),
            vid,
            pid,
            manufacturer: None,
            product: product.map(String::from),
        }
    }

    #[test]
    fn test_matches_ch340_vid_pid() {
        let port = candidate("/dev/ttyUSB0", Some(0x1A86), Some(0x7523), None);
        assert!(port.is_relay_board());
    }

    #[test]
    fn test_matches_description_fallback() {
        let port = candidate("/dev/ttyUSB1", None, None, Some("USB-Serial CH340"));
        assert!(port.is_relay_board());

        let port = candidate("COM7", None, None, Some("usb-serial adapter"));
        assert!(port.is_relay_board());
    }

    #[test]
    fn test_matches_manufacturer_fallback() {
        let mut port = candidate("/dev/ttyUSB2", None, None, None);
        port.manufacturer = Some("wch.cn CH340".to_string());
        assert!(port.is_relay_board());
    }

    #[test]
    fn test_rejects_other_adapters() {
        // FTDI adapter
        let port = candidate("/dev/ttyUSB3", Some(0x0403), Some(0x6001), Some("FT232R UART"));
        assert!(!port.is_relay_board());

        // Onboard UART with no USB metadata
        let port = candidate("/dev/ttyS0", None, None, None);
        assert!(!port.is_relay_board());
    }

    #[test]
    fn test_find_relay_board_picks_first_match() {
        let ports = vec![
            candidate("/dev/ttyS0", None, None, None),
            candidate("/dev/ttyUSB0", Some(0x1A86), Some(0x7523), Some("USB Serial")),
            candidate("/dev/ttyUSB1", Some(0x1A86), Some(0x7523), Some("USB Serial")),
        ];

        let found = find_relay_board(&ports).unwrap();
        assert_eq!(found.name, "/dev/ttyUSB0");
    }

    #[test]
    fn test_find_relay_board_empty() {
        assert!(find_relay_board(&[]).is_none());
    }
}
