//! Built-in default configuration.
//!
//! Describes the stock battery test rig: a charge relay on channel 1 and
//! three discharge resistors on channels 2-4 of a 4-relay board.

use crate::storage::types::{ConfigFile, FunctionEntry, HardwareSection};

/// Default configuration written on first run.
pub fn default_config() -> ConfigFile {
    ConfigFile {
        hardware: HardwareSection::default(),
        functions: vec![
            switch_entry("charge", 1),
            load_entry("load_6ohm", 2, 6.0),
            load_entry("load_20ohm", 3, 20.0),
            load_entry("load_75ohm", 4, 75.0),
        ],
    }
}

// Helpers to build entries
fn load_entry(name: &str, channel: u8, ohms: f64) -> FunctionEntry {
    FunctionEntry {
        name: name.into(),
        channel,
        resistance_ohms: Some(ohms),
    }
}

fn switch_entry(name: &str, channel: u8) -> FunctionEntry {
    FunctionEntry {
        name: name.into(),
        channel,
        resistance_ohms: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_targets_four_relay_board() {
        let config = default_config();

        assert_eq!(config.hardware.board_type, "4-relay");
        assert!(config.hardware.port.is_none());
        assert_eq!(config.functions.len(), 4);
    }

    #[test]
    fn test_default_charge_is_switch_only() {
        let config = default_config();
        let charge = config
            .functions
            .iter()
            .find(|f| f.name == "charge")
            .unwrap();

        assert_eq!(charge.channel, 1);
        assert!(charge.resistance_ohms.is_none());
    }

    #[test]
    fn test_default_channels_are_unique() {
        let config = default_config();
        let mut channels: Vec<u8> = config.functions.iter().map(|f| f.channel).collect();
        channels.sort_unstable();
        channels.dedup();

        assert_eq!(channels.len(), config.functions.len());
    }
}
