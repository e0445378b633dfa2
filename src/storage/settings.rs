//! Configuration persistence.
//!
//! Handles loading and saving config.json to disk.
//! Cross-platform: uses appropriate config directories for each OS.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::control::{FunctionDef, validate_functions};
use crate::error::{RelayError, Result};
use crate::protocol::BoardType;
use crate::storage::defaults::default_config;
use crate::storage::types::ConfigFile;
use crate::utils::parsing::parse_board_type;

// =============================================================================
// Config Path
// =============================================================================

const APP_NAME: &str = "relay-ctl";
const CONFIG_FILE: &str = "config.json";

/// Get the configuration directory path.
/// - Linux: ~/.config/relay-ctl/
/// - Windows: %APPDATA%\relay-ctl\
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join(APP_NAME))
        .ok_or_else(|| RelayError::ConfigError {
            message: "Could not find config directory".into(),
        })
}

/// Get the full path to the config file.
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join(CONFIG_FILE))
}

// =============================================================================
// Storage Functions
// =============================================================================

/// Load configuration from disk, falling back to the built-in defaults
/// when no file exists yet.
pub fn load_config() -> Result<ConfigFile> {
    let path = get_config_path()?;

    if !path.exists() {
        return Ok(default_config());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| RelayError::ConfigError {
        message: format!("Failed to read config: {}", e),
    })?;

    serde_json::from_str(&content).map_err(|e| RelayError::ConfigError {
        message: format!("Failed to parse config: {}", e),
    })
}

/// Save configuration to disk.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let dir = get_config_dir()?;
    let path = dir.join(CONFIG_FILE);

    // Create directory if needed
    std::fs::create_dir_all(&dir).map_err(|e| RelayError::ConfigError {
        message: format!("Failed to create config dir: {}", e),
    })?;

    let content = serde_json::to_string_pretty(config).map_err(|e| RelayError::ConfigError {
        message: format!("Failed to serialize config: {}", e),
    })?;

    std::fs::write(&path, content).map_err(|e| RelayError::ConfigError {
        message: format!("Failed to write config: {}", e),
    })?;

    Ok(())
}

/// Ensure that the configuration file exists.
/// If it doesn't exist, create it with the built-in battery rig defaults.
pub fn ensure_config_exists() -> Result<()> {
    let path = get_config_path()?;
    if path.exists() {
        return Ok(());
    }

    save_config(&default_config())?;
    println!("Created default config at: {}", path.display());

    Ok(())
}

// =============================================================================
// Schema Resolution
// =============================================================================

/// Resolve the stored schema into driver and controller inputs.
///
/// Runs the full function-mapping validation, so callers that never attach
/// a driver (offline load math) still only ever see checked definitions.
///
/// # Errors
/// Returns `InvalidConfiguration` on an unknown board type, a function name
/// defined twice, an out-of-range or duplicate channel, or a non-positive
/// resistance.
pub fn resolve_config(config: &ConfigFile) -> Result<(BoardType, BTreeMap<String, FunctionDef>)> {
    let board = parse_board_type(&config.hardware.board_type)?;

    let mut functions = BTreeMap::new();
    for entry in &config.functions {
        let replaced = functions.insert(
            entry.name.clone(),
            FunctionDef {
                channel: entry.channel,
                resistance: entry.resistance_ohms,
            },
        );

        if replaced.is_some() {
            return Err(RelayError::InvalidConfiguration {
                message: format!("Function '{}' is defined twice", entry.name),
            });
        }
    }

    validate_functions(board, &functions)?;

    Ok((board, functions))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_json() {
        let json = r#"{
            "hardware": { "boardType": "8-relay", "port": "/dev/ttyUSB1" },
            "functions": [
                { "name": "charge", "channel": 1 },
                { "name": "load_6ohm", "channel": 2, "resistanceOhms": 6.0 }
            ]
        }"#;

        let config: ConfigFile = serde_json::from_str(json).unwrap();
        assert_eq!(config.hardware.board_type, "8-relay");
        assert_eq!(config.hardware.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.functions.len(), 2);
        assert_eq!(config.functions[1].resistance_ohms, Some(6.0));
    }

    #[test]
    fn test_parse_config_missing_sections_uses_defaults() {
        let config: ConfigFile = serde_json::from_str("{}").unwrap();

        assert_eq!(config.hardware.board_type, "4-relay");
        assert!(config.functions.is_empty());
    }

    #[test]
    fn test_resolve_default_config() {
        let (board, functions) = resolve_config(&default_config()).unwrap();

        assert_eq!(board, BoardType::FourChannel);
        assert_eq!(functions.len(), 4);
        assert_eq!(functions["charge"].channel, 1);
        assert!(functions["charge"].resistance.is_none());
        assert_eq!(functions["load_20ohm"].resistance, Some(20.0));
    }

    #[test]
    fn test_resolve_rejects_duplicate_names() {
        let mut config = default_config();
        let mut dup = config.functions[1].clone();
        dup.channel = 4;
        config.functions.push(dup);

        assert!(matches!(
            resolve_config(&config),
            Err(RelayError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_out_of_range_channel() {
        let mut config = default_config();
        // Channel 5 on the default 4-relay board
        config.functions[0].channel = 5;

        assert!(matches!(
            resolve_config(&config),
            Err(RelayError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_duplicate_channel() {
        let mut config = default_config();
        config.functions[1].channel = config.functions[0].channel;

        assert!(matches!(
            resolve_config(&config),
            Err(RelayError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_non_positive_resistance() {
        // A hand-edited 0 ohm load must fail here, not reach the load math
        // as a divide-through-zero short circuit.
        for bad in [0.0, -6.0] {
            let mut config = default_config();
            config.functions[1].resistance_ohms = Some(bad);

            assert!(matches!(
                resolve_config(&config),
                Err(RelayError::InvalidConfiguration { .. })
            ));
        }
    }

    #[test]
    fn test_resolve_rejects_unknown_board_type() {
        let mut config = default_config();
        config.hardware.board_type = "16-relay".to_string();

        assert!(resolve_config(&config).is_err());
    }
}
