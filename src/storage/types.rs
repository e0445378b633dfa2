use serde::{Deserialize, Serialize};

/// On-disk configuration file (config.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    /// Board and connection settings
    #[serde(default)]
    pub hardware: HardwareSection,
    /// Named functions mapped to relay channels
    #[serde(default)]
    pub functions: Vec<FunctionEntry>,
}

/// Hardware connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareSection {
    /// Board size: "4-relay" or "8-relay"
    #[serde(default = "default_board_type")]
    pub board_type: String,
    /// Serial port override; auto-detect when absent
    #[serde(default)]
    pub port: Option<String>,
}

fn default_board_type() -> String {
    "4-relay".to_string()
}

impl Default for HardwareSection {
    fn default() -> Self {
        Self {
            board_type: default_board_type(),
            port: None,
        }
    }
}

/// One named function wired to a relay channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEntry {
    pub name: String,
    pub channel: u8,
    /// Load resistance in ohms; omitted for switch-only functions
    #[serde(default)]
    pub resistance_ohms: Option<f64>,
}
