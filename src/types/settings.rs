use serde::{Deserialize, Serialize};

/// Top-level scroll manager settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScrollSettings {
    #[serde(default)]
    pub restoration: RestorationSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Restoration behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestorationSettings {
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub smooth_scroll_to_top: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RestorationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            smooth_scroll_to_top: true,
        }
    }
}

/// Navigation history bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistorySettings {
    /// Length above which the history is trimmed.
    pub max_entries: usize,
    /// Number of most recent entries kept when trimming.
    pub retain_on_overflow: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_entries: 50,
            retain_on_overflow: 25,
        }
    }
}

/// Position store bounds and durable key layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    pub key_prefix: String,
    pub max_positions: usize,
    /// Byte quota of the durable tier; 0 disables the check.
    pub quota_bytes: u64,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            key_prefix: "scroll_".to_string(),
            max_positions: 100,
            quota_bytes: 5 * 1024 * 1024,
        }
    }
}
