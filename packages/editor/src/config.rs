use crate::errors::EditorResult;
use crate::node::PARAGRAPH;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "editor.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Whether transactions are accepted at all
    #[serde(default = "default_editable")]
    pub editable: bool,

    /// Quiet period after which the open history item is sealed
    #[serde(default = "default_min_history_item_duration_ms")]
    pub min_history_item_duration_ms: u64,

    /// Undo/redo depth; the oldest entries are evicted first
    #[serde(default = "default_max_history_item_size")]
    pub max_history_item_size: usize,

    /// Block type created for pasted plain-text lines
    #[serde(default = "default_block_type")]
    pub default_block_type: String,
}

fn default_editable() -> bool {
    true
}

fn default_min_history_item_duration_ms() -> u64 {
    50
}

fn default_max_history_item_size() -> usize {
    200
}

fn default_block_type() -> String {
    PARAGRAPH.to_string()
}

impl EditorConfig {
    pub fn from_json(json: &str) -> EditorResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load `editor.config.json` from a directory, falling back to defaults
    pub fn load(dir: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn min_history_item_duration(&self) -> Duration {
        Duration::from_millis(self.min_history_item_duration_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            editable: default_editable(),
            min_history_item_duration_ms: default_min_history_item_duration_ms(),
            max_history_item_size: default_max_history_item_size(),
            default_block_type: default_block_type(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "editable": false,
            "minHistoryItemDurationMs": 300,
            "maxHistoryItemSize": 10
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert!(!config.editable);
        assert_eq!(config.min_history_item_duration(), Duration::from_millis(300));
        assert_eq!(config.max_history_item_size, 10);
        assert_eq!(config.default_block_type, "paragraph");
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert!(config.editable);
        assert_eq!(config.min_history_item_duration_ms, 50);
        assert_eq!(config.max_history_item_size, 200);
        assert_eq!(EditorConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("notes_editor_config_missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = std::env::temp_dir().join("notes_editor_config_present");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(DEFAULT_CONFIG_NAME), r#"{"maxHistoryItemSize": 3}"#).unwrap();

        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config.max_history_item_size, 3);
    }
}
