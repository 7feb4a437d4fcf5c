use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_SHOT_MINUTES: u32 = 10;
pub const DEFAULT_BREAK_MINUTES: u32 = 30;
pub const DEFAULT_IMPORT_MINUTES: u32 = 15;

/// Bounds applied when a reference image is stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Longest edge after compression, in pixels.
    pub max_dimension: u32,
    /// Encoder quality, 1..=100.
    pub quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            max_dimension: 600,
            quality: 70,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorConfig {
    pub shot_minutes: u32,
    pub break_minutes: u32,
    pub import_minutes: u32,
    pub compression: CompressionSettings,
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            shot_minutes: DEFAULT_SHOT_MINUTES,
            break_minutes: DEFAULT_BREAK_MINUTES,
            import_minutes: DEFAULT_IMPORT_MINUTES,
            compression: CompressionSettings::default(),
            history_depth: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AutosaveConfig {
    pub debounce_ms: u64,
    pub saved_display_ms: u64,
    pub error_display_ms: u64,
}

impl AutosaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 1000,
            saved_display_ms: 2500,
            error_display_ms: 5000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let editor = EditorConfig::default();
        assert_eq!(editor.shot_minutes, 10);
        assert_eq!(editor.break_minutes, 30);
        assert_eq!(editor.import_minutes, 15);
        assert_eq!(editor.compression.max_dimension, 600);
        assert_eq!(editor.compression.quality, 70);

        let autosave = AutosaveConfig::default();
        assert_eq!(autosave.debounce(), Duration::from_millis(1000));
        assert_eq!(autosave.saved_display(), Duration::from_millis(2500));
        assert_eq!(autosave.error_display(), Duration::from_millis(5000));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: AutosaveConfig = serde_json::from_str(r#"{"debounce_ms": 250}"#).unwrap();
        assert_eq!(cfg.debounce_ms, 250);
        assert_eq!(cfg.error_display_ms, 5000);

        let editor: EditorConfig = serde_json::from_str(r#"{"shot_minutes": 5}"#).unwrap();
        assert_eq!(editor.shot_minutes, 5);
        assert_eq!(editor.history_depth, 100);
    }
}
