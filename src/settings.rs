//! Engine settings
//!
//! Stage geometry and every timing constant the engine uses, loadable from a
//! JSON file. Missing fields fall back to the defaults in `crate::consts`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::StageSize;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Stage ===
    pub stage_width: f32,
    pub stage_height: f32,
    /// Sprite box edge length (pixels)
    pub sprite_size: f32,

    // === Interpreter ===
    /// Pause after Move / Turn / Go to
    pub step_pause_ms: u64,
    /// Zero-duration steps per interpreter before yielding
    pub max_instant_steps: u32,

    // === Collisions ===
    pub collision_interval_ms: u64,
    pub collision_distance: f32,
    pub collision_cooldown_ms: u64,

    // === Run ===
    /// Stop play automatically after this long (`None` = run until stopped)
    pub auto_stop_ms: Option<u64>,
    /// Seed for the demo scatter
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stage_width: STAGE_WIDTH,
            stage_height: STAGE_HEIGHT,
            sprite_size: SPRITE_SIZE,

            step_pause_ms: STEP_PAUSE_MS,
            max_instant_steps: MAX_INSTANT_STEPS,

            collision_interval_ms: COLLISION_INTERVAL_MS,
            collision_distance: COLLISION_DISTANCE,
            collision_cooldown_ms: COLLISION_COOLDOWN_MS,

            auto_stop_ms: Some(AUTO_STOP_MS),
            seed: 1,
        }
    }
}

impl Settings {
    pub fn stage_size(&self) -> StageSize {
        StageSize::new(self.stage_width, self.stage_height)
    }

    /// Collision polling interval, never zero
    pub fn collision_interval(&self) -> u64 {
        self.collision_interval_ms.max(1)
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read {}: {}, using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"stage_width": 800, "auto_stop_ms": null}"#).unwrap();
        assert_eq!(settings.stage_width, 800.0);
        assert_eq!(settings.stage_height, STAGE_HEIGHT);
        assert_eq!(settings.auto_stop_ms, None);
        assert_eq!(settings.collision_cooldown_ms, COLLISION_COOLDOWN_MS);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let settings = Settings::load(Path::new("/nonexistent/block-stage.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("block-stage-settings-{}.json", std::process::id()));
        let settings = Settings {
            sprite_size: 40.0,
            auto_stop_ms: None,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_collision_interval_never_zero() {
        let settings = Settings {
            collision_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(settings.collision_interval(), 1);
    }
}
