use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::constants;
use crate::error::{EditError, EditResult};

/// Output resolution of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    /// 3840x2160 landscape
    #[default]
    #[serde(rename = "4k")]
    FourK,
    /// 1080x1920 portrait
    #[serde(rename = "shorts")]
    Shorts,
}

impl Resolution {
    /// (width, height) in pixels
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Resolution::FourK => (3840, 2160),
            Resolution::Shorts => (1080, 1920),
        }
    }
}

/// Editor-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Frame rate (frames per second)
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Pixels per second at zoom 1.0
    #[serde(default = "default_base_pixels_per_second")]
    pub base_pixels_per_second: f64,
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    #[serde(default = "default_zoom")]
    pub default_zoom: f64,
    /// Multiplier applied by zoom in/out
    #[serde(default = "default_zoom_step")]
    pub zoom_step: f64,
    /// Gap under which adjacent clips snap together for a transition
    #[serde(default = "default_snap_distance_px")]
    pub snap_distance_px: f64,
    /// Maximum number of undo entries
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_initial_timeline_width_px")]
    pub initial_timeline_width_px: f64,
    /// Distance from the end at which the timeline grows
    #[serde(default = "default_expansion_threshold_px")]
    pub expansion_threshold_px: f64,
    #[serde(default = "default_expansion_amount_px")]
    pub expansion_amount_px: f64,
}

fn default_fps() -> f64 {
    constants::FPS
}

fn default_base_pixels_per_second() -> f64 {
    constants::PIXELS_PER_SECOND
}

fn default_min_zoom() -> f64 {
    constants::MIN_ZOOM
}

fn default_max_zoom() -> f64 {
    constants::MAX_ZOOM
}

fn default_zoom() -> f64 {
    constants::DEFAULT_ZOOM
}

fn default_zoom_step() -> f64 {
    constants::ZOOM_STEP
}

fn default_snap_distance_px() -> f64 {
    constants::SNAP_DISTANCE_PX
}

fn default_history_capacity() -> usize {
    constants::HISTORY_CAPACITY
}

fn default_initial_timeline_width_px() -> f64 {
    constants::DEFAULT_TIMELINE_WIDTH_PX
}

fn default_expansion_threshold_px() -> f64 {
    constants::TIMELINE_EXPANSION_THRESHOLD_PX
}

fn default_expansion_amount_px() -> f64 {
    constants::TIMELINE_EXPANSION_AMOUNT_PX
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            base_pixels_per_second: default_base_pixels_per_second(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            default_zoom: default_zoom(),
            zoom_step: default_zoom_step(),
            snap_distance_px: default_snap_distance_px(),
            history_capacity: default_history_capacity(),
            initial_timeline_width_px: default_initial_timeline_width_px(),
            expansion_threshold_px: default_expansion_threshold_px(),
            expansion_amount_px: default_expansion_amount_px(),
        }
    }
}

impl EditorSettings {
    pub fn validate(&self) -> EditResult<()> {
        if !(self.fps > 0.0) {
            return Err(EditError::settings("fps must be positive"));
        }
        if !(self.base_pixels_per_second > 0.0) {
            return Err(EditError::settings("base_pixels_per_second must be positive"));
        }
        if !(self.min_zoom > 0.0) || !(self.max_zoom > 0.0) {
            return Err(EditError::settings("zoom bounds must be positive"));
        }
        if self.min_zoom > self.max_zoom {
            return Err(EditError::settings("min_zoom is greater than max_zoom"));
        }
        if self.default_zoom < self.min_zoom || self.default_zoom > self.max_zoom {
            return Err(EditError::settings("default_zoom is outside the zoom bounds"));
        }
        if !(self.zoom_step > 1.0) {
            return Err(EditError::settings("zoom_step must be greater than 1"));
        }
        if self.snap_distance_px < 0.0 {
            return Err(EditError::settings("snap_distance_px must not be negative"));
        }
        if self.history_capacity == 0 {
            return Err(EditError::settings("history_capacity must be at least 1"));
        }
        if !(self.initial_timeline_width_px > 0.0) || self.expansion_amount_px < 0.0 {
            return Err(EditError::settings("timeline width settings must be positive"));
        }
        Ok(())
    }

    /// Parse and validate settings. Missing fields take their defaults.
    pub fn from_json(json: &str) -> EditResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> EditResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = EditorSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.fps, 30.0);
        assert_eq!(settings.history_capacity, 100);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let settings = EditorSettings::from_json(r#"{ "fps": 24.0, "snap_distance_px": 4.0 }"#).unwrap();
        assert_eq!(settings.fps, 24.0);
        assert_eq!(settings.snap_distance_px, 4.0);
        assert_eq!(settings.max_zoom, 4.0);
    }

    #[test]
    fn rejects_inverted_zoom_bounds() {
        let err = EditorSettings::from_json(r#"{ "min_zoom": 5.0, "max_zoom": 2.0, "default_zoom": 3.0 }"#)
            .unwrap_err();
        assert!(matches!(err, EditError::Settings(_)));
    }

    #[test]
    fn rejects_zero_fps_and_flat_step() {
        let mut settings = EditorSettings::default();
        settings.fps = 0.0;
        assert!(settings.validate().is_err());
        let mut settings = EditorSettings::default();
        settings.zoom_step = 1.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "history_capacity": 5 }"#).unwrap();
        let settings = EditorSettings::load(&path).unwrap();
        assert_eq!(settings.history_capacity, 5);
    }

    #[test]
    fn resolution_wire_names() {
        assert_eq!(serde_json::to_string(&Resolution::FourK).unwrap(), "\"4k\"");
        assert_eq!(Resolution::Shorts.dimensions(), (1080, 1920));
    }
}
