//! Time <-> pixel mapping for the timeline.
//!
//! Nothing here holds state: a [`TimeScale`] is derived from the current zoom
//! each time an engine needs one.

use crate::state::{EditorSettings, Timeline};

/// Conversion factors between seconds, frames and timeline pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    /// Zoomed pixels per second.
    pub pixels_per_second: f64,
    /// Frames per second.
    pub fps: f64,
}

impl TimeScale {
    pub fn new(base_pixels_per_second: f64, zoom: f64, fps: f64) -> Self {
        Self {
            pixels_per_second: base_pixels_per_second * zoom,
            fps,
        }
    }

    /// Build a scale for the given zoom, clamped to the configured bounds.
    pub fn from_settings(settings: &EditorSettings, zoom: f64) -> Self {
        let zoom = clamp_zoom(zoom, settings.min_zoom, settings.max_zoom);
        Self::new(settings.base_pixels_per_second, zoom, settings.fps)
    }

    pub fn to_pixels(&self, seconds: f64) -> f64 {
        seconds * self.pixels_per_second
    }

    pub fn to_seconds(&self, pixels: f64) -> f64 {
        pixels / self.pixels_per_second
    }

    /// Width in pixels of a span of frames.
    pub fn frames_to_pixels(&self, frames: f64) -> f64 {
        self.to_pixels(seconds_from_frames(frames, self.fps))
    }

    /// Number of (fractional) frames covered by a span of pixels.
    pub fn pixels_to_frames(&self, pixels: f64) -> f64 {
        frames_from_seconds(self.to_seconds(pixels), self.fps)
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::from_settings(&EditorSettings::default(), crate::constants::DEFAULT_ZOOM)
    }
}

/// Convert seconds to frame units using the given fps.
pub fn frames_from_seconds(time_seconds: f64, fps: f64) -> f64 {
    time_seconds * fps.max(1.0)
}

/// Convert frame units back to seconds using the given fps.
pub fn seconds_from_frames(frames: f64, fps: f64) -> f64 {
    frames / fps.max(1.0)
}

/// Round a time value to the nearest frame boundary.
pub fn snap_time_to_frame(time_seconds: f64, fps: f64) -> f64 {
    let fps = fps.max(1.0);
    (time_seconds * fps).round() / fps
}

pub fn clamp_zoom(zoom: f64, min: f64, max: f64) -> f64 {
    zoom.clamp(min, max)
}

/// Current zoom level with its bounds and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    level: f64,
    min: f64,
    max: f64,
    step: f64,
    default: f64,
}

impl ZoomState {
    pub fn new(settings: &EditorSettings) -> Self {
        Self {
            level: clamp_zoom(settings.default_zoom, settings.min_zoom, settings.max_zoom),
            min: settings.min_zoom,
            max: settings.max_zoom,
            step: settings.zoom_step,
            default: settings.default_zoom,
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Set a new level and return the ratio `new / old` to rescale geometry by.
    pub fn set(&mut self, zoom: f64) -> f64 {
        let old = self.level;
        self.level = clamp_zoom(zoom, self.min, self.max);
        self.level / old
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.set(self.level * self.step)
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.set(self.level / self.step)
    }

    pub fn reset(&mut self) -> f64 {
        self.set(self.default)
    }
}

/// Multiply every top-level clip's `left` and `width` by `ratio`.
///
/// Children of composite clips keep the geometry they were grouped with;
/// ungrouping maps them through the composite's current width.
pub fn rescale_timeline(timeline: &mut Timeline, ratio: f64) {
    for track in &mut timeline.tracks {
        for clip in &mut track.clips {
            clip.left *= ratio;
            clip.width *= ratio;
        }
    }
}
