use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::TimeScale;

/// Visual style of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    #[default]
    Fade,
    Wipe,
    ClockWipe,
    Slide,
    Flip,
    Iris,
}

/// Timing curve of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    Spring,
    #[default]
    Linear,
}

/// One edge of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSide {
    Left,
    Right,
}

impl fmt::Display for EdgeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeSide::Left => f.write_str("left"),
            EdgeSide::Right => f.write_str("right"),
        }
    }
}

/// Which sides of a transition are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Only a right clip: fades the clip in.
    Intro,
    /// Only a left clip: fades the clip out.
    Outro,
    /// Blends the left clip into the right clip.
    Bridging,
}

/// A transition on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub id: Uuid,
    #[serde(default)]
    pub presentation: Presentation,
    #[serde(default)]
    pub timing: Timing,
    pub duration_in_frames: u32,
    /// Clip whose right edge carries this transition
    #[serde(default)]
    pub left_clip_id: Option<Uuid>,
    /// Clip whose left edge carries this transition
    #[serde(default)]
    pub right_clip_id: Option<Uuid>,
}

impl Transition {
    pub fn new(presentation: Presentation, timing: Timing, duration_in_frames: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            presentation,
            timing,
            duration_in_frames,
            left_clip_id: None,
            right_clip_id: None,
        }
    }

    /// Returns None when neither side is set
    pub fn kind(&self) -> Option<TransitionKind> {
        match (self.left_clip_id, self.right_clip_id) {
            (Some(_), Some(_)) => Some(TransitionKind::Bridging),
            (None, Some(_)) => Some(TransitionKind::Intro),
            (Some(_), None) => Some(TransitionKind::Outro),
            (None, None) => None,
        }
    }

    pub fn references(&self, clip_id: Uuid) -> bool {
        self.left_clip_id == Some(clip_id) || self.right_clip_id == Some(clip_id)
    }

    /// True when this transition bridges `a` and `b`, in either order
    pub fn links(&self, a: Uuid, b: Uuid) -> bool {
        matches!(
            (self.left_clip_id, self.right_clip_id),
            (Some(l), Some(r)) if (l == a && r == b) || (l == b && r == a)
        )
    }

    /// Width of the transition on the timeline
    pub fn width_px(&self, scale: &TimeScale) -> f64 {
        scale.frames_to_pixels(self.duration_in_frames as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_resolved_sides() {
        let mut t = Transition::new(Presentation::Fade, Timing::Linear, 15);
        assert_eq!(t.kind(), None);
        t.right_clip_id = Some(Uuid::new_v4());
        assert_eq!(t.kind(), Some(TransitionKind::Intro));
        t.left_clip_id = Some(Uuid::new_v4());
        assert_eq!(t.kind(), Some(TransitionKind::Bridging));
        t.right_clip_id = None;
        assert_eq!(t.kind(), Some(TransitionKind::Outro));
    }

    #[test]
    fn links_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut t = Transition::new(Presentation::Wipe, Timing::Spring, 10);
        t.left_clip_id = Some(a);
        t.right_clip_id = Some(b);
        assert!(t.links(a, b));
        assert!(t.links(b, a));
        assert!(!t.links(a, Uuid::new_v4()));
    }

    #[test]
    fn width_uses_scale() {
        let t = Transition::new(Presentation::Fade, Timing::Linear, 15);
        let scale = TimeScale::new(100.0, 2.0, 30.0);
        assert_eq!(t.width_px(&scale), 100.0);
    }

    #[test]
    fn presentation_serializes_snake_case() {
        let json = serde_json::to_string(&Presentation::ClockWipe).unwrap();
        assert_eq!(json, "\"clock_wipe\"");
    }
}
