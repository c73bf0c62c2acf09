use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::TimeScale;
use crate::state::{MediaEntry, MediaKind, TextProperties, Transition};

/// Position and size of a clip on the player canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Bounding box of a set of clips in timeline space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupBounds {
    pub left: f64,
    pub right: f64,
    /// Smallest track index.
    pub top: usize,
}

impl GroupBounds {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn of<'a>(clips: impl IntoIterator<Item = &'a Clip>) -> Option<Self> {
        clips.into_iter().fold(None, |bounds: Option<GroupBounds>, clip| {
            Some(match bounds {
                None => GroupBounds {
                    left: clip.left,
                    right: clip.right(),
                    top: clip.y,
                },
                Some(b) => GroupBounds {
                    left: b.left.min(clip.left),
                    right: b.right.max(clip.right()),
                    top: b.top.min(clip.y),
                },
            })
        })
    }
}

/// Payload of a composite clip: the grouped clips with the geometry they had
/// when grouped, and the transitions linking them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClipGroup {
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl ClipGroup {
    /// Bounds of the children at the time they were grouped
    pub fn bounds(&self) -> Option<GroupBounds> {
        GroupBounds::of(&self.clips)
    }
}

/// A clip placed on a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Unique identifier
    pub id: Uuid,
    pub kind: MediaKind,
    /// The media entry this clip was created from
    pub source_media_id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub media_url_local: Option<String>,
    #[serde(default)]
    pub media_url_remote: Option<String>,
    /// Natural duration of the source in seconds (0 when unknown)
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub media_width: f64,
    #[serde(default)]
    pub media_height: f64,
    #[serde(default)]
    pub text: Option<TextProperties>,
    /// Start position in timeline pixels
    pub left: f64,
    /// Width in timeline pixels
    pub width: f64,
    /// Index of the track holding this clip
    pub y: usize,
    /// Geometry on the player canvas
    #[serde(default)]
    pub player: PlayerRect,
    /// Frames cut from the start of the source (None = untrimmed)
    #[serde(default)]
    pub trim_before: Option<i64>,
    /// Frames cut from the end of the source (None = untrimmed)
    #[serde(default)]
    pub trim_after: Option<i64>,
    /// Children, for composite clips
    #[serde(default)]
    pub group: Option<ClipGroup>,
    /// Transition on the left edge (intro, or the right side of a bridge)
    #[serde(default)]
    pub left_transition_id: Option<Uuid>,
    /// Transition on the right edge (outro, or the left side of a bridge)
    #[serde(default)]
    pub right_transition_id: Option<Uuid>,
}

impl Clip {
    /// Create a bare clip
    pub fn new(kind: MediaKind, source_media_id: Uuid, left: f64, width: f64, y: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source_media_id,
            name: String::new(),
            media_url_local: None,
            media_url_remote: None,
            duration_seconds: 0.0,
            media_width: 0.0,
            media_height: 0.0,
            text: None,
            left,
            width,
            y,
            player: PlayerRect::default(),
            trim_before: None,
            trim_after: None,
            group: None,
            left_transition_id: None,
            right_transition_id: None,
        }
    }

    /// Create a clip seeded from a media entry. The group payload is copied as-is.
    pub fn from_media(entry: &MediaEntry, left: f64, width: f64, y: usize) -> Self {
        Self {
            name: entry.name.clone(),
            media_url_local: entry.media_url_local.clone(),
            media_url_remote: entry.media_url_remote.clone(),
            duration_seconds: entry.duration_seconds,
            media_width: entry.media_width,
            media_height: entry.media_height,
            text: entry.text.clone(),
            group: entry.group.clone(),
            ..Self::new(entry.kind, entry.id, left, width, y)
        }
    }

    /// Get the right edge of this clip
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Check if this clip overlaps the half-open span `[start, end)`
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.left < end && self.right() > start
    }

    pub fn overlaps_clip(&self, other: &Clip) -> bool {
        self.overlaps(other.left, other.right())
    }

    /// True when `position` lies strictly between the clip's edges
    pub fn contains_strictly(&self, position: f64) -> bool {
        position > self.left && position < self.right()
    }

    pub fn is_composite(&self) -> bool {
        self.kind == MediaKind::Composite
    }

    pub fn has_transitions(&self) -> bool {
        self.left_transition_id.is_some() || self.right_transition_id.is_some()
    }

    /// Ids of the transitions on either edge
    pub fn transition_ids(&self) -> impl Iterator<Item = Uuid> {
        [self.left_transition_id, self.right_transition_id]
            .into_iter()
            .flatten()
    }

    pub fn references_transition(&self, transition_id: Uuid) -> bool {
        self.left_transition_id == Some(transition_id)
            || self.right_transition_id == Some(transition_id)
    }

    /// Clear any edge pointing at `transition_id`. Returns true if one was cleared.
    pub fn clear_transition(&mut self, transition_id: Uuid) -> bool {
        let mut cleared = false;
        if self.left_transition_id == Some(transition_id) {
            self.left_transition_id = None;
            cleared = true;
        }
        if self.right_transition_id == Some(transition_id) {
            self.right_transition_id = None;
            cleared = true;
        }
        cleared
    }

    /// Frames shown on the timeline at the given scale
    pub fn displayed_frames(&self, scale: &TimeScale) -> f64 {
        scale.pixels_to_frames(self.width)
    }

    /// Total frame count of the source media: from the natural duration when
    /// known, otherwise reconstructed from the trims and the displayed span.
    pub fn source_total_frames(&self, scale: &TimeScale) -> i64 {
        if self.duration_seconds > 0.0 {
            (self.duration_seconds * scale.fps).round() as i64
        } else {
            self.trim_before.unwrap_or(0)
                + self.displayed_frames(scale).round() as i64
                + self.trim_after.unwrap_or(0)
        }
    }

    /// Check that the trim window fits inside the source media.
    pub fn trim_fits(&self, scale: &TimeScale) -> bool {
        if self.trim_before.is_none() && self.trim_after.is_none() {
            return true;
        }
        let before = self.trim_before.unwrap_or(0);
        let after = self.trim_after.unwrap_or(0);
        if before < 0 || after < 0 {
            return false;
        }
        if self.duration_seconds <= 0.0 {
            return true;
        }
        let used = before as f64 + self.displayed_frames(scale) + after as f64;
        used <= self.source_total_frames(scale) as f64
            + crate::constants::TRIM_TOLERANCE_FRAMES
            + crate::constants::GEOMETRY_EPSILON
    }
}
