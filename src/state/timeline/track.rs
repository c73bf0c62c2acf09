use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Clip, Transition};

/// A track in the timeline.
///
/// Clips are stored in insertion order; use [`Track::sorted_clips`] when the
/// left-to-right order matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique identifier
    pub id: Uuid,
    /// Display name (e.g., "Track 1")
    pub name: String,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

impl Track {
    /// Create a new empty track
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            clips: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn find_clip(&self, id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.id == id)
    }

    pub fn find_clip_mut(&mut self, id: Uuid) -> Option<&mut Clip> {
        self.clips.iter_mut().find(|c| c.id == id)
    }

    pub fn find_transition(&self, id: Uuid) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.id == id)
    }

    /// Clips ordered by their left edge
    pub fn sorted_clips(&self) -> Vec<&Clip> {
        let mut clips: Vec<&Clip> = self.clips.iter().collect();
        clips.sort_by(|a, b| a.left.total_cmp(&b.left));
        clips
    }

    /// Remove a clip by id, returning it
    pub fn take_clip(&mut self, id: Uuid) -> Option<Clip> {
        let index = self.clips.iter().position(|c| c.id == id)?;
        Some(self.clips.remove(index))
    }

    /// Remove a transition by id, returning it
    pub fn take_transition(&mut self, id: Uuid) -> Option<Transition> {
        let index = self.transitions.iter().position(|t| t.id == id)?;
        Some(self.transitions.remove(index))
    }

    /// Get the end of the last clip on this track
    pub fn end(&self) -> f64 {
        self.clips.iter().map(Clip::right).fold(0.0, f64::max)
    }
}
