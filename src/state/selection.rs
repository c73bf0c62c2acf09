//! Selection state owned by the caller and passed into timeline commands.

use uuid::Uuid;

use super::Timeline;

/// Tracks the current selection on the timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    /// Selected clip IDs, in selection order.
    pub clip_ids: Vec<Uuid>,
    /// Selected track IDs.
    pub track_ids: Vec<Uuid>,
}

impl SelectionState {
    /// Clear all selections.
    pub fn clear(&mut self) {
        self.clip_ids.clear();
        self.track_ids.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.clip_ids.is_empty() && self.track_ids.is_empty()
    }

    /// Replace the selection with a single clip.
    pub fn select_clip(&mut self, clip_id: Uuid) {
        self.clear();
        self.clip_ids.push(clip_id);
    }

    /// Add or remove a clip (shift/ctrl-click).
    pub fn toggle_clip(&mut self, clip_id: Uuid) {
        if self.clip_ids.contains(&clip_id) {
            self.remove_clip(clip_id);
        } else {
            self.track_ids.clear();
            self.clip_ids.push(clip_id);
        }
    }

    /// Remove a clip from selection, if present.
    pub fn remove_clip(&mut self, clip_id: Uuid) {
        self.clip_ids.retain(|id| *id != clip_id);
    }

    /// Return the primary selected clip, if any.
    pub fn primary_clip(&self) -> Option<Uuid> {
        self.clip_ids.first().copied()
    }

    /// Replace the selection with a single track.
    pub fn select_track(&mut self, track_id: Uuid) {
        self.clear();
        self.track_ids.push(track_id);
    }

    /// Return the primary selected track, if any.
    pub fn primary_track(&self) -> Option<Uuid> {
        self.track_ids.first().copied()
    }

    /// Drop ids that no longer exist, e.g. after a delete or an undo.
    pub fn retain_existing(&mut self, timeline: &Timeline) {
        self.clip_ids.retain(|id| timeline.find_clip(*id).is_some());
        self.track_ids.retain(|id| timeline.track_index(*id).is_some());
    }
}
