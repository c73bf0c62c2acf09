//! Snapshot-based undo/redo history.
//!
//! - Undo/redo stacks of whole-timeline [`Snapshot`]s
//! - Bounded depth, oldest entries dropped first
//! - Pushes are suppressed while an undo/redo is being applied
//!
//! # Usage
//!
//! ```ignore
//! // Before a structural edit, record the current state
//! history.record("Split clip", timeline.clone(), zoom);
//!
//! // Undo hands back the state to restore and keeps `current` for redo
//! history.begin_apply();
//! if let Some(previous) = history.undo(current) {
//!     restore(previous);
//! }
//! history.end_apply();
//! ```

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Arc;

use super::Timeline;

/// One entry in the undo/redo history.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Human-readable label of the edit (e.g., "Split clip").
    pub label: String,
    /// The timeline as it was. Snapshots share structure with the store.
    pub timeline: Arc<Timeline>,
    /// Zoom level the geometry was captured at.
    pub zoom: f64,
    pub recorded_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(label: impl Into<String>, timeline: Arc<Timeline>, zoom: f64) -> Self {
        Self {
            label: label.into(),
            timeline,
            zoom,
            recorded_at: Utc::now(),
        }
    }
}

/// Manages undo/redo using timeline snapshots.
///
/// - Recording a new entry clears the redo stack
/// - `applying` suppresses recording while a snapshot is being restored
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    capacity: usize,
    applying: bool,
}

impl History {
    /// Create a history holding at most `capacity` undo entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            capacity: capacity.max(1),
            applying: false,
        }
    }

    /// Record the state *before* an edit. Returns false when suppressed.
    pub fn record(&mut self, label: &str, timeline: Arc<Timeline>, zoom: f64) -> bool {
        if self.applying {
            tracing::debug!(label, "history push suppressed: undo/redo in progress");
            return false;
        }

        self.redo_stack.clear();
        self.undo_stack.push_back(Snapshot::new(label, timeline, zoom));
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }

        tracing::debug!(label, undo_depth = self.undo_stack.len(), "history entry pushed");
        true
    }

    /// Drop the redo branch without recording, for edits that fork history
    /// but are too fine-grained to get their own entry.
    pub fn invalidate_redo(&mut self) {
        if self.applying || self.redo_stack.is_empty() {
            return;
        }
        tracing::debug!(dropped = self.redo_stack.len(), "redo stack invalidated");
        self.redo_stack.clear();
    }

    /// Pop the last entry and keep `current` for redo.
    pub fn undo(&mut self, mut current: Snapshot) -> Option<Snapshot> {
        let entry = self.undo_stack.pop_back()?;
        current.label = entry.label.clone();
        self.redo_stack.push_back(current);
        while self.redo_stack.len() > self.capacity {
            self.redo_stack.pop_front();
        }
        tracing::debug!(label = %entry.label, undo_remaining = self.undo_stack.len(), "undo");
        Some(entry)
    }

    /// Mirror of [`History::undo`].
    pub fn redo(&mut self, mut current: Snapshot) -> Option<Snapshot> {
        let entry = self.redo_stack.pop_back()?;
        current.label = entry.label.clone();
        self.undo_stack.push_back(current);
        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
        tracing::debug!(label = %entry.label, redo_remaining = self.redo_stack.len(), "redo");
        Some(entry)
    }

    pub fn begin_apply(&mut self) {
        self.applying = true;
    }

    pub fn end_apply(&mut self) {
        self.applying = false;
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the edit an undo would revert
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.back().map(|s| s.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.back().map(|s| s.label.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(tracks: usize) -> Arc<Timeline> {
        Arc::new(Timeline::with_tracks(tracks))
    }

    #[test]
    fn undo_then_redo_swaps_states() {
        let mut history = History::new(10);
        let before = state(1);
        let after = state(2);
        history.record("Add track", before.clone(), 1.0);

        let restored = history.undo(Snapshot::new("", after.clone(), 1.0)).unwrap();
        assert!(Arc::ptr_eq(&restored.timeline, &before));
        assert_eq!(history.redo_label(), Some("Add track"));

        let restored = history.redo(Snapshot::new("", before, 1.0)).unwrap();
        assert!(Arc::ptr_eq(&restored.timeline, &after));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = History::new(3);
        for n in 1..=5 {
            history.record(&format!("edit {n}"), state(n), 1.0);
        }
        assert_eq!(history.undo_len(), 3);
        let oldest = (0..3)
            .filter_map(|_| history.undo(Snapshot::new("", state(0), 1.0)))
            .last()
            .unwrap();
        assert_eq!(oldest.label, "edit 3");
        assert!(!history.can_undo());
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::new(10);
        history.record("a", state(1), 1.0);
        history.undo(Snapshot::new("", state(2), 1.0));
        assert!(history.can_redo());
        history.record("b", state(3), 1.0);
        assert!(!history.can_redo());
    }

    #[test]
    fn recording_is_suppressed_while_applying() {
        let mut history = History::new(10);
        history.begin_apply();
        assert!(!history.record("nested", state(1), 1.0));
        history.end_apply();
        assert!(!history.can_undo());
        assert!(history.record("edit", state(1), 1.0));
    }

    #[test]
    fn invalidate_redo_keeps_undo() {
        let mut history = History::new(10);
        history.record("a", state(1), 1.0);
        history.record("b", state(2), 1.0);
        history.undo(Snapshot::new("", state(3), 1.0));
        history.invalidate_redo();
        assert_eq!(history.undo_len(), 1);
        assert_eq!(history.redo_len(), 0);
    }

    #[test]
    fn empty_history_returns_none() {
        let mut history = History::new(10);
        assert!(history.undo(Snapshot::new("", state(1), 1.0)).is_none());
        assert!(history.redo(Snapshot::new("", state(1), 1.0)).is_none());
    }
}
