//! Timeline store
//!
//! [`Editor`] owns the committed timeline and is the only place it changes.
//! Each mutation asks an engine in [`crate::core`] for a new timeline value,
//! then swaps it in, records history and notifies subscribers. A failed
//! engine call leaves everything untouched.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::GEOMETRY_EPSILON;
use crate::core::{
    group, placement, rescale_timeline, split, transition, ConnectedSet, PlacementOutcome,
    TimeScale, TimelineView, ZoomState,
};
use crate::error::{EditError, EditResult};
use crate::state::{
    Clip, EdgeSide, EditorSettings, History, InvariantViolation, MediaEntry, PlayerRect,
    RemovalReport, Resolution, Snapshot, Timeline, Transition,
};

/// Handle returned by [`Editor::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Timeline, u64)>;

/// How a commit interacts with the undo history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Record {
    /// Push the previous timeline as an undo entry.
    Push,
    /// Fork history without a new entry.
    InvalidateRedo,
    /// Leave history alone.
    Skip,
}

/// A partial update of one clip. Unset fields are left unchanged.
///
/// For the trims, `Some(None)` clears the trim; in JSON that is an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipUpdate {
    pub clip_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_index: Option<usize>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trim_before: Option<Option<i64>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub trim_after: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerRect>,
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl ClipUpdate {
    pub fn new(clip_id: Uuid) -> Self {
        Self {
            clip_id,
            ..Default::default()
        }
    }

    fn apply(&self, clip: &mut Clip) {
        if let Some(left) = self.left {
            clip.left = left;
        }
        if let Some(width) = self.width {
            clip.width = width;
        }
        if let Some(trim) = self.trim_before {
            clip.trim_before = trim;
        }
        if let Some(trim) = self.trim_after {
            clip.trim_after = trim;
        }
        if let Some(player) = self.player {
            clip.player = player;
        }
    }
}

fn check_geometry(clip: &Clip) -> EditResult<()> {
    if !clip.left.is_finite() || !clip.width.is_finite() {
        return Err(EditError::invalid_geometry("clip position is not a number"));
    }
    if clip.width <= 0.0 {
        return Err(EditError::invalid_geometry(format!(
            "clip width must be positive, got {}",
            clip.width
        )));
    }
    if clip.left < 0.0 {
        return Err(EditError::invalid_geometry(format!(
            "clip cannot start before the timeline, got {}",
            clip.left
        )));
    }
    Ok(())
}

/// The editing session: committed timeline, zoom, history and subscribers.
pub struct Editor {
    settings: EditorSettings,
    timeline: Arc<Timeline>,
    zoom: ZoomState,
    timeline_width: f64,
    history: History,
    revision: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("zoom", &self.zoom.level())
            .field("revision", &self.revision)
            .field("tracks", &self.timeline.tracks.len())
            .field("clips", &self.timeline.clip_count())
            .field("undo", &self.history.undo_len())
            .field("redo", &self.history.redo_len())
            .finish()
    }
}

impl Editor {
    /// Create an editor with an empty default timeline.
    pub fn new(settings: EditorSettings) -> EditResult<Self> {
        settings.validate()?;
        Ok(Self {
            zoom: ZoomState::new(&settings),
            timeline_width: settings.initial_timeline_width_px,
            history: History::new(settings.history_capacity),
            timeline: Arc::new(Timeline::default()),
            revision: 0,
            subscribers: Vec::new(),
            next_subscription: 0,
            settings,
        })
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Shared handle to the committed timeline. Two handles are the same
    /// state exactly when they point at the same value.
    pub fn timeline_arc(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    /// Number of commits so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn zoom(&self) -> f64 {
        self.zoom.level()
    }

    /// Scale at the current zoom
    pub fn scale(&self) -> TimeScale {
        TimeScale::from_settings(&self.settings, self.zoom.level())
    }

    pub fn timeline_width(&self) -> f64 {
        self.timeline_width
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Check the committed timeline against its invariants
    pub fn validate(&self) -> Vec<InvariantViolation> {
        self.timeline.validate(&self.scale())
    }

    /// Flattened view for rendering and export, derived from the current state.
    pub fn render_view(&self) -> TimelineView {
        TimelineView::build(&self.timeline, &self.scale())
    }

    /// Call `callback` with the timeline and revision after every commit.
    pub fn subscribe(&mut self, callback: impl FnMut(&Timeline, u64) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    fn commit(&mut self, label: &str, next: Timeline, record: Record) {
        self.replace(label, Arc::new(next), record);
    }

    fn replace(&mut self, label: &str, next: Arc<Timeline>, record: Record) {
        match record {
            Record::Push => {
                self.history
                    .record(label, Arc::clone(&self.timeline), self.zoom.level());
            }
            Record::InvalidateRedo => self.history.invalidate_redo(),
            Record::Skip => {}
        }
        self.timeline = next;
        self.revision += 1;
        tracing::debug!(label, revision = self.revision, "timeline committed");

        let timeline = Arc::clone(&self.timeline);
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&timeline, self.revision);
        }
    }

    // ---- tracks -------------------------------------------------------

    pub fn add_track(&mut self) -> Uuid {
        let mut next = Timeline::clone(&self.timeline);
        let id = next.add_track();
        self.commit("Add track", next, Record::Push);
        id
    }

    /// Remove a track with its clips and transitions.
    pub fn delete_track(&mut self, track_id: Uuid) -> EditResult<RemovalReport> {
        let mut next = Timeline::clone(&self.timeline);
        let report = next.remove_track(track_id)?;
        self.commit("Delete track", next, Record::Push);
        Ok(report)
    }

    // ---- clips --------------------------------------------------------

    /// Insert a prepared clip on a track.
    ///
    /// The clip must have valid geometry, no transition links and an id not
    /// already on the timeline, and may not overlap another clip.
    pub fn add_clip(&mut self, track_id: Uuid, mut clip: Clip) -> EditResult<Uuid> {
        let track_index = self.timeline.track_index_or_err(track_id)?;
        clip.y = track_index;
        check_geometry(&clip)?;
        if clip.has_transitions() {
            return Err(EditError::invalid_geometry(
                "a new clip cannot reference transitions",
            ));
        }
        if self.timeline.find_clip(clip.id).is_some() {
            return Err(EditError::invalid_geometry(format!(
                "clip {} is already on the timeline",
                clip.id
            )));
        }
        if !clip.trim_fits(&self.scale()) {
            return Err(EditError::TrimOverflow(clip.id));
        }
        if placement::collides(&self.timeline, &clip) {
            return Err(EditError::Collision(clip.id));
        }

        let id = clip.id;
        let mut next = Timeline::clone(&self.timeline);
        next.tracks[track_index].clips.push(clip);
        self.commit("Add clip", next, Record::Push);
        Ok(id)
    }

    /// Drop a media entry onto a track. A colliding drop snaps like a drag.
    pub fn drop_media(
        &mut self,
        entry: &MediaEntry,
        track_index: usize,
        left_px: f64,
    ) -> EditResult<(Uuid, PlacementOutcome)> {
        let placement = placement::prepare_drop(
            &self.timeline,
            entry,
            track_index,
            left_px,
            &self.scale(),
            self.timeline_width,
        )?;
        let outcome = placement.outcome();
        let clip = placement.into_clip();
        let id = clip.id;

        let mut next = Timeline::clone(&self.timeline);
        next.tracks[track_index].clips.push(clip);
        self.commit("Drop media", next, Record::Push);
        tracing::debug!(clip = %id, media = %entry.id, ?outcome, "media dropped");
        Ok((id, outcome))
    }

    /// Patch position, width, track, trims or player geometry of one clip.
    pub fn update_clip(&mut self, update: ClipUpdate) -> EditResult<()> {
        let scale = self.scale();
        let (from, current) = self.timeline.clip_or_err(update.clip_id)?;
        let mut clip = current.clone();
        update.apply(&mut clip);

        let to = update.track_index.unwrap_or(from);
        if to >= self.timeline.tracks.len() {
            return Err(EditError::TrackIndexOutOfRange(to as isize));
        }
        if to != from && clip.has_transitions() {
            return Err(EditError::LinkedClip(clip.id));
        }
        clip.y = to;
        check_geometry(&clip)?;
        if !clip.trim_fits(&scale) {
            return Err(EditError::TrimOverflow(clip.id));
        }
        for transition_id in clip.transition_ids() {
            let Some((_, transition)) = self.timeline.find_transition(transition_id) else {
                continue;
            };
            if transition.width_px(&scale) > clip.width + GEOMETRY_EPSILON {
                let side = if transition.left_clip_id == Some(clip.id) {
                    EdgeSide::Left
                } else {
                    EdgeSide::Right
                };
                return Err(EditError::TransitionTooLong { side });
            }
        }
        if placement::collides(&self.timeline, &clip) {
            return Err(EditError::Collision(clip.id));
        }

        let mut next = Timeline::clone(&self.timeline);
        next.tracks[from].take_clip(clip.id);
        next.tracks[to].clips.push(clip);
        self.commit("Update clip", next, Record::InvalidateRedo);
        Ok(())
    }

    /// Drag a clip to `left` on `track_index`.
    ///
    /// A clip linked by transitions moves with its whole chain, or not at all.
    /// A standalone clip that lands on another one is snapped flush against it.
    pub fn move_clip(
        &mut self,
        clip_id: Uuid,
        left: f64,
        track_index: usize,
    ) -> EditResult<PlacementOutcome> {
        if !left.is_finite() {
            return Err(EditError::invalid_geometry("clip position is not a number"));
        }
        if track_index >= self.timeline.tracks.len() {
            return Err(EditError::TrackIndexOutOfRange(track_index as isize));
        }
        let (from, current) = self.timeline.clip_or_err(clip_id)?;

        if current.has_transitions() {
            let dx = left - current.left;
            let dy = track_index as isize - from as isize;
            return match placement::move_connected(&self.timeline, clip_id, dx, dy)? {
                Some(next) => {
                    self.commit("Move clips", next, Record::InvalidateRedo);
                    Ok(PlacementOutcome::Accepted)
                }
                None => Ok(PlacementOutcome::Reverted),
            };
        }

        let mut proposed = current.clone();
        proposed.left = left.max(0.0);
        proposed.y = track_index;
        let resolved = placement::resolve_drag(&self.timeline, current, proposed, self.timeline_width);
        let outcome = resolved.outcome();
        if outcome == PlacementOutcome::Reverted {
            return Ok(outcome);
        }

        let clip = resolved.into_clip();
        let mut next = Timeline::clone(&self.timeline);
        next.tracks[from].take_clip(clip_id);
        let y = clip.y;
        next.tracks[y].clips.push(clip);
        self.commit("Move clip", next, Record::InvalidateRedo);
        Ok(outcome)
    }

    pub fn delete_clip(&mut self, clip_id: Uuid) -> EditResult<RemovalReport> {
        self.delete_clips(&[clip_id])
    }

    /// Delete clips and every transition attached to them.
    pub fn delete_clips(&mut self, clip_ids: &[Uuid]) -> EditResult<RemovalReport> {
        if clip_ids.is_empty() {
            return Err(EditError::NoSelection);
        }
        for id in clip_ids {
            self.timeline.clip_or_err(*id)?;
        }
        let ids: HashSet<Uuid> = clip_ids.iter().copied().collect();
        let mut next = Timeline::clone(&self.timeline);
        let report = next.remove_clips(&ids);
        self.commit("Delete clip", next, Record::Push);
        Ok(report)
    }

    /// Delete every clip created from `media_id`. Nothing is committed when
    /// no clip uses it.
    pub fn delete_media(&mut self, media_id: Uuid) -> RemovalReport {
        let mut next = Timeline::clone(&self.timeline);
        let report = next.remove_clips_from_media(media_id);
        if !report.is_empty() {
            self.commit("Delete media", next, Record::Push);
        }
        report
    }

    /// Split the selected clip at the ruler. Returns the number of clips
    /// split (0 or 1).
    pub fn split_at_ruler(&mut self, selection: &[Uuid], ruler_px: f64) -> usize {
        match self.try_split_at_ruler(selection, ruler_px) {
            Ok(_) => 1,
            Err(err) => {
                tracing::debug!(%err, "split rejected");
                0
            }
        }
    }

    /// Like [`Editor::split_at_ruler`], but reports why a split was rejected.
    /// Returns the ids of the left and right pieces.
    pub fn try_split_at_ruler(
        &mut self,
        selection: &[Uuid],
        ruler_px: f64,
    ) -> EditResult<(Uuid, Uuid)> {
        let result = split::split_clip(
            &self.timeline,
            selection,
            ruler_px,
            &self.scale(),
            self.settings.snap_distance_px,
        )?;
        self.commit("Split clip", result.timeline, Record::Push);
        Ok((result.left_id, result.right_id))
    }

    // ---- transitions --------------------------------------------------

    /// Drop a transition at `drop_px` on a track.
    pub fn add_transition(
        &mut self,
        track_id: Uuid,
        transition: Transition,
        drop_px: f64,
    ) -> EditResult<Uuid> {
        let (next, id) = transition::add_transition(
            &self.timeline,
            track_id,
            transition,
            drop_px,
            &self.scale(),
            self.settings.snap_distance_px,
        )?;
        self.commit("Add transition", next, Record::Push);
        Ok(id)
    }

    /// Attach a transition to explicit clips.
    pub fn add_transition_between(
        &mut self,
        left: Option<Uuid>,
        right: Option<Uuid>,
        transition: Transition,
    ) -> EditResult<Uuid> {
        let (next, id) = transition::add_transition_between(
            &self.timeline,
            left,
            right,
            transition,
            &self.scale(),
            self.settings.snap_distance_px,
        )?;
        self.commit("Add transition", next, Record::Push);
        Ok(id)
    }

    pub fn delete_transition(&mut self, transition_id: Uuid) -> EditResult<()> {
        let next = transition::delete_transition(
            &self.timeline,
            transition_id,
            &self.scale(),
            self.settings.snap_distance_px,
        )?;
        self.commit("Delete transition", next, Record::Push);
        Ok(())
    }

    // ---- groups -------------------------------------------------------

    pub fn group_clips(&mut self, clip_ids: &[Uuid]) -> EditResult<Uuid> {
        let (next, id) = group::group_clips(&self.timeline, clip_ids, &self.scale())?;
        self.commit("Group clips", next, Record::Push);
        Ok(id)
    }

    pub fn ungroup_clip(&mut self, clip_id: Uuid) -> EditResult<Vec<Uuid>> {
        let (next, ids) = group::ungroup_clip(&self.timeline, clip_id)?;
        self.commit("Ungroup clip", next, Record::Push);
        Ok(ids)
    }

    /// Move a group off the timeline into a media entry for the media bin.
    pub fn extract_group(&mut self, clip_id: Uuid) -> EditResult<MediaEntry> {
        let (next, entry) = group::extract_group(&self.timeline, clip_id, &self.scale())?;
        self.commit("Move group to media bin", next, Record::Push);
        Ok(entry)
    }

    /// Clips and transitions linked to `clip_id`.
    pub fn connected_elements(&self, clip_id: Uuid) -> EditResult<ConnectedSet> {
        self.timeline.clip_or_err(clip_id)?;
        Ok(placement::connected_elements(&self.timeline, clip_id))
    }

    // ---- view & session -----------------------------------------------

    pub fn zoom_in(&mut self) -> f64 {
        let ratio = self.zoom.zoom_in();
        self.apply_zoom(ratio)
    }

    pub fn zoom_out(&mut self) -> f64 {
        let ratio = self.zoom.zoom_out();
        self.apply_zoom(ratio)
    }

    pub fn reset_zoom(&mut self) -> f64 {
        let ratio = self.zoom.reset();
        self.apply_zoom(ratio)
    }

    /// Set the zoom level, clamped to the configured bounds. Returns the new level.
    pub fn set_zoom(&mut self, zoom: f64) -> f64 {
        let ratio = self.zoom.set(zoom);
        self.apply_zoom(ratio)
    }

    fn apply_zoom(&mut self, ratio: f64) -> f64 {
        if (ratio - 1.0).abs() > f64::EPSILON {
            let mut next = Timeline::clone(&self.timeline);
            rescale_timeline(&mut next, ratio);
            self.timeline_width = (self.timeline_width * ratio)
                .max(self.settings.initial_timeline_width_px);
            self.commit("Zoom", next, Record::Skip);
        }
        self.zoom.level()
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        if self.timeline.resolution == resolution {
            return;
        }
        let mut next = Timeline::clone(&self.timeline);
        next.resolution = resolution;
        self.commit("Set resolution", next, Record::Push);
    }

    /// Record an undo entry before an interactive transform such as a drag,
    /// whose individual moves do not record their own.
    pub fn begin_transform(&mut self) -> bool {
        self.history
            .record("Transform", Arc::clone(&self.timeline), self.zoom.level())
    }

    /// Grow the scrollable width when the viewport nears its end.
    pub fn expand_timeline(&mut self, viewport_right_px: f64) -> bool {
        if viewport_right_px < self.timeline_width - self.settings.expansion_threshold_px {
            return false;
        }
        self.timeline_width += self.settings.expansion_amount_px;
        tracing::debug!(width = self.timeline_width, "timeline expanded");
        true
    }

    /// Replace the session's timeline with externally loaded state.
    ///
    /// The timeline is repaired first. History starts over.
    pub fn load_timeline(&mut self, mut timeline: Timeline) {
        let fixes = timeline.repair();
        let end = timeline.end() + self.settings.expansion_amount_px;
        self.timeline_width = self.timeline_width.max(end);
        self.history.clear();
        self.commit("Load timeline", timeline, Record::Skip);
        tracing::info!(
            tracks = self.timeline.tracks.len(),
            clips = self.timeline.clip_count(),
            fixes,
            "timeline loaded"
        );
    }

    pub fn undo(&mut self) -> bool {
        let current = Snapshot::new("", Arc::clone(&self.timeline), self.zoom.level());
        self.history.begin_apply();
        let restored = self.history.undo(current);
        let applied = restored.is_some();
        if let Some(snapshot) = restored {
            self.restore(snapshot);
        }
        self.history.end_apply();
        applied
    }

    pub fn redo(&mut self) -> bool {
        let current = Snapshot::new("", Arc::clone(&self.timeline), self.zoom.level());
        self.history.begin_apply();
        let restored = self.history.redo(current);
        let applied = restored.is_some();
        if let Some(snapshot) = restored {
            self.restore(snapshot);
        }
        self.history.end_apply();
        applied
    }

    /// Swap in a snapshot, rescaled when it was taken at another zoom.
    fn restore(&mut self, snapshot: Snapshot) {
        let ratio = self.zoom.level() / snapshot.zoom;
        if (ratio - 1.0).abs() > f64::EPSILON {
            let mut timeline = Timeline::clone(&snapshot.timeline);
            rescale_timeline(&mut timeline, ratio);
            self.commit(&snapshot.label, timeline, Record::Skip);
        } else {
            self.replace(&snapshot.label, snapshot.timeline, Record::Skip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MediaKind, Presentation, Timing};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor() -> Editor {
        Editor::new(EditorSettings::default()).unwrap()
    }

    fn fade(frames: u32) -> Transition {
        Transition::new(Presentation::Fade, Timing::Linear, frames)
    }

    /// Drop a video of `seconds` at `left` on track 0.
    fn drop_video(editor: &mut Editor, seconds: f64, left: f64) -> Uuid {
        let entry = MediaEntry::new_video("clip.mp4", seconds, 1920.0, 1080.0);
        editor.drop_media(&entry, 0, left).unwrap().0
    }

    fn left_of(editor: &Editor, id: Uuid) -> f64 {
        editor.timeline().find_clip(id).unwrap().1.left
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let settings = EditorSettings {
            min_zoom: 2.0,
            max_zoom: 1.0,
            ..Default::default()
        };
        assert!(matches!(Editor::new(settings), Err(EditError::Settings(_))));
    }

    #[test]
    fn drop_sizes_clip_from_duration() {
        let mut editor = editor();
        let (id, outcome) = editor
            .drop_media(&MediaEntry::new_video("a.mp4", 3.0, 1920.0, 1080.0), 1, 50.0)
            .unwrap();
        assert_eq!(outcome, PlacementOutcome::Accepted);
        let (track, clip) = editor.timeline().find_clip(id).unwrap();
        assert_eq!(track, 1);
        assert_eq!((clip.left, clip.width), (50.0, 300.0));
        assert_eq!(clip.trim_before, None);
        assert_eq!(clip.player.left, 100.0);
        assert!(editor.can_undo());
    }

    #[test]
    fn blocked_drop_changes_nothing() {
        let mut editor = editor();
        drop_video(&mut editor, 3.0, 0.0);
        drop_video(&mut editor, 3.0, 300.0);
        let before = editor.timeline_arc();
        let undo_depth = editor.history().undo_len();

        // 2s wide, centered on the pair: neither side has room.
        let entry = MediaEntry::new_video("b.mp4", 2.0, 1920.0, 1080.0);
        let result = editor.drop_media(&entry, 0, 250.0);
        assert!(matches!(result, Err(EditError::Collision(_))));
        assert!(Arc::ptr_eq(&before, &editor.timeline_arc()));
        assert_eq!(editor.history().undo_len(), undo_depth);
    }

    #[test]
    fn standalone_move_snaps_against_neighbour() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 2.0, 0.0);
        let b = drop_video(&mut editor, 2.0, 600.0);
        let outcome = editor.move_clip(a, 550.0, 0).unwrap();
        assert_eq!(outcome, PlacementOutcome::Snapped);
        assert_eq!(left_of(&editor, a), 400.0);
        assert_eq!(left_of(&editor, b), 600.0);
        assert!(editor.validate().is_empty());
    }

    #[test]
    fn linked_clips_move_as_a_chain() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 3.0, 0.0);
        let b = drop_video(&mut editor, 3.0, 300.0);
        let track = editor.timeline().tracks[0].id;
        editor.add_transition(track, fade(15), 280.0).unwrap();
        assert_eq!(left_of(&editor, b), 250.0);

        let outcome = editor.move_clip(a, 100.0, 1).unwrap();
        assert_eq!(outcome, PlacementOutcome::Accepted);
        let (track_a, clip_a) = editor.timeline().find_clip(a).unwrap();
        let (track_b, clip_b) = editor.timeline().find_clip(b).unwrap();
        assert_eq!((track_a, clip_a.left), (1, 100.0));
        assert_eq!((track_b, clip_b.left), (1, 350.0));
        assert_eq!(editor.timeline().tracks[1].transitions.len(), 1);
        assert!(editor.validate().is_empty());

        assert!(matches!(
            editor.update_clip(ClipUpdate {
                track_index: Some(0),
                ..ClipUpdate::new(a)
            }),
            Err(EditError::LinkedClip(_))
        ));
    }

    #[test]
    fn update_clip_checks_trims_and_overlap() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 3.0, 0.0);
        drop_video(&mut editor, 3.0, 400.0);

        // 3s source, showing 2s: 30 frames of trims fit, 31 do not.
        let trimmed = ClipUpdate {
            width: Some(200.0),
            trim_before: Some(Some(20)),
            trim_after: Some(Some(10)),
            ..ClipUpdate::new(a)
        };
        editor.update_clip(trimmed).unwrap();
        let too_long = ClipUpdate {
            trim_after: Some(Some(42)),
            ..ClipUpdate::new(a)
        };
        assert!(matches!(editor.update_clip(too_long), Err(EditError::TrimOverflow(_))));

        let overlapping = ClipUpdate {
            left: Some(300.0),
            ..ClipUpdate::new(a)
        };
        assert!(matches!(editor.update_clip(overlapping), Err(EditError::Collision(_))));

        let cleared = ClipUpdate {
            trim_before: Some(None),
            ..ClipUpdate::new(a)
        };
        editor.update_clip(cleared).unwrap();
        assert_eq!(editor.timeline().find_clip(a).unwrap().1.trim_before, None);
        assert!(editor.validate().is_empty());
    }

    #[test]
    fn clip_update_json_distinguishes_null_from_missing() {
        let id = Uuid::new_v4();
        let update: ClipUpdate =
            serde_json::from_str(&format!(r#"{{"clip_id":"{id}","trim_before":null}}"#)).unwrap();
        assert_eq!(update.trim_before, Some(None));
        assert_eq!(update.trim_after, None);
    }

    #[test]
    fn split_reports_count() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 10.0, 0.0);
        assert_eq!(editor.split_at_ruler(&[], 400.0), 0);
        assert_eq!(editor.split_at_ruler(&[a], 1000.0), 0);
        let revision = editor.revision();
        assert_eq!(editor.split_at_ruler(&[a], 400.0), 1);
        assert_eq!(editor.revision(), revision + 1);
        assert_eq!(editor.timeline().clip_count(), 2);
        assert_eq!(editor.history().undo_label(), Some("Split clip"));
    }

    #[test]
    fn rejected_split_leaves_timeline_untouched() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 10.0, 0.0);
        let before = editor.timeline_arc();
        let revision = editor.revision();
        let undo_len = editor.history().undo_len();

        assert_eq!(editor.split_at_ruler(&[a], 1500.0), 0);
        assert!(matches!(
            editor.try_split_at_ruler(&[a, Uuid::new_v4()], 400.0),
            Err(EditError::MultipleSelection(2))
        ));
        assert!(Arc::ptr_eq(&before, &editor.timeline_arc()));
        assert_eq!(editor.revision(), revision);
        assert_eq!(editor.history().undo_len(), undo_len);
    }

    #[test]
    fn split_group_then_ungroup_both_pieces() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 3.0, 0.0);
        let b = drop_video(&mut editor, 3.0, 300.0);
        let group = editor.group_clips(&[a, b]).unwrap();

        let (left, right) = editor.try_split_at_ruler(&[group], 200.0).unwrap();
        let mut ids = editor.ungroup_clip(left).unwrap();
        ids.extend(editor.ungroup_clip(right).unwrap());

        assert_eq!(ids.len(), 4);
        assert_eq!(editor.timeline().clip_count(), 4);
        let unique: HashSet<Uuid> = editor.timeline().clips().map(|c| c.id).collect();
        assert_eq!(unique.len(), 4);
        assert!(editor.validate().is_empty());
    }

    #[test]
    fn zoom_round_trip_restores_geometry() {
        let mut editor = editor();
        drop_video(&mut editor, 3.3, 17.0);
        drop_video(&mut editor, 1.7, 900.0);
        let before = editor.timeline_arc();

        editor.zoom_in();
        editor.zoom_in();
        assert_eq!(editor.zoom(), 2.25);
        editor.zoom_out();
        editor.zoom_out();
        for (a, b) in before.clips().zip(editor.timeline().clips()) {
            assert!((a.left - b.left).abs() < 1e-9);
            assert!((a.width - b.width).abs() < 1e-9);
        }
        // Zoom never records history.
        assert_eq!(editor.history().undo_len(), 2);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut editor = editor();
        assert_eq!(editor.set_zoom(100.0), 4.0);
        assert_eq!(editor.set_zoom(0.0), 0.25);
        assert_eq!(editor.reset_zoom(), 1.0);
    }

    #[test]
    fn undo_rescales_snapshots_taken_at_another_zoom() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 2.0, 100.0);
        editor.set_zoom(2.0);
        assert_eq!(left_of(&editor, a), 200.0);
        assert!(editor.undo());
        assert_eq!(editor.timeline().clip_count(), 0);
        assert!(editor.redo());
        let (_, clip) = editor.timeline().find_clip(a).unwrap();
        assert_eq!((clip.left, clip.width), (200.0, 400.0));
    }

    #[test]
    fn undo_redo_symmetry() {
        let mut editor = editor();
        let start = editor.timeline_arc();
        let a = drop_video(&mut editor, 4.0, 0.0);
        let b = drop_video(&mut editor, 4.0, 400.0);
        let track = editor.timeline().tracks[0].id;
        editor.add_transition(track, fade(15), 390.0).unwrap();
        editor.split_at_ruler(&[a], 100.0);
        editor.add_track();
        editor.delete_clip(b).unwrap();
        editor.set_resolution(Resolution::Shorts);
        let end = editor.timeline_arc();
        let steps = editor.history().undo_len();
        assert_eq!(steps, 7);

        for _ in 0..steps {
            assert!(editor.undo());
        }
        assert!(!editor.undo());
        assert_eq!(*editor.timeline(), *start);
        for _ in 0..steps {
            assert!(editor.redo());
        }
        assert!(!editor.redo());
        assert_eq!(*editor.timeline(), *end);
    }

    #[test]
    fn drag_edits_fork_history_without_recording() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 1.0, 0.0);
        drop_video(&mut editor, 1.0, 500.0);
        editor.undo();
        assert!(editor.can_redo());

        assert!(editor.begin_transform());
        editor.move_clip(a, 50.0, 0).unwrap();
        assert!(!editor.can_redo());
        assert_eq!(editor.history().undo_label(), Some("Transform"));
        editor.undo();
        assert_eq!(left_of(&editor, a), 0.0);
    }

    #[test]
    fn edits_never_leave_silent_overlaps() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 3.0, 0.0);
        let b = drop_video(&mut editor, 3.0, 300.0);
        let c = drop_video(&mut editor, 2.0, 1000.0);
        assert!(editor.validate().is_empty());

        let track = editor.timeline().tracks[0].id;
        let t = editor.add_transition(track, fade(15), 290.0).unwrap();
        assert!(editor.validate().is_empty());

        // Both sides of `a` are taken, so the drag is undone.
        assert_eq!(editor.move_clip(c, 10.0, 0).unwrap(), PlacementOutcome::Reverted);
        assert!(editor.validate().is_empty());

        let (left, right) = editor.try_split_at_ruler(&[b], 400.0).unwrap();
        assert!(editor.validate().is_empty());
        editor.group_clips(&[left, right]).unwrap();
        assert!(editor.validate().is_empty());
        editor.zoom_in();
        assert!(editor.validate().is_empty());

        editor.undo();
        editor.undo();
        assert!(editor.timeline().find_transition(t).is_some());
        assert!(editor.validate().is_empty());
        editor.delete_transition(t).unwrap();
        assert!(editor.validate().is_empty());
        assert!(editor.timeline().find_clip(a).is_some());
    }

    #[test]
    fn transitions_pull_and_release_spacing() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 3.0, 0.0);
        let b = drop_video(&mut editor, 3.0, 300.0);
        let after = drop_video(&mut editor, 1.0, 800.0);
        let track = editor.timeline().tracks[0].id;

        let t = editor.add_transition(track, fade(15), 280.0).unwrap();
        assert_eq!(left_of(&editor, b), 250.0);
        assert_eq!(editor.connected_elements(a).unwrap().clips, vec![a, b]);

        editor.delete_transition(t).unwrap();
        assert_eq!(left_of(&editor, b), 300.0);
        assert_eq!(left_of(&editor, after), 850.0);
        assert!(editor.timeline().clips().all(|c| !c.has_transitions()));

        assert!(matches!(
            editor.add_transition(track, fade(120), 280.0),
            Err(EditError::TransitionTooLong { .. })
        ));
    }

    #[test]
    fn group_extract_and_drop_again() {
        let mut editor = editor();
        let a = drop_video(&mut editor, 1.0, 0.0);
        let b = drop_video(&mut editor, 1.0, 200.0);
        let group = editor.group_clips(&[a, b]).unwrap();
        let entry = editor.extract_group(group).unwrap();
        assert_eq!(entry.kind, MediaKind::Composite);
        assert_eq!(entry.duration_seconds, 3.0);
        assert_eq!(editor.timeline().clip_count(), 0);

        let (first, _) = editor.drop_media(&entry, 0, 0.0).unwrap();
        let (second, _) = editor.drop_media(&entry, 1, 0.0).unwrap();
        let children = |id| -> Vec<Uuid> {
            let (_, clip) = editor.timeline().find_clip(id).unwrap();
            clip.group.as_ref().unwrap().clips.iter().map(|c| c.id).collect()
        };
        let (x, y) = (children(first), children(second));
        assert!(x.iter().all(|id| !y.contains(id) && *id != a && *id != b));

        let ids = editor.ungroup_clip(second).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(editor.validate().is_empty());
    }

    #[test]
    fn deleting_media_cascades_transitions() {
        let mut editor = editor();
        let entry = MediaEntry::new_video("shared.mp4", 3.0, 1920.0, 1080.0);
        let (a, _) = editor.drop_media(&entry, 0, 0.0).unwrap();
        let other = drop_video(&mut editor, 3.0, 300.0);
        let track = editor.timeline().tracks[0].id;
        editor
            .add_transition_between(Some(a), Some(other), fade(10))
            .unwrap();
        editor.drop_media(&entry, 1, 0.0).unwrap();

        let report = editor.delete_media(entry.id);
        assert_eq!(report.clips.len(), 2);
        assert_eq!(report.transitions.len(), 1);
        let (_, remaining) = editor.timeline().find_clip(other).unwrap();
        assert!(!remaining.has_transitions());
        assert!(editor.timeline().tracks[0].transitions.is_empty());
        assert_eq!(editor.timeline().track_index(track), Some(0));

        let revision = editor.revision();
        assert!(editor.delete_media(Uuid::new_v4()).is_empty());
        assert_eq!(editor.revision(), revision);
    }

    #[test]
    fn subscribers_see_every_commit() {
        let mut editor = editor();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = editor.subscribe(move |timeline, revision| {
            sink.borrow_mut().push((revision, timeline.tracks.len()));
        });
        editor.add_track();
        editor.undo();
        assert_eq!(*seen.borrow(), vec![(1, 5), (2, 4)]);
        assert!(editor.unsubscribe(id));
        editor.add_track();
        assert_eq!(seen.borrow().len(), 2);
        assert!(!editor.unsubscribe(id));
    }

    #[test]
    fn expand_near_the_end() {
        let mut editor = editor();
        assert!(!editor.expand_timeline(1000.0));
        assert!(editor.expand_timeline(1850.0));
        assert_eq!(editor.timeline_width(), 3000.0);
    }

    #[test]
    fn load_repairs_and_resets_history() {
        // Repairs are logged as warnings; show them with --nocapture.
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut editor = editor();
        editor.add_track();
        let mut timeline = Timeline::default();
        let mut clip = Clip::new(MediaKind::Video, Uuid::new_v4(), 0.0, 100.0, 3);
        clip.right_transition_id = Some(Uuid::new_v4());
        timeline.tracks[1].clips.push(clip);

        editor.load_timeline(timeline);
        assert!(!editor.can_undo());
        assert!(editor.validate().is_empty());
        let clip = &editor.timeline().tracks[1].clips[0];
        assert_eq!(clip.y, 1);
        assert_eq!(clip.right_transition_id, None);
    }

    #[test]
    fn add_clip_rejects_bad_geometry() {
        let mut editor = editor();
        let track = editor.timeline().tracks[0].id;
        let clip = Clip::new(MediaKind::Image, Uuid::new_v4(), 0.0, 0.0, 0);
        assert!(matches!(
            editor.add_clip(track, clip),
            Err(EditError::InvalidGeometry(_))
        ));
        let clip = Clip::new(MediaKind::Image, Uuid::new_v4(), 10.0, 100.0, 3);
        let id = editor.add_clip(track, clip.clone()).unwrap();
        assert_eq!(editor.timeline().find_clip(id).unwrap().0, 0);
        assert!(matches!(
            editor.add_clip(track, clip),
            Err(EditError::InvalidGeometry(_))
        ));
    }
}
