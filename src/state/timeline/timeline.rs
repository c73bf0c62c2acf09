use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{Clip, Resolution, Track, Transition};
use crate::constants::{DEFAULT_TRACK_COUNT, GEOMETRY_EPSILON};
use crate::core::TimeScale;
use crate::error::{EditError, EditResult};

/// Current on-disk format version
pub const TIMELINE_VERSION: u32 = 1;

/// The whole editable timeline: tracks of clips and transitions plus the output resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default = "default_version")]
    pub version: u32,
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub resolution: Resolution,
}

fn default_version() -> u32 {
    TIMELINE_VERSION
}

impl Default for Timeline {
    fn default() -> Self {
        Self::with_tracks(DEFAULT_TRACK_COUNT)
    }
}

/// Clips and transitions removed by a cascading delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemovalReport {
    pub clips: Vec<Clip>,
    pub transitions: Vec<Transition>,
}

impl RemovalReport {
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty() && self.transitions.is_empty()
    }
}

/// A broken timeline invariant, as reported by [`Timeline::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    NonPositiveWidth { clip_id: Uuid },
    TrackIndexMismatch { clip_id: Uuid, track_index: usize, y: usize },
    DuplicateClipId { clip_id: Uuid },
    UnlicensedOverlap { a: Uuid, b: Uuid },
    DanglingReference { clip_id: Uuid, transition_id: Uuid },
    OrphanTransition { transition_id: Uuid },
    MissingEndpoint { transition_id: Uuid, clip_id: Uuid },
    TransitionOffTrack { transition_id: Uuid },
    TransitionTooLong { transition_id: Uuid, clip_id: Uuid },
    TrimOverflow { clip_id: Uuid },
}

impl Timeline {
    /// Create an empty timeline with `count` tracks named "Track 1".."Track N"
    pub fn with_tracks(count: usize) -> Self {
        Self {
            version: TIMELINE_VERSION,
            tracks: (1..=count).map(|n| Track::new(format!("Track {n}"))).collect(),
            resolution: Resolution::default(),
        }
    }

    pub fn track_index(&self, track_id: Uuid) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    pub fn track_index_or_err(&self, track_id: Uuid) -> EditResult<usize> {
        self.track_index(track_id)
            .ok_or(EditError::TrackNotFound(track_id))
    }

    /// Get a clip and the index of the track holding it
    pub fn find_clip(&self, clip_id: Uuid) -> Option<(usize, &Clip)> {
        self.tracks
            .iter()
            .enumerate()
            .find_map(|(i, t)| t.find_clip(clip_id).map(|c| (i, c)))
    }

    pub fn find_clip_mut(&mut self, clip_id: Uuid) -> Option<&mut Clip> {
        self.tracks
            .iter_mut()
            .find_map(|t| t.find_clip_mut(clip_id))
    }

    pub fn clip_or_err(&self, clip_id: Uuid) -> EditResult<(usize, &Clip)> {
        self.find_clip(clip_id).ok_or(EditError::ClipNotFound(clip_id))
    }

    /// Get a transition and the index of the track holding it
    pub fn find_transition(&self, transition_id: Uuid) -> Option<(usize, &Transition)> {
        self.tracks
            .iter()
            .enumerate()
            .find_map(|(i, t)| t.find_transition(transition_id).map(|tr| (i, tr)))
    }

    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.tracks.iter().flat_map(|t| t.clips.iter())
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.tracks.iter().flat_map(|t| t.transitions.iter())
    }

    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// True when some transition bridges the two clips. Overlap between them is then allowed.
    pub fn has_transition_between(&self, a: Uuid, b: Uuid) -> bool {
        self.transitions().any(|t| t.links(a, b))
    }

    /// All transitions by id
    pub fn transition_lookup(&self) -> HashMap<Uuid, Transition> {
        self.transitions().map(|t| (t.id, t.clone())).collect()
    }

    /// End of the last clip on any track
    pub fn end(&self) -> f64 {
        self.tracks.iter().map(Track::end).fold(0.0, f64::max)
    }

    /// Append an empty track and return its id
    pub fn add_track(&mut self) -> Uuid {
        let track = Track::new(format!("Track {}", self.tracks.len() + 1));
        let id = track.id;
        self.tracks.push(track);
        id
    }

    /// Remove a track with its clips and transitions. Clips on later tracks
    /// move up by one index.
    pub fn remove_track(&mut self, track_id: Uuid) -> EditResult<RemovalReport> {
        let index = self.track_index_or_err(track_id)?;
        let track = self.tracks.remove(index);
        let clip_ids: HashSet<Uuid> = track.clips.iter().map(|c| c.id).collect();
        let mut report = RemovalReport {
            transitions: track.transitions,
            clips: track.clips,
        };
        report
            .transitions
            .extend(self.detach_transitions_of(&clip_ids));
        self.clear_transition_refs(report.transitions.iter().map(|t| t.id).collect());
        self.reindex_tracks();
        Ok(report)
    }

    /// Remove the given clips and every transition touching them.
    /// References to removed transitions are cleared on the remaining clips.
    pub fn remove_clips(&mut self, clip_ids: &HashSet<Uuid>) -> RemovalReport {
        let mut report = RemovalReport::default();
        for track in &mut self.tracks {
            let (removed, kept): (Vec<Clip>, Vec<Clip>) = std::mem::take(&mut track.clips)
                .into_iter()
                .partition(|c| clip_ids.contains(&c.id));
            track.clips = kept;
            report.clips.extend(removed);
        }
        report.transitions = self.detach_transitions_of(clip_ids);
        self.clear_transition_refs(report.transitions.iter().map(|t| t.id).collect());
        report
    }

    /// Remove every top-level clip created from `media_id`
    pub fn remove_clips_from_media(&mut self, media_id: Uuid) -> RemovalReport {
        let ids: HashSet<Uuid> = self
            .clips()
            .filter(|c| c.source_media_id == media_id)
            .map(|c| c.id)
            .collect();
        self.remove_clips(&ids)
    }

    /// Remove one transition and clear the edges pointing at it
    pub fn remove_transition(&mut self, transition_id: Uuid) -> EditResult<Transition> {
        let (index, _) = self
            .find_transition(transition_id)
            .ok_or(EditError::TransitionNotFound(transition_id))?;
        let transition = self.tracks[index]
            .take_transition(transition_id)
            .ok_or(EditError::TransitionNotFound(transition_id))?;
        self.clear_transition_refs(HashSet::from([transition_id]));
        Ok(transition)
    }

    fn detach_transitions_of(&mut self, clip_ids: &HashSet<Uuid>) -> Vec<Transition> {
        let mut removed = Vec::new();
        for track in &mut self.tracks {
            let (gone, kept): (Vec<Transition>, Vec<Transition>) =
                std::mem::take(&mut track.transitions)
                    .into_iter()
                    .partition(|t| {
                        t.left_clip_id.is_some_and(|id| clip_ids.contains(&id))
                            || t.right_clip_id.is_some_and(|id| clip_ids.contains(&id))
                    });
            track.transitions = kept;
            removed.extend(gone);
        }
        removed
    }

    fn clear_transition_refs(&mut self, transition_ids: HashSet<Uuid>) {
        if transition_ids.is_empty() {
            return;
        }
        for clip in self.tracks.iter_mut().flat_map(|t| t.clips.iter_mut()) {
            if clip
                .left_transition_id
                .is_some_and(|id| transition_ids.contains(&id))
            {
                clip.left_transition_id = None;
            }
            if clip
                .right_transition_id
                .is_some_and(|id| transition_ids.contains(&id))
            {
                clip.right_transition_id = None;
            }
        }
    }

    /// Set every clip's `y` to the index of the track holding it.
    /// Returns how many clips changed.
    pub fn reindex_tracks(&mut self) -> usize {
        let mut changed = 0;
        for (index, track) in self.tracks.iter_mut().enumerate() {
            for clip in &mut track.clips {
                if clip.y != index {
                    clip.y = index;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Move every clip on `track_index` whose left edge is at or after `from_px`
    /// right by `dx`, skipping `exclude`.
    pub fn shift_clips_from(&mut self, track_index: usize, from_px: f64, dx: f64, exclude: &[Uuid]) {
        let Some(track) = self.tracks.get_mut(track_index) else {
            return;
        };
        for clip in &mut track.clips {
            if clip.left + GEOMETRY_EPSILON >= from_px && !exclude.contains(&clip.id) {
                clip.left += dx;
            }
        }
    }

    /// Check every timeline invariant at the given scale.
    pub fn validate(&self, scale: &TimeScale) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();
        let mut seen = HashSet::new();
        let transitions = self.transition_lookup();

        for (index, track) in self.tracks.iter().enumerate() {
            for clip in &track.clips {
                if !seen.insert(clip.id) {
                    violations.push(InvariantViolation::DuplicateClipId { clip_id: clip.id });
                }
                if !(clip.width > 0.0) {
                    violations.push(InvariantViolation::NonPositiveWidth { clip_id: clip.id });
                }
                if clip.y != index {
                    violations.push(InvariantViolation::TrackIndexMismatch {
                        clip_id: clip.id,
                        track_index: index,
                        y: clip.y,
                    });
                }
                if !clip.trim_fits(scale) {
                    violations.push(InvariantViolation::TrimOverflow { clip_id: clip.id });
                }
                let edges = [
                    (clip.left_transition_id, true),
                    (clip.right_transition_id, false),
                ];
                for (edge, is_left_edge) in edges {
                    let Some(transition_id) = edge else { continue };
                    let mirrored = transitions.get(&transition_id).is_some_and(|t| {
                        if is_left_edge {
                            t.right_clip_id == Some(clip.id)
                        } else {
                            t.left_clip_id == Some(clip.id)
                        }
                    });
                    if !mirrored {
                        violations.push(InvariantViolation::DanglingReference {
                            clip_id: clip.id,
                            transition_id,
                        });
                    }
                }
            }

            let clips = track.sorted_clips();
            for (i, a) in clips.iter().enumerate() {
                for b in &clips[i + 1..] {
                    if b.left >= a.right() - GEOMETRY_EPSILON {
                        continue;
                    }
                    if b.right() <= a.left + GEOMETRY_EPSILON {
                        continue;
                    }
                    if !self.has_transition_between(a.id, b.id) {
                        violations.push(InvariantViolation::UnlicensedOverlap { a: a.id, b: b.id });
                    }
                }
            }

            for transition in &track.transitions {
                if transition.kind().is_none() {
                    violations.push(InvariantViolation::OrphanTransition {
                        transition_id: transition.id,
                    });
                }
                let endpoints = [
                    (transition.left_clip_id, false),
                    (transition.right_clip_id, true),
                ];
                for (endpoint, is_left_edge) in endpoints {
                    let Some(clip_id) = endpoint else { continue };
                    let Some(clip) = track.find_clip(clip_id) else {
                        if self.find_clip(clip_id).is_some() {
                            violations.push(InvariantViolation::TransitionOffTrack {
                                transition_id: transition.id,
                            });
                        } else {
                            violations.push(InvariantViolation::MissingEndpoint {
                                transition_id: transition.id,
                                clip_id,
                            });
                        }
                        continue;
                    };
                    let edge = if is_left_edge {
                        clip.left_transition_id
                    } else {
                        clip.right_transition_id
                    };
                    if edge != Some(transition.id) {
                        violations.push(InvariantViolation::MissingEndpoint {
                            transition_id: transition.id,
                            clip_id,
                        });
                    }
                    if transition.width_px(scale) > clip.width + GEOMETRY_EPSILON {
                        violations.push(InvariantViolation::TransitionTooLong {
                            transition_id: transition.id,
                            clip_id,
                        });
                    }
                }
            }
        }
        violations
    }

    /// Fix referential damage found in externally loaded state. Returns the
    /// number of fixes applied; each one is logged as a warning.
    pub fn repair(&mut self) -> usize {
        let mut fixes = 0;

        let reindexed = self.reindex_tracks();
        if reindexed > 0 {
            tracing::warn!(clips = reindexed, "re-derived clip track indices");
            fixes += reindexed;
        }

        let clip_tracks: HashMap<Uuid, usize> = self
            .tracks
            .iter()
            .enumerate()
            .flat_map(|(i, t)| t.clips.iter().map(move |c| (c.id, i)))
            .collect();

        // Transition endpoints must name clips that exist on the transition's track.
        let mut relocate = Vec::new();
        for (index, track) in self.tracks.iter_mut().enumerate() {
            for transition in &mut track.transitions {
                for endpoint in [&mut transition.left_clip_id, &mut transition.right_clip_id] {
                    if let Some(clip_id) = *endpoint {
                        if !clip_tracks.contains_key(&clip_id) {
                            tracing::warn!(transition = %transition.id, clip = %clip_id, "dropping reference to missing clip");
                            *endpoint = None;
                            fixes += 1;
                        }
                    }
                }
                let left_track = transition.left_clip_id.and_then(|id| clip_tracks.get(&id).copied());
                let right_track = transition.right_clip_id.and_then(|id| clip_tracks.get(&id).copied());
                if let (Some(l), Some(r)) = (left_track, right_track) {
                    if l != r {
                        tracing::warn!(transition = %transition.id, "transition spans two tracks, detaching right clip");
                        transition.right_clip_id = None;
                        fixes += 1;
                    }
                }
                if let Some(home) = left_track.or(right_track) {
                    if home != index {
                        relocate.push((transition.id, index, home));
                    }
                }
            }
        }
        for (transition_id, from, to) in relocate {
            if let Some(transition) = self.tracks[from].take_transition(transition_id) {
                tracing::warn!(transition = %transition_id, from, to, "moving transition to the track of its clips");
                self.tracks[to].transitions.push(transition);
                fixes += 1;
            }
        }

        // Clip edges must be mirrored by the transition they name.
        let transitions = self.transition_lookup();
        for clip in self.tracks.iter_mut().flat_map(|t| t.clips.iter_mut()) {
            let clip_id = clip.id;
            if let Some(id) = clip.left_transition_id {
                if transitions.get(&id).and_then(|t| t.right_clip_id) != Some(clip_id) {
                    tracing::warn!(clip = %clip_id, transition = %id, "clearing dangling left transition");
                    clip.left_transition_id = None;
                    fixes += 1;
                }
            }
            if let Some(id) = clip.right_transition_id {
                if transitions.get(&id).and_then(|t| t.left_clip_id) != Some(clip_id) {
                    tracing::warn!(clip = %clip_id, transition = %id, "clearing dangling right transition");
                    clip.right_transition_id = None;
                    fixes += 1;
                }
            }
        }

        // And the other way round.
        let edges: HashMap<Uuid, (Option<Uuid>, Option<Uuid>)> = self
            .clips()
            .map(|c| (c.id, (c.left_transition_id, c.right_transition_id)))
            .collect();
        for track in &mut self.tracks {
            for transition in &mut track.transitions {
                if let Some(clip_id) = transition.left_clip_id {
                    if edges.get(&clip_id).and_then(|e| e.1) != Some(transition.id) {
                        tracing::warn!(transition = %transition.id, clip = %clip_id, "left clip does not point back");
                        transition.left_clip_id = None;
                        fixes += 1;
                    }
                }
                if let Some(clip_id) = transition.right_clip_id {
                    if edges.get(&clip_id).and_then(|e| e.0) != Some(transition.id) {
                        tracing::warn!(transition = %transition.id, clip = %clip_id, "right clip does not point back");
                        transition.right_clip_id = None;
                        fixes += 1;
                    }
                }
            }
            let before = track.transitions.len();
            track.transitions.retain(|t| t.kind().is_some());
            let dropped = before - track.transitions.len();
            if dropped > 0 {
                tracing::warn!(track = %track.id, dropped, "dropping transitions without clips");
                fixes += dropped;
            }
        }

        fixes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MediaKind, Presentation, Timing};

    fn video(left: f64, width: f64, y: usize) -> Clip {
        Clip::new(MediaKind::Video, Uuid::new_v4(), left, width, y)
    }

    /// Two clips on track 0 bridged by a transition, plus one unrelated clip.
    fn linked_timeline() -> (Timeline, Uuid, Uuid, Uuid, Uuid) {
        let mut timeline = Timeline::default();
        let mut a = video(0.0, 300.0, 0);
        let mut b = video(250.0, 300.0, 0);
        let c = video(0.0, 100.0, 1);
        let mut t = Transition::new(Presentation::Fade, Timing::Linear, 15);
        t.left_clip_id = Some(a.id);
        t.right_clip_id = Some(b.id);
        a.right_transition_id = Some(t.id);
        b.left_transition_id = Some(t.id);
        let ids = (a.id, b.id, c.id, t.id);
        timeline.tracks[0].clips.extend([a, b]);
        timeline.tracks[0].transitions.push(t);
        timeline.tracks[1].clips.push(c);
        (timeline, ids.0, ids.1, ids.2, ids.3)
    }

    #[test]
    fn default_has_four_named_tracks() {
        let timeline = Timeline::default();
        assert_eq!(timeline.tracks.len(), 4);
        assert_eq!(timeline.tracks[3].name, "Track 4");
        assert_eq!(timeline.resolution, Resolution::FourK);
    }

    #[test]
    fn linked_overlap_is_valid() {
        let (timeline, ..) = linked_timeline();
        assert!(timeline.validate(&TimeScale::default()).is_empty());
    }

    #[test]
    fn unlinked_overlap_is_reported() {
        let mut timeline = Timeline::default();
        let a = video(0.0, 300.0, 0);
        let b = video(100.0, 300.0, 0);
        let (a_id, b_id) = (a.id, b.id);
        timeline.tracks[0].clips.extend([a, b]);
        let violations = timeline.validate(&TimeScale::default());
        assert_eq!(violations, vec![InvariantViolation::UnlicensedOverlap { a: a_id, b: b_id }]);
    }

    #[test]
    fn deleting_an_endpoint_cascades() {
        let (mut timeline, a, b, _, t) = linked_timeline();
        let report = timeline.remove_clips(&HashSet::from([a]));
        assert_eq!(report.clips.len(), 1);
        assert_eq!(report.transitions.len(), 1);
        assert!(timeline.find_transition(t).is_none());
        let (_, b) = timeline.find_clip(b).unwrap();
        assert_eq!(b.left_transition_id, None);
        assert!(timeline.validate(&TimeScale::default()).is_empty());
    }

    #[test]
    fn remove_clips_from_media_removes_every_use() {
        let mut timeline = Timeline::default();
        let media = Uuid::new_v4();
        timeline.tracks[0].clips.push(Clip::new(MediaKind::Image, media, 0.0, 100.0, 0));
        timeline.tracks[2].clips.push(Clip::new(MediaKind::Image, media, 0.0, 100.0, 2));
        timeline.tracks[2].clips.push(video(200.0, 100.0, 2));
        let report = timeline.remove_clips_from_media(media);
        assert_eq!(report.clips.len(), 2);
        assert_eq!(timeline.clip_count(), 1);
    }

    #[test]
    fn removing_a_track_reindexes_later_clips() {
        let (mut timeline, a, _, c, _) = linked_timeline();
        let first = timeline.tracks[0].id;
        let report = timeline.remove_track(first).unwrap();
        assert_eq!(report.clips.len(), 2);
        assert!(timeline.find_clip(a).is_none());
        let (index, clip) = timeline.find_clip(c).unwrap();
        assert_eq!(index, 0);
        assert_eq!(clip.y, 0);
        assert!(matches!(
            timeline.remove_track(first),
            Err(EditError::TrackNotFound(_))
        ));
    }

    #[test]
    fn remove_transition_clears_both_edges() {
        let (mut timeline, a, b, _, t) = linked_timeline();
        timeline.remove_transition(t).unwrap();
        assert!(!timeline.find_clip(a).unwrap().1.has_transitions());
        assert!(!timeline.find_clip(b).unwrap().1.has_transitions());
        assert!(matches!(
            timeline.remove_transition(t),
            Err(EditError::TransitionNotFound(_))
        ));
    }

    #[test]
    fn repair_clears_dangling_references() {
        let (mut timeline, a, b, _, t) = linked_timeline();
        // Drop clip b behind the store's back.
        timeline.tracks[0].clips.retain(|c| c.id != b);
        timeline.tracks[1].clips[0].left_transition_id = Some(Uuid::new_v4());
        timeline.tracks[1].clips[0].y = 3;

        let fixes = timeline.repair();
        assert!(fixes >= 3);
        let transition = timeline.find_transition(t).unwrap().1;
        assert_eq!(transition.left_clip_id, Some(a));
        assert_eq!(transition.right_clip_id, None);
        assert!(timeline.validate(&TimeScale::default()).is_empty());
        assert_eq!(timeline.repair(), 0);
    }

    #[test]
    fn repair_drops_transitions_without_clips() {
        let mut timeline = Timeline::default();
        timeline.tracks[0]
            .transitions
            .push(Transition::new(Presentation::Fade, Timing::Linear, 10));
        assert_eq!(timeline.repair(), 1);
        assert!(timeline.tracks[0].transitions.is_empty());
    }

    #[test]
    fn shift_moves_followers_only() {
        let mut timeline = Timeline::default();
        let a = video(0.0, 100.0, 0);
        let b = video(100.0, 100.0, 0);
        let c = video(300.0, 100.0, 0);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        timeline.tracks[0].clips.extend([a, b, c]);
        timeline.shift_clips_from(0, 100.0, 50.0, &[b_id]);
        assert_eq!(timeline.find_clip(a_id).unwrap().1.left, 0.0);
        assert_eq!(timeline.find_clip(b_id).unwrap().1.left, 100.0);
        assert_eq!(timeline.find_clip(c_id).unwrap().1.left, 350.0);
    }
}
