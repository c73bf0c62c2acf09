//! Frame-accurate clip splitting at the ruler position.

use uuid::Uuid;

use super::{group, transition, TimeScale};
use crate::error::{EditError, EditResult};
use crate::state::Timeline;

/// A successful split
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub timeline: Timeline,
    /// The piece ending at the ruler
    pub left_id: Uuid,
    /// The piece starting at the ruler
    pub right_id: Uuid,
}

/// Split the single selected clip at `ruler_px`.
///
/// The left piece keeps the original `trim_before` and gets a `trim_after`
/// ending at the split frame; the right piece starts at the split frame and
/// keeps the original `trim_after`. Both pieces get fresh ids and start
/// without transitions: transitions on the original clip are deleted, which
/// restores the spacing they had pulled together. When that happens the
/// pieces shift right with their neighbours, so the cut no longer sits at
/// `ruler_px`.
///
/// Splitting a composite gives the right piece its own copy of the group
/// with fresh ids, so ungrouping both pieces never duplicates a child.
pub fn split_clip(
    timeline: &Timeline,
    selection: &[Uuid],
    ruler_px: f64,
    scale: &TimeScale,
    snap_px: f64,
) -> EditResult<SplitResult> {
    let clip_id = match selection {
        [] => return Err(EditError::NoSelection),
        [id] => *id,
        ids => return Err(EditError::MultipleSelection(ids.len())),
    };
    let (track_index, clip) = timeline.clip_or_err(clip_id)?;
    if !clip.contains_strictly(ruler_px) {
        return Err(EditError::SplitOutOfBounds {
            clip_id,
            position_px: ruler_px,
        });
    }

    let split_offset_seconds = scale.to_seconds(ruler_px) - scale.to_seconds(clip.left);
    let split_frame = (split_offset_seconds * scale.fps).round() as i64;
    let trim_before = clip.trim_before.unwrap_or(0);
    let trim_after = clip.trim_after.unwrap_or(0);
    let total_frames = clip.source_total_frames(scale);
    let split_in_source = trim_before + split_frame;

    let mut left = clip.clone();
    left.id = Uuid::new_v4();
    left.width = ruler_px - clip.left;
    left.trim_before = Some(trim_before);
    left.trim_after = Some(total_frames - split_in_source);
    left.right_transition_id = None;

    let mut right = clip.clone();
    right.id = Uuid::new_v4();
    right.left = ruler_px;
    right.width = clip.right() - ruler_px;
    right.trim_before = Some(split_in_source);
    right.trim_after = Some(trim_after);
    right.left_transition_id = None;
    if let Some(payload) = &clip.group {
        right.group = Some(group::remap_group(payload, &timeline.transition_lookup()));
    }

    let (left_id, right_id) = (left.id, right.id);
    // The outer edges briefly carry the original transitions so that deleting
    // them goes through the normal spacing restoration.
    let inherited = [clip.left_transition_id, clip.right_transition_id];

    let mut next = timeline.clone();
    let track = &mut next.tracks[track_index];
    track.take_clip(clip_id);
    track.clips.push(left);
    track.clips.push(right);
    for transition in &mut track.transitions {
        if transition.left_clip_id == Some(clip_id) {
            transition.left_clip_id = Some(right_id);
        }
        if transition.right_clip_id == Some(clip_id) {
            transition.right_clip_id = Some(left_id);
        }
    }

    for transition_id in inherited.into_iter().flatten() {
        if next.find_transition(transition_id).is_none() {
            tracing::warn!(clip = %clip_id, transition = %transition_id, "split clip referenced a missing transition");
            continue;
        }
        next = transition::delete_transition(&next, transition_id, scale, snap_px)?;
    }

    tracing::debug!(
        clip = %clip_id,
        split_frame,
        left = %left_id,
        right = %right_id,
        "split clip"
    );
    Ok(SplitResult {
        timeline: next,
        left_id,
        right_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Clip, MediaKind, Presentation, Timing, Transition};
    use std::collections::HashSet;

    const SNAP: f64 = 10.0;

    fn scale() -> TimeScale {
        TimeScale::new(100.0, 1.0, 30.0)
    }

    /// A 10 second video spanning [0, 1000), untrimmed.
    fn ten_second_clip() -> (Timeline, Uuid) {
        let mut timeline = Timeline::default();
        let mut clip = Clip::new(MediaKind::Video, Uuid::new_v4(), 0.0, 1000.0, 0);
        clip.duration_seconds = 10.0;
        clip.trim_before = Some(0);
        clip.trim_after = Some(0);
        let id = clip.id;
        timeline.tracks[0].clips.push(clip);
        (timeline, id)
    }

    #[test]
    fn split_conserves_frames_and_width() {
        let (timeline, id) = ten_second_clip();
        let result = split_clip(&timeline, &[id], 400.0, &scale(), SNAP).unwrap();
        let next = &result.timeline;
        assert!(next.find_clip(id).is_none());

        let (_, left) = next.find_clip(result.left_id).unwrap();
        let (_, right) = next.find_clip(result.right_id).unwrap();
        let total = 300;

        // Left shows [trim_before, total - trim_after), right likewise.
        let left_range = (left.trim_before.unwrap(), total - left.trim_after.unwrap());
        let right_range = (right.trim_before.unwrap(), total - right.trim_after.unwrap());
        assert_eq!(left_range, (0, 120));
        assert_eq!(right_range, (120, 300));
        assert_eq!(left.width + right.width, 1000.0);
        assert_eq!(right.left, 400.0);
        assert!(next.validate(&scale()).is_empty());
    }

    #[test]
    fn split_of_a_trimmed_clip_offsets_from_trim() {
        let mut timeline = Timeline::default();
        // 20s of source, 30 frames cut at the start, 60 at the end, 5s shown.
        let mut clip = Clip::new(MediaKind::Video, Uuid::new_v4(), 200.0, 500.0, 0);
        clip.duration_seconds = 20.0;
        clip.trim_before = Some(30);
        clip.trim_after = Some(60);
        let id = clip.id;
        timeline.tracks[0].clips.push(clip);

        let result = split_clip(&timeline, &[id], 300.0, &scale(), SNAP).unwrap();
        let (_, left) = result.timeline.find_clip(result.left_id).unwrap();
        let (_, right) = result.timeline.find_clip(result.right_id).unwrap();
        assert_eq!(left.trim_before, Some(30));
        assert_eq!(left.trim_after, Some(600 - 60));
        assert_eq!(right.trim_before, Some(60));
        assert_eq!(right.trim_after, Some(60));
        assert!(result.timeline.validate(&scale()).is_empty());
    }

    #[test]
    fn split_derives_length_from_trims_without_duration() {
        let mut timeline = Timeline::default();
        let mut clip = Clip::new(MediaKind::Image, Uuid::new_v4(), 0.0, 300.0, 0);
        clip.trim_before = Some(10);
        let id = clip.id;
        timeline.tracks[0].clips.push(clip);

        let result = split_clip(&timeline, &[id], 100.0, &scale(), SNAP).unwrap();
        let (_, left) = result.timeline.find_clip(result.left_id).unwrap();
        // Total is 10 + 90 + 0 frames; split at frame 30 of the shown span.
        assert_eq!(left.trim_after, Some(100 - 40));
    }

    #[test]
    fn split_rejects_bad_requests() {
        let (timeline, id) = ten_second_clip();
        assert!(matches!(
            split_clip(&timeline, &[], 400.0, &scale(), SNAP),
            Err(EditError::NoSelection)
        ));
        assert!(matches!(
            split_clip(&timeline, &[id, Uuid::new_v4()], 400.0, &scale(), SNAP),
            Err(EditError::MultipleSelection(2))
        ));
        for ruler in [0.0, 1000.0, 1200.0, -5.0] {
            assert!(matches!(
                split_clip(&timeline, &[id], ruler, &scale(), SNAP),
                Err(EditError::SplitOutOfBounds { .. })
            ));
        }
        assert!(matches!(
            split_clip(&timeline, &[Uuid::new_v4()], 400.0, &scale(), SNAP),
            Err(EditError::ClipNotFound(_))
        ));
    }

    #[test]
    fn split_drops_transitions_and_restores_spacing() {
        let mut timeline = Timeline::default();
        let mut a = Clip::new(MediaKind::Video, Uuid::new_v4(), 0.0, 300.0, 0);
        let mut b = Clip::new(MediaKind::Video, Uuid::new_v4(), 250.0, 300.0, 0);
        let mut t = Transition::new(Presentation::Fade, Timing::Linear, 15);
        t.left_clip_id = Some(a.id);
        t.right_clip_id = Some(b.id);
        a.right_transition_id = Some(t.id);
        b.left_transition_id = Some(t.id);
        let (a_id, b_id, t_id) = (a.id, b.id, t.id);
        timeline.tracks[0].clips.extend([a, b]);
        timeline.tracks[0].transitions.push(t);

        let result = split_clip(&timeline, &[b_id], 400.0, &scale(), SNAP).unwrap();
        let next = &result.timeline;
        assert!(next.find_transition(t_id).is_none());
        assert!(next.clips().all(|c| !c.has_transitions()));

        // Both pieces move right by the 50px the bridge had pulled in.
        let (_, left) = next.find_clip(result.left_id).unwrap();
        let (_, right) = next.find_clip(result.right_id).unwrap();
        assert_eq!(left.left, 300.0);
        assert_eq!(left.width, 150.0);
        assert_eq!(right.left, 450.0);
        assert_eq!(next.find_clip(a_id).unwrap().1.left, 0.0);
        assert!(next.validate(&scale()).is_empty());
    }

    #[test]
    fn split_composite_pieces_ungroup_without_shared_ids() {
        let mut timeline = Timeline::default();
        let a = Clip::new(MediaKind::Video, Uuid::new_v4(), 0.0, 300.0, 0);
        let b = Clip::new(MediaKind::Video, Uuid::new_v4(), 300.0, 300.0, 0);
        let (a_id, b_id) = (a.id, b.id);
        timeline.tracks[0].clips.extend([a, b]);
        let (grouped, composite) = group::group_clips(&timeline, &[a_id, b_id], &scale()).unwrap();

        let result = split_clip(&grouped, &[composite], 200.0, &scale(), SNAP).unwrap();
        let (next, _) = group::ungroup_clip(&result.timeline, result.left_id).unwrap();
        let (next, right_children) = group::ungroup_clip(&next, result.right_id).unwrap();

        assert_eq!(next.clip_count(), 4);
        let ids: HashSet<Uuid> = next.clips().map(|c| c.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(!right_children.contains(&a_id) && !right_children.contains(&b_id));
        assert_eq!(next.clips().filter(|c| c.id == a_id).count(), 1);

        // Left piece squeezes the children into [0, 200), the right into [200, 600).
        assert!((next.find_clip(b_id).unwrap().1.right() - 200.0).abs() < 1e-9);
        let mut right_lefts: Vec<f64> = right_children
            .iter()
            .map(|id| next.find_clip(*id).unwrap().1.left)
            .collect();
        right_lefts.sort_by(f64::total_cmp);
        assert!((right_lefts[0] - 200.0).abs() < 1e-9);
        assert!((right_lefts[1] - 400.0).abs() < 1e-9);
        assert!(next.validate(&scale()).is_empty());
    }
}
