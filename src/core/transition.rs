//! Transition placement and removal.
//!
//! A clip edge is in one of four states: no transition, intro (right clip
//! only), outro (left clip only) or bridging. Bridging two clips that are
//! within the snap distance pulls the right clip left so the pair overlaps by
//! the transition's width; deleting the transition pushes it back.

use uuid::Uuid;

use super::{placement, TimeScale};
use crate::error::{EditError, EditResult};
use crate::state::{Clip, EdgeSide, Timeline, Track, Transition};

/// The clips a transition would attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionTarget {
    pub left: Option<Uuid>,
    pub right: Option<Uuid>,
}

/// Find the clips a transition dropped at `drop_px` should attach to.
///
/// A drop inside a clip targets its left edge in the left half and its right
/// edge in the right half, bridging to the neighbour when the gap is within
/// `snap_px`. Drops in empty space target the nearest edges around them.
pub fn locate_target(track: &Track, drop_px: f64, snap_px: f64) -> TransitionTarget {
    let clips = track.sorted_clips();
    let last = clips.len().saturating_sub(1);

    for (i, clip) in clips.iter().enumerate() {
        if drop_px >= clip.left && drop_px <= clip.right() {
            let in_left_half = drop_px <= clip.left + clip.width / 2.0;
            return if in_left_half {
                match i.checked_sub(1).map(|p| clips[p]) {
                    Some(prev) if clip.left - prev.right() <= snap_px => TransitionTarget {
                        left: Some(prev.id),
                        right: Some(clip.id),
                    },
                    _ => TransitionTarget {
                        left: None,
                        right: Some(clip.id),
                    },
                }
            } else {
                match clips.get(i + 1) {
                    Some(next) if next.left - clip.right() <= snap_px => TransitionTarget {
                        left: Some(clip.id),
                        right: Some(next.id),
                    },
                    _ => TransitionTarget {
                        left: Some(clip.id),
                        right: None,
                    },
                }
            };
        }
        if i == 0 && drop_px < clip.left {
            return TransitionTarget {
                left: None,
                right: Some(clip.id),
            };
        }
        if i == last && drop_px > clip.right() {
            return TransitionTarget {
                left: Some(clip.id),
                right: None,
            };
        }
        if let Some(next) = clips.get(i + 1) {
            if drop_px > clip.right() && drop_px < next.left {
                return TransitionTarget {
                    left: Some(clip.id),
                    right: Some(next.id),
                };
            }
        }
    }
    TransitionTarget::default()
}

/// Check a transition against the clips it would attach to.
pub fn validate_placement(
    left: Option<&Clip>,
    right: Option<&Clip>,
    transition: &Transition,
    scale: &TimeScale,
) -> EditResult<()> {
    if left.is_none() && right.is_none() {
        return Err(EditError::TransitionWithoutClip);
    }
    for clip in left.iter().chain(right.iter()) {
        if !clip.kind.accepts_transitions() {
            return Err(EditError::TransitionNotAllowed { kind: clip.kind });
        }
    }

    let width = transition.width_px(scale);
    if let Some(left) = left {
        if width > left.width {
            return Err(EditError::TransitionTooLong {
                side: EdgeSide::Left,
            });
        }
    }
    if let Some(right) = right {
        if width > right.width {
            return Err(EditError::TransitionTooLong {
                side: EdgeSide::Right,
            });
        }
    }

    let left_taken = left.is_some_and(|c| c.right_transition_id.is_some());
    let right_taken = right.is_some_and(|c| c.left_transition_id.is_some());
    match (left, right) {
        _ if left_taken && right_taken => Err(EditError::BackToBackTransitions),
        (Some(clip), _) if left_taken => Err(EditError::EdgeOccupied {
            clip_id: clip.id,
            side: EdgeSide::Right,
        }),
        (_, Some(clip)) if right_taken => Err(EditError::EdgeOccupied {
            clip_id: clip.id,
            side: EdgeSide::Left,
        }),
        _ => Ok(()),
    }
}

/// Place a transition dropped at `drop_px` on a track.
///
/// Returns the new timeline and the id of the placed transition.
pub fn add_transition(
    timeline: &Timeline,
    track_id: Uuid,
    transition: Transition,
    drop_px: f64,
    scale: &TimeScale,
    snap_px: f64,
) -> EditResult<(Timeline, Uuid)> {
    let track_index = timeline.track_index_or_err(track_id)?;
    let target = locate_target(&timeline.tracks[track_index], drop_px, snap_px);
    place(timeline, track_index, target, transition, scale, snap_px)
}

/// Place a transition between explicit clips. Either side may be `None`
/// for an intro or outro. Two clips must be neighbours on the same track.
pub fn add_transition_between(
    timeline: &Timeline,
    left: Option<Uuid>,
    right: Option<Uuid>,
    transition: Transition,
    scale: &TimeScale,
    snap_px: f64,
) -> EditResult<(Timeline, Uuid)> {
    let left_clip = left.map(|id| timeline.clip_or_err(id)).transpose()?;
    let right_clip = right.map(|id| timeline.clip_or_err(id)).transpose()?;
    let track_index = match (left_clip, right_clip) {
        (Some((l, a)), Some((r, b))) => {
            if l != r {
                return Err(EditError::invalid_geometry(
                    "transition clips are on different tracks",
                ));
            }
            if a.left > b.left {
                return Err(EditError::invalid_geometry(
                    "left clip of a transition must start before the right clip",
                ));
            }
            let between = timeline.tracks[l]
                .clips
                .iter()
                .find(|c| c.id != a.id && c.id != b.id && c.left > a.left && c.left < b.left);
            if let Some(between) = between {
                return Err(EditError::ClipsNotAdjacent {
                    left: a.id,
                    right: b.id,
                    between: between.id,
                });
            }
            l
        }
        (Some((index, _)), None) | (None, Some((index, _))) => index,
        (None, None) => return Err(EditError::TransitionWithoutClip),
    };
    place(
        timeline,
        track_index,
        TransitionTarget { left, right },
        transition,
        scale,
        snap_px,
    )
}

fn place(
    timeline: &Timeline,
    track_index: usize,
    target: TransitionTarget,
    mut transition: Transition,
    scale: &TimeScale,
    snap_px: f64,
) -> EditResult<(Timeline, Uuid)> {
    let track = &timeline.tracks[track_index];
    let left = target.left.and_then(|id| track.find_clip(id));
    let right = target.right.and_then(|id| track.find_clip(id));
    validate_placement(left, right, &transition, scale)?;

    if timeline.find_transition(transition.id).is_some() {
        transition.id = Uuid::new_v4();
    }
    transition.left_clip_id = left.map(|c| c.id);
    transition.right_clip_id = right.map(|c| c.id);
    let transition_id = transition.id;
    let width = transition.width_px(scale);

    // Pull the right clip into an overlap when the pair is close enough.
    let snapped_left = match (left, right) {
        (Some(l), Some(r)) if r.left - l.right() <= snap_px => Some(l.right() - width),
        _ => None,
    };

    let mut next = timeline.clone();
    let track = &mut next.tracks[track_index];
    if let Some(id) = transition.left_clip_id {
        if let Some(clip) = track.find_clip_mut(id) {
            clip.right_transition_id = Some(transition_id);
        }
    }
    if let Some(id) = transition.right_clip_id {
        if let Some(clip) = track.find_clip_mut(id) {
            clip.left_transition_id = Some(transition_id);
            if let Some(left) = snapped_left {
                clip.left = left;
            }
        }
    }
    track.transitions.push(transition);

    if let (Some(_), Some(right_id)) = (snapped_left, target.right) {
        if let Some((_, moved)) = next.find_clip(right_id) {
            if placement::collides(&next, moved) {
                return Err(EditError::Collision(right_id));
            }
        }
    }

    tracing::debug!(
        transition = %transition_id,
        left = ?target.left,
        right = ?target.right,
        snapped = snapped_left.is_some(),
        "transition placed"
    );
    Ok((next, transition_id))
}

/// Remove a transition. If it had pulled its clips together, the right clip
/// and every clip after it on the track move right by the transition's width.
pub fn delete_transition(
    timeline: &Timeline,
    transition_id: Uuid,
    scale: &TimeScale,
    snap_px: f64,
) -> EditResult<Timeline> {
    let (track_index, transition) = timeline
        .find_transition(transition_id)
        .ok_or(EditError::TransitionNotFound(transition_id))?;
    let track = &timeline.tracks[track_index];
    let width = transition.width_px(scale);

    let restore = match (
        transition.left_clip_id.and_then(|id| track.find_clip(id)),
        transition.right_clip_id.and_then(|id| track.find_clip(id)),
    ) {
        (Some(left), Some(right)) => {
            let current_gap = right.left - left.right();
            let original_gap = current_gap + width;
            (original_gap <= snap_px).then_some((left.id, right.left))
        }
        _ => None,
    };

    let mut next = timeline.clone();
    if let Some((left_id, from_px)) = restore {
        next.shift_clips_from(track_index, from_px, width, &[left_id]);
    }
    next.remove_transition(transition_id)?;
    tracing::debug!(transition = %transition_id, restored = restore.is_some(), "transition deleted");
    Ok(next)
}
