//! Placement and collision rules for clips on a track.
//!
//! Two clips on the same track may only overlap when a transition bridges
//! them. A drag that lands on another clip is snapped flush against one of its
//! edges; if neither edge is free the clip stays where it was.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

use super::{group, TimeScale};
use crate::constants::{
    DEFAULT_IMAGE_WIDTH_PX, DEFAULT_MEDIA_WIDTH_PX, DEFAULT_PLAYER_OFFSET, DEFAULT_TEXT_CHARS,
    DEFAULT_TEXT_FONT_SIZE, DEFAULT_TEXT_WIDTH_PX, GEOMETRY_EPSILON, MIN_DROP_WIDTH_PX,
    MIN_TEXT_PLAYER_HEIGHT, MIN_TEXT_PLAYER_WIDTH,
};
use crate::error::{EditError, EditResult};
use crate::state::{Clip, MediaEntry, MediaKind, PlayerRect, Timeline, Transition};

/// How a requested position was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementOutcome {
    /// Placed exactly where requested.
    Accepted,
    /// Moved flush against a colliding clip.
    Snapped,
    /// Left at its previous position.
    Reverted,
}

/// A resolved drag: the clip as it should be committed.
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    Accepted(Clip),
    Snapped(Clip),
    Reverted(Clip),
}

impl Placement {
    pub fn clip(&self) -> &Clip {
        match self {
            Placement::Accepted(c) | Placement::Snapped(c) | Placement::Reverted(c) => c,
        }
    }

    pub fn into_clip(self) -> Clip {
        match self {
            Placement::Accepted(c) | Placement::Snapped(c) | Placement::Reverted(c) => c,
        }
    }

    pub fn outcome(&self) -> PlacementOutcome {
        match self {
            Placement::Accepted(_) => PlacementOutcome::Accepted,
            Placement::Snapped(_) => PlacementOutcome::Snapped,
            Placement::Reverted(_) => PlacementOutcome::Reverted,
        }
    }
}

fn spans_overlap(a_left: f64, a_right: f64, b_left: f64, b_right: f64) -> bool {
    a_left < b_right - GEOMETRY_EPSILON && a_right > b_left + GEOMETRY_EPSILON
}

/// Clips on the candidate's track that it would overlap without a bridging
/// transition, ordered by their left edge.
pub fn colliding_clips<'a>(timeline: &'a Timeline, candidate: &Clip) -> Vec<&'a Clip> {
    let Some(track) = timeline.tracks.get(candidate.y) else {
        return Vec::new();
    };
    let mut hits: Vec<&Clip> = track
        .clips
        .iter()
        .filter(|other| other.id != candidate.id)
        .filter(|other| {
            spans_overlap(candidate.left, candidate.right(), other.left, other.right())
        })
        .filter(|other| !timeline.has_transition_between(candidate.id, other.id))
        .collect();
    hits.sort_by(|a, b| a.left.total_cmp(&b.left));
    hits
}

/// True if the candidate placement would overlap another clip on its track.
pub fn collides(timeline: &Timeline, candidate: &Clip) -> bool {
    !colliding_clips(timeline, candidate).is_empty()
}

/// Resolve an interactive drag from `original` to `proposed`.
///
/// With a collision, the clip is snapped flush against the first colliding
/// clip. The side nearer to the dragged clip's center is tried first, then the
/// other one. If both are blocked the original clip is returned.
pub fn resolve_drag(
    timeline: &Timeline,
    original: &Clip,
    proposed: Clip,
    timeline_width: f64,
) -> Placement {
    let first = match colliding_clips(timeline, &proposed).first() {
        None => return Placement::Accepted(proposed),
        Some(first) => (*first).clone(),
    };

    let drag_center = proposed.left + proposed.width / 2.0;
    let first_center = first.left + first.width / 2.0;
    let snap_left = (first.left - proposed.width).max(0.0);
    let snap_right = first.right().min(timeline_width - proposed.width);
    let candidates = if drag_center < first_center {
        [snap_left, snap_right]
    } else {
        [snap_right, snap_left]
    };

    for left in candidates {
        if left < 0.0 {
            continue;
        }
        let mut snapped = proposed.clone();
        snapped.left = left;
        if !collides(timeline, &snapped) {
            tracing::debug!(clip = %snapped.id, left, against = %first.id, "snapped drag");
            return Placement::Snapped(snapped);
        }
    }

    tracing::debug!(clip = %original.id, "both snap positions blocked, reverting drag");
    Placement::Reverted(original.clone())
}

/// Clips and transitions reachable from one element through transition links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectedSet {
    /// In breadth-first order, starting element first when it is a clip.
    pub clips: Vec<Uuid>,
    pub transitions: Vec<Uuid>,
}

impl ConnectedSet {
    pub fn contains_clip(&self, clip_id: Uuid) -> bool {
        self.clips.contains(&clip_id)
    }

    /// True when the clip is linked to at least one other clip
    pub fn is_chain(&self) -> bool {
        self.clips.len() > 1
    }
}

#[derive(Clone, Copy)]
enum Element {
    Clip(Uuid),
    Transition(Uuid),
}

/// Breadth-first walk over left/right transition links starting at a clip
/// or transition id. Unknown ids yield an empty set.
pub fn connected_elements(timeline: &Timeline, start: Uuid) -> ConnectedSet {
    let clips: HashMap<Uuid, &Clip> = timeline.clips().map(|c| (c.id, c)).collect();
    let transitions: HashMap<Uuid, &Transition> =
        timeline.transitions().map(|t| (t.id, t)).collect();

    let mut set = ConnectedSet::default();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    if clips.contains_key(&start) {
        queue.push_back(Element::Clip(start));
    } else if transitions.contains_key(&start) {
        queue.push_back(Element::Transition(start));
    }

    while let Some(element) = queue.pop_front() {
        match element {
            Element::Clip(id) => {
                if !visited.insert(id) {
                    continue;
                }
                let Some(clip) = clips.get(&id) else { continue };
                set.clips.push(id);
                for edge in [clip.left_transition_id, clip.right_transition_id]
                    .into_iter()
                    .flatten()
                {
                    if transitions.contains_key(&edge) && !visited.contains(&edge) {
                        queue.push_back(Element::Transition(edge));
                    }
                }
            }
            Element::Transition(id) => {
                if !visited.insert(id) {
                    continue;
                }
                let Some(transition) = transitions.get(&id) else { continue };
                set.transitions.push(id);
                for endpoint in [transition.left_clip_id, transition.right_clip_id]
                    .into_iter()
                    .flatten()
                {
                    if clips.contains_key(&endpoint) && !visited.contains(&endpoint) {
                        queue.push_back(Element::Clip(endpoint));
                    }
                }
            }
        }
    }
    set
}

/// Move a clip and everything linked to it by `dx` pixels and `dy` tracks.
///
/// Returns `Ok(None)` when any moved clip would collide with a clip outside
/// the chain or leave the start of the timeline; nothing moves in that case.
pub fn move_connected(
    timeline: &Timeline,
    anchor: Uuid,
    dx: f64,
    dy: isize,
) -> EditResult<Option<Timeline>> {
    timeline.clip_or_err(anchor)?;
    let set = connected_elements(timeline, anchor);
    let in_set: HashSet<Uuid> = set.clips.iter().copied().collect();

    let mut moved = Vec::with_capacity(set.clips.len());
    for id in &set.clips {
        let Some((_, clip)) = timeline.find_clip(*id) else {
            continue;
        };
        let target = clip.y as isize + dy;
        if target < 0 || target as usize >= timeline.tracks.len() {
            return Err(EditError::TrackIndexOutOfRange(target));
        }
        let mut next = clip.clone();
        next.left += dx;
        next.y = target as usize;
        moved.push(next);
    }

    if moved.iter().any(|c| c.left < -GEOMETRY_EPSILON) {
        tracing::debug!(anchor = %anchor, "chain move would cross the timeline start");
        return Ok(None);
    }

    for clip in &moved {
        let blocked = timeline.tracks[clip.y]
            .clips
            .iter()
            .filter(|other| !in_set.contains(&other.id))
            .any(|other| {
                spans_overlap(clip.left, clip.right(), other.left, other.right())
                    && !timeline.has_transition_between(clip.id, other.id)
            });
        if blocked {
            tracing::debug!(anchor = %anchor, clip = %clip.id, "chain move blocked");
            return Ok(None);
        }
    }

    let mut next = timeline.clone();
    let mut homes = HashMap::new();
    for clip in moved {
        homes.insert(clip.id, clip.y);
        let stays = next
            .find_clip(clip.id)
            .is_some_and(|(track, _)| track == clip.y);
        if stays {
            if let Some(existing) = next.find_clip_mut(clip.id) {
                *existing = clip;
            }
        } else {
            for track in &mut next.tracks {
                track.take_clip(clip.id);
            }
            let y = clip.y;
            next.tracks[y].clips.push(clip);
        }
    }
    for id in &set.transitions {
        let Some((from, transition)) = next.find_transition(*id) else {
            continue;
        };
        let home = transition
            .left_clip_id
            .or(transition.right_clip_id)
            .and_then(|c| homes.get(&c).copied());
        if let Some(to) = home.filter(|to| *to != from) {
            if let Some(transition) = next.tracks[from].take_transition(*id) {
                next.tracks[to].transitions.push(transition);
            }
        }
    }
    Ok(Some(next))
}

/// Initial timeline width of a dropped media entry.
pub fn initial_width(entry: &MediaEntry, scale: &TimeScale) -> f64 {
    let width = match entry.kind {
        MediaKind::Text => DEFAULT_TEXT_WIDTH_PX,
        kind if kind.is_timed() && entry.duration_seconds > 0.0 => {
            scale.to_pixels(entry.duration_seconds)
        }
        MediaKind::Image => DEFAULT_IMAGE_WIDTH_PX,
        _ => DEFAULT_MEDIA_WIDTH_PX,
    };
    width.max(MIN_DROP_WIDTH_PX)
}

/// Initial player geometry of a dropped media entry. Text without a natural
/// size gets one derived from its content and font size.
pub fn initial_player_rect(entry: &MediaEntry) -> PlayerRect {
    let mut rect = PlayerRect {
        left: DEFAULT_PLAYER_OFFSET,
        top: DEFAULT_PLAYER_OFFSET,
        width: entry.media_width,
        height: entry.media_height,
    };
    if entry.kind == MediaKind::Text {
        let (chars, font_size) = entry
            .text
            .as_ref()
            .map(|t| (t.content.chars().count(), t.font_size))
            .unwrap_or((0, 0.0));
        let chars = if chars == 0 { DEFAULT_TEXT_CHARS } else { chars };
        let font_size = if font_size > 0.0 {
            font_size
        } else {
            DEFAULT_TEXT_FONT_SIZE
        };
        if entry.media_width == 0.0 {
            rect.width = MIN_TEXT_PLAYER_WIDTH.max(chars as f64 * font_size * 0.6);
        }
        if entry.media_height == 0.0 {
            rect.height = MIN_TEXT_PLAYER_HEIGHT.max(font_size * 1.5);
        }
    }
    rect
}

/// Build the clip a drop of `entry` at `left_px` on `track_index` would create.
///
/// Composite payloads get fresh ids throughout. A collision is resolved like a
/// drag; a drop with both snap sides blocked fails with [`EditError::Collision`].
pub fn prepare_drop(
    timeline: &Timeline,
    entry: &MediaEntry,
    track_index: usize,
    left_px: f64,
    scale: &TimeScale,
    timeline_width: f64,
) -> EditResult<Placement> {
    if track_index >= timeline.tracks.len() {
        return Err(EditError::TrackIndexOutOfRange(track_index as isize));
    }
    if !left_px.is_finite() {
        return Err(EditError::invalid_geometry("drop position is not a number"));
    }

    let width = initial_width(entry, scale);
    let mut clip = Clip::from_media(entry, left_px.max(0.0), width, track_index);
    clip.player = initial_player_rect(entry);
    if let Some(payload) = entry.group.as_ref() {
        clip.group = Some(group::remap_group(payload, &timeline.transition_lookup()));
    }

    match resolve_drag(timeline, &clip, clip.clone(), timeline_width) {
        Placement::Reverted(clip) => Err(EditError::Collision(clip.id)),
        placement => Ok(placement),
    }
}
