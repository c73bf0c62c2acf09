//! Grouping clips into a composite clip and back.
//!
//! A composite stores deep copies of its children with the geometry they had
//! when grouped. Ungrouping maps that geometry through the composite's current
//! position and width. Dropping a composite from the media bin regenerates
//! every id inside it so that copies never collide.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{placement, TimeScale};
use crate::constants::GROUP_MEDIA_HEIGHT;
use crate::error::{EditError, EditResult};
use crate::state::{Clip, ClipGroup, GroupBounds, MediaEntry, MediaKind, Timeline, Transition};

/// Collapse the given clips into one composite clip on the topmost of their tracks.
///
/// Transitions between grouped clips move into the group. A transition
/// linking a grouped clip to one outside the selection blocks the operation.
pub fn group_clips(
    timeline: &Timeline,
    clip_ids: &[Uuid],
    scale: &TimeScale,
) -> EditResult<(Timeline, Uuid)> {
    let mut seen = HashSet::new();
    let ids: Vec<Uuid> = clip_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if ids.len() < 2 {
        return Err(EditError::GroupTooSmall(ids.len()));
    }

    let mut children = ids
        .iter()
        .map(|id| timeline.clip_or_err(*id).map(|(_, c)| c.clone()))
        .collect::<EditResult<Vec<Clip>>>()?;

    let lookup = timeline.transition_lookup();
    let mut inner: Vec<Transition> = Vec::new();
    for child in &children {
        for transition_id in child.transition_ids() {
            let Some(transition) = lookup.get(&transition_id) else {
                continue;
            };
            let outside = [transition.left_clip_id, transition.right_clip_id]
                .into_iter()
                .flatten()
                .any(|id| !seen.contains(&id));
            if outside {
                return Err(EditError::GroupCutsTransition(transition_id));
            }
            if !inner.iter().any(|t| t.id == transition_id) {
                inner.push(transition.clone());
            }
        }
    }

    children.sort_by(|a, b| a.left.total_cmp(&b.left));
    let Some(bounds) = GroupBounds::of(&children) else {
        return Err(EditError::GroupTooSmall(0));
    };

    let name = children
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    let mut composite = Clip::new(
        MediaKind::Composite,
        Uuid::new_v4(),
        bounds.left,
        bounds.width(),
        bounds.top,
    );
    composite.name = format!("Group: {name}");
    composite.duration_seconds = scale.to_seconds(bounds.width());
    composite.media_width = bounds.width();
    composite.media_height = GROUP_MEDIA_HEIGHT;
    composite.group = Some(ClipGroup {
        clips: children,
        transitions: inner,
    });
    let composite_id = composite.id;

    let mut next = timeline.clone();
    next.remove_clips(&seen);
    if placement::collides(&next, &composite) {
        return Err(EditError::Collision(composite_id));
    }
    next.tracks[bounds.top].clips.push(composite);

    tracing::info!(group = %composite_id, clips = ids.len(), "grouped clips");
    Ok((next, composite_id))
}

/// Replace a composite clip with its children.
///
/// Children are scaled by the composite's current width over its width when
/// grouped, and shifted by the tracks it has moved. Their ids are kept.
pub fn ungroup_clip(timeline: &Timeline, composite_id: Uuid) -> EditResult<(Timeline, Vec<Uuid>)> {
    let (track_index, composite) = timeline.clip_or_err(composite_id)?;
    let group = match (&composite.group, composite.is_composite()) {
        (Some(group), true) => group,
        _ => return Err(EditError::NotComposite(composite_id)),
    };
    let Some(original) = group.bounds() else {
        return Err(EditError::NotComposite(composite_id));
    };

    let width_scale = if original.width() > 0.0 {
        composite.width / original.width()
    } else {
        1.0
    };
    let track_offset = composite.y as isize - original.top as isize;

    let mut children = Vec::with_capacity(group.clips.len());
    for child in &group.clips {
        let y = child.y as isize + track_offset;
        if y < 0 || y as usize >= timeline.tracks.len() {
            return Err(EditError::TrackIndexOutOfRange(y));
        }
        let mut restored = child.clone();
        restored.left = composite.left + (child.left - original.left) * width_scale;
        restored.width = child.width * width_scale;
        restored.y = y as usize;
        children.push(restored);
    }

    let mut next = timeline.clone();
    next.tracks[track_index].take_clip(composite_id);
    let homes: HashMap<Uuid, usize> = children.iter().map(|c| (c.id, c.y)).collect();
    for transition in &group.transitions {
        let home = [transition.left_clip_id, transition.right_clip_id]
            .into_iter()
            .flatten()
            .find_map(|id| homes.get(&id).copied());
        match home {
            Some(y) => next.tracks[y].transitions.push(transition.clone()),
            None => tracing::warn!(transition = %transition.id, "skipping group transition without clips"),
        }
    }
    let child_ids: Vec<Uuid> = children.iter().map(|c| c.id).collect();
    for child in children {
        let y = child.y;
        next.tracks[y].clips.push(child);
    }
    for id in &child_ids {
        if let Some((_, child)) = next.find_clip(*id) {
            if placement::collides(&next, child) {
                return Err(EditError::Collision(*id));
            }
        }
    }

    tracing::info!(group = %composite_id, clips = child_ids.len(), "ungrouped clip");
    Ok((next, child_ids))
}

/// Remove a composite from the timeline and return it as a media entry
/// whose duration is its current length.
pub fn extract_group(
    timeline: &Timeline,
    composite_id: Uuid,
    scale: &TimeScale,
) -> EditResult<(Timeline, MediaEntry)> {
    let (_, composite) = timeline.clip_or_err(composite_id)?;
    let group = match (&composite.group, composite.is_composite()) {
        (Some(group), true) => group.clone(),
        _ => return Err(EditError::NotComposite(composite_id)),
    };
    let mut entry = MediaEntry::new_group(
        composite.name.clone(),
        scale.to_seconds(composite.width),
        group,
    );
    entry.media_width = composite.media_width;
    entry.media_height = composite.media_height;

    let mut next = timeline.clone();
    next.remove_clips(&HashSet::from([composite_id]));
    tracing::info!(group = %composite_id, media = %entry.id, "moved group to media bin");
    Ok((next, entry))
}

#[derive(Default)]
struct IdMap {
    clips: HashMap<Uuid, Uuid>,
    transitions: HashMap<Uuid, Uuid>,
}

impl IdMap {
    fn collect(&mut self, group: &ClipGroup) {
        for transition in &group.transitions {
            self.transitions.entry(transition.id).or_insert_with(Uuid::new_v4);
        }
        for clip in &group.clips {
            self.clips.insert(clip.id, Uuid::new_v4());
            for id in clip.transition_ids() {
                self.transitions.entry(id).or_insert_with(Uuid::new_v4);
            }
            if let Some(nested) = &clip.group {
                self.collect(nested);
            }
        }
    }

    fn rewrite(&self, group: &ClipGroup, fallback: &HashMap<Uuid, Transition>) -> ClipGroup {
        // Transitions of this level: the group's own, plus any its clips
        // reference that only the timeline still knows about.
        let mut sources: Vec<&Transition> = group.transitions.iter().collect();
        for id in group.clips.iter().flat_map(Clip::transition_ids) {
            if sources.iter().any(|t| t.id == id) {
                continue;
            }
            if let Some(transition) = fallback.get(&id) {
                sources.push(transition);
            }
        }

        let mut transitions = Vec::with_capacity(sources.len());
        for source in sources {
            let mut copy = source.clone();
            copy.id = self
                .transitions
                .get(&source.id)
                .copied()
                .unwrap_or_else(Uuid::new_v4);
            copy.left_clip_id = self.endpoint(source, source.left_clip_id);
            copy.right_clip_id = self.endpoint(source, source.right_clip_id);
            if copy.kind().is_some() {
                transitions.push(copy);
            }
        }

        let clips = group
            .clips
            .iter()
            .map(|clip| {
                let mut copy = clip.clone();
                copy.id = self.clips.get(&clip.id).copied().unwrap_or_else(Uuid::new_v4);
                copy.left_transition_id = self.edge(&transitions, clip, clip.left_transition_id);
                copy.right_transition_id = self.edge(&transitions, clip, clip.right_transition_id);
                copy.group = clip.group.as_ref().map(|g| self.rewrite(g, fallback));
                copy
            })
            .collect();

        ClipGroup { clips, transitions }
    }

    fn endpoint(&self, transition: &Transition, clip_id: Option<Uuid>) -> Option<Uuid> {
        let clip_id = clip_id?;
        let mapped = self.clips.get(&clip_id).copied();
        if mapped.is_none() {
            tracing::warn!(transition = %transition.id, clip = %clip_id, "transition endpoint outside the group, clearing");
        }
        mapped
    }

    fn edge(&self, transitions: &[Transition], clip: &Clip, old: Option<Uuid>) -> Option<Uuid> {
        let old = old?;
        let mapped = self
            .transitions
            .get(&old)
            .copied()
            .filter(|new| transitions.iter().any(|t| t.id == *new));
        if mapped.is_none() {
            tracing::warn!(clip = %clip.id, transition = %old, "unresolved transition reference, clearing");
        }
        mapped
    }
}

/// Copy a group with fresh ids for every clip and transition at every
/// nesting level, rewriting transition endpoints to the new clip ids.
///
/// Transitions referenced by a clip but missing from its group are looked up
/// in `fallback`; references that resolve nowhere are cleared.
pub fn remap_group(group: &ClipGroup, fallback: &HashMap<Uuid, Transition>) -> ClipGroup {
    let mut map = IdMap::default();
    map.collect(group);
    map.rewrite(group, fallback)
}
