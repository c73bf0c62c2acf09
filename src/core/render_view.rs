//! Flattened, time-based view of the timeline for the render/export side.
//!
//! Derived on demand from the pixel geometry; never stored.

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::TimeScale;
use crate::state::{
    Clip, ClipGroup, MediaKind, PlayerRect, Resolution, TextProperties, Timeline, Transition,
};

/// One clip in seconds and frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderClip {
    pub id: Uuid,
    pub kind: MediaKind,
    pub source_media_id: Uuid,
    pub media_url_local: Option<String>,
    pub media_url_remote: Option<String>,
    pub track_id: Uuid,
    pub track_index: usize,
    pub start_time: f64,
    pub end_time: f64,
    /// Natural duration of the source in seconds
    pub duration: f64,
    pub media_width: f64,
    pub media_height: f64,
    pub text: Option<TextProperties>,
    pub player: PlayerRect,
    pub trim_before: Option<i64>,
    pub trim_after: Option<i64>,
    pub left_transition_id: Option<Uuid>,
    pub right_transition_id: Option<Uuid>,
    pub group: Option<ClipGroup>,
}

impl RenderClip {
    fn from_clip(clip: &Clip, track_id: Uuid, track_index: usize, scale: &TimeScale) -> Self {
        Self {
            id: clip.id,
            kind: clip.kind,
            source_media_id: clip.source_media_id,
            media_url_local: clip.media_url_local.clone(),
            media_url_remote: clip.media_url_remote.clone(),
            track_id,
            track_index,
            start_time: scale.to_seconds(clip.left),
            end_time: scale.to_seconds(clip.right()),
            duration: clip.duration_seconds,
            media_width: clip.media_width,
            media_height: clip.media_height,
            text: clip.text.clone(),
            player: clip.player,
            trim_before: clip.trim_before,
            trim_after: clip.trim_after,
            left_transition_id: clip.left_transition_id,
            right_transition_id: clip.right_transition_id,
            group: clip.group.clone(),
        }
    }

    pub fn length_seconds(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Everything the renderer needs for one frame range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    /// Ordered by track, then start time
    pub clips: Vec<RenderClip>,
    pub transitions: BTreeMap<Uuid, Transition>,
    pub resolution: Resolution,
    pub fps: f64,
}

impl TimelineView {
    pub fn build(timeline: &Timeline, scale: &TimeScale) -> Self {
        let mut clips = Vec::with_capacity(timeline.clip_count());
        for (track_index, track) in timeline.tracks.iter().enumerate() {
            for clip in track.sorted_clips() {
                clips.push(RenderClip::from_clip(clip, track.id, track_index, scale));
            }
        }
        let transitions = timeline
            .transitions()
            .map(|t| (t.id, t.clone()))
            .collect();

        Self {
            clips,
            transitions,
            resolution: timeline.resolution,
            fps: scale.fps,
        }
    }

    /// End of the last clip in seconds
    pub fn duration(&self) -> f64 {
        self.clips.iter().map(|c| c.end_time).fold(0.0, f64::max)
    }

    /// Clips visible at `time_seconds`, bottom track first.
    pub fn active_at(&self, time_seconds: f64) -> Vec<&RenderClip> {
        let mut active: Vec<&RenderClip> = self
            .clips
            .iter()
            .filter(|c| time_seconds >= c.start_time && time_seconds < c.end_time)
            .collect();
        active.sort_by(|a, b| b.track_index.cmp(&a.track_index));
        active
    }

    pub fn transition(&self, id: Uuid) -> Option<&Transition> {
        self.transitions.get(&id)
    }
}
