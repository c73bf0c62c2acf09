//! Command surface for UI and automation callers.
//!
//! Each [`EditCommand`] maps to one atomic [`Editor`] call. Commands are
//! serializable so a scripted or chat-driven caller can send the same edits a
//! person makes with the mouse.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::PlacementOutcome;
use crate::editor::{ClipUpdate, Editor};
use crate::error::{EditError, EditResult};
use crate::state::{Clip, MediaEntry, Presentation, Resolution, Timing, Transition};

/// Style and length of a transition to create
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionSpec {
    #[serde(default)]
    pub presentation: Presentation,
    #[serde(default)]
    pub timing: Timing,
    pub duration_in_frames: u32,
}

impl TransitionSpec {
    fn build(self) -> Transition {
        Transition::new(self.presentation, self.timing, self.duration_in_frames)
    }
}

/// Commands accepted by [`Editor::execute`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    AddTrack,
    DeleteTrack {
        track_id: Uuid,
    },
    /// Insert a fully prepared clip
    AddClip {
        track_id: Uuid,
        clip: Clip,
    },
    /// Drop a media bin entry at a pixel position
    DropMedia {
        entry: MediaEntry,
        track_index: usize,
        left_px: f64,
    },
    UpdateClip(ClipUpdate),
    MoveClip {
        clip_id: Uuid,
        left_px: f64,
        track_index: usize,
    },
    DeleteClip {
        clip_id: Uuid,
    },
    DeleteClips {
        clip_ids: Vec<Uuid>,
    },
    /// Delete every clip created from a media entry
    DeleteMedia {
        media_id: Uuid,
    },
    /// Split the single selected clip at the ruler
    Split {
        selection: Vec<Uuid>,
        ruler_px: f64,
    },
    AddTransition {
        track_id: Uuid,
        drop_px: f64,
        transition: TransitionSpec,
    },
    AddTransitionBetween {
        #[serde(default)]
        left_clip_id: Option<Uuid>,
        #[serde(default)]
        right_clip_id: Option<Uuid>,
        transition: TransitionSpec,
    },
    DeleteTransition {
        transition_id: Uuid,
    },
    Group {
        clip_ids: Vec<Uuid>,
    },
    Ungroup {
        clip_id: Uuid,
    },
    /// Move a group off the timeline into the media bin
    ExtractGroup {
        clip_id: Uuid,
    },
    ZoomIn,
    ZoomOut,
    ZoomReset,
    SetZoom {
        zoom: f64,
    },
    Undo,
    Redo,
    SetResolution {
        resolution: Resolution,
    },
    /// Record an undo point before a drag
    BeginTransform,
}

impl EditCommand {
    /// Get command name
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTrack => "add_track",
            Self::DeleteTrack { .. } => "delete_track",
            Self::AddClip { .. } => "add_clip",
            Self::DropMedia { .. } => "drop_media",
            Self::UpdateClip(_) => "update_clip",
            Self::MoveClip { .. } => "move_clip",
            Self::DeleteClip { .. } => "delete_clip",
            Self::DeleteClips { .. } => "delete_clips",
            Self::DeleteMedia { .. } => "delete_media",
            Self::Split { .. } => "split",
            Self::AddTransition { .. } => "add_transition",
            Self::AddTransitionBetween { .. } => "add_transition_between",
            Self::DeleteTransition { .. } => "delete_transition",
            Self::Group { .. } => "group",
            Self::Ungroup { .. } => "ungroup",
            Self::ExtractGroup { .. } => "extract_group",
            Self::ZoomIn => "zoom_in",
            Self::ZoomOut => "zoom_out",
            Self::ZoomReset => "zoom_reset",
            Self::SetZoom { .. } => "set_zoom",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::SetResolution { .. } => "set_resolution",
            Self::BeginTransform => "begin_transform",
        }
    }

    /// Commands that only change the view, never the timeline's time positions
    pub fn is_view_only(&self) -> bool {
        matches!(
            self,
            Self::ZoomIn | Self::ZoomOut | Self::ZoomReset | Self::SetZoom { .. }
        )
    }
}

/// What a successful command produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    Done,
    Track { track_id: Uuid },
    Clip { clip_id: Uuid },
    Placed { clip_id: Uuid, placement: PlacementOutcome },
    Moved { placement: PlacementOutcome },
    Removed { clips: Vec<Uuid>, transitions: Vec<Uuid> },
    Split { left_id: Uuid, right_id: Uuid },
    Transition { transition_id: Uuid },
    Ungrouped { clip_ids: Vec<Uuid> },
    Extracted { entry: MediaEntry },
    Zoom { level: f64 },
    /// Undo/redo; `applied` is false when the stack was empty
    History { applied: bool },
}

impl Editor {
    /// Run one command.
    pub fn execute(&mut self, command: EditCommand) -> EditResult<CommandOutcome> {
        let name = command.name();
        let outcome = self.dispatch(command);
        match &outcome {
            Ok(_) => tracing::debug!(command = name, "command applied"),
            Err(err) => tracing::debug!(command = name, %err, "command rejected"),
        }
        outcome
    }

    fn dispatch(&mut self, command: EditCommand) -> EditResult<CommandOutcome> {
        use CommandOutcome as Out;

        let outcome = match command {
            EditCommand::AddTrack => Out::Track {
                track_id: self.add_track(),
            },
            EditCommand::DeleteTrack { track_id } => removed(self.delete_track(track_id)?),
            EditCommand::AddClip { track_id, clip } => Out::Clip {
                clip_id: self.add_clip(track_id, clip)?,
            },
            EditCommand::DropMedia {
                entry,
                track_index,
                left_px,
            } => {
                let (clip_id, placement) = self.drop_media(&entry, track_index, left_px)?;
                Out::Placed { clip_id, placement }
            }
            EditCommand::UpdateClip(update) => {
                self.update_clip(update)?;
                Out::Done
            }
            EditCommand::MoveClip {
                clip_id,
                left_px,
                track_index,
            } => Out::Moved {
                placement: self.move_clip(clip_id, left_px, track_index)?,
            },
            EditCommand::DeleteClip { clip_id } => removed(self.delete_clip(clip_id)?),
            EditCommand::DeleteClips { clip_ids } => removed(self.delete_clips(&clip_ids)?),
            EditCommand::DeleteMedia { media_id } => removed(self.delete_media(media_id)),
            EditCommand::Split {
                selection,
                ruler_px,
            } => {
                let (left_id, right_id) = self.try_split_at_ruler(&selection, ruler_px)?;
                Out::Split { left_id, right_id }
            }
            EditCommand::AddTransition {
                track_id,
                drop_px,
                transition,
            } => Out::Transition {
                transition_id: self.add_transition(track_id, transition.build(), drop_px)?,
            },
            EditCommand::AddTransitionBetween {
                left_clip_id,
                right_clip_id,
                transition,
            } => Out::Transition {
                transition_id: self.add_transition_between(
                    left_clip_id,
                    right_clip_id,
                    transition.build(),
                )?,
            },
            EditCommand::DeleteTransition { transition_id } => {
                self.delete_transition(transition_id)?;
                Out::Done
            }
            EditCommand::Group { clip_ids } => Out::Clip {
                clip_id: self.group_clips(&clip_ids)?,
            },
            EditCommand::Ungroup { clip_id } => Out::Ungrouped {
                clip_ids: self.ungroup_clip(clip_id)?,
            },
            EditCommand::ExtractGroup { clip_id } => Out::Extracted {
                entry: self.extract_group(clip_id)?,
            },
            EditCommand::ZoomIn => Out::Zoom {
                level: self.zoom_in(),
            },
            EditCommand::ZoomOut => Out::Zoom {
                level: self.zoom_out(),
            },
            EditCommand::ZoomReset => Out::Zoom {
                level: self.reset_zoom(),
            },
            EditCommand::SetZoom { zoom } => {
                if !zoom.is_finite() || zoom <= 0.0 {
                    return Err(EditError::invalid_geometry(format!("invalid zoom level {zoom}")));
                }
                Out::Zoom {
                    level: self.set_zoom(zoom),
                }
            }
            EditCommand::Undo => Out::History {
                applied: self.undo(),
            },
            EditCommand::Redo => Out::History {
                applied: self.redo(),
            },
            EditCommand::SetResolution { resolution } => {
                self.set_resolution(resolution);
                Out::Done
            }
            EditCommand::BeginTransform => {
                self.begin_transform();
                Out::Done
            }
        };
        Ok(outcome)
    }
}

fn removed(report: crate::state::RemovalReport) -> CommandOutcome {
    CommandOutcome::Removed {
        clips: report.clips.iter().map(|c| c.id).collect(),
        transitions: report.transitions.iter().map(|t| t.id).collect(),
    }
}
