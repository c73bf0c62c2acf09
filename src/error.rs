use uuid::Uuid;

use crate::state::{EdgeSide, MediaKind};

/// Convenience result type used across the editing core.
pub type EditResult<T> = Result<T, EditError>;

/// Coarse classification of a failure, used by callers to pick feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself is not valid for the current timeline.
    InvalidRequest,
    /// The request is valid but would make clips overlap.
    Conflict,
    /// A referenced track, clip or transition does not exist.
    Missing,
    /// Settings, serialization or IO failed.
    Storage,
}

/// Errors reported by timeline mutations. A mutation that returns an error
/// leaves the timeline untouched.
#[derive(thiserror::Error, Debug)]
pub enum EditError {
    #[error("track not found: {0}")]
    TrackNotFound(Uuid),

    #[error("track index {0} is out of range")]
    TrackIndexOutOfRange(isize),

    #[error("clip not found: {0}")]
    ClipNotFound(Uuid),

    #[error("transition not found: {0}")]
    TransitionNotFound(Uuid),

    #[error("no clip selected")]
    NoSelection,

    #[error("expected exactly one selected clip, got {0}")]
    MultipleSelection(usize),

    #[error("split position {position_px}px is not inside clip {clip_id}")]
    SplitOutOfBounds { clip_id: Uuid, position_px: f64 },

    #[error("a transition needs at least one adjacent clip")]
    TransitionWithoutClip,

    #[error("{kind} clips cannot have transitions")]
    TransitionNotAllowed { kind: MediaKind },

    #[error("transition is longer than the {side} clip")]
    TransitionTooLong { side: EdgeSide },

    #[error("cannot place transitions next to each other")]
    BackToBackTransitions,

    #[error("clip {clip_id} already has a transition on its {side} edge")]
    EdgeOccupied { clip_id: Uuid, side: EdgeSide },

    #[error("clip {between} lies between transition clips {left} and {right}")]
    ClipsNotAdjacent { left: Uuid, right: Uuid, between: Uuid },

    #[error("clip {0} is linked by transitions and must move with its chain")]
    LinkedClip(Uuid),

    #[error("clip {0} would overlap another clip")]
    Collision(Uuid),

    #[error("invalid clip geometry: {0}")]
    InvalidGeometry(String),

    #[error("trim window of clip {0} exceeds its source media length")]
    TrimOverflow(Uuid),

    #[error("grouping needs at least two clips, got {0}")]
    GroupTooSmall(usize),

    #[error("transition {0} links a selected clip to a clip outside the selection")]
    GroupCutsTransition(Uuid),

    #[error("clip {0} is not a group")]
    NotComposite(Uuid),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EditError {
    /// Build an [`EditError::InvalidGeometry`] value.
    pub fn invalid_geometry(msg: impl Into<String>) -> Self {
        Self::InvalidGeometry(msg.into())
    }

    /// Build an [`EditError::Settings`] value.
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EditError::TrackNotFound(_)
            | EditError::TrackIndexOutOfRange(_)
            | EditError::ClipNotFound(_)
            | EditError::TransitionNotFound(_) => ErrorCategory::Missing,
            EditError::Collision(_) => ErrorCategory::Conflict,
            EditError::Settings(_) | EditError::Serde(_) | EditError::Io(_) => {
                ErrorCategory::Storage
            }
            _ => ErrorCategory::InvalidRequest,
        }
    }
}
