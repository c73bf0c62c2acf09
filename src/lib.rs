//! NLA timeline core
//!
//! The editing core of a non-linear video editor: a multi-track timeline of
//! clips, transitions and groups, the engines that keep it consistent while
//! clips are dropped, dragged, split, grouped and zoomed, and snapshot-based
//! undo/redo.
//!
//! [`Editor`] is the entry point. It owns the committed [`Timeline`] and
//! routes every mutation through the pure engines in [`core`].

pub mod commands;
pub mod constants;
pub mod core;
pub mod editor;
pub mod error;
pub mod hotkeys;
pub mod state;

pub use commands::{CommandOutcome, EditCommand, TransitionSpec};
pub use crate::core::{PlacementOutcome, TimeScale, TimelineView};
pub use editor::{ClipUpdate, Editor, SubscriptionId};
pub use error::{EditError, EditResult, ErrorCategory};
pub use state::{
    Clip, EditorSettings, MediaEntry, MediaKind, Resolution, SelectionState, Timeline, Track,
    Transition,
};
