//! Timeline data model
//!
//! Tracks hold clips and the transitions between them. Geometry is in
//! timeline pixels at the current zoom; trims and transition durations are in
//! frames.

mod clip;
mod persistence;
mod settings;
mod timeline;
mod track;
mod transition;

pub use clip::{Clip, ClipGroup, GroupBounds, PlayerRect};
pub use persistence::TimelineDocument;
pub use settings::{EditorSettings, Resolution};
pub use timeline::{InvariantViolation, RemovalReport, Timeline, TIMELINE_VERSION};
pub use track::Track;
pub use transition::{EdgeSide, Presentation, Timing, Transition, TransitionKind};
