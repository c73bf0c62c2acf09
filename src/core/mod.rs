//! Editing engines
//!
//! Every engine takes the current timeline by reference and returns a new
//! value; nothing here mutates the committed timeline in place.

mod coords;
pub mod group;
pub mod placement;
pub mod render_view;
pub mod split;
pub mod transition;

pub use coords::*;
pub use placement::{ConnectedSet, Placement, PlacementOutcome};
pub use render_view::{RenderClip, TimelineView};
pub use split::SplitResult;
pub use transition::TransitionTarget;
