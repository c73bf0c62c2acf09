//! State management module
//!
//! This module contains the data structures of the editing core:
//! - Timeline: tracks, clips, transitions and resolution
//! - Media: entries handed to the timeline by the media bin
//! - Selection: the caller-owned set of selected clips and tracks
//! - History: bounded undo/redo snapshots

mod history;
mod media;
mod selection;
mod timeline;

pub use history::*;
pub use media::*;
pub use selection::*;
pub use timeline::*;
